use crate::{
    ast::{
        expressions::IdentRef,
        statements::{Stmt, StmtKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::parser::Parser;

/// Parses one statement. A token with no registered handler starts the
/// empty statement and is left for the caller.
pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let handler = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied();

    match handler {
        Some(handler) => handler(parser),
        None => Ok(Stmt::new(StmtKind::Empty, parser.current_token().clone())),
    }
}

fn parse_ident(parser: &mut Parser, context: &str) -> Result<IdentRef, Error> {
    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: format!("expected identifier after {}", context),
        },
        parser.get_position(),
    );
    let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(IdentRef::new(token))
}

pub fn parse_assign_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    parser.expect(TokenKind::Assignment)?;
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::new(
        StmtKind::Assign {
            target: IdentRef::new(token.clone()),
            value,
        },
        token,
    ))
}

pub fn parse_call_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    let target = parse_ident(parser, "CALL")?;

    Ok(Stmt::new(StmtKind::Call(target), token))
}

pub fn parse_input_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    let target = parse_ident(parser, "?")?;

    Ok(Stmt::new(StmtKind::Input(target), token))
}

pub fn parse_output_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::new(StmtKind::Output(value), token))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();

    let mut body = vec![parse_stmt(parser)?];
    while parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        body.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::End)?;

    Ok(Stmt::new(StmtKind::Block(body), token))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Then)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::If {
            condition,
            body: Box::new(body),
        },
        token,
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::While {
            condition,
            body: Box::new(body),
        },
        token,
    ))
}
