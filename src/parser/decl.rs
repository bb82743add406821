use crate::{
    ast::{
        ast::{Block, DeclId, Declaration, DeclarationKind, Procedure},
        types::ConstValue,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{parser::Parser, stmt::parse_stmt};

/// Parses a block: any number of `CONST`, then `VAR`, then `PROCEDURE`
/// sections followed by one statement.
pub fn parse_block(parser: &mut Parser) -> Result<Block, Error> {
    let mut consts = vec![];
    let mut vars = vec![];
    let mut procedures = vec![];

    while parser.current_token_kind() == TokenKind::Const {
        parser.advance();
        loop {
            consts.push(parse_const_decl(parser)?);
            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
        parser.expect(TokenKind::Semicolon)?;
    }

    while parser.current_token_kind() == TokenKind::Var {
        parser.advance();
        loop {
            let token = parser.expect(TokenKind::Identifier)?;
            vars.push(parser.declare(Declaration::new(DeclarationKind::Var, token)));
            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
        parser.expect(TokenKind::Semicolon)?;
    }

    while parser.current_token_kind() == TokenKind::Procedure {
        procedures.push(parse_procedure(parser)?);
    }

    let statement = parse_stmt(parser)?;

    Ok(Block {
        consts,
        vars,
        procedures,
        statement,
    })
}

fn parse_const_decl(parser: &mut Parser) -> Result<DeclId, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    parser.expect(TokenKind::Equals)?;

    let literal = parser.current_token().clone();
    let value = match literal.kind {
        TokenKind::Number => ConstValue::Number(literal.value.parse::<i32>().map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: literal.value.clone(),
                },
                literal.position,
            )
        })?),
        TokenKind::String => ConstValue::String(literal.value.clone()),
        TokenKind::Boolean => ConstValue::Boolean(literal.value == "TRUE"),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: literal.value.clone(),
                    message: String::from("expected a literal constant value"),
                },
                literal.position,
            ))
        }
    };
    parser.advance();

    Ok(parser.declare(Declaration::new(DeclarationKind::Const(value), token)))
}

fn parse_procedure(parser: &mut Parser) -> Result<Procedure, Error> {
    parser.advance();
    let token = parser.expect(TokenKind::Identifier)?;
    parser.expect(TokenKind::Semicolon)?;

    // Allocated before the body so ids follow declaration pre-order
    let decl = parser.declare(Declaration::new(DeclarationKind::Proc, token));
    let block = parse_block(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Procedure { decl, block })
}
