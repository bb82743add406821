use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

/// Broad classification of an [`Error`], used by callers to tell user-facing
/// diagnostics apart from generator limitations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Scope,
    Type,
    Internal,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Lexical => write!(f, "lexical error"),
            ErrorCategory::Syntax => write!(f, "syntax error"),
            ErrorCategory::Scope => write!(f, "scope error"),
            ErrorCategory::Type => write!(f, "type error"),
            ErrorCategory::Internal => write!(f, "internal error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    /// Internal error without a meaningful source position.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::new(
            ErrorImpl::CodegenError {
                message: message.into(),
            },
            Position::null(),
        )
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn category(&self) -> ErrorCategory {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::NumberParseError { .. }
            | ErrorImpl::InvalidEscape { .. }
            | ErrorImpl::UnterminatedString => ErrorCategory::Lexical,
            ErrorImpl::UnexpectedToken { .. } | ErrorImpl::UnexpectedTokenDetailed { .. } => {
                ErrorCategory::Syntax
            }
            ErrorImpl::DuplicateDeclaration { .. } | ErrorImpl::IdentifierNotFound { .. } => {
                ErrorCategory::Scope
            }
            ErrorImpl::TypeMatchError { .. }
            | ErrorImpl::IncompatibleOperands { .. }
            | ErrorImpl::NonBooleanGuard { .. }
            | ErrorImpl::AssignToConstant { .. }
            | ErrorImpl::ProcedureAssignment { .. }
            | ErrorImpl::NotCallable { .. }
            | ErrorImpl::NotPrintable
            | ErrorImpl::InvalidInputTarget { .. }
            | ErrorImpl::InsufficientTypeInformation { .. } => ErrorCategory::Type,
            ErrorImpl::NotImplementedError { .. }
            | ErrorImpl::UnreachableFrame { .. }
            | ErrorImpl::CodegenError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::InvalidEscape { .. } => "InvalidEscape",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::IdentifierNotFound { .. } => "IdentifierNotFound",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::IncompatibleOperands { .. } => "IncompatibleOperands",
            ErrorImpl::NonBooleanGuard { .. } => "NonBooleanGuard",
            ErrorImpl::AssignToConstant { .. } => "AssignToConstant",
            ErrorImpl::ProcedureAssignment { .. } => "ProcedureAssignment",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::NotPrintable => "NotPrintable",
            ErrorImpl::InvalidInputTarget { .. } => "InvalidInputTarget",
            ErrorImpl::InsufficientTypeInformation { .. } => "InsufficientTypeInformation",
            ErrorImpl::NotImplementedError { .. } => "NotImplementedError",
            ErrorImpl::UnreachableFrame { .. } => "UnreachableFrame",
            ErrorImpl::CodegenError { .. } => "CodegenError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::InvalidEscape { sequence } => ErrorTip::Suggestion(format!(
                "`\\{}` is not a valid escape, expected one of \\b \\t \\n \\f \\r \\\" \\' \\\\",
                sequence
            )),
            ErrorImpl::UnterminatedString => {
                ErrorTip::Suggestion(String::from("String literal is missing its closing `\"`"))
            }
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::DuplicateDeclaration { identifier } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this block",
                identifier
            )),
            ErrorImpl::IdentifierNotFound { identifier } => {
                ErrorTip::Suggestion(format!("`{}` is never declared", identifier))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::IncompatibleOperands {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot combine `{}` and `{}`",
                operator, left, right
            )),
            ErrorImpl::NonBooleanGuard { received } => ErrorTip::Suggestion(format!(
                "Conditions must be BOOLEAN, received `{}`",
                received
            )),
            ErrorImpl::AssignToConstant { identifier } => ErrorTip::Suggestion(format!(
                "`{}` is a constant and cannot be assigned",
                identifier
            )),
            ErrorImpl::ProcedureAssignment { identifier } => ErrorTip::Suggestion(format!(
                "Procedures are not values, `{}` can only hold NUMBER, BOOLEAN or STRING",
                identifier
            )),
            ErrorImpl::NotCallable {
                identifier,
                received,
            } => ErrorTip::Suggestion(format!(
                "Only procedures can be called, `{}` is `{}`",
                identifier, received
            )),
            ErrorImpl::NotPrintable => {
                ErrorTip::Suggestion(String::from("Procedures cannot be output"))
            }
            ErrorImpl::InvalidInputTarget { identifier } => ErrorTip::Suggestion(format!(
                "`{}` is a procedure and cannot receive input",
                identifier
            )),
            ErrorImpl::InsufficientTypeInformation { identifier } => {
                ErrorTip::Suggestion(format!(
                    "Nothing in the program determines the type of `{}`",
                    identifier
                ))
            }
            ErrorImpl::NotImplementedError { .. } => ErrorTip::Suggestion(String::from(
                "This feature is expected to be handled, but has not yet been implemented",
            )),
            ErrorImpl::UnreachableFrame { .. } => ErrorTip::Suggestion(String::from(
                "The declaring procedure is not on the lexical chain of this use",
            )),
            ErrorImpl::CodegenError { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.category(),
            self.internal_error,
            self.position
        )
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::internal(format!("llvm builder: {}", error))
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("invalid escape sequence: \\{sequence}")]
    InvalidEscape { sequence: String },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("duplicate declaration of {identifier:?}")]
    DuplicateDeclaration { identifier: String },
    #[error("identifier {identifier:?} not found")]
    IdentifierNotFound { identifier: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("incompatible operands for {operator:?}: {left} and {right}")]
    IncompatibleOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("condition must be BOOLEAN, received {received}")]
    NonBooleanGuard { received: String },
    #[error("cannot assign to constant {identifier:?}")]
    AssignToConstant { identifier: String },
    #[error("cannot assign a procedure to {identifier:?}")]
    ProcedureAssignment { identifier: String },
    #[error("{identifier:?} of type {received} is not a procedure")]
    NotCallable { identifier: String, received: String },
    #[error("procedures cannot be output")]
    NotPrintable,
    #[error("cannot input into procedure {identifier:?}")]
    InvalidInputTarget { identifier: String },
    #[error("insufficient type information for {identifier:?}")]
    InsufficientTypeInformation { identifier: String },
    #[error("not implemented: {feature}")]
    NotImplementedError { feature: String },
    #[error("declaration of {identifier:?} is not reachable through enclosing frames")]
    UnreachableFrame { identifier: String },
    #[error("code generation failed: {message}")]
    CodegenError { message: String },
}
