pub mod default;

use thiserror::Error;
use crate::ast::AstNode;

pub trait Parser {
    fn parse(&mut self) -> Result<AstNode, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token '{found}' at position {pos}. Expected: {expected:?}")]
    UnexpectedToken {
        found: String,
        expected: Vec<String>,
        pos: usize,
    },
    #[error("Input is empty")]
    EmptyInput,
}
