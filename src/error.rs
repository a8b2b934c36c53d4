use thiserror::Error;

use crate::executor::ExecError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// Everything that can go wrong between reading a line and getting its status.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Lexing error: {0}")]
    Lex(#[from] LexError),
    #[error("Parsing error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl ShellError {
    /// Status reported for the line that produced this error.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::Lex(_) | ShellError::Parse(_) => 2,
            ShellError::Exec(_) => 1,
        }
    }
}
