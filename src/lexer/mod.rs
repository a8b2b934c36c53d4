mod lexer;
mod token;

pub use lexer::{Lexer, LexError};
pub use token::{Token, TokenKind};
