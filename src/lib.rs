pub mod repl;
pub mod lexer;
pub mod parser;
pub mod ast;
pub mod expander;
pub mod executor;
pub mod environment;
pub mod config;
pub mod error;
