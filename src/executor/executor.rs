use std::io;

use thiserror::Error;

use crate::ast::AstNode;
use crate::environment::Environment;

pub type ExecStatus = Result<ExecOutcome, ExecError>;

/// Result of evaluating a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Ordinary exit status, 0 meaning success.
    Code(i32),
    /// `exit`/`quit` was evaluated: stop the whole chain and leave with this code.
    Exit(i32),
}

impl ExecOutcome {
    pub const SUCCESS: ExecOutcome = ExecOutcome::Code(0);
    pub const FAILURE: ExecOutcome = ExecOutcome::Code(1);

    pub fn from_success(ok: bool) -> Self {
        if ok { Self::SUCCESS } else { Self::FAILURE }
    }

    /// Code a forked branch terminates with.
    pub fn code(self) -> i32 {
        match self {
            ExecOutcome::Code(c) | ExecOutcome::Exit(c) => c,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),
    #[error("pipe failed: {0}")]
    Pipe(#[source] nix::Error),
    #[error("waitpid failed: {0}")]
    Wait(#[source] nix::Error),
    #[error("dup2 failed: {0}")]
    Dup(#[source] nix::Error),
    #[error("cannot open {path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{program}: {source}")]
    Load {
        program: String,
        #[source]
        source: nix::Error,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Knobs the interpreter reads while running a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecSettings {
    pub load_failure_status: i32,
    pub pipefail: bool,
}

impl Default for ExecSettings {
    fn default() -> Self {
        ExecSettings {
            load_failure_status: 127,
            pipefail: false,
        }
    }
}

pub trait Executor {
    fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        assert_eq!(ExecOutcome::from_success(true), ExecOutcome::Code(0));
        assert_eq!(ExecOutcome::from_success(false), ExecOutcome::Code(1));
        assert_eq!(ExecOutcome::Exit(3).code(), 3);
    }

    #[test]
    fn test_error_messages() {
        let err = ExecError::CommandNotFound("nope".to_string());
        assert_eq!(err.to_string(), "nope: command not found");
        let err = ExecError::Fork(nix::Error::EAGAIN);
        assert!(err.to_string().starts_with("fork failed"));
    }
}
