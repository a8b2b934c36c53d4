use log::{debug, warn};

use crate::ast::AstNode;
use crate::environment::Environment;
use crate::executor::process::{self, run_branch};
use crate::executor::{ExecOutcome, ExecStatus, Executor};

pub struct ParallelHandler;

impl ParallelHandler {
    /// `cmd1 & cmd2`: both branches run in their own process, sharing the
    /// parent's streams. Succeeds only when both exit with 0.
    pub fn run(
        cmd1: &AstNode,
        cmd2: &AstNode,
        executor: &mut dyn Executor,
        env: &mut Environment,
    ) -> ExecStatus {
        let first = process::spawn(|| run_branch(executor, cmd1, env))?;
        let second = match process::spawn(|| run_branch(executor, cmd2, env)) {
            Ok(pid) => pid,
            Err(e) => {
                // Reap the branch that did start before giving up.
                if let Err(wait_err) = process::wait_status(first) {
                    warn!("{}", wait_err);
                }
                return Err(e);
            }
        };
        debug!("parallel branches {} and {}", first, second);

        // Both are reaped before any error is surfaced.
        let first_status = process::wait_status(first);
        let second_status = process::wait_status(second);
        let (first_status, second_status) = (first_status?, second_status?);

        Ok(ExecOutcome::from_success(first_status == 0 && second_status == 0))
    }
}
