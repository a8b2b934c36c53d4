use log::{debug, warn};
use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use crate::ast::AstNode;
use crate::environment::Environment;
use crate::executor::process::{self, report, run_branch};
use crate::executor::redirect::{replace_stream, STDIN, STDOUT};
use crate::executor::{ExecError, ExecOutcome, ExecStatus, Executor};

pub struct PipelineHandler;

impl PipelineHandler {
    /// `cmd1 | cmd2`: the first branch's stdout feeds the second's stdin.
    ///
    /// The status is the second branch's. With `pipefail` a failing first
    /// branch wins when the second one succeeded.
    pub fn run(
        cmd1: &AstNode,
        cmd2: &AstNode,
        executor: &mut dyn Executor,
        env: &mut Environment,
        pipefail: bool,
    ) -> ExecStatus {
        // Close-on-exec keeps unrelated programs from holding an end open;
        // dup2 onto 0/1 clears the flag where the end is actually used.
        let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?;
        // Each child takes its own copy of the ends out of here and drops
        // them; the parent's copy stays until both children exist.
        let mut ends = Some((read_end, write_end));

        let first = process::spawn(|| {
            let Some((read_end, write_end)) = ends.take() else { return 1 };
            if let Err(e) = replace_stream(&write_end, STDOUT) {
                report(e);
                return 1;
            }
            drop(read_end);
            drop(write_end);
            run_branch(executor, cmd1, env)
        });
        let first = match first {
            Ok(pid) => pid,
            Err(e) => return Err(e), // `ends` closes on return
        };

        let second = process::spawn(|| {
            let Some((read_end, write_end)) = ends.take() else { return 1 };
            if let Err(e) = replace_stream(&read_end, STDIN) {
                report(e);
                return 1;
            }
            drop(read_end);
            drop(write_end);
            run_branch(executor, cmd2, env)
        });

        // The reader only sees end-of-input once every write end is closed,
        // ours included.
        drop(ends);

        let second = match second {
            Ok(pid) => pid,
            Err(e) => {
                if let Err(wait_err) = process::wait_status(first) {
                    warn!("{}", wait_err);
                }
                return Err(e);
            }
        };
        debug!("pipe {} | {}", first, second);

        let first_status = process::wait_status(first);
        let second_status = process::wait_status(second)?;
        let first_status = first_status?;

        if pipefail && second_status == 0 && first_status != 0 {
            return Ok(ExecOutcome::Code(first_status));
        }
        Ok(ExecOutcome::Code(second_status))
    }
}
