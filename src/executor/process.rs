use std::fmt::Display;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};

use crate::ast::AstNode;
use crate::environment::Environment;
use crate::executor::{ExecError, Executor};

/// Status used when a child's body panics instead of returning.
const PANIC_STATUS: i32 = 101;

/// Forks; the child runs `body` and terminates with the code it returns.
/// Only the parent ever returns from this function.
pub fn spawn<F>(body: F) -> Result<Pid, ExecError>
where
    F: FnOnce() -> i32,
{
    // Unflushed buffers would otherwise be written twice.
    flush_std_streams();

    // SAFETY: the child never returns into the caller's frames, it leaves
    // through `terminate` once `body` is done.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!("spawned child {}", child);
            Ok(child)
        }
        Ok(ForkResult::Child) => {
            restore_default_signals();
            let code = panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or(PANIC_STATUS);
            terminate(code)
        }
        Err(e) => Err(ExecError::Fork(e)),
    }
}

/// Blocks until `pid` terminates. Killed children report `128 + signal`.
pub fn wait_status(pid: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("child {} exited with {}", pid, code);
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!("child {} killed by {}", pid, signal);
                return Ok(128 + signal as i32);
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}

/// Ends the current process without running the caller's destructors.
pub fn terminate(code: i32) -> ! {
    flush_std_streams();
    // SAFETY: _exit is always safe to call, it just never returns.
    unsafe { libc::_exit(code & 0xff) }
}

/// Evaluates one branch inside a freshly spawned child and turns the outcome
/// into that child's exit code.
pub fn run_branch(executor: &mut dyn Executor, node: &AstNode, env: &mut Environment) -> i32 {
    match executor.exec(node, env) {
        Ok(outcome) => outcome.code(),
        Err(e) => {
            report(e);
            1
        }
    }
}

/// Diagnostic on the process's real standard error.
pub fn report(msg: impl Display) {
    let _ = writeln!(io::stderr(), "forksh: {}", msg);
}

/// The Rust runtime ignores SIGPIPE; an ignored disposition survives
/// `execve`, so children put it back before running anything.
fn restore_default_signals() {
    // SAFETY: SigDfl installs no handler code.
    if let Err(e) = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
        report(format_args!("cannot reset SIGPIPE: {}", e));
    }
}

fn flush_std_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_reaches_parent() {
        let pid = spawn(|| 42).unwrap();
        assert_eq!(wait_status(pid).unwrap(), 42);
    }

    #[test]
    fn test_code_is_truncated_to_a_byte() {
        let pid = spawn(|| 256 + 7).unwrap();
        assert_eq!(wait_status(pid).unwrap(), 7);
    }

    #[test]
    fn test_panicking_child_still_terminates() {
        let pid = spawn(|| panic!("boom")).unwrap();
        assert_eq!(wait_status(pid).unwrap(), PANIC_STATUS);
    }

    #[test]
    fn test_signal_status() {
        let pid = spawn(|| {
            // SAFETY: raising a signal on ourselves.
            unsafe { libc::raise(libc::SIGKILL) };
            0
        })
        .unwrap();
        assert_eq!(wait_status(pid).unwrap(), 128 + 9);
    }

    #[test]
    fn test_waiting_twice_is_an_error() {
        let pid = spawn(|| 0).unwrap();
        wait_status(pid).unwrap();
        assert!(matches!(wait_status(pid), Err(ExecError::Wait(Errno::ECHILD))));
    }
}
