use std::convert::Infallible;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;

use log::debug;
use nix::unistd::execve;

use crate::ast::SimpleCommand;
use crate::environment::Environment;
use crate::executor::path_resolver::PathResolver;
use crate::executor::process;
use crate::executor::redirect::RedirectHandler;
use crate::executor::{ExecError, ExecSettings};
use crate::expander::build_argv;

/// Runs a simple command as a separate program.
pub struct Launcher;

impl Launcher {
    /// Forks, lets the child redirect and load the program, then waits and
    /// returns the child's exit status.
    pub fn run(
        cmd: &SimpleCommand,
        env: &Environment,
        settings: &ExecSettings,
    ) -> Result<i32, ExecError> {
        let load_failure_status = settings.load_failure_status;

        let pid = process::spawn(|| {
            if let Err(e) = RedirectHandler::apply(cmd, env) {
                // A child with half-wired streams must not go on.
                process::report(e);
                return 1;
            }
            match Self::load(cmd, env) {
                Ok(never) => match never {},
                Err(e) => {
                    process::report(e);
                    load_failure_status
                }
            }
        })?;

        process::wait_status(pid)
    }

    /// Replaces the current process image. Only returns on failure.
    pub fn load(cmd: &SimpleCommand, env: &Environment) -> Result<Infallible, ExecError> {
        let argv = build_argv(cmd, env);
        let program = argv.first().cloned().unwrap_or_default();

        let path = PathResolver
            .resolve(&program, env.get("PATH"))
            .ok_or_else(|| ExecError::CommandNotFound(program.clone()))?;
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| ExecError::InvalidArgument(path.display().to_string()))?;
        let c_argv = argv
            .into_iter()
            .map(|arg| CString::new(arg).map_err(|e| ExecError::InvalidArgument(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let envp = env.to_envp();

        debug!("execve {} {:?}", path.display(), c_argv);
        execve(&c_path, &c_argv, &envp).map_err(|source| ExecError::Load { program, source })
    }
}
