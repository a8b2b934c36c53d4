use std::io::{self, Write};

use log::{debug, warn};

use crate::ast::{Quoting, SimpleCommand, Word};
use crate::environment::{is_valid_name, Environment};
use crate::executor::builtin::manager::BuiltinCommand;
use crate::executor::process::report;
use crate::executor::redirect::RedirectHandler;
use crate::executor::{ExecOutcome, ExecStatus};
use crate::expander::expand_word;

/// `exit [N]` and its `quit` alias.
pub struct ExitCommand {
    name: &'static str,
}

impl ExitCommand {
    pub fn new(name: &'static str) -> Self {
        ExitCommand { name }
    }
}

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, cmd: &SimpleCommand, env: &mut Environment) -> ExecStatus {
        let Some(arg) = cmd.args.first() else {
            return Ok(ExecOutcome::Exit(0));
        };
        let arg = expand_word(arg, env);
        match arg.parse::<i32>() {
            Ok(code) => Ok(ExecOutcome::Exit(code & 0xff)),
            Err(_) => {
                report(format!("{}: {}: numeric argument required", self.name, arg));
                Ok(ExecOutcome::Exit(2))
            }
        }
    }
}

/// `cd [DIR]`, `$HOME` when no directory is given.
pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(&self, cmd: &SimpleCommand, env: &mut Environment) -> ExecStatus {
        // Redirections only live as long as the builtin runs.
        let _streams = match RedirectHandler::scoped(cmd, env) {
            Ok(saved) => saved,
            Err(e) => {
                report(format_args!("cd: {}", e));
                return Ok(ExecOutcome::FAILURE);
            }
        };

        let target = match cmd.args.first() {
            Some(dir) => expand_word(dir, env),
            None => env.get("HOME").unwrap_or("/").to_string(),
        };

        match std::env::set_current_dir(&target) {
            Ok(()) => {
                debug!("cwd is now {}", target);
                Ok(ExecOutcome::SUCCESS)
            }
            Err(e) => {
                // Written straight to fd 2 so a `2>` on cd catches it.
                let _ = writeln!(io::stderr(), "cd: {}: {}", target, e);
                Ok(ExecOutcome::FAILURE)
            }
        }
    }
}

/// `NAME=value`: sets a variable in the environment table, replacing any
/// previous value.
pub struct AssignCommand;

impl AssignCommand {
    /// Verb starts with a bare identifier followed by a bare `=`.
    pub fn matches(cmd: &SimpleCommand) -> bool {
        match cmd.verb.parts.as_slice() {
            [name, eq, ..] => {
                name.quoting == Quoting::Bare
                    && is_valid_name(&name.text)
                    && eq.quoting == Quoting::Bare
                    && eq.text == "="
            }
            _ => false,
        }
    }

    pub fn run(&self, cmd: &SimpleCommand, env: &mut Environment) -> ExecStatus {
        if !Self::matches(cmd) {
            report("malformed assignment");
            return Ok(ExecOutcome::FAILURE);
        }
        let parts = &cmd.verb.parts;
        let name = parts[0].text.as_str();
        if parts.len() < 3 {
            report(format!("{}: missing value in assignment", name));
            return Ok(ExecOutcome::FAILURE);
        }
        if !cmd.args.is_empty() {
            warn!("{}: words after an assignment are ignored", name);
        }

        let value = expand_word(&Word::new(parts[2..].to_vec()), env);
        env.set(name, &value);
        Ok(ExecOutcome::SUCCESS)
    }
}
