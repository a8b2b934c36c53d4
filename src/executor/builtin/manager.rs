use std::collections::HashMap;

use crate::ast::SimpleCommand;
use crate::environment::Environment;
use crate::executor::builtin::commands::{AssignCommand, CdCommand, ExitCommand};
use crate::executor::ExecStatus;

pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, cmd: &SimpleCommand, env: &mut Environment) -> ExecStatus;
}

/// Commands that run inside the shell process, never in a child.
pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(ExitCommand::new("exit")));
        mgr.register(Box::new(ExitCommand::new("quit")));
        mgr.register(Box::new(CdCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Runs `cmd` in-process when it is a builtin or an assignment.
    /// `None` means it has to be launched as a program.
    pub fn dispatch(&self, cmd: &SimpleCommand, env: &mut Environment) -> Option<ExecStatus> {
        if let Some(builtin) = cmd.verb.as_name().and_then(|name| self.commands.get(name)) {
            return Some(builtin.run(cmd, env));
        }
        if AssignCommand::matches(cmd) {
            return Some(AssignCommand.run(cmd, env));
        }
        None
    }
}
