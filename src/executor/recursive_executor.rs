use log::warn;

use crate::ast::{AstNode, SimpleCommand};
use crate::environment::Environment;
use crate::executor::{
    Executor,
    ExecOutcome, ExecSettings, ExecStatus,
    builtin::BuiltinManager,
    launcher::Launcher,
    parallel::ParallelHandler,
    pipeline::PipelineHandler,
    process::report,
};

/// Walks the command tree, one recursive call per node.
pub struct RecursiveExecutor {
    pub builtin_registry: BuiltinManager,
    pub settings: ExecSettings,
}

impl Default for RecursiveExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecursiveExecutor {
    pub fn new() -> Self {
        Self::with_settings(ExecSettings::default())
    }

    pub fn with_settings(settings: ExecSettings) -> Self {
        RecursiveExecutor {
            builtin_registry: BuiltinManager::new(),
            settings,
        }
    }

    pub fn exec_command(&mut self, cmd: &SimpleCommand, env: &mut Environment) -> ExecStatus {
        if let Some(status) = self.builtin_registry.dispatch(cmd, env) {
            return status;
        }
        Launcher::run(cmd, env, &self.settings).map(ExecOutcome::Code)
    }

    /// Fork, pipe and wait failures count as a failed branch, not as an
    /// interruption of the whole tree.
    fn recover(result: ExecStatus) -> ExecStatus {
        match result {
            Err(e) => {
                warn!("{}", e);
                report(e);
                Ok(ExecOutcome::FAILURE)
            }
            ok => ok,
        }
    }
}

impl Executor for RecursiveExecutor {
    fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus {
        match node {
            AstNode::Command(cmd) => Self::recover(self.exec_command(cmd, env)),
            AstNode::Sequence(cmd1, cmd2) => match self.exec(cmd1, env)? {
                exit @ ExecOutcome::Exit(_) => Ok(exit),
                ExecOutcome::Code(_) => self.exec(cmd2, env),
            },
            AstNode::And(cmd1, cmd2) => match self.exec(cmd1, env)? {
                ExecOutcome::Code(0) => self.exec(cmd2, env),
                other => Ok(other),
            },
            AstNode::Or(cmd1, cmd2) => match self.exec(cmd1, env)? {
                ExecOutcome::Code(0) => Ok(ExecOutcome::SUCCESS),
                ExecOutcome::Code(_) => self.exec(cmd2, env),
                exit => Ok(exit),
            },
            AstNode::Parallel(cmd1, cmd2) => {
                Self::recover(ParallelHandler::run(cmd1, cmd2, self, env))
            }
            AstNode::Pipeline(cmd1, cmd2) => {
                let pipefail = self.settings.pipefail;
                Self::recover(PipelineHandler::run(cmd1, cmd2, self, env, pipefail))
            }
        }
    }
}
