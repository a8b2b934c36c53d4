use std::io::{self, BufRead, IsTerminal, Write};

use log::{debug, warn};

use crate::config::Config;
use crate::environment::Environment;
use crate::error::ShellError;
use crate::executor::process::report;
use crate::executor::{ExecOutcome, Executor, RecursiveExecutor};
use crate::lexer::Lexer;
use crate::parser::{default::DefaultParser, Parser};

/// One interpreter session: configuration, variable table and executor.
pub struct Shell {
    config: Config,
    env: Environment,
    executor: RecursiveExecutor,
    last_status: i32,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        let mut env = Environment::from_os();
        for (name, value) in &config.env_vars {
            env.set(name, value);
        }
        let executor = RecursiveExecutor::with_settings(config.exec_settings());
        Shell {
            config,
            env,
            executor,
            last_status: 0,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Lex, parse and run one line.
    pub fn execute_line(&mut self, line: &str) -> Result<ExecOutcome, ShellError> {
        let tokens = Lexer::tokenize(line)?;
        let ast = DefaultParser::new(&tokens).parse()?;
        debug!("ast: {:?}", ast);
        Ok(self.executor.exec(&ast, &mut self.env)?)
    }

    /// Like `execute_line`, but errors are reported and turned into a status.
    /// Blank lines and `#` comments leave the last status untouched.
    pub fn run_line(&mut self, line: &str) -> ExecOutcome {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return ExecOutcome::Code(self.last_status);
        }

        let outcome = match self.execute_line(trimmed) {
            Ok(outcome) => outcome,
            Err(e) => {
                report(&e);
                ExecOutcome::Code(e.status())
            }
        };
        self.last_status = outcome.code();
        outcome
    }

    /// Runs every line of `input` until end of input or `exit`, returning the
    /// status the process should leave with.
    pub fn run_source<R: BufRead>(&mut self, mut input: R, interactive: bool) -> i32 {
        let mut line = String::new();
        loop {
            if interactive {
                print!("{}", self.config.prompt);
                let _ = io::stdout().flush();
            }

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => {
                    if interactive {
                        println!();
                    }
                    break;
                }
                Ok(_) => {
                    if let ExecOutcome::Exit(code) = self.run_line(&line) {
                        return code;
                    }
                }
                Err(e) => {
                    warn!("read error: {}", e);
                    report(format_args!("cannot read input: {}", e));
                    return 1;
                }
            }
        }
        self.last_status
    }

    /// Reads commands from stdin, prompting only when it is a terminal.
    pub fn run_interactive(&mut self) -> i32 {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        self.run_source(stdin.lock(), interactive)
    }
}
