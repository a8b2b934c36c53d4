use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use forksh::config::ConfigLoader;
use forksh::executor::ExecOutcome;
use forksh::repl::Shell;

#[derive(Parser)]
#[command(name = "forksh", version, about = "A small fork/exec command interpreter")]
struct Cli {
    /// Run COMMAND instead of reading from stdin
    #[arg(short = 'c', value_name = "COMMAND")]
    command: Option<String>,

    /// Configuration file (defaults to $FORKSH_CONFIG, then ~/.forkshrc)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Script to run, one command line per line
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::discover(cli.config.as_deref()).context("failed to load configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();
    debug!("config: {:?}", config);

    let mut shell = Shell::new(config);
    let code = if let Some(command) = cli.command {
        match shell.run_line(&command) {
            ExecOutcome::Code(code) | ExecOutcome::Exit(code) => code,
        }
    } else if let Some(script) = cli.script {
        let file = File::open(&script).with_context(|| format!("cannot open {}", script.display()))?;
        shell.run_source(BufReader::new(file), false)
    } else {
        shell.run_interactive()
    };

    std::process::exit(code);
}
