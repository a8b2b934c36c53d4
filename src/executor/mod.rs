mod executor;
mod launcher;
mod parallel;
mod path_resolver;
mod pipeline;
mod recursive_executor;
pub mod builtin;
pub mod process;
pub mod redirect;


pub use executor::{Executor, ExecError, ExecOutcome, ExecSettings, ExecStatus};
pub use launcher::Launcher;
pub use parallel::ParallelHandler;
pub use path_resolver::PathResolver;
pub use pipeline::PipelineHandler;
pub use recursive_executor::RecursiveExecutor;
