mod commands;
mod manager;

pub use commands::{AssignCommand, CdCommand, ExitCommand};
pub use manager::{BuiltinCommand, BuiltinManager};
