pub mod cli;

pub use cli::{Cli, Commands, DataCommands, OptimizeCommands, PolicyArgs, RunArgs};
