//! Subprocess plumbing shared by the `kcl` CLI collaborators.

pub mod execution;

pub use execution::{
    CommandExecutionOutput, CommandExecutionRequest, CommandRunner, ExecutionError,
    TokioCommandRunner,
};
