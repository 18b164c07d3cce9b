use crate::cli::Command;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// KRM function mode: stdout carries the ResourceList and must stay clean.
    Function,
    /// Operator-facing commands such as `exec`, `validate` and `split`.
    Interactive,
}

impl ExecutionContext {
    /// Returns `true` when stdout is reserved for command output.
    pub fn reserves_stdout(self) -> bool {
        matches!(self, ExecutionContext::Function)
    }
}

/// Derive the active execution context from a parsed CLI command.
pub fn detect_context(command: &Command) -> ExecutionContext {
    match command {
        Command::Run(_) => ExecutionContext::Function,
        Command::Exec(_) | Command::Validate(_) | Command::Split(_) => {
            ExecutionContext::Interactive
        }
    }
}
