use thiserror::Error;

/// Errors raised while executing a program against an input.
///
/// No input content ever produces one of these. They signal either a program
/// that was assembled by hand with dangling references or a caller supplied
/// work bound that the run exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("corrupt program: instruction {pc:04} references an undefined target")]
    CorruptProgram { pc: usize },

    #[error("execution exceeded the work limit of {limit} instruction visits")]
    WorkLimitExceeded { limit: usize },
}
