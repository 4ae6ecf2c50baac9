pub mod check;
pub mod status;
pub mod validate;

/// How a successful command run should end the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0: CORRECT, UNKNOWN, or a clean validate/status.
    Passed,
    /// Exit 1: the certificate was checked and is wrong.
    Incorrect,
    /// Exit 2: structural errors, already listed on stdout.
    Malformed,
}
