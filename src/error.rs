//! Process-level error signalling.

/// The current command has already reported its failure to the user and the
/// process should exit with a non-zero status.
///
/// Handlers return this through `anyhow` instead of exiting directly so the
/// command logic stays testable; `main` checks for it with
/// `err.is::<Aborted>()` and exits without printing a second message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("command aborted")]
pub struct Aborted;
