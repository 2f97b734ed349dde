//! Error types for build orchestration.

/// Errors that stop a build before compilation starts.
///
/// Everything that goes wrong during planning or cache maintenance is
/// absorbed and degrades to a full build; a failed compile is reported in
/// the [`BuildReport`](crate::BuildReport), not as an error.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The compilation strategy cannot run on this machine.
    #[error("compiler '{name}' is not available")]
    StrategyUnavailable {
        /// Name of the strategy.
        name: String,
    },
}
