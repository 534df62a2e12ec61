//! Structured errors for the command boundary (section 7).

use thiserror::Error;

/// Everything that can go wrong handling a command, in the style of the
/// wider pack's `thiserror`-based error enums (see `DESIGN.md`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Rejected at `init`/`reset`/`updateParams`: non-positive sizes/counts
    /// or negative rates. The caller must leave the previous state untouched.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Not fatal: placement ran out of retries before reaching `population`
    /// agents. Logged via `tracing::warn!`; the generation proceeds with
    /// fewer agents than requested.
    #[error("exhausted {attempts} placement attempts after placing {placed} of {requested} agents")]
    PlacementExhausted {
        attempts: u32,
        placed: usize,
        requested: usize,
    },

    /// Used internally by `inspect`'s lookup helper; per spec this is not an
    /// error at the command boundary (`inspect` answers `None`, it never
    /// propagates `Err`), but surfacing it as a typed error makes that
    /// lookup path trivially testable in isolation.
    #[error("no agent at the queried cell")]
    NoAgentAtCell,
}
