use thiserror::Error;

/// Error taxonomy for the provider boundary (§7's five kinds). Component functions on the hot
/// path (C10M, FillTime, Expander) do not return `Result` — a per-item failure must not abort a
/// pass, so they report through the numeric sentinels in `numeric` plus a human-readable
/// `errorMessage` attached to the owning record instead. `CalcError` is reserved for genuine I/O
/// failures at the provider boundary, where propagating a `Result` is the correct shape.
#[derive(Error, Debug)]
pub enum CalcError {
    #[error("data missing: {0}")]
    DataMissing(String),

    #[error("data invalid: {0}")]
    DataInvalid(String),

    #[error("cycle detected: {0}")]
    Cycle(CycleKind),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal calculation error: {0}")]
    InternalCalc(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read cache file: {0}")]
    Cache(#[from] std::io::Error),

    #[error("failed to decode cached data: {0}")]
    Decode(#[from] bincode::Error),
}

impl CalcError {
    /// Whether the failure is expected to clear itself on the next scheduler tick, as opposed
    /// to a data problem that will recur until the upstream feed is fixed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CalcError::UpstreamUnavailable(_) | CalcError::Http(_) | CalcError::Cache(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// The expansion re-discovered the top-level item; the branch is truncated to empty.
    ToTop,
    /// The expansion re-discovered a non-root ancestor; that node is demoted to a base leaf.
    ToIntermediate,
}

impl std::fmt::Display for CycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleKind::ToTop => write!(f, "cycle-to-top"),
            CycleKind::ToIntermediate => write!(f, "cycle-to-intermediate"),
        }
    }
}
