/// Reasons a syntactically valid operation is refused by the consensus rules. None of these
/// stop the indexer; they are recorded (at debug level) and the inscription is skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusRejection {
    #[error("ticker '{0}' already deployed")]
    DuplicateTicker(String),
    #[error("ticker '{0}' not found")]
    TickerNotFound(String),
    #[error("amount {amount} exceeds per-mint limit {limit} for '{ticker}'")]
    AmountExceedsLimit {
        ticker: String,
        amount: String,
        limit: String,
    },
    #[error("amount '{amount}' carries more fractional digits than '{ticker}' allows ({decimals})")]
    DecimalsExceeded {
        ticker: String,
        amount: String,
        decimals: u8,
    },
    #[error("'{0}' has no remaining supply to mint")]
    SupplyExhausted(String),
    #[error("address does not hold enough available balance of '{ticker}': has {available}, needs {requested}")]
    InsufficientBalance {
        ticker: String,
        available: String,
        requested: String,
    },
    #[error("inscription was spent as a fee, no owning address")]
    InscribedToFee,
    #[error("not a recognized brc-20 operation")]
    NotBrc20,
}

/// Errors returned by the operation engine and the ledger store it drives.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("rejected: {0}")]
    Consensus(#[from] ConsensusRejection),
    #[error("store error: {0}")]
    Store(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

/// What actually happened to an inscription handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    Applied,
    Rejected(ConsensusRejection),
    Ignored,
}
