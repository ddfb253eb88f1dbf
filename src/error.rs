//! Error taxonomy, grounded on the teacher's `ckb-error` crate shape: a
//! per-domain error enum plus a top-level wrapper with `#[from]`
//! conversions (see `error/src/{transaction,internal,lib}.rs`).

use thiserror::Error;

/// Surfaced to the caller, not logged beyond debug (spec.md §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid item")]
    InvalidItem,
    #[error("wrong network for public key")]
    WrongNetworkForPublicKey,
    #[error("record has expired")]
    RecordHasExpired,
    #[error("share quantity too small")]
    ShareQuantityTooSmall,
    #[error("missing parameters")]
    MissingParameters,
    #[error("too many items to process")]
    TooManyItemsToProcess,
}

/// Surfaced; mempool left unchanged on these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictError {
    #[error("transaction already exists")]
    TransactionAlreadyExists,
    #[error("double transfer attempt")]
    DoubleTransferAttempt,
    #[error("insufficient shares")]
    InsufficientShares,
    #[error("asset not found")]
    AssetNotFound,
}

/// Surfaced; caller should back off.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    #[error("buffer capacity limit reached")]
    BufferCapacityLimit,
    #[error("too many items to process")]
    TooManyItemsToProcess,
}

/// Programming defect; surfaced and logged at error level by the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalError {
    #[error("nil pointer")]
    NilPointer,
    #[error("missing parameters")]
    MissingParameters,
}

/// Fatal startup errors; abort the subsystem.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    #[error("initialisation failed")]
    InitialisationFailed,
    #[error("not initialised")]
    NotInitialised,
    #[error("already initialised")]
    AlreadyInitialised,
}

/// Top-level error returned by every reservoir operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservoirError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

pub type ReservoirResult<T> = Result<T, ReservoirError>;
