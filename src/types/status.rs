//! Tracking status enumeration returned to RPC-like callers.

/// spec.md §6: `{NotFound, Invalid, Accepted, Pending, Verified, Confirmed}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingStatus {
    NotFound,
    Invalid,
    Accepted,
    Pending,
    Verified,
    Confirmed,
}
