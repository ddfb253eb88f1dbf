//! Fixed-size identifiers used throughout the reservoir and voting machine.
//!
//! Every identifier is a thin newtype over a fixed byte array so it can be
//! used directly as a hash-map key without any intermediate allocation,
//! the same way the teacher wraps `Byte32`/`ProposalShortId` rather than
//! passing raw slices around.

use std::fmt;

macro_rules! fixed_bytes_id {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x", stringify!($name))?;
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, ")")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    };
}

fixed_bytes_id!(TxId, 32);
fixed_bytes_id!(PayId, 32);
fixed_bytes_id!(PayNonce, 8);
fixed_bytes_id!(AssetId, 32);
fixed_bytes_id!(ShareId, 32);
fixed_bytes_id!(Owner, 32);
fixed_bytes_id!(ClientNonce, 8);
fixed_bytes_id!(Digest32, 32);

/// Opaque identifier for a registered peer; lexicographically ordered for
/// the voting machine's tie-break rule.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub String);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
