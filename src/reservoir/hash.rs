//! The canonical 32-byte hash used for pay-id derivation (spec.md §6).

use sha3::{Digest, Sha3_256};

use crate::types::PayId;

/// `pay_id = H(concat(packed_tx_i))`.
pub fn compute_pay_id(packed_bodies: &[Vec<u8>]) -> PayId {
    let mut hasher = Sha3_256::new();
    for packed in packed_bodies {
        hasher.update(packed);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    PayId(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pay_id_is_deterministic_and_order_sensitive() {
        let a = vec![b"one".to_vec(), b"two".to_vec()];
        let b = vec![b"two".to_vec(), b"one".to_vec()];
        assert_eq!(compute_pay_id(&a), compute_pay_id(&a));
        assert_ne!(compute_pay_id(&a), compute_pay_id(&b));
    }
}
