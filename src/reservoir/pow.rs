//! Proof-of-work verifier: the sliding pay-nonce window (spec.md §4.3).

use sha3::{Digest, Sha3_256};

use crate::types::{ClientNonce, PayId, TrackingStatus};

use super::Reservoir;

pub use crate::config::PowWindowConfig as PowWindow;

impl Reservoir {
    /// `try_proof(pay_id, client_nonce) -> TrackingStatus`.
    ///
    /// Walks up to `window_steps` recent pay-nonces, each derived from a
    /// block `PayNonceHeightDelta` apart, accepting the first whose
    /// `SHA3_256(pay_id || pay_nonce || client_nonce)` is `<=` the entry's
    /// difficulty. A `pay_id` observed mid-eviction returns `NotFound`
    /// rather than racing (spec.md §5).
    pub async fn try_proof(&self, pay_id: PayId, client_nonce: ClientNonce) -> TrackingStatus {
        let window = PowWindow::default();

        let mut state = self.state.write().await;
        let Some(entry) = state.pending_free_issues.get(&pay_id) else {
            return if state.verified_free_issues.contains_key(&pay_id) {
                TrackingStatus::Verified
            } else {
                TrackingStatus::NotFound
            };
        };

        let difficulty = entry.difficulty;
        let current_height = self.block_store.height();
        let mut height = round_down(current_height, window.pay_nonce_height_delta);

        let mut accepted = false;
        for step in 0..window.window_steps {
            if let Some(digest) = self.block_store.digest_for_block(height) {
                let mut pay_nonce = [0u8; 8];
                pay_nonce.copy_from_slice(&digest[..8]);

                let mut hasher = Sha3_256::new();
                hasher.update(pay_id.0);
                hasher.update(pay_nonce);
                hasher.update(client_nonce.0);
                let out = hasher.finalize();
                let mut out_bytes = [0u8; 32];
                out_bytes.copy_from_slice(&out);

                if difficulty.meets(&out_bytes) {
                    accepted = true;
                    break;
                }
            }

            if step + 1 >= window.window_steps || height < window.pay_nonce_height_delta {
                break;
            }
            height -= window.pay_nonce_height_delta;
        }

        if !accepted {
            return TrackingStatus::Invalid;
        }

        let entry = state.pending_free_issues.remove(&pay_id).expect("checked above");
        for tx in &entry.txs {
            state.pending_index.remove(&tx.tx_id);
            state.verified_index.insert(tx.tx_id, pay_id);
        }
        state.pending_free_count -= entry.txs.len();

        let mut verified = entry;
        verified.client_nonce = Some(client_nonce);
        state.verified_free_issues.insert(pay_id, verified);

        state.debug_assert_invariants();

        TrackingStatus::Accepted
    }
}

fn round_down(value: u64, step: u64) -> u64 {
    if step == 0 {
        value
    } else {
        (value / step) * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_down_floors_to_step_boundary() {
        assert_eq!(round_down(300, 128), 256);
        assert_eq!(round_down(128, 128), 128);
        assert_eq!(round_down(50, 128), 0);
    }
}
