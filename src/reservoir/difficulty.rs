//! Pure difficulty-scaling function (spec.md §4.2): the more issues in a
//! free batch, the harder the proof-of-work target, modeled as shrinking
//! the acceptance threshold proportionally to batch size.

use crate::types::Difficulty;

/// The easiest possible target: every digest byte maxed out.
const BASE_THRESHOLD: [u8; 32] = [0xff; 32];

/// `ScaledDifficulty(batch_size)`: divides the base threshold by
/// `batch_size`, so a single-issue batch gets the easiest target and
/// larger batches get a proportionally smaller (harder) one.
pub fn scaled_difficulty(batch_size: usize) -> Difficulty {
    let divisor = batch_size.max(1) as u64;
    Difficulty(divide_be(BASE_THRESHOLD, divisor))
}

/// Schoolbook long division of a big-endian 256-bit value by a small
/// divisor, keeping the whole computation in pure integer arithmetic.
fn divide_be(value: [u8; 32], divisor: u64) -> [u8; 32] {
    let mut quotient = [0u8; 32];
    let mut remainder: u128 = 0;
    for (i, &byte) in value.iter().enumerate() {
        remainder = (remainder << 8) | byte as u128;
        quotient[i] = (remainder / divisor as u128) as u8;
        remainder %= divisor as u128;
    }
    quotient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_issue_is_easiest() {
        let d1 = scaled_difficulty(1);
        assert_eq!(d1.0, BASE_THRESHOLD);
    }

    #[test]
    fn larger_batches_are_strictly_harder() {
        let d1 = scaled_difficulty(1);
        let d4 = scaled_difficulty(4);
        let d16 = scaled_difficulty(16);
        assert!(d4.0 < d1.0);
        assert!(d16.0 < d4.0);
    }

    #[test]
    fn zero_sized_batch_treated_as_one() {
        assert_eq!(scaled_difficulty(0).0, scaled_difficulty(1).0);
    }
}
