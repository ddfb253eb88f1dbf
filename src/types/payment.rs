//! Payment evidence types: a single currency/amount/address tuple, an
//! alternative (a full set of currencies that together satisfy one way of
//! paying), and the detail delivered by an external payment watcher.

use std::collections::BTreeMap;

/// One currency's required amount and destination address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub currency: String,
    pub address: String,
    pub amount: u64,
}

/// A full set of currencies that, paid together, satisfy one alternative
/// way of paying for a batch. Only a single alternative need be satisfied.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PaymentAlternative(pub Vec<Payment>);

/// Evidence delivered by an external payment watcher for a given pay-id:
/// the amount actually observed per currency/address pair.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PaymentDetail {
    /// keyed by (currency, address)
    pub observed: BTreeMap<(String, String), u64>,
}

impl PaymentDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, currency: impl Into<String>, address: impl Into<String>, amount: u64) {
        self.observed.insert((currency.into(), address.into()), amount);
    }
}

/// True iff some single alternative in `alternatives` is fully covered by
/// `detail`: every currency/address pair in the alternative has an observed
/// amount that meets or exceeds the required amount. Exact comparison, no
/// partial credit, and only one alternative needs to match (Open Question
/// (b) in SPEC_FULL.md §9).
pub fn acceptable_payment(detail: &PaymentDetail, alternatives: &[PaymentAlternative]) -> bool {
    if alternatives.is_empty() {
        return false;
    }
    alternatives.iter().any(|alt| {
        !alt.0.is_empty()
            && alt.0.iter().all(|p| {
                detail
                    .observed
                    .get(&(p.currency.clone(), p.address.clone()))
                    .is_some_and(|&observed| observed >= p.amount)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alt(pairs: &[(&str, &str, u64)]) -> PaymentAlternative {
        PaymentAlternative(
            pairs
                .iter()
                .map(|(c, a, amt)| Payment {
                    currency: (*c).to_string(),
                    address: (*a).to_string(),
                    amount: *amt,
                })
                .collect(),
        )
    }

    #[test]
    fn accepts_when_one_alternative_fully_covered() {
        let mut detail = PaymentDetail::new();
        detail.observe("BTC", "addr1", 100);
        let alts = vec![alt(&[("BTC", "addr1", 100)]), alt(&[("LTC", "addr2", 50)])];
        assert!(acceptable_payment(&detail, &alts));
    }

    #[test]
    fn rejects_partial_coverage_within_alternative() {
        let mut detail = PaymentDetail::new();
        detail.observe("BTC", "addr1", 50);
        let alts = vec![alt(&[("BTC", "addr1", 100), ("LTC", "addr2", 10)])];
        assert!(!acceptable_payment(&detail, &alts));
    }

    #[test]
    fn rejects_when_no_alternatives() {
        let detail = PaymentDetail::new();
        assert!(!acceptable_payment(&detail, &[]));
    }

    #[test]
    fn excess_payment_still_accepted() {
        let mut detail = PaymentDetail::new();
        detail.observe("BTC", "addr1", 1_000);
        let alts = vec![alt(&[("BTC", "addr1", 100)])];
        assert!(acceptable_payment(&detail, &alts));
    }
}
