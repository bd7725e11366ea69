//! Action Space
//!
//! Actions are integer share quantities, one per instrument: positive buys,
//! negative sells, each bounded by `[-max_action, max_action]`.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default per-instrument action bound (shares per step)
pub const MAX_LIMIT: i64 = 10;

/// Bounded integer box action space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    /// Number of instruments
    pub dim: usize,
    /// Lowest allowed quantity (inclusive)
    pub low: i64,
    /// Highest allowed quantity (inclusive)
    pub high: i64,
}

impl ActionSpace {
    /// Symmetric space `[-max_action, max_action]^dim`
    pub fn symmetric(dim: usize, max_action: i64) -> Self {
        Self {
            dim,
            low: -max_action,
            high: max_action,
        }
    }

    /// Uniformly sample an action, bounds inclusive
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i64> {
        (0..self.dim)
            .map(|_| rng.gen_range(self.low..=self.high))
            .collect()
    }

    /// Whether every entry is inside the bounds and the length matches
    pub fn contains(&self, action: &[i64]) -> bool {
        action.len() == self.dim && action.iter().all(|a| (self.low..=self.high).contains(a))
    }

    /// Clip a continuous action to the bounds and truncate toward zero.
    ///
    /// Share quantities must be whole; NaN entries become 0.
    pub fn clip_and_truncate(&self, raw: &[f64]) -> Vec<i64> {
        raw.iter()
            .map(|value| {
                if value.is_nan() {
                    return 0;
                }
                value.clamp(self.low as f64, self.high as f64).trunc() as i64
            })
            .collect()
    }

    /// Largest absolute quantity allowed
    pub fn max_magnitude(&self) -> i64 {
        self.high.max(-self.low)
    }
}

/// Apply a per-instrument trade vector to holdings and cash.
///
/// Instruments are processed in declaration order against the running cash
/// balance, so an earlier buy can starve a later one. A trade is applied only
/// when it leaves cash and the holding non-negative; otherwise that
/// instrument is skipped and its cash is left untouched.
///
/// Returns the new holdings and the remaining cash.
pub fn apply_trades(
    action: &[i64],
    holdings: &[f64],
    cash: f64,
    prices: &[f64],
) -> (Vec<f64>, f64) {
    let mut remaining_cash = cash;
    let new_holdings = action
        .iter()
        .zip(holdings)
        .zip(prices)
        .map(|((&quantity, &holding), &price)| {
            let quantity = quantity as f64;
            let cost = quantity * price;
            if remaining_cash - cost >= 0.0 && holding + quantity >= 0.0 {
                remaining_cash -= cost;
                (holding + quantity).max(0.0)
            } else {
                holding
            }
        })
        .collect();

    (new_holdings, remaining_cash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_within_bounds() {
        let space = ActionSpace::symmetric(3, MAX_LIMIT);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let action = space.sample(&mut rng);
            assert!(space.contains(&action));
        }
    }

    #[test]
    fn test_sample_hits_both_bounds() {
        let space = ActionSpace::symmetric(1, 2);
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<i64> = (0..500).map(|_| space.sample(&mut rng)[0]).collect();

        assert!(samples.contains(&-2));
        assert!(samples.contains(&2));
    }

    #[test]
    fn test_clip_and_truncate() {
        let space = ActionSpace::symmetric(4, 10);
        let action = space.clip_and_truncate(&[3.9, -3.9, 42.0, f64::NAN]);
        assert_eq!(action, vec![3, -3, 10, 0]);
        assert_eq!(space.clip_and_truncate(&[-10.7]), vec![-10]);
    }

    #[test]
    fn test_buy_within_budget() {
        let (holdings, cash) = apply_trades(&[5, 0], &[0.0, 0.0], 1000.0, &[10.0, 20.0]);
        assert_eq!(holdings, vec![5.0, 0.0]);
        assert_eq!(cash, 950.0);
    }

    #[test]
    fn test_unaffordable_buy_skipped() {
        let (holdings, cash) = apply_trades(&[1], &[0.0], 10.0, &[100.0]);
        assert_eq!(holdings, vec![0.0]);
        assert_eq!(cash, 10.0);
    }

    #[test]
    fn test_oversell_skipped() {
        let (holdings, cash) = apply_trades(&[-3], &[2.0], 0.0, &[50.0]);
        assert_eq!(holdings, vec![2.0]);
        assert_eq!(cash, 0.0);
    }

    #[test]
    fn test_sell_credits_cash() {
        let (holdings, cash) = apply_trades(&[-2], &[2.0], 0.0, &[50.0]);
        assert_eq!(holdings, vec![0.0]);
        assert_eq!(cash, 100.0);
    }

    #[test]
    fn test_declaration_order_competes_for_cash() {
        // Enough cash for either buy alone but not both: the first wins
        let (holdings, cash) = apply_trades(&[1, 1], &[0.0, 0.0], 100.0, &[80.0, 80.0]);
        assert_eq!(holdings, vec![1.0, 0.0]);
        assert_eq!(cash, 20.0);
    }

    #[test]
    fn test_sale_funds_later_buy() {
        // Selling the first instrument frees cash for the second
        let (holdings, cash) = apply_trades(&[-1, 1], &[1.0, 0.0], 0.0, &[60.0, 50.0]);
        assert_eq!(holdings, vec![0.0, 1.0]);
        assert_eq!(cash, 10.0);
    }
}
