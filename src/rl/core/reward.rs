//! Reward Functions
//!
//! Reward is the net portfolio gain since the episode's reference value
//! (captured at reset), not the change since the previous tick.

/// Cash plus market value of `holdings` at `prices`
pub fn portfolio_value(cash: f64, holdings: &[f64], prices: &[f64]) -> f64 {
    cash + holdings
        .iter()
        .zip(prices)
        .map(|(holding, price)| holding * price)
        .sum::<f64>()
}

/// Net gain of the portfolio over the episode's reference value
pub fn episode_gain(cash: f64, holdings: &[f64], prices: &[f64], reference_value: f64) -> f64 {
    portfolio_value(cash, holdings, prices) - reference_value
}
