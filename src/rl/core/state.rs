//! State Representation
//!
//! The environment state is a flat vector `[cash, holdings.., prices..]`
//! whose instrument segments follow ticker declaration order.

use serde::{Deserialize, Serialize};

use super::reward::portfolio_value;

/// Flat state vector with a fixed `[cash, holdings, prices]` layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    values: Vec<f64>,
    num_instruments: usize,
}

impl StateVector {
    /// Length of the state vector for `num_instruments` instruments
    pub fn dim(num_instruments: usize) -> usize {
        1 + 2 * num_instruments
    }

    /// Assemble from its three segments.
    ///
    /// `holdings` and `prices` must have the same length.
    pub fn assemble(cash: f64, holdings: &[f64], prices: &[f64]) -> Self {
        debug_assert_eq!(holdings.len(), prices.len());
        let mut values = Vec::with_capacity(Self::dim(holdings.len()));
        values.push(cash);
        values.extend_from_slice(holdings);
        values.extend_from_slice(prices);
        Self {
            values,
            num_instruments: holdings.len(),
        }
    }

    /// All-zero state, used before the first reset
    pub fn zeros(num_instruments: usize) -> Self {
        Self {
            values: vec![0.0; Self::dim(num_instruments)],
            num_instruments,
        }
    }

    pub fn cash(&self) -> f64 {
        self.values[0]
    }

    pub fn holdings(&self) -> &[f64] {
        &self.values[1..1 + self.num_instruments]
    }

    pub fn prices(&self) -> &[f64] {
        &self.values[1 + self.num_instruments..]
    }

    /// Cash plus market value of all holdings at the prices in this state
    pub fn portfolio_value(&self) -> f64 {
        portfolio_value(self.cash(), self.holdings(), self.prices())
    }

    pub fn num_instruments(&self) -> usize {
        self.num_instruments
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<StateVector> for Vec<f64> {
    fn from(state: StateVector) -> Self {
        state.values
    }
}
