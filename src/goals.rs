//! Production goal parsing
//!
//! Goals are given on the command line in the compact form `id[:rate]`,
//! e.g. `Reinforced_Iron_Plate:5` or just `Iron_Plate` (rate 100/min).

use std::str::FromStr;

use serde::Serialize;

use crate::error::PlanError;

/// Rate used when a goal token carries no `:rate` part
pub const DEFAULT_TARGET_RATE: f64 = 100.0;

/// Requested net production of one item, per minute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductGoal {
    pub item: String,
    pub rate: f64,
}

impl ProductGoal {
    pub fn new(item: impl Into<String>, rate: f64) -> Self {
        Self {
            item: item.into(),
            rate,
        }
    }
}

impl FromStr for ProductGoal {
    type Err = PlanError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let (item, rate) = match token.split_once(':') {
            Some((item, rate)) => (item.trim(), Some(rate.trim())),
            None => (token, None),
        };

        if item.is_empty() {
            return Err(PlanError::InvalidGoal(token.to_string()));
        }

        let rate = match rate {
            None => DEFAULT_TARGET_RATE,
            Some(raw) => {
                let invalid = || PlanError::InvalidRate {
                    item: item.to_string(),
                    token: raw.to_string(),
                };
                let value = raw.parse::<f64>().map_err(|_| invalid())?;
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid());
                }
                value
            }
        };

        Ok(ProductGoal::new(item, rate))
    }
}

/// Parse every goal token, failing on the first malformed one
pub fn parse_goals<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<ProductGoal>, PlanError> {
    tokens
        .iter()
        .map(|token| token.as_ref().parse::<ProductGoal>())
        .collect()
}
