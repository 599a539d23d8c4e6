//! Planner error types

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid product goal {0:?}: item id is empty")]
    InvalidGoal(String),

    #[error("invalid target rate {token:?} for item {item}")]
    InvalidRate { item: String, token: String },

    #[error("no production plan satisfies the requested goals")]
    Infeasible,

    #[error("planning did not finish within {0:?}")]
    Timeout(Duration),

    #[error("solver failed: {0}")]
    Solver(String),

    #[error("catalog lookup failed: {0}")]
    Catalog(String),
}

impl PlanError {
    /// Infeasible plans and expired solves are reported the same way to users
    pub fn is_infeasible(&self) -> bool {
        matches!(self, PlanError::Infeasible | PlanError::Timeout(_))
    }
}
