//! Production planner
//!
//! Ties the catalog, the constraint system and the derived metrics together
//! for one planning call.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::PlannerConfig;
use crate::constraints::{ConstraintSystem, PlanInputs};
use crate::error::PlanError;
use crate::goals::ProductGoal;
use crate::metrics::{self, ProductionPlan};
use crate::models::{Item, ResolvedRecipe};

/// A planning request with its catalog data already copied out
///
/// Holds no references into the catalog, so it can be moved to another
/// thread and solved while the catalog changes.
#[derive(Debug, Clone)]
pub struct ProductionPlanner {
    recipes: Vec<ResolvedRecipe>,
    items: Vec<Item>,
    goals: BTreeMap<String, f64>,
    free_inputs: BTreeSet<String>,
    config: PlannerConfig,
}

impl ProductionPlanner {
    pub fn new<C: Catalog + ?Sized>(
        catalog: &C,
        recipe_ids: &[String],
        goals: &[ProductGoal],
        free_inputs: &[String],
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        let recipes = catalog.find_recipes_by_ids(recipe_ids)?;
        if recipes.len() < recipe_ids.len() {
            debug!(
                requested = recipe_ids.len(),
                found = recipes.len(),
                "ignoring unknown or repeated recipe ids"
            );
        }
        let items = catalog.all_items()?;

        let mut goal_rates = BTreeMap::new();
        for goal in goals {
            if let Some(previous) = goal_rates.insert(goal.item.clone(), goal.rate) {
                warn!(
                    item = %goal.item,
                    previous,
                    rate = goal.rate,
                    "duplicate goal, keeping the last rate"
                );
            }
        }

        Ok(Self {
            recipes,
            items,
            goals: goal_rates,
            free_inputs: free_inputs.iter().cloned().collect(),
            config,
        })
    }

    /// The selected recipes that were found in the catalog
    pub fn recipes(&self) -> &[ResolvedRecipe] {
        &self.recipes
    }

    pub fn solve(&self) -> Result<ProductionPlan, PlanError> {
        let inputs = PlanInputs {
            recipes: &self.recipes,
            items: &self.items,
            goals: &self.goals,
            free_inputs: &self.free_inputs,
            goal_policy: self.config.goal_policy,
            zero_threshold: self.config.zero_threshold,
        };

        let system = ConstraintSystem::build(&inputs)?;
        let touched = system
            .net_productions()
            .values()
            .filter(|production| production.terms > 0)
            .count();
        debug!(
            touched,
            relative_gap = self.config.relative_gap,
            "items balanced by the selected recipes"
        );

        let solved = system.solve()?;
        let plan = metrics::derive(&self.recipes, &solved, &self.config);

        info!(
            recipes = self.recipes.len(),
            consume = plan.consume,
            power = plan.power,
            "solved production plan"
        );
        Ok(plan)
    }

    /// Solve on a worker thread, giving up after `limit`
    ///
    /// The worker is not interrupted on expiry; its result is discarded.
    pub fn solve_with_timeout(self, limit: Duration) -> Result<ProductionPlan, PlanError> {
        run_with_timeout(limit, move || self.solve())
    }
}

fn run_with_timeout<T, F>(limit: Duration, job: F) -> Result<T, PlanError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PlanError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!(?limit, "production planning timed out");
            Err(PlanError::Timeout(limit))
        }
        Err(RecvTimeoutError::Disconnected) => Err(PlanError::Solver(
            "planning thread exited without a result".to_string(),
        )),
    }
}
