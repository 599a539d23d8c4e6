//! Read-only catalog access used by the planner

use rusqlite::Connection;

use crate::db;
use crate::error::PlanError;
use crate::models::{Item, ResolvedRecipe};

/// Lookup interface the planner reads catalog data through
///
/// Implementations must not change while a planner is being constructed;
/// the planner copies what it needs, so later mutations do not affect a
/// plan that is already built.
pub trait Catalog {
    /// Recipes for the given ids in caller order; unknown ids are skipped
    fn find_recipes_by_ids(&self, ids: &[String]) -> Result<Vec<ResolvedRecipe>, PlanError>;

    fn all_items(&self) -> Result<Vec<Item>, PlanError>;
}

impl Catalog for Connection {
    fn find_recipes_by_ids(&self, ids: &[String]) -> Result<Vec<ResolvedRecipe>, PlanError> {
        db::find_recipes_by_ids(self, ids).map_err(|e| PlanError::Catalog(format!("{e:#}")))
    }

    fn all_items(&self) -> Result<Vec<Item>, PlanError> {
        db::list_items(self).map_err(|e| PlanError::Catalog(format!("{e:#}")))
    }
}
