//! Linear program for recipe throughputs
//!
//! Every selected recipe gets a throughput variable `x_r >= 0` (building
//! equivalents). Every item gets a net production expression
//!
//! ```text
//! net_i = sum(product.minute * x_r) - sum(ingredient.minute * x_r)
//! ```
//!
//! constrained to `net_i >= 0` (cannot be drawn from outside), `net_i <= 0`
//! for free inputs, or pinned to the goal rate. The objective minimises the
//! summed surplus `max(net_i, 0)` of every item that is not a goal, using
//! one auxiliary variable per item bounded below by 0 and by `net_i`.

use std::collections::{BTreeMap, BTreeSet};

use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    constraint, microlp, variable,
};
use tracing::debug;

use crate::config::GoalPolicy;
use crate::error::PlanError;
use crate::models::{Item, ResolvedRecipe, Role};

/// Net production of one item as a function of recipe throughputs
#[derive(Debug, Clone)]
pub struct NetProduction {
    pub expr: Expression,
    /// Recipe lines contributing to `expr`; 0 means the item is untouched
    pub terms: usize,
}

impl Default for NetProduction {
    fn default() -> Self {
        Self {
            expr: Expression::from(0.0),
            terms: 0,
        }
    }
}

/// What the constraint system is built from
pub struct PlanInputs<'a> {
    pub recipes: &'a [ResolvedRecipe],
    pub items: &'a [Item],
    pub goals: &'a BTreeMap<String, f64>,
    pub free_inputs: &'a BTreeSet<String>,
    pub goal_policy: GoalPolicy,
    pub zero_threshold: f64,
}

/// An assembled, not yet solved, linear program
pub struct ConstraintSystem {
    vars: ProblemVariables,
    throughputs: Vec<Variable>,
    net: BTreeMap<String, NetProduction>,
    constraints: Vec<Constraint>,
    objective: Expression,
}

/// Solver output, before any rounding or filtering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedSystem {
    /// Throughput per recipe, same order as the recipes the system was built from
    pub throughputs: Vec<f64>,
    /// Net production of every item touched by a selected recipe
    pub net: BTreeMap<String, f64>,
}

impl ConstraintSystem {
    pub fn build(inputs: &PlanInputs<'_>) -> Result<Self, PlanError> {
        let mut vars = ProblemVariables::new();
        let throughputs: Vec<Variable> = inputs
            .recipes
            .iter()
            .map(|r| vars.add(variable().min(0).name(format!("recipe_{}", r.recipe.id))))
            .collect();

        let net = net_productions(inputs, &throughputs);

        let mut constraints = Vec::new();
        let mut objective = Expression::from(0.0);

        for (item_id, production) in &net {
            let goal = inputs.goals.get(item_id).copied();

            if production.terms == 0 {
                // Untouched items are fixed at zero
                if let Some(target) = goal {
                    if target > inputs.zero_threshold {
                        debug!(item = %item_id, target, "no selected recipe touches goal item");
                        return Err(PlanError::Infeasible);
                    }
                }
                continue;
            }

            let expr = production.expr.clone();
            let balance = match goal {
                Some(target) => match inputs.goal_policy {
                    GoalPolicy::Exact => constraint!(expr == target),
                    GoalPolicy::AtLeast => constraint!(expr >= target),
                },
                None if inputs.free_inputs.contains(item_id) => constraint!(expr <= 0.0),
                None => constraint!(expr >= 0.0),
            };
            constraints.push(balance);

            if goal.is_none() {
                let surplus = vars.add(variable().min(0).name(format!("surplus_{item_id}")));
                constraints.push(constraint!(surplus >= production.expr.clone()));
                objective += surplus;
            }
        }

        debug!(
            recipes = throughputs.len(),
            items = net.len(),
            constraints = constraints.len(),
            "built constraint system"
        );

        Ok(Self {
            vars,
            throughputs,
            net,
            constraints,
            objective,
        })
    }

    pub fn net_productions(&self) -> &BTreeMap<String, NetProduction> {
        &self.net
    }

    pub fn solve(self) -> Result<SolvedSystem, PlanError> {
        let Self {
            vars,
            throughputs,
            net,
            constraints,
            objective,
        } = self;

        if throughputs.is_empty() {
            return Ok(SolvedSystem::default());
        }

        let solution = vars
            .minimise(objective)
            .using(microlp)
            .with_all(constraints)
            .solve()
            .map_err(|err| match err {
                ResolutionError::Infeasible => PlanError::Infeasible,
                other => PlanError::Solver(other.to_string()),
            })?;

        let throughputs = throughputs.iter().map(|&x| solution.value(x)).collect();
        let net = net
            .into_iter()
            .filter(|(_, production)| production.terms > 0)
            .map(|(item_id, production)| {
                let value = production.expr.eval_with(&solution);
                (item_id, value)
            })
            .collect();

        Ok(SolvedSystem { throughputs, net })
    }
}

/// One expression per catalog item and per goal item
///
/// Recipe lines naming items outside that set are ignored.
fn net_productions(
    inputs: &PlanInputs<'_>,
    throughputs: &[Variable],
) -> BTreeMap<String, NetProduction> {
    let mut net: BTreeMap<String, NetProduction> = inputs
        .items
        .iter()
        .map(|item| (item.id.clone(), NetProduction::default()))
        .collect();
    for item_id in inputs.goals.keys() {
        net.entry(item_id.clone()).or_default();
    }

    for (item_id, production) in net.iter_mut() {
        for (resolved, &x) in inputs.recipes.iter().zip(throughputs) {
            for line in [
                resolved.recipe.find_product(item_id),
                resolved.recipe.find_ingredient(item_id),
            ]
            .into_iter()
            .flatten()
            {
                match line.role {
                    Role::Product => production.expr += x * line.minute,
                    Role::Ingredient => production.expr -= x * line.minute,
                }
                production.terms += 1;
            }
        }
    }

    net
}
