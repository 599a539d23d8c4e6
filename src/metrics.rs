//! Power, building and rate figures derived from a solved plan

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::{PlannerConfig, PowerModel};
use crate::constraints::SolvedSystem;
use crate::models::ResolvedRecipe;

/// `log2(2.5)`: a building at 200% clock draws 2.5x its base power
pub const OVERCLOCK_EXPONENT: f64 = 1.321928;

/// Power drawn by `count` building equivalents of a `base` consumer
///
/// Whole buildings run at 100%; the fractional remainder is one overclocked
/// (or underclocked) building whose draw follows the clock curve.
pub fn overclock_power(base: f64, count: f64) -> f64 {
    let whole = count.floor();
    let fraction = count - whole;
    base * whole + base * fraction.powf(OVERCLOCK_EXPONENT)
}

pub fn scaled_power(model: PowerModel, base: f64, count: f64) -> f64 {
    match model {
        PowerModel::Overclock => overclock_power(base, count),
        PowerModel::Linear => base * count,
    }
}

pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    // Normalise -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Final result of one planning call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionPlan {
    /// Net production per item (negative = drawn from outside)
    pub net: BTreeMap<String, f64>,
    /// Total power consumption (MW)
    pub consume: f64,
    /// Total power generation (MW)
    pub power: f64,
    /// Buildings to construct, per building id
    pub buildings: BTreeMap<String, u32>,
    /// Throughput per recipe id, in building equivalents
    pub recipes: BTreeMap<String, f64>,
}

impl ProductionPlan {
    pub fn net_power(&self) -> f64 {
        self.power - self.consume
    }
}

/// Turn raw solver values into a [`ProductionPlan`]
///
/// `recipes` must be the slice the solved system was built from.
pub fn derive(
    recipes: &[ResolvedRecipe],
    solved: &SolvedSystem,
    config: &PlannerConfig,
) -> ProductionPlan {
    let digits = config.round_digits;
    let threshold = config.zero_threshold;

    let mut consume = 0.0;
    let mut power = 0.0;
    let mut buildings = BTreeMap::new();
    let mut recipe_rates = BTreeMap::new();

    for (resolved, &raw) in recipes.iter().zip(&solved.throughputs) {
        let throughput = if raw.abs() < threshold { 0.0 } else { raw.max(0.0) };

        match resolved.effective_power() {
            Some(rating) if rating < 0.0 => {
                consume += scaled_power(config.power_model, -rating, throughput);
            }
            Some(rating) => power += rating * throughput,
            None => {}
        }

        // Solver noise just above a whole number must not add a building
        let count = (throughput - threshold).max(0.0).ceil() as u32;
        *buildings.entry(resolved.building.id.clone()).or_insert(0) += count;

        recipe_rates.insert(resolved.recipe.id.clone(), round_to(throughput, digits));
    }

    consume += coolant_pumping(&solved.net, config);

    let net = solved
        .net
        .iter()
        .filter(|(_, value)| value.abs() > threshold)
        .map(|(item_id, &value)| (item_id.clone(), round_to(value, digits)))
        .collect();

    ProductionPlan {
        net,
        consume: round_to(consume, digits),
        power: round_to(power, digits),
        buildings,
        recipes: recipe_rates,
    }
}

/// Pumps needed to supply the coolant drawn from outside the plan
fn coolant_pumping(net: &BTreeMap<String, f64>, config: &PlannerConfig) -> f64 {
    let draw = net
        .get(&config.coolant_item)
        .map_or(0.0, |value| (-value).max(0.0));
    if draw <= config.zero_threshold {
        return 0.0;
    }
    scaled_power(config.power_model, config.pump_power, draw / config.pump_rate)
}

impl fmt::Display for ProductionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Plan ===")?;

        writeln!(f, "Recipes:")?;
        for (id, rate) in &self.recipes {
            writeln!(f, "  {:.3}x {}", rate, id)?;
        }
        writeln!(f)?;

        writeln!(f, "Buildings required:")?;
        for (id, count) in self.buildings.iter().filter(|(_, count)| **count > 0) {
            writeln!(f, "  {}x {}", count, id)?;
        }
        writeln!(f)?;

        writeln!(f, "Net production:")?;
        for (id, value) in &self.net {
            let label = if *value < 0.0 { "input" } else { "output" };
            writeln!(f, "  {:<28} {:>10.3}/min ({})", id, value, label)?;
        }
        writeln!(f)?;

        writeln!(f, "Power:")?;
        writeln!(f, "  Consumption: {:.3} MW", self.consume)?;
        writeln!(f, "  Generation:  {:.3} MW", self.power)?;
        writeln!(f, "  Net:         {:.3} MW", self.net_power())?;

        Ok(())
    }
}
