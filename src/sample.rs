//! Built-in sample catalog for trying the planner without seed files

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::{Building, Item, Recipe, RecipeItem, Role};

const ITEMS: &[(&str, &str, &str)] = &[
    ("Iron_Ore", "Iron Ore", "Ore"),
    ("Coal", "Coal", "Ore"),
    ("Water", "Water", "Fluid"),
    ("Iron_Ingot", "Iron Ingot", "Ingot"),
    ("Iron_Plate", "Iron Plate", "Standard Part"),
    ("Iron_Rod", "Iron Rod", "Standard Part"),
    ("Screw", "Screw", "Standard Part"),
    ("Reinforced_Iron_Plate", "Reinforced Iron Plate", "Standard Part"),
];

// (id, name, category, power MW)
const BUILDINGS: &[(&str, &str, &str, f64)] = &[
    ("Smelter", "Smelter", "Production", -4.0),
    ("Constructor", "Constructor", "Production", -4.0),
    ("Assembler", "Assembler", "Production", -15.0),
    ("Refinery", "Refinery", "Production", -30.0),
    ("Water_Extractor", "Water Extractor", "Extraction", -20.0),
    ("Coal_Generator", "Coal Generator", "Power", 75.0),
];

struct SampleRecipe {
    id: &'static str,
    name: &'static str,
    building: &'static str,
    alternate: bool,
    time: f64,
    // (item, amount per cycle, per minute)
    ingredients: &'static [(&'static str, f64, f64)],
    products: &'static [(&'static str, f64, f64)],
}

const RECIPES: &[SampleRecipe] = &[
    SampleRecipe {
        id: "Iron_Ingot",
        name: "Iron Ingot",
        building: "Smelter",
        alternate: false,
        time: 2.0,
        ingredients: &[("Iron_Ore", 1.0, 30.0)],
        products: &[("Iron_Ingot", 1.0, 30.0)],
    },
    SampleRecipe {
        id: "Alt_Pure_Iron_Ingot",
        name: "Pure Iron Ingot",
        building: "Refinery",
        alternate: true,
        time: 12.0,
        ingredients: &[("Iron_Ore", 7.0, 35.0), ("Water", 4.0, 20.0)],
        products: &[("Iron_Ingot", 13.0, 65.0)],
    },
    SampleRecipe {
        id: "Iron_Plate",
        name: "Iron Plate",
        building: "Constructor",
        alternate: false,
        time: 6.0,
        ingredients: &[("Iron_Ingot", 3.0, 30.0)],
        products: &[("Iron_Plate", 2.0, 20.0)],
    },
    SampleRecipe {
        id: "Iron_Rod",
        name: "Iron Rod",
        building: "Constructor",
        alternate: false,
        time: 4.0,
        ingredients: &[("Iron_Ingot", 1.0, 15.0)],
        products: &[("Iron_Rod", 1.0, 15.0)],
    },
    SampleRecipe {
        id: "Screw",
        name: "Screw",
        building: "Constructor",
        alternate: false,
        time: 6.0,
        ingredients: &[("Iron_Rod", 1.0, 10.0)],
        products: &[("Screw", 4.0, 40.0)],
    },
    SampleRecipe {
        id: "Reinforced_Iron_Plate",
        name: "Reinforced Iron Plate",
        building: "Assembler",
        alternate: false,
        time: 12.0,
        ingredients: &[("Iron_Plate", 6.0, 30.0), ("Screw", 12.0, 60.0)],
        products: &[("Reinforced_Iron_Plate", 1.0, 5.0)],
    },
    SampleRecipe {
        id: "Water",
        name: "Water",
        building: "Water_Extractor",
        alternate: false,
        time: 1.0,
        ingredients: &[],
        products: &[("Water", 2.0, 120.0)],
    },
    SampleRecipe {
        id: "Power_Coal",
        name: "Coal Power",
        building: "Coal_Generator",
        alternate: false,
        time: 4.0,
        ingredients: &[("Coal", 1.0, 15.0), ("Water", 3.0, 45.0)],
        products: &[],
    },
];

fn lines(recipe_id: &str, role: Role, raw: &[(&str, f64, f64)]) -> Vec<RecipeItem> {
    raw.iter()
        .map(|&(item_id, amount, minute)| RecipeItem {
            recipe_id: recipe_id.to_string(),
            item_id: item_id.to_string(),
            role,
            amount,
            minute,
        })
        .collect()
}

/// Replace the catalog with a small iron production chain
pub fn load_sample_data(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    db::clear_catalog(&tx)?;

    for (i, &(id, name, category)) in ITEMS.iter().enumerate() {
        let item = Item {
            id: id.to_string(),
            name: name.to_string(),
            kind: "material".to_string(),
            category: category.to_string(),
        };
        db::upsert_item(&tx, &item, i)?;
    }

    for (i, &(id, name, category, power)) in BUILDINGS.iter().enumerate() {
        let building = Building {
            id: id.to_string(),
            name: name.to_string(),
            category: Some(category.to_string()),
            power: Some(power),
            max_inputs: None,
            max_outputs: None,
        };
        db::upsert_building(&tx, &building, i)?;
    }

    for (i, sample) in RECIPES.iter().enumerate() {
        let recipe = Recipe {
            id: sample.id.to_string(),
            name: sample.name.to_string(),
            alternate: sample.alternate,
            power: None,
            building_id: sample.building.to_string(),
            production_time: sample.time,
            ingredients: lines(sample.id, Role::Ingredient, sample.ingredients),
            products: lines(sample.id, Role::Product, sample.products),
        };
        db::upsert_recipe(&tx, &recipe, i)?;
    }

    tx.commit()?;
    tracing::info!(
        items = ITEMS.len(),
        buildings = BUILDINGS.len(),
        recipes = RECIPES.len(),
        "loaded sample catalog"
    );
    Ok(())
}
