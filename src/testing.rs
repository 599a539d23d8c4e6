//! In-memory catalog fixtures for unit tests

use rusqlite::Connection;

use crate::db;
use crate::models::{Building, Item, Recipe, RecipeItem, Role};

pub struct CatalogBuilder {
    conn: Connection,
    items: usize,
    buildings: usize,
    recipes: usize,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        Self {
            conn,
            items: 0,
            buildings: 0,
            recipes: 0,
        }
    }

    pub fn items(mut self, ids: &[&str]) -> Self {
        for id in ids {
            let item = Item {
                id: id.to_string(),
                name: id.replace('_', " "),
                kind: "material".to_string(),
                category: "Test".to_string(),
            };
            db::upsert_item(&self.conn, &item, self.items).unwrap();
            self.items += 1;
        }
        self
    }

    pub fn building(mut self, id: &str, power: Option<f64>) -> Self {
        let building = Building {
            id: id.to_string(),
            name: id.replace('_', " "),
            category: None,
            power,
            max_inputs: None,
            max_outputs: None,
        };
        db::upsert_building(&self.conn, &building, self.buildings).unwrap();
        self.buildings += 1;
        self
    }

    /// Add a recipe; line rates are per minute
    pub fn recipe(
        self,
        id: &str,
        building: &str,
        ingredients: &[(&str, f64)],
        products: &[(&str, f64)],
    ) -> Self {
        self.recipe_with_power(id, building, None, ingredients, products)
    }

    pub fn recipe_with_power(
        mut self,
        id: &str,
        building: &str,
        power: Option<f64>,
        ingredients: &[(&str, f64)],
        products: &[(&str, f64)],
    ) -> Self {
        let lines = |role: Role, raw: &[(&str, f64)]| -> Vec<RecipeItem> {
            raw.iter()
                .map(|&(item_id, minute)| RecipeItem {
                    recipe_id: id.to_string(),
                    item_id: item_id.to_string(),
                    role,
                    amount: minute / 30.0,
                    minute,
                })
                .collect()
        };
        let recipe = Recipe {
            id: id.to_string(),
            name: id.replace('_', " "),
            alternate: false,
            power,
            building_id: building.to_string(),
            production_time: 2.0,
            ingredients: lines(Role::Ingredient, ingredients),
            products: lines(Role::Product, products),
        };
        db::upsert_recipe(&self.conn, &recipe, self.recipes).unwrap();
        self.recipes += 1;
        self
    }

    pub fn build(self) -> Connection {
        self.conn
    }
}

pub fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
