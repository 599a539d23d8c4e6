//! Data models for catalog items, buildings and recipes

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: String, // material, equipment, ...
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub power: Option<f64>, // Negative = consumes, Positive = generates, None = set per recipe
    pub max_inputs: Option<u32>,
    pub max_outputs: Option<u32>,
}

/// Which side of a recipe a line sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ingredient,
    Product,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Ingredient => "ingredient",
            Role::Product => "product",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeItem {
    pub recipe_id: String,
    pub item_id: String,
    pub role: Role,
    pub amount: f64,
    pub minute: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub alternate: bool,
    pub power: Option<f64>, // Overrides the building rating when set
    pub building_id: String,
    pub production_time: f64,
    pub ingredients: Vec<RecipeItem>,
    pub products: Vec<RecipeItem>,
}

impl Recipe {
    pub fn find_ingredient(&self, item_id: &str) -> Option<&RecipeItem> {
        self.ingredients.iter().find(|line| line.item_id == item_id)
    }

    pub fn find_product(&self, item_id: &str) -> Option<&RecipeItem> {
        self.products.iter().find(|line| line.item_id == item_id)
    }

    /// True when `item_id` is produced, but not as the primary (first) product
    pub fn is_byproduct(&self, item_id: &str) -> bool {
        self.products
            .first()
            .is_some_and(|primary| primary.item_id != item_id)
    }
}

/// A recipe joined with the building that hosts it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecipe {
    pub recipe: Recipe,
    pub building: Building,
}

impl ResolvedRecipe {
    /// Fixed recipe power if present, otherwise the building's rating
    pub fn effective_power(&self) -> Option<f64> {
        self.recipe.power.or(self.building.power)
    }
}
