//! Catalog seeding from YAML data files
//!
//! A seed directory holds `items*.yaml`, `buildings*.yaml` and
//! `recipes*.yaml` files (searched recursively). Files are loaded in that
//! order so recipes can refer to buildings and items already stored.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{Building, Item, Recipe, RecipeItem, Role};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

// "1,500", "-30" or a range such as "250 - 750" / "-250 ~ -750"
static POWER_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?[\d,]+(?:\.\d+)?)\s*(?:(?:-|~|to)\s*(-?[\d,]+(?:\.\d+)?))?\s*$")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SeedKind {
    Items,
    Buildings,
    Recipes,
}

impl SeedKind {
    fn from_path(path: &Path) -> Option<Self> {
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.starts_with("items") {
            Some(SeedKind::Items)
        } else if stem.starts_with("buildings") {
            Some(SeedKind::Buildings)
        } else if stem.starts_with("recipes") {
            Some(SeedKind::Recipes)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemSeed {
    id: String,
    name: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    category: String,
}

fn default_kind() -> String {
    "material".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PowerSeed {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct BuildingSeed {
    id: String,
    name: String,
    category: Option<String>,
    power: Option<PowerSeed>,
    max_inputs: Option<u32>,
    max_outputs: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RecipeItemSeed {
    id: String,
    amount: f64,
    minute: f64,
}

#[derive(Debug, Deserialize)]
struct RecipeSeed {
    id: String,
    name: String,
    #[serde(default)]
    alternate: bool,
    buildings: Vec<String>,
    #[serde(default)]
    production_times: Vec<f64>,
    power: Option<PowerSeed>,
    #[serde(default)]
    ingredients: Vec<RecipeItemSeed>,
    #[serde(default)]
    products: Vec<RecipeItemSeed>,
}

/// Normalise a display name into a catalog id ("Iron Plate" -> "Iron_Plate")
pub fn to_id(name: &str) -> String {
    WHITESPACE.replace_all(name.trim(), "_").into_owned()
}

/// Parse a power figure; ranges resolve to the midpoint
pub fn parse_power(value: &str) -> Option<f64> {
    let caps = POWER_RANGE.captures(value)?;
    let number = |raw: &str| raw.replace(',', "").parse::<f64>().ok();
    let low = number(&caps[1])?;
    match caps.get(2) {
        Some(high) => Some((low + number(high.as_str())?) / 2.0),
        None => Some(low),
    }
}

fn resolve_power(power: Option<PowerSeed>, owner: &str) -> Result<Option<f64>> {
    match power {
        None => Ok(None),
        Some(PowerSeed::Number(value)) => Ok(Some(value)),
        Some(PowerSeed::Text(text)) => match parse_power(&text) {
            Some(value) => Ok(Some(value)),
            None => bail!("unreadable power value {text:?} for {owner}"),
        },
    }
}

/// Find all seed files below `seed_dir`, in loading order
pub fn find_seed_files(seed_dir: &Path) -> Result<Vec<PathBuf>> {
    if !seed_dir.is_dir() {
        bail!("seed directory {} does not exist", seed_dir.display());
    }

    let mut files: Vec<(SeedKind, PathBuf)> = WalkDir::new(seed_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| SeedKind::from_path(e.path()).map(|kind| (kind, e.into_path())))
        .collect();
    files.sort();

    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = serde_yaml::from_str::<Option<Vec<T>>>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(entries.unwrap_or_default())
}

fn recipe_lines(recipe_id: &str, role: Role, seeds: Vec<RecipeItemSeed>) -> Vec<RecipeItem> {
    seeds
        .into_iter()
        .map(|seed| RecipeItem {
            recipe_id: recipe_id.to_string(),
            item_id: to_id(&seed.id),
            role,
            amount: seed.amount,
            minute: seed.minute,
        })
        .collect()
}

fn load_items(conn: &Connection, path: &Path, stats: &mut SeedStats) -> Result<()> {
    for seed in read_yaml::<ItemSeed>(path)? {
        let item = Item {
            id: to_id(&seed.id),
            name: seed.name,
            kind: seed.kind,
            category: seed.category,
        };
        db::upsert_item(conn, &item, stats.items)?;
        stats.items += 1;
    }
    Ok(())
}

fn load_buildings(conn: &Connection, path: &Path, stats: &mut SeedStats) -> Result<()> {
    for seed in read_yaml::<BuildingSeed>(path)? {
        let id = to_id(&seed.id);
        let building = Building {
            power: resolve_power(seed.power, &id)?,
            id,
            name: seed.name,
            category: seed.category,
            max_inputs: seed.max_inputs,
            max_outputs: seed.max_outputs,
        };
        db::upsert_building(conn, &building, stats.buildings)?;
        stats.buildings += 1;
    }
    Ok(())
}

fn load_recipes(conn: &Connection, path: &Path, stats: &mut SeedStats) -> Result<()> {
    for seed in read_yaml::<RecipeSeed>(path)? {
        let id = to_id(&seed.id);

        // Recipes made in several buildings are hosted by the first one
        let Some(building) = seed.buildings.first() else {
            warn!(recipe = %id, "recipe has no building, skipping");
            stats.skipped += 1;
            continue;
        };
        let building_id = to_id(building);
        let Some(&production_time) = seed.production_times.first() else {
            bail!("recipe {id} has no production time");
        };
        if db::get_building(conn, &building_id)?.is_none() {
            warn!(recipe = %id, building = %building_id, "recipe building is not in the catalog");
        }

        let ingredients = recipe_lines(&id, Role::Ingredient, seed.ingredients);
        let products = recipe_lines(&id, Role::Product, seed.products);
        stats.recipe_items += ingredients.len() + products.len();

        let recipe = Recipe {
            power: resolve_power(seed.power, &id)?,
            name: seed.name,
            alternate: seed.alternate,
            building_id,
            production_time,
            ingredients,
            products,
            id,
        };
        db::upsert_recipe(conn, &recipe, stats.recipes)?;
        stats.recipes += 1;
    }
    Ok(())
}

/// Load every seed file below `seed_dir` into the catalog
///
/// All files are loaded in one transaction. Each file gets its own
/// savepoint, so a file that fails leaves no rows behind and is reported
/// without aborting the others.
pub fn seed_database(conn: &Connection, seed_dir: &Path) -> Result<SeedStats> {
    let mut stats = SeedStats::default();

    info!(dir = %seed_dir.display(), "scanning for seed files");
    let files = find_seed_files(seed_dir)?;
    println!("Found {} seed files in {}", files.len(), seed_dir.display());

    let mut tx = conn.unchecked_transaction()?;
    for path in &files {
        let Some(kind) = SeedKind::from_path(path) else {
            continue;
        };
        let before = stats.clone();
        let sp = tx.savepoint()?;
        let loaded = match kind {
            SeedKind::Items => load_items(&sp, path, &mut stats),
            SeedKind::Buildings => load_buildings(&sp, path, &mut stats),
            SeedKind::Recipes => load_recipes(&sp, path, &mut stats),
        };

        match loaded.and_then(|()| Ok(sp.commit()?)) {
            Ok(()) => {
                stats.files += 1;
                debug!(file = %path.display(), "loaded seed file");
            }
            Err(e) => {
                // savepoint rolled back on drop
                eprintln!("  Error loading {}: {:#}", path.display(), e);
                stats = SeedStats {
                    errors: before.errors + 1,
                    ..before
                };
            }
        }
    }
    tx.commit()?;

    Ok(stats)
}

#[derive(Debug, Clone, Default)]
pub struct SeedStats {
    pub files: usize,
    pub items: usize,
    pub buildings: usize,
    pub recipes: usize,
    pub recipe_items: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl fmt::Display for SeedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Seeded {} items, {} buildings, {} recipes ({} recipe lines) from {} files. \
             Skipped: {}, Errors: {}",
            self.items,
            self.buildings,
            self.recipes,
            self.recipe_items,
            self.files,
            self.skipped,
            self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn ids_replace_whitespace() {
        assert_eq!(to_id("  Reinforced Iron  Plate "), "Reinforced_Iron_Plate");
        assert_eq!(to_id("Screw"), "Screw");
    }

    #[test]
    fn power_values_and_ranges() {
        assert_eq!(parse_power("-4"), Some(-4.0));
        assert_eq!(parse_power("1,500"), Some(1500.0));
        assert_eq!(parse_power("250 - 750"), Some(500.0));
        assert_eq!(parse_power("-250 ~ -750"), Some(-500.0));
        assert_eq!(parse_power("lots"), None);
    }

    #[test]
    fn seeds_directory_in_dependency_order() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("extra");
        fs::create_dir(&nested).unwrap();

        // Recipes sort before items alphabetically, but must load last
        fs::write(
            dir.path().join("recipes.yaml"),
            r#"
- id: Iron Plate
  name: Iron Plate
  alternate: false
  buildings: [Constructor, Craft Bench]
  production_times: [6, 4]
  ingredients:
    - { id: Iron Ingot, amount: 3, minute: 30 }
  products:
    - { id: Iron Plate, amount: 2, minute: 20 }
- id: Orphan
  name: Orphan
  buildings: []
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("items.yaml"),
            r#"
- { id: Iron Ingot, name: Iron Ingot, type: material, category: Ingot }
- { id: Iron Plate, name: Iron Plate, type: material, category: Standard Part }
"#,
        )
        .unwrap();
        fs::write(
            nested.join("buildings_production.yaml"),
            r#"
- id: Constructor
  name: Constructor
  category: Production
  power: -4
  max_inputs: 1
  max_outputs: 1
- { id: Particle Accelerator, name: Particle Accelerator, power: "-250 - -750" }
"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a seed file").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = seed_database(&conn, dir.path()).unwrap();

        assert_eq!(stats.files, 3);
        assert_eq!(stats.items, 2);
        assert_eq!(stats.buildings, 2);
        assert_eq!(stats.recipes, 1);
        assert_eq!(stats.recipe_items, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 0);

        let plate = db::find_recipe(&conn, "Iron_Plate").unwrap().unwrap();
        assert_eq!(plate.building.id, "Constructor");
        assert_eq!(plate.recipe.production_time, 6.0);
        assert_eq!(plate.recipe.ingredients[0].item_id, "Iron_Ingot");

        let accelerator = db::get_building(&conn, "Particle_Accelerator").unwrap().unwrap();
        assert_eq!(accelerator.power, Some(-500.0));
    }

    #[test]
    fn broken_file_is_counted_not_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("items.yaml"), "- { id: Coal, name: Coal }\n").unwrap();
        fs::write(dir.path().join("items_broken.yaml"), "- id: [unclosed\n").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = seed_database(&conn, dir.path()).unwrap();

        assert_eq!(stats.items, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(db::list_items(&conn).unwrap()[0].kind, "material");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(seed_database(&conn, Path::new("/no/such/seed/dir")).is_err());
    }

    #[test]
    fn recipe_line_without_rate_fails_the_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("buildings.yaml"),
            "- { id: Smelter, name: Smelter, power: -4 }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("recipes.yaml"),
            r#"
- id: Ingot
  name: Ingot
  buildings: [Smelter]
  production_times: [2]
  ingredients:
    - { id: Ore, amount: 1 }
  products:
    - { id: Ingot, amount: 1, minute: 30 }
"#,
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = seed_database(&conn, dir.path()).unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.recipes, 0);
        assert_eq!(stats.recipe_items, 0);
        assert!(db::find_recipe(&conn, "Ingot").unwrap().is_none());
    }

    #[test]
    fn recipe_without_production_time_fails_the_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("buildings.yaml"),
            "- { id: Smelter, name: Smelter, power: -4 }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("recipes.yaml"),
            r#"
- id: Ingot
  name: Ingot
  buildings: [Smelter]
  products:
    - { id: Ingot, amount: 1, minute: 30 }
"#,
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = seed_database(&conn, dir.path()).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.errors, 1);
        assert!(db::find_recipe(&conn, "Ingot").unwrap().is_none());
    }

    #[test]
    fn failed_file_leaves_no_rows_behind() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("items.yaml"), "- { id: Coal, name: Coal }\n").unwrap();
        fs::write(
            dir.path().join("buildings.yaml"),
            r#"
- { id: Smelter, name: Smelter, power: -4 }
- { id: Weird, name: Weird, power: "lots" }
"#,
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = seed_database(&conn, dir.path()).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.items, 1);
        assert_eq!(stats.buildings, 0);
        assert!(db::list_buildings(&conn).unwrap().is_empty());
        assert_eq!(db::list_items(&conn).unwrap().len(), 1);
    }
}
