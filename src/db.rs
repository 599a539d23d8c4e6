//! Database schema and operations

use std::collections::HashSet;

use anyhow::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{Building, Item, Recipe, RecipeItem, ResolvedRecipe, Role};

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "ingredient" => Ok(Role::Ingredient),
            "product" => Ok(Role::Product),
            other => Err(FromSqlError::Other(
                format!("unknown recipe item role '{other}'").into(),
            )),
        }
    }
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            idx INTEGER NOT NULL,
            kind TEXT NOT NULL,
            category TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS buildings (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            idx INTEGER NOT NULL,
            category TEXT,
            power REAL,
            max_inputs INTEGER,
            max_outputs INTEGER
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            idx INTEGER NOT NULL,
            alternate INTEGER NOT NULL DEFAULT 0,
            power REAL,
            building_id TEXT NOT NULL,
            production_time REAL NOT NULL
        );

        -- Ingredient and product lines, rates already converted to per-minute
        CREATE TABLE IF NOT EXISTS recipe_items (
            recipe_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            role TEXT NOT NULL,
            idx INTEGER NOT NULL,
            amount REAL NOT NULL,
            minute REAL NOT NULL,
            PRIMARY KEY (recipe_id, item_id, role)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_items_item ON recipe_items(item_id, role);
        "#,
    )?;
    Ok(())
}

/// Clear all catalog data (for re-seeding)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_items;
        DELETE FROM recipes;
        DELETE FROM buildings;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item, index: usize) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, idx, kind, category)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (&item.id, &item.name, index as i64, &item.kind, &item.category),
    )?;
    Ok(())
}

/// Insert or replace a building
pub fn upsert_building(conn: &Connection, building: &Building, index: usize) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO buildings (id, name, idx, category, power, max_inputs, max_outputs)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &building.id,
            &building.name,
            index as i64,
            &building.category,
            building.power,
            building.max_inputs,
            building.max_outputs,
        ),
    )?;
    Ok(())
}

/// Insert or replace a recipe together with all of its lines
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe, index: usize) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes
             (id, name, idx, alternate, power, building_id, production_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &recipe.id,
            &recipe.name,
            index as i64,
            recipe.alternate,
            recipe.power,
            &recipe.building_id,
            recipe.production_time,
        ),
    )?;

    conn.execute("DELETE FROM recipe_items WHERE recipe_id = ?1", [&recipe.id])?;
    for lines in [&recipe.ingredients, &recipe.products] {
        for (i, line) in lines.iter().enumerate() {
            insert_recipe_item(conn, &recipe.id, line, i)?;
        }
    }
    Ok(())
}

fn insert_recipe_item(
    conn: &Connection,
    recipe_id: &str,
    line: &RecipeItem,
    index: usize,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipe_items (recipe_id, item_id, role, idx, amount, minute)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            recipe_id,
            &line.item_id,
            line.role,
            index as i64,
            line.amount,
            line.minute,
        ),
    )?;
    Ok(())
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        category: row.get(3)?,
    })
}

fn building_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Building> {
    Ok(Building {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        category: row.get(offset + 2)?,
        power: row.get(offset + 3)?,
        max_inputs: row.get(offset + 4)?,
        max_outputs: row.get(offset + 5)?,
    })
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        name: row.get(1)?,
        alternate: row.get(2)?,
        power: row.get(3)?,
        building_id: row.get(4)?,
        production_time: row.get(5)?,
        ingredients: Vec::new(),
        products: Vec::new(),
    })
}

/// List all items in catalog order
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, name, kind, category FROM items ORDER BY idx")?;
    let rows = stmt.query_map([], item_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all buildings in catalog order
pub fn list_buildings(conn: &Connection) -> Result<Vec<Building>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, power, max_inputs, max_outputs FROM buildings ORDER BY idx",
    )?;
    let rows = stmt.query_map([], |row| building_from_row(row, 0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn get_building(conn: &Connection, building_id: &str) -> Result<Option<Building>> {
    let building = conn
        .query_row(
            "SELECT id, name, category, power, max_inputs, max_outputs
             FROM buildings WHERE id = ?1",
            [building_id],
            |row| building_from_row(row, 0),
        )
        .optional()?;
    Ok(building)
}

/// Load the ingredient and product lines of a recipe, each in recipe order
fn load_recipe_items(conn: &Connection, recipe: &mut Recipe) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT item_id, role, amount, minute
         FROM recipe_items
         WHERE recipe_id = ?1
         ORDER BY role, idx",
    )?;

    let rows = stmt.query_map([&recipe.id], |row| {
        Ok(RecipeItem {
            recipe_id: recipe.id.clone(),
            item_id: row.get(0)?,
            role: row.get(1)?,
            amount: row.get(2)?,
            minute: row.get(3)?,
        })
    })?;

    let mut ingredients = Vec::new();
    let mut products = Vec::new();
    for row in rows {
        let line = row?;
        match line.role {
            Role::Ingredient => ingredients.push(line),
            Role::Product => products.push(line),
        }
    }
    recipe.ingredients = ingredients;
    recipe.products = products;
    Ok(())
}

/// Find a recipe and its hosting building
///
/// Recipes whose building is missing from the catalog are treated as unknown.
pub fn find_recipe(conn: &Connection, recipe_id: &str) -> Result<Option<ResolvedRecipe>> {
    let found = conn
        .query_row(
            "SELECT r.id, r.name, r.alternate, r.power, r.building_id, r.production_time,
                    b.id, b.name, b.category, b.power, b.max_inputs, b.max_outputs
             FROM recipes r
             JOIN buildings b ON b.id = r.building_id
             WHERE r.id = ?1",
            [recipe_id],
            |row| Ok((recipe_from_row(row)?, building_from_row(row, 6)?)),
        )
        .optional()?;

    let Some((mut recipe, building)) = found else {
        return Ok(None);
    };
    load_recipe_items(conn, &mut recipe)?;
    Ok(Some(ResolvedRecipe { recipe, building }))
}

/// Find recipes by id, keeping caller order and skipping unknown or repeated ids
pub fn find_recipes_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<ResolvedRecipe>> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if let Some(resolved) = find_recipe(conn, id)? {
            results.push(resolved);
        }
    }
    Ok(results)
}

fn recipes_by_line(conn: &Connection, item_id: &str, role: Role) -> Result<Vec<ResolvedRecipe>> {
    let mut stmt = conn.prepare(
        "SELECT r.id
         FROM recipes r
         JOIN recipe_items ri ON ri.recipe_id = r.id
         WHERE ri.item_id = ?1 AND ri.role = ?2
         ORDER BY r.alternate, r.idx",
    )?;
    let ids = stmt
        .query_map((item_id, role), |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    find_recipes_by_ids(conn, &ids)
}

/// Recipes producing an item: standard before alternate, by-products last
pub fn recipes_producing(conn: &Connection, item_id: &str) -> Result<Vec<ResolvedRecipe>> {
    let mut recipes = recipes_by_line(conn, item_id, Role::Product)?;
    // Stable sort keeps the alternate/index order within each group
    recipes.sort_by_key(|r| r.recipe.is_byproduct(item_id));
    Ok(recipes)
}

/// Recipes consuming an item
pub fn recipes_using(conn: &Connection, item_id: &str) -> Result<Vec<ResolvedRecipe>> {
    recipes_by_line(conn, item_id, Role::Ingredient)
}

/// Recipes hosted by a building, standard before alternate
pub fn recipes_for_building(
    conn: &Connection,
    building_id: &str,
) -> Result<Vec<ResolvedRecipe>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM recipes
         WHERE building_id = ?1
         ORDER BY alternate, idx",
    )?;
    let ids = stmt
        .query_map([building_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    find_recipes_by_ids(conn, &ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn sample_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        sample::load_sample_data(&conn).unwrap();
        conn
    }

    #[test]
    fn resolves_recipe_with_building_and_ordered_lines() {
        let conn = sample_db();
        let resolved = find_recipe(&conn, "Reinforced_Iron_Plate").unwrap().unwrap();

        assert_eq!(resolved.building.id, "Assembler");
        assert_eq!(resolved.effective_power(), Some(-15.0));
        let ingredients: Vec<_> = resolved
            .recipe
            .ingredients
            .iter()
            .map(|l| l.item_id.as_str())
            .collect();
        assert_eq!(ingredients, ["Iron_Plate", "Screw"]);
        assert_eq!(resolved.recipe.products.len(), 1);
        assert_eq!(resolved.recipe.products[0].role, Role::Product);
    }

    #[test]
    fn unknown_and_repeated_ids_are_skipped() {
        let conn = sample_db();
        let ids = vec![
            "Screw".to_string(),
            "No_Such_Recipe".to_string(),
            "Iron_Rod".to_string(),
            "Screw".to_string(),
        ];
        let found: Vec<_> = find_recipes_by_ids(&conn, &ids)
            .unwrap()
            .into_iter()
            .map(|r| r.recipe.id)
            .collect();
        assert_eq!(found, ["Screw", "Iron_Rod"]);
    }

    #[test]
    fn producing_lists_standard_recipes_first() {
        let conn = sample_db();
        let ids: Vec<_> = recipes_producing(&conn, "Iron_Ingot")
            .unwrap()
            .into_iter()
            .map(|r| r.recipe.id)
            .collect();
        assert_eq!(ids, ["Iron_Ingot", "Alt_Pure_Iron_Ingot"]);

        let using: Vec<_> = recipes_using(&conn, "Water")
            .unwrap()
            .into_iter()
            .map(|r| r.recipe.id)
            .collect();
        assert!(using.contains(&"Alt_Pure_Iron_Ingot".to_string()));
        assert!(using.contains(&"Power_Coal".to_string()));
    }

    #[test]
    fn lists_recipes_hosted_by_a_building() {
        let conn = sample_db();
        let ids: Vec<_> = recipes_for_building(&conn, "Smelter")
            .unwrap()
            .into_iter()
            .map(|r| r.recipe.id)
            .collect();
        assert_eq!(ids, ["Iron_Ingot"]);

        let constructor = recipes_for_building(&conn, "Constructor").unwrap();
        assert_eq!(constructor.len(), 3);
        assert!(constructor.iter().all(|r| r.building.id == "Constructor"));
        assert!(recipes_for_building(&conn, "Nowhere").unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_recipe_lines() {
        let conn = sample_db();
        let mut resolved = find_recipe(&conn, "Iron_Rod").unwrap().unwrap();
        resolved.recipe.products[0].minute = 20.0;
        upsert_recipe(&conn, &resolved.recipe, 99).unwrap();

        let reloaded = find_recipe(&conn, "Iron_Rod").unwrap().unwrap();
        assert_eq!(reloaded.recipe.products.len(), 1);
        assert_eq!(reloaded.recipe.products[0].minute, 20.0);
    }

    #[test]
    fn clear_removes_everything() {
        let conn = sample_db();
        clear_catalog(&conn).unwrap();
        assert!(list_items(&conn).unwrap().is_empty());
        assert!(list_buildings(&conn).unwrap().is_empty());
        assert!(get_building(&conn, "Smelter").unwrap().is_none());
    }
}
