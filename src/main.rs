//! Satisfactory Production Planner
//!
//! Catalog browser and linear-programming production planner for
//! Satisfactory recipes.

mod catalog;
mod config;
mod constraints;
mod db;
mod error;
mod goals;
mod metrics;
mod models;
mod planner;
mod sample;
mod seed;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use crate::config::{GoalPolicy, PlannerConfig, PowerModel};
use crate::models::ResolvedRecipe;
use crate::planner::ProductionPlanner;

#[derive(Parser)]
#[command(name = "satis-planner")]
#[command(about = "Production planner for the Satisfactory recipe catalog")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "satisfactory.db")]
    database: PathBuf,

    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load items, buildings and recipes from a directory of YAML files
    Seed {
        /// Directory containing items*.yaml, buildings*.yaml, recipes*.yaml
        seed_dir: PathBuf,

        /// Clear existing data before seeding
        #[arg(long)]
        clear: bool,
    },

    /// Load a small sample catalog (iron production chain)
    LoadSample,

    /// List all items in the catalog
    ListItems {
        /// Group items by category
        #[arg(short, long)]
        grouped: bool,
    },

    /// List all buildings in the catalog
    ListBuildings,

    /// Show recipes producing and using an item
    Recipes {
        /// Item ID (e.g. "Iron_Plate")
        item: String,
    },

    /// Show recipes hosted by a building
    Building {
        /// Building ID (e.g. "Constructor")
        id: String,
    },

    /// Show details for a specific recipe
    Recipe {
        /// Recipe ID
        id: String,
    },

    /// Plan throughputs for a set of recipes and production goals
    Plan {
        /// Recipes to use (comma separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        recipes: Vec<String>,

        /// Production goals as ID[:RATE] per minute, rate defaults to 100
        #[arg(short, long, value_delimiter = ',')]
        products: Vec<String>,

        /// Items that may be drawn from outside without limit
        #[arg(short, long = "input", value_delimiter = ',')]
        inputs: Vec<String>,

        /// Planner settings file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Require goals to be met or exceeded instead of met exactly
        #[arg(long)]
        at_least: bool,

        /// Scale consumer power linearly instead of using the overclock curve
        #[arg(long)]
        linear_power: bool,

        /// Item whose outside draw is charged with pump power
        #[arg(long)]
        coolant: Option<String>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "satis_planner=info" } else { "satis_planner=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Seed { seed_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = seed::seed_database(&conn, &seed_dir)?;
            println!("\n{}", stats);
        }

        Commands::LoadSample => {
            sample::load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }

        Commands::ListItems { grouped } => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'seed' or 'load-sample' first.");
            } else if grouped {
                let mut category: Option<&str> = None;
                for item in &items {
                    if category != Some(item.category.as_str()) {
                        category = Some(item.category.as_str());
                        println!("{}:", item.category);
                    }
                    println!("  {:<32} {}", item.id, item.name);
                }
            } else {
                println!("{:<32} {:<32} {}", "ID", "Name", "Category");
                println!("{}", "-".repeat(80));
                for item in items {
                    println!("{:<32} {:<32} {}", item.id, item.name, item.category);
                }
            }
        }

        Commands::ListBuildings => {
            let buildings = db::list_buildings(&conn)?;
            if buildings.is_empty() {
                println!("No buildings in database. Run 'seed' or 'load-sample' first.");
            } else {
                println!("{:<32} {:>12}", "Building", "Power (MW)");
                println!("{}", "-".repeat(45));
                for b in buildings {
                    let power = b.power.map_or_else(|| "varies".to_string(), |p| format!("{p:.1}"));
                    println!("{:<32} {:>12}", b.name, power);
                }
            }
        }

        Commands::Recipes { item } => {
            let producing = db::recipes_producing(&conn, &item)?;
            let using = db::recipes_using(&conn, &item)?;
            if producing.is_empty() && using.is_empty() {
                println!("No recipes mention '{}'", item);
            } else {
                println!("Producing {}:", item);
                for r in &producing {
                    let tag = if r.recipe.is_byproduct(&item) {
                        " (by-product)"
                    } else if r.recipe.alternate {
                        " (alternate)"
                    } else {
                        ""
                    };
                    println!("  {:<36} {}{}", r.recipe.id, r.building.name, tag);
                }
                println!("Using {}:", item);
                for r in &using {
                    println!("  {:<36} {}", r.recipe.id, r.building.name);
                }
            }
        }

        Commands::Building { id } => match db::get_building(&conn, &id)? {
            Some(building) => {
                println!("{}", building.name);
                for r in db::recipes_for_building(&conn, &id)? {
                    let tag = if r.recipe.alternate { " (alternate)" } else { "" };
                    println!("  {}{}", r.recipe.id, tag);
                }
            }
            None => println!("Building '{}' not found", id),
        },

        Commands::Recipe { id } => match db::find_recipe(&conn, &id)? {
            Some(resolved) => print_recipe(&resolved),
            None => println!("Recipe '{}' not found", id),
        },

        Commands::Plan {
            recipes,
            products,
            inputs,
            config,
            at_least,
            linear_power,
            coolant,
            timeout_secs,
            json,
        } => {
            let mut planner_config = match &config {
                Some(path) => PlannerConfig::from_file(path)?,
                None => PlannerConfig::default(),
            };
            if at_least {
                planner_config.goal_policy = GoalPolicy::AtLeast;
            }
            if linear_power {
                planner_config.power_model = PowerModel::Linear;
            }
            if let Some(coolant) = coolant {
                planner_config.coolant_item = coolant;
            }
            if timeout_secs.is_some() {
                planner_config.timeout_secs = timeout_secs;
            }
            planner_config.validate()?;

            let goals = goals::parse_goals(&products)?;
            let timeout = planner_config.timeout_secs.map(Duration::from_secs);
            let planner = ProductionPlanner::new(&conn, &recipes, &goals, &inputs, planner_config)?;
            if planner.recipes().is_empty() {
                println!("None of the requested recipes are in the catalog.");
            }

            let result = match timeout {
                Some(limit) => planner.solve_with_timeout(limit),
                None => planner.solve(),
            };

            let plan = match result {
                Ok(plan) => plan,
                Err(e) if e.is_infeasible() => {
                    bail!("No feasible production plan: {}", e);
                }
                Err(e) => return Err(e.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("{}", plan);
            }
        }
    }

    Ok(())
}

fn print_recipe(resolved: &ResolvedRecipe) {
    let recipe = &resolved.recipe;
    println!("Recipe: {}{}", recipe.name, if recipe.alternate { " (alternate)" } else { "" });
    println!("  ID: {}", recipe.id);
    println!("  Building: {}", resolved.building.name);
    println!("  Cycle: {}s", recipe.production_time);
    match resolved.effective_power() {
        Some(power) => println!("  Power: {} MW", power),
        None => println!("  Power: none"),
    }

    if !recipe.ingredients.is_empty() {
        println!("  Ingredients:");
        for line in &recipe.ingredients {
            println!("    {} x{} ({:.2}/min)", line.item_id, line.amount, line.minute);
        }
    }
    if !recipe.products.is_empty() {
        println!("  Products:");
        for line in &recipe.products {
            println!("    {} x{} ({:.2}/min)", line.item_id, line.amount, line.minute);
        }
    }
}
