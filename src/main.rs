//! Synthesis Planner
//!
//! Recipe generation and element-combination screening for inorganic
//! materials, backed by a text-mined literature recipe dataset.

mod combinations;
mod config;
mod db;
mod extract;
mod formula;
mod materials;
mod methods;
mod models;
mod precursors;
mod recipe;
mod screening;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{Level, warn};

use crate::models::{Language, MethodId, RecipeRequest, ResearchRequest, SynthesisRecipe};
use crate::store::{ElementMatch, RecipeStore, SynthesisTypeFilter};

#[derive(Parser)]
#[command(name = "synthesis-planner")]
#[command(about = "Synthesis recipe planner and element-combination screener")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "synthesis.db", global = true)]
    database: PathBuf,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Materials Project API key
    #[arg(long, env = "MP_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import text-mined recipe datasets (*.json) from a directory
    Import {
        /// Directory containing dataset files
        dir: PathBuf,

        /// Clear existing recipes before import
        #[arg(long)]
        clear: bool,
    },

    /// Load the bundled sample recipes (without the full dataset)
    LoadSample,

    /// Show dataset statistics
    Stats,

    /// Parse a chemical formula
    Parse {
        formula: String,
    },

    /// List precursors for an element
    Precursors {
        /// Element symbol (e.g., "Co")
        element: String,

        /// Restrict to one synthesis method
        #[arg(short, long, value_enum)]
        method: Option<MethodId>,
    },

    /// List synthesis methods
    Methods {
        #[arg(long, value_enum, default_value_t = Language::Ko)]
        lang: Language,
    },

    /// Generate a synthesis recipe from a request like "LiCoO2 solid-state"
    Recipe {
        message: String,

        #[arg(short, long, value_enum)]
        method: Option<MethodId>,

        #[arg(long, value_enum, default_value_t = Language::Ko)]
        lang: Language,

        /// Print the structured recipe as JSON
        #[arg(long, requires = "method")]
        json: bool,
    },

    /// Search literature recipes
    Search {
        #[command(subcommand)]
        by: SearchBy,
    },

    /// Enumerate k-element combinations
    Combos {
        elements: Vec<String>,

        #[arg(short, default_value = "3")]
        k: usize,
    },

    /// Screen element combinations for a research query
    Research {
        message: String,

        #[arg(long, value_enum, default_value_t = Language::Ko)]
        lang: Language,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SearchBy {
    /// Recipes whose target matches a formula
    Formula {
        formula: String,

        #[arg(short = 't', long = "type", value_enum, default_value_t = SynthesisTypeFilter::All)]
        synthesis_type: SynthesisTypeFilter,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Recipes using a precursor
    Precursor {
        precursor: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Recipes whose temperature range overlaps [min, max] °C
    Temperature {
        min: f64,
        max: f64,

        /// Required target elements, comma separated
        #[arg(short, long, value_delimiter = ',')]
        elements: Vec<String>,

        /// Match elements by parsed formula instead of substring
        #[arg(long)]
        strict_elements: bool,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::WARN);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { dir, clear } => {
            if clear {
                println!("Clearing existing recipes...");
                db::clear_recipes(&conn)?;
            }

            let stats = extract::import_to_database(&conn, &dir)?;
            println!("\n{}", stats);
        }

        Commands::LoadSample => {
            let sample = RecipeStore::sample()?;
            db::clear_recipes(&conn)?;
            db::insert_recipes(&conn, sample.recipes())?;
            println!("Loaded {} sample recipes", sample.recipe_count());
        }

        Commands::Stats => {
            let total = db::recipe_count(&conn)?;
            if total == 0 {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Recipes: {}", total);
                for (synthesis_type, count) in db::count_by_type(&conn)? {
                    println!("  {:<12} {:>8}", synthesis_type, count);
                }
            }
        }

        Commands::Parse { formula } => {
            let parsed = formula::parse_formula(&formula);
            if parsed.elements.is_empty() {
                println!("No elements recognized in '{}'", formula);
            } else {
                println!("{:<8} {:>8}", "Element", "Count");
                println!("{}", "-".repeat(17));
                for el in &parsed.elements {
                    println!("{:<8} {:>8}", el.symbol, el.count);
                }
                println!("\nName: {}", formula::material_name(&parsed.unique_elements));
            }
        }

        Commands::Precursors { element, method } => {
            if !precursors::has_element(&element) {
                println!("No precursor data for '{}'", element);
            } else {
                let selected: Vec<MethodId> = match method {
                    Some(m) => vec![m],
                    None => MethodId::ALL.to_vec(),
                };
                for m in selected {
                    println!("{} ({}):", methods::method(m).name.en, m);
                    let list = precursors::get_precursors(&element, m);
                    if list.is_empty() {
                        println!("  (none)");
                    }
                    for p in list {
                        println!("  {:<16} {:<32} {:?}", p.formula, p.name, p.kind);
                    }
                }
            }
        }

        Commands::Methods { lang } => {
            for m in methods::all_methods() {
                let c = &m.conditions;
                println!("{} ({})", m.name.get(lang), m.id);
                println!("  {}", m.description.get(lang));
                println!(
                    "  {}-{}°C, {}-{}h, {}",
                    c.temperature_range.0,
                    c.temperature_range.1,
                    c.time_range.0,
                    c.time_range.1,
                    c.atmosphere.join(" / ")
                );
                for (i, step) in m.steps.iter().enumerate() {
                    println!("    {}. {}", i + 1, step.name);
                }
                println!();
            }
        }

        Commands::Recipe {
            message,
            method,
            lang,
            json,
        } => {
            let store = open_store(&conn)?;
            match method {
                Some(method) => {
                    let target = formula::extract_target_material(&message).unwrap_or(message);
                    if json {
                        let Some(generated) = recipe::generate_recipe(&target, method.as_str(), &store)
                        else {
                            bail!("Cannot generate a recipe for '{}'", target);
                        };
                        println!("{}", serde_json::to_string_pretty(&generated)?);
                    } else {
                        let response = recipe::respond_with_method(&target, method, lang, &store);
                        println!("{}", response.message);
                    }
                }
                None => {
                    let request = RecipeRequest {
                        message,
                        language: lang,
                    };
                    println!("{}", recipe::respond(&request, &store).message);
                }
            }
        }

        Commands::Search { by } => {
            let store = open_store(&conn)?;
            let results = match &by {
                SearchBy::Formula {
                    formula,
                    synthesis_type,
                    limit,
                } => store.search_by_formula(formula, *synthesis_type, *limit),
                SearchBy::Precursor { precursor, limit } => {
                    store.search_by_precursor(precursor, *limit)
                }
                SearchBy::Temperature {
                    min,
                    max,
                    elements,
                    strict_elements,
                    limit,
                } => {
                    let mode = if *strict_elements {
                        ElementMatch::Parsed
                    } else {
                        ElementMatch::Substring
                    };
                    let elements = (!elements.is_empty()).then_some(elements.as_slice());
                    store.search_by_temperature(*min, *max, elements, mode, *limit)
                }
            };
            print_recipes(&results);
        }

        Commands::Combos { elements, k } => {
            let total = combinations::combination_count(elements.len(), k);
            println!("{} combinations of {} from {} elements", total, k, elements.len());
            for combo in combinations::generate_combinations(&elements, k) {
                println!("  {}", combo.join("-"));
            }
        }

        Commands::Research {
            message,
            lang,
            json,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let store = open_store(&conn)?;
            let source = materials::from_config(&config.materials_project, cli.api_key)?;
            let screener = screening::Screener::new(
                Arc::from(source),
                Arc::new(store),
                config.screening.clone(),
                config.materials_project.timeout(),
            );

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            let request = ResearchRequest {
                message,
                language: lang,
            };
            let response = runtime.block_on(screening::handle_request(&screener, &request));

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                for step in &response.steps {
                    println!("{}\n", step.content);
                }
            }
        }
    }

    Ok(())
}

/// Load the recipe dataset, falling back to the bundled sample when the
/// database is empty
fn open_store(conn: &Connection) -> Result<RecipeStore> {
    let store = RecipeStore::load(conn)?;
    if store.recipe_count() > 0 {
        return Ok(store);
    }
    warn!("recipe database is empty, using the bundled sample");
    RecipeStore::sample()
}

fn format_range(min: Option<f64>, max: Option<f64>, unit: &str) -> String {
    match (min, max) {
        (Some(a), Some(b)) if a == b => format!("{}{}", a, unit),
        (Some(a), Some(b)) => format!("{}-{}{}", a, b, unit),
        (Some(a), None) | (None, Some(a)) => format!("{}{}", a, unit),
        (None, None) => "-".to_string(),
    }
}

fn print_recipes(recipes: &[&SynthesisRecipe]) {
    if recipes.is_empty() {
        println!("No matching recipes.");
        return;
    }

    println!(
        "{:<14} {:<20} {:<12} {:>14} {:>10}  {}",
        "ID", "Target", "Type", "Temperature", "Time", "DOI"
    );
    println!("{}", "-".repeat(96));
    for r in recipes {
        println!(
            "{:<14} {:<20} {:<12} {:>14} {:>10}  {}",
            r.id,
            r.target_formula,
            r.synthesis_type,
            format_range(r.temperature_min, r.temperature_max, "°C"),
            format_range(r.time_min, r.time_max, "h"),
            r.doi
        );
        if !r.precursors.is_empty() {
            let precursors: Vec<&str> = r.precursors.iter().map(|p| p.formula.as_str()).collect();
            println!("{:<14} ← {}", "", precursors.join(" + "));
        }
    }
    println!("\n{} recipe(s)", recipes.len());
}
