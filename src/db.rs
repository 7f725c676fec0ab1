//! Database schema and operations

use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::models::{Precursor, SynthesisRecipe, SynthesisType};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Text-mined literature recipes, seq preserves dataset order
        CREATE TABLE IF NOT EXISTS synthesis_recipes (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL,
            doi TEXT NOT NULL DEFAULT '',
            target_formula TEXT NOT NULL,
            target_name TEXT NOT NULL DEFAULT '',
            temperature_min REAL,
            temperature_max REAL,
            time_min REAL,
            time_max REAL,
            atmosphere TEXT,
            synthesis_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_precursors (
            recipe_seq INTEGER NOT NULL,
            position INTEGER NOT NULL,
            formula TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (recipe_seq, position)
        );

        CREATE TABLE IF NOT EXISTS recipe_operations (
            recipe_seq INTEGER NOT NULL,
            position INTEGER NOT NULL,
            operation TEXT NOT NULL,
            PRIMARY KEY (recipe_seq, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipes_target ON synthesis_recipes(target_formula);
        CREATE INDEX IF NOT EXISTS idx_recipes_type ON synthesis_recipes(synthesis_type);
        "#,
    )?;
    Ok(())
}

/// Insert a recipe with its precursors and operations, returning its seq
pub fn insert_recipe(conn: &Connection, recipe: &SynthesisRecipe) -> Result<i64> {
    conn.execute(
        "INSERT INTO synthesis_recipes (id, doi, target_formula, target_name, temperature_min,
             temperature_max, time_min, time_max, atmosphere, synthesis_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            &recipe.id,
            &recipe.doi,
            &recipe.target_formula,
            &recipe.target_name,
            recipe.temperature_min,
            recipe.temperature_max,
            recipe.time_min,
            recipe.time_max,
            &recipe.atmosphere,
            recipe.synthesis_type.as_str(),
        ),
    )?;
    let seq = conn.last_insert_rowid();

    for (position, precursor) in recipe.precursors.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_precursors (recipe_seq, position, formula, name)
             VALUES (?1, ?2, ?3, ?4)",
            (seq, position as i64, &precursor.formula, &precursor.name),
        )?;
    }

    for (position, operation) in recipe.operations.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_operations (recipe_seq, position, operation)
             VALUES (?1, ?2, ?3)",
            (seq, position as i64, operation),
        )?;
    }

    Ok(seq)
}

/// Insert a batch of recipes in one transaction
pub fn insert_recipes(conn: &Connection, recipes: &[SynthesisRecipe]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for recipe in recipes {
        insert_recipe(&tx, recipe)
            .with_context(|| format!("Failed to insert recipe {}", recipe.id))?;
    }
    tx.commit()?;
    Ok(())
}

/// Clear all imported data (for re-import)
pub fn clear_recipes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_operations;
        DELETE FROM recipe_precursors;
        DELETE FROM synthesis_recipes;
        "#,
    )?;
    Ok(())
}

pub fn recipe_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM synthesis_recipes", [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

/// Recipe counts per synthesis type
pub fn count_by_type(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT synthesis_type, COUNT(*) FROM synthesis_recipes
         GROUP BY synthesis_type ORDER BY synthesis_type",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load every recipe in insertion order
pub fn load_recipes(conn: &Connection) -> Result<Vec<SynthesisRecipe>> {
    let mut precursors: HashMap<i64, Vec<Precursor>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT recipe_seq, formula, name FROM recipe_precursors ORDER BY recipe_seq, position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Precursor {
                    formula: row.get(1)?,
                    name: row.get(2)?,
                },
            ))
        })?;
        for row in rows {
            let (seq, precursor) = row?;
            precursors.entry(seq).or_default().push(precursor);
        }
    }

    let mut operations: HashMap<i64, Vec<String>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT recipe_seq, operation FROM recipe_operations ORDER BY recipe_seq, position",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (seq, operation) = row?;
            operations.entry(seq).or_default().push(operation);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT seq, id, doi, target_formula, target_name, temperature_min, temperature_max,
                time_min, time_max, atmosphere, synthesis_type
         FROM synthesis_recipes ORDER BY seq",
    )?;

    let rows = stmt.query_map([], |row| {
        let seq: i64 = row.get(0)?;
        let synthesis_type: String = row.get(10)?;
        Ok((
            seq,
            synthesis_type,
            SynthesisRecipe {
                id: row.get(1)?,
                doi: row.get(2)?,
                target_formula: row.get(3)?,
                target_name: row.get(4)?,
                precursors: Vec::new(),
                temperature_min: row.get(5)?,
                temperature_max: row.get(6)?,
                time_min: row.get(7)?,
                time_max: row.get(8)?,
                atmosphere: row.get(9)?,
                operations: Vec::new(),
                synthesis_type: SynthesisType::SolidState,
            },
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (seq, synthesis_type, mut recipe) = row?;
        recipe.synthesis_type = synthesis_type
            .parse()
            .with_context(|| format!("Recipe {} has a bad synthesis type", recipe.id))?;
        recipe.precursors = precursors.remove(&seq).unwrap_or_default();
        recipe.operations = operations.remove(&seq).unwrap_or_default();
        results.push(recipe);
    }
    Ok(results)
}
