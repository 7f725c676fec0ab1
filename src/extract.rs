//! Import of text-mined synthesis datasets
//!
//! Walks a directory for `*.json` files and loads two layouts: the raw
//! text-mined dump (an object with a `reactions` array, one file per
//! synthesis route) and a pre-flattened array of recipe records.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{Precursor, SynthesisRecipe, SynthesisType};

#[derive(Debug, Default, Deserialize)]
struct RawDataset {
    reactions: Option<Vec<RawReaction>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawReaction {
    doi: Option<String>,
    target: Option<RawMaterial>,
    precursors: Option<Vec<RawMaterial>>,
    operations: Option<Vec<RawOperation>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMaterial {
    material_formula: Option<String>,
    material_string: Option<String>,
    material_name: Option<String>,
}

impl RawMaterial {
    fn formula(&self) -> Option<&str> {
        non_empty(&self.material_formula).or_else(|| non_empty(&self.material_string))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawOperation {
    #[serde(rename = "type")]
    kind: Option<String>,
    conditions: Option<RawConditions>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConditions {
    heating_temperature: Option<Vec<RawValue>>,
    heating_time: Option<Vec<RawValue>>,
    heating_atmosphere: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawValue {
    min_value: Option<f64>,
    max_value: Option<f64>,
    values: Option<Vec<f64>>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Running min/max over every reported value
#[derive(Debug, Default, Clone, Copy)]
struct Range {
    min: Option<f64>,
    max: Option<f64>,
}

impl Range {
    fn include_min(&mut self, v: f64) {
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
    }

    fn include_max(&mut self, v: f64) {
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
    }

    fn include(&mut self, value: &RawValue) {
        if let Some(v) = value.min_value {
            self.include_min(v);
        }
        if let Some(v) = value.max_value {
            self.include_max(v);
        }
        for &v in value.values.iter().flatten() {
            self.include_min(v);
            self.include_max(v);
        }
    }
}

fn condition_range<'a>(
    operations: &'a [RawOperation],
    select: impl Fn(&'a RawConditions) -> Option<&'a Vec<RawValue>>,
) -> Range {
    let mut range = Range::default();
    for values in operations
        .iter()
        .filter_map(|op| op.conditions.as_ref())
        .filter_map(select)
    {
        for value in values {
            range.include(value);
        }
    }
    range
}

/// Route of a raw dataset file, taken from its name
fn synthesis_type_for(path: &Path) -> SynthesisType {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    if name.contains("sol-gel") || name.contains("sol_gel") || name.contains("solgel") {
        SynthesisType::SolGel
    } else {
        SynthesisType::SolidState
    }
}

fn convert_reaction(reaction: RawReaction, index: usize, synthesis_type: SynthesisType) -> SynthesisRecipe {
    let prefix = match synthesis_type {
        SynthesisType::SolidState => "ss",
        SynthesisType::SolGel => "sg",
    };
    let operations = reaction.operations.unwrap_or_default();
    let temperature = condition_range(&operations, |c| c.heating_temperature.as_ref());
    let time = condition_range(&operations, |c| c.heating_time.as_ref());

    let atmosphere = operations
        .iter()
        .filter_map(|op| op.conditions.as_ref())
        .filter_map(|c| c.heating_atmosphere.as_ref())
        .find_map(|atm| atm.first().cloned());

    let target = reaction.target.unwrap_or_default();
    let precursors = reaction
        .precursors
        .unwrap_or_default()
        .iter()
        .filter_map(|p| {
            p.formula().map(|formula| Precursor {
                formula: formula.to_string(),
                name: p.material_name.clone().unwrap_or_default(),
            })
        })
        .collect();

    SynthesisRecipe {
        id: format!("synth-{}-{}", prefix, index + 1),
        doi: reaction.doi.unwrap_or_default(),
        target_formula: target.formula().unwrap_or("").to_string(),
        target_name: target.material_name.clone().unwrap_or_default(),
        precursors,
        temperature_min: temperature.min,
        temperature_max: temperature.max,
        time_min: time.min,
        time_max: time.max,
        atmosphere,
        operations: operations
            .into_iter()
            .filter_map(|op| op.kind)
            .filter(|kind| !kind.is_empty() && kind != "StartingSynthesis")
            .collect(),
        synthesis_type,
    }
}

/// Find all JSON dataset files under a directory, sorted by path
pub fn find_dataset_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Parse one dataset file. `Ok(None)` means the file is JSON but not a
/// recipe dataset.
pub fn parse_dataset_file(path: &Path) -> Result<Option<Vec<SynthesisRecipe>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if value.is_array() {
        let recipes: Vec<SynthesisRecipe> = serde_json::from_value(value)
            .with_context(|| format!("Bad recipe records in {}", path.display()))?;
        return Ok(Some(recipes));
    }

    if value.get("reactions").is_none() {
        return Ok(None);
    }

    let dataset: RawDataset = serde_json::from_value(value)
        .with_context(|| format!("Bad reactions in {}", path.display()))?;
    let synthesis_type = synthesis_type_for(path);
    let recipes = dataset
        .reactions
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, r)| convert_reaction(r, i, synthesis_type))
        .collect();
    Ok(Some(recipes))
}

/// Import every dataset file under `dir` into the database
pub fn import_to_database(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    info!(dir = %dir.display(), "scanning for dataset files");
    let files = find_dataset_files(dir)?;
    info!(files = files.len(), "found candidate dataset files");

    for path in &files {
        match parse_dataset_file(path) {
            Ok(Some(recipes)) => {
                let parsed = recipes.len();
                let valid: Vec<SynthesisRecipe> = recipes
                    .into_iter()
                    .filter(|r| !r.target_formula.trim().is_empty())
                    .collect();

                db::insert_recipes(conn, &valid)?;

                stats.files += 1;
                stats.dropped += parsed - valid.len();
                stats.recipes += valid.len();
                stats.with_temperature += valid
                    .iter()
                    .filter(|r| r.temperature_min.is_some() || r.temperature_max.is_some())
                    .count();
                stats.with_time += valid
                    .iter()
                    .filter(|r| r.time_min.is_some() || r.time_max.is_some())
                    .count();
                stats.with_atmosphere += valid.iter().filter(|r| r.atmosphere.is_some()).count();

                info!(
                    file = %path.display(),
                    valid = valid.len(),
                    parsed,
                    "imported dataset file"
                );
            }
            Ok(None) => {
                warn!(file = %path.display(), "not a recipe dataset, skipped");
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to import");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub recipes: usize,
    pub dropped: usize,
    pub with_temperature: usize,
    pub with_time: usize,
    pub with_atmosphere: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} recipes from {} files (with temperature: {}, with time: {}, with atmosphere: {}). \
             Dropped: {}, Skipped: {}, Errors: {}",
            self.recipes,
            self.files,
            self.with_temperature,
            self.with_time,
            self.with_atmosphere,
            self.dropped,
            self.skipped,
            self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RAW_SOLID_STATE: &str = r#"{
        "reactions": [
            {
                "doi": "10.1000/abc",
                "target": {"material_formula": "LiCoO2", "material_name": "lithium cobalt oxide"},
                "precursors": [
                    {"material_formula": "Li2CO3", "material_name": "lithium carbonate"},
                    {"material_formula": "", "material_string": "Co3O4"},
                    {"material_formula": null, "material_string": null}
                ],
                "operations": [
                    {"type": "StartingSynthesis", "conditions": null},
                    {"type": "MixingOperation", "conditions": {"heating_temperature": []}},
                    {"type": "HeatingOperation", "conditions": {
                        "heating_temperature": [{"min_value": 600, "max_value": 700, "values": [650]}],
                        "heating_time": [{"min_value": null, "max_value": null, "values": [5, 12]}],
                        "heating_atmosphere": ["air", "O2"]
                    }},
                    {"type": "HeatingOperation", "conditions": {
                        "heating_temperature": [{"min_value": null, "max_value": 900, "values": []}],
                        "heating_atmosphere": ["O2"]
                    }}
                ]
            },
            {
                "doi": "10.1000/empty",
                "target": {"material_formula": "", "material_string": ""},
                "precursors": [],
                "operations": []
            }
        ]
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_raw_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "solid-state.json", RAW_SOLID_STATE);

        let recipes = parse_dataset_file(&path).unwrap().unwrap();
        assert_eq!(recipes.len(), 2);

        let r = &recipes[0];
        assert_eq!(r.id, "synth-ss-1");
        assert_eq!(r.doi, "10.1000/abc");
        assert_eq!(r.target_formula, "LiCoO2");
        assert_eq!(r.target_name, "lithium cobalt oxide");
        assert_eq!(
            r.precursors.iter().map(|p| p.formula.as_str()).collect::<Vec<_>>(),
            vec!["Li2CO3", "Co3O4"]
        );
        assert_eq!(r.temperature_min, Some(600.0));
        assert_eq!(r.temperature_max, Some(900.0));
        assert_eq!(r.time_min, Some(5.0));
        assert_eq!(r.time_max, Some(12.0));
        assert_eq!(r.atmosphere.as_deref(), Some("air"));
        assert_eq!(r.operations, vec!["MixingOperation", "HeatingOperation", "HeatingOperation"]);
        assert_eq!(r.synthesis_type, SynthesisType::SolidState);

        assert_eq!(recipes[1].id, "synth-ss-2");
        assert!(recipes[1].target_formula.is_empty());
    }

    #[test]
    fn test_sol_gel_type_from_file_name() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "sol_gel_dump.json", RAW_SOLID_STATE);
        let recipes = parse_dataset_file(&path).unwrap().unwrap();
        assert_eq!(recipes[0].id, "synth-sg-1");
        assert_eq!(recipes[0].synthesis_type, SynthesisType::SolGel);
    }

    #[test]
    fn test_unrelated_json_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "package.json", r#"{"name": "portal"}"#);
        assert!(parse_dataset_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_import_directory() {
        let dir = TempDir::new().unwrap();
        write(&dir, "solid-state.json", RAW_SOLID_STATE);
        write(&dir, "notes.json", r#"{"hello": 1}"#);
        write(&dir, "broken.json", "{ not json");
        write(&dir, "readme.txt", "ignored");
        fs::create_dir(dir.path().join("flat")).unwrap();
        write(
            &dir,
            "flat/recipes.json",
            r#"[{"id": "x-1", "target_formula": "BaTiO3", "synthesis_type": "sol-gel",
                 "temperature_min": null, "temperature_max": 1200}]"#,
        );

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_to_database(&conn, dir.path()).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.recipes, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.with_temperature, 2);
        assert_eq!(stats.with_time, 1);
        assert_eq!(stats.with_atmosphere, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);

        // files are visited in path order
        let loaded = db::load_recipes(&conn).unwrap();
        assert_eq!(loaded[0].target_formula, "BaTiO3");
        assert_eq!(loaded[1].target_formula, "LiCoO2");
    }
}
