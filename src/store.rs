//! In-memory literature recipe store
//!
//! The store is built once (from SQLite, a JSON file or the bundled sample)
//! and never mutated afterwards; callers share it by reference or `Arc`.
//! All searches are linear scans returning matches in dataset order.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rusqlite::Connection;
use tracing::info;

use crate::db;
use crate::formula::parse_formula;
use crate::models::{SynthesisRecipe, SynthesisType};

const SAMPLE_RECIPES: &str = include_str!("../data/sample_recipes.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SynthesisTypeFilter {
    #[default]
    All,
    SolidState,
    SolGel,
}

impl SynthesisTypeFilter {
    fn accepts(self, synthesis_type: SynthesisType) -> bool {
        match self {
            SynthesisTypeFilter::All => true,
            SynthesisTypeFilter::SolidState => synthesis_type == SynthesisType::SolidState,
            SynthesisTypeFilter::SolGel => synthesis_type == SynthesisType::SolGel,
        }
    }
}

/// How `search_by_temperature` decides that a target contains an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementMatch {
    /// Case-insensitive substring of the target formula ("In" matches "LiNbO3")
    #[default]
    Substring,
    /// Exact symbol in the parsed target formula
    Parsed,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeStore {
    recipes: Vec<SynthesisRecipe>,
}

/// Whitespace-stripped, lowercased form used for formula comparison
fn normalize(formula: &str) -> String {
    formula
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Either string contains the other
fn symmetric_match(candidate: &str, normalized_query: &str) -> bool {
    let candidate = normalize(candidate);
    candidate.contains(normalized_query) || normalized_query.contains(candidate.as_str())
}

impl RecipeStore {
    /// Build a store, dropping records without a target formula
    pub fn from_recipes(recipes: Vec<SynthesisRecipe>) -> Self {
        let recipes = recipes
            .into_iter()
            .filter(|r| !r.target_formula.trim().is_empty())
            .collect();
        Self { recipes }
    }

    pub fn load(conn: &Connection) -> Result<Self> {
        let recipes = db::load_recipes(conn)?;
        let store = Self::from_recipes(recipes);
        info!(recipes = store.recipe_count(), "recipe dataset loaded");
        Ok(store)
    }

    /// Parse a flat JSON array of recipes
    pub fn from_json(json: &str) -> Result<Self> {
        let recipes: Vec<SynthesisRecipe> =
            serde_json::from_str(json).context("Failed to parse recipe JSON")?;
        Ok(Self::from_recipes(recipes))
    }

    /// The small literature sample compiled into the binary
    pub fn sample() -> Result<Self> {
        Self::from_json(SAMPLE_RECIPES)
    }

    pub fn recipes(&self) -> &[SynthesisRecipe] {
        &self.recipes
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Distinct synthesis types in order of first appearance
    pub fn synthesis_types(&self) -> Vec<SynthesisType> {
        let mut types = Vec::new();
        for recipe in &self.recipes {
            if !types.contains(&recipe.synthesis_type) {
                types.push(recipe.synthesis_type);
            }
        }
        types
    }

    pub fn search_by_formula(
        &self,
        formula: &str,
        filter: SynthesisTypeFilter,
        limit: usize,
    ) -> Vec<&SynthesisRecipe> {
        let query = normalize(formula);
        self.recipes
            .iter()
            .filter(|r| filter.accepts(r.synthesis_type))
            .filter(|r| symmetric_match(&r.target_formula, &query))
            .take(limit)
            .collect()
    }

    pub fn search_by_precursor(&self, precursor: &str, limit: usize) -> Vec<&SynthesisRecipe> {
        let query = normalize(precursor);
        self.recipes
            .iter()
            .filter(|r| r.precursors.iter().any(|p| symmetric_match(&p.formula, &query)))
            .take(limit)
            .collect()
    }

    /// Recipes whose `[temperature_min ?? 0, temperature_max ?? inf]` interval
    /// overlaps `[min_temp, max_temp]`, optionally restricted to targets that
    /// contain every given element.
    pub fn search_by_temperature(
        &self,
        min_temp: f64,
        max_temp: f64,
        elements: Option<&[String]>,
        mode: ElementMatch,
        limit: usize,
    ) -> Vec<&SynthesisRecipe> {
        self.recipes
            .iter()
            .filter(|r| {
                let low = r.temperature_min.unwrap_or(0.0);
                let high = r.temperature_max.unwrap_or(f64::INFINITY);
                high >= min_temp && low <= max_temp
            })
            .filter(|r| match elements {
                Some(elements) => contains_elements(&r.target_formula, elements, mode),
                None => true,
            })
            .take(limit)
            .collect()
    }
}

fn contains_elements(formula: &str, elements: &[String], mode: ElementMatch) -> bool {
    match mode {
        ElementMatch::Substring => {
            let upper = formula.to_uppercase();
            elements.iter().all(|el| upper.contains(&el.to_uppercase()))
        }
        ElementMatch::Parsed => {
            let parsed = parse_formula(formula);
            elements
                .iter()
                .all(|el| parsed.unique_elements.iter().any(|u| u == el))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Precursor;

    fn recipe(
        id: &str,
        target: &str,
        synthesis_type: SynthesisType,
        temperature: (Option<f64>, Option<f64>),
    ) -> SynthesisRecipe {
        SynthesisRecipe {
            id: id.to_string(),
            doi: format!("10.1000/{}", id),
            target_formula: target.to_string(),
            target_name: String::new(),
            precursors: Vec::new(),
            temperature_min: temperature.0,
            temperature_max: temperature.1,
            time_min: None,
            time_max: None,
            atmosphere: None,
            operations: Vec::new(),
            synthesis_type,
        }
    }

    fn fixture() -> RecipeStore {
        let mut with_precursors = recipe("r5", "LiMn2O4", SynthesisType::SolGel, (Some(750.0), Some(800.0)));
        with_precursors.precursors = vec![
            Precursor { formula: "LiNO3".to_string(), name: "lithium nitrate".to_string() },
            Precursor { formula: "Mn(NO3)2".to_string(), name: String::new() },
        ];

        RecipeStore::from_recipes(vec![
            recipe("r1", "LiCoO2", SynthesisType::SolidState, (Some(700.0), Some(750.0))),
            recipe("r2", "LiCoO2", SynthesisType::SolGel, (Some(750.0), Some(850.0))),
            recipe("r3", "Li Co O2 (Mg doped)", SynthesisType::SolidState, (None, None)),
            recipe("r4", "LiNbO3", SynthesisType::SolidState, (Some(900.0), None)),
            with_precursors,
            recipe("empty", "  ", SynthesisType::SolidState, (None, None)),
        ])
    }

    fn ids(recipes: &[&SynthesisRecipe]) -> Vec<String> {
        recipes.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_targets_are_dropped() {
        let store = fixture();
        assert_eq!(store.recipe_count(), 5);
        assert_eq!(
            store.synthesis_types(),
            vec![SynthesisType::SolidState, SynthesisType::SolGel]
        );
    }

    #[test]
    fn test_search_by_formula_is_symmetric() {
        let store = fixture();
        let found = store.search_by_formula("licoo2", SynthesisTypeFilter::All, 10);
        assert_eq!(ids(&found), vec!["r1", "r2", "r3"]);

        // the query contains the record formula
        let found = store.search_by_formula("LiCoO2 nanosheets", SynthesisTypeFilter::All, 10);
        assert_eq!(ids(&found), vec!["r1", "r2"]);
    }

    #[test]
    fn test_search_by_formula_limit_and_type() {
        let store = fixture();
        let found = store.search_by_formula("LiCoO2", SynthesisTypeFilter::SolidState, 5);
        assert!(found.len() <= 5);
        assert!(found.iter().all(|r| r.synthesis_type == SynthesisType::SolidState));

        let found = store.search_by_formula("LiCoO2", SynthesisTypeFilter::All, 1);
        assert_eq!(ids(&found), vec!["r1"]);
    }

    #[test]
    fn test_search_by_formula_is_idempotent() {
        let store = fixture();
        let first = ids(&store.search_by_formula("Li", SynthesisTypeFilter::All, 10));
        let second = ids(&store.search_by_formula("Li", SynthesisTypeFilter::All, 10));
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_by_precursor() {
        let store = fixture();
        assert_eq!(ids(&store.search_by_precursor("LiNO3", 10)), vec!["r5"]);
        assert_eq!(ids(&store.search_by_precursor("mn(no3)2", 10)), vec!["r5"]);
        assert!(store.search_by_precursor("BaCO3", 10).is_empty());
    }

    #[test]
    fn test_search_by_temperature_overlap() {
        let store = fixture();
        let found = store.search_by_temperature(800.0, 1000.0, None, ElementMatch::Substring, 10);
        // 700-750 is excluded, 750-850 included, unknown bounds are open
        assert_eq!(ids(&found), vec!["r2", "r3", "r4", "r5"]);
    }

    #[test]
    fn test_search_by_temperature_element_filter() {
        let store = fixture();
        let indium = vec!["In".to_string()];

        // "LINBO3" contains "IN"
        let loose = store.search_by_temperature(0.0, 2000.0, Some(&indium), ElementMatch::Substring, 10);
        assert_eq!(ids(&loose), vec!["r4"]);

        let strict = store.search_by_temperature(0.0, 2000.0, Some(&indium), ElementMatch::Parsed, 10);
        assert!(strict.is_empty());

        let cobalt = vec!["Co".to_string(), "Li".to_string()];
        let strict = store.search_by_temperature(0.0, 2000.0, Some(&cobalt), ElementMatch::Parsed, 10);
        assert_eq!(ids(&strict), vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_bundled_sample_loads() {
        let store = RecipeStore::sample().unwrap();
        assert!(store.recipe_count() > 0);
        assert!(!store.search_by_formula("LiCoO2", SynthesisTypeFilter::All, 10).is_empty());
    }
}
