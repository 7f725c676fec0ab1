//! Data models for synthesis planning and candidate screening

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output language for user-facing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

/// A fixed piece of text in both supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Text {
    pub en: &'static str,
    pub ko: &'static str,
}

impl Text {
    pub const fn new(en: &'static str, ko: &'static str) -> Self {
        Self { en, ko }
    }

    pub fn get(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::Ko => self.ko,
        }
    }
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedElement {
    pub symbol: String,
    pub count: f64,
}

/// Element multiset of a formula string, symbols in order of first appearance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFormula {
    pub formula: String,
    pub elements: Vec<ParsedElement>,
    pub unique_elements: Vec<String>,
}

impl ParsedFormula {
    pub fn count_of(&self, symbol: &str) -> Option<f64> {
        self.elements
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.count)
    }
}

// ---------------------------------------------------------------------------
// Synthesis methods and precursors (static catalogs)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MethodId {
    SolidState,
    SolGel,
    Hydrothermal,
    Solution,
}

impl MethodId {
    pub const ALL: [MethodId; 4] = [
        MethodId::SolidState,
        MethodId::SolGel,
        MethodId::Hydrothermal,
        MethodId::Solution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodId::SolidState => "solid-state",
            MethodId::SolGel => "sol-gel",
            MethodId::Hydrothermal => "hydrothermal",
            MethodId::Solution => "solution",
        }
    }
}

impl FromStr for MethodId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| anyhow!("unknown synthesis method '{}'", s))
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecursorKind {
    Oxide,
    Carbonate,
    Nitrate,
    Hydroxide,
    Chloride,
    Organic,
}

/// A starting compound that supplies one element of the target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecursorInfo {
    pub formula: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: PrecursorKind,
    /// Methods this precursor suits, most preferred first
    pub preferred_for: &'static [MethodId],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisStep {
    pub name: &'static str,
    pub description: Text,
    pub temperature: Option<&'static str>,
    pub time: Option<&'static str>,
    pub atmosphere: Option<&'static str>,
    pub details: Option<Text>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodConditions {
    pub temperature_range: (f64, f64), // °C
    pub time_range: (f64, f64),        // hours
    pub atmosphere: &'static [&'static str],
    pub pressure: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisMethod {
    pub id: MethodId,
    pub name: Text,
    pub description: Text,
    pub conditions: MethodConditions,
    pub steps: &'static [SynthesisStep],
    pub equipment: &'static [&'static str],
    pub advantages: &'static [Text],
    pub suitable_for: &'static [Text],
    pub reducing_required: bool,
}

// ---------------------------------------------------------------------------
// Text-mined literature recipes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SynthesisType {
    SolidState,
    SolGel,
}

impl SynthesisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisType::SolidState => "solid-state",
            SynthesisType::SolGel => "sol-gel",
        }
    }
}

impl FromStr for SynthesisType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid-state" => Ok(SynthesisType::SolidState),
            "sol-gel" => Ok(SynthesisType::SolGel),
            other => Err(anyhow!("unknown synthesis type '{}'", other)),
        }
    }
}

impl fmt::Display for SynthesisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precursor {
    pub formula: String,
    #[serde(default)]
    pub name: String,
}

/// One literature recipe from the text-mined dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRecipe {
    pub id: String,
    #[serde(default)]
    pub doi: String,
    pub target_formula: String,
    #[serde(default)]
    pub target_name: String,
    #[serde(default)]
    pub precursors: Vec<Precursor>,
    pub temperature_min: Option<f64>, // °C, None = unknown
    pub temperature_max: Option<f64>,
    pub time_min: Option<f64>, // hours
    pub time_max: Option<f64>,
    pub atmosphere: Option<String>,
    #[serde(default)]
    pub operations: Vec<String>,
    pub synthesis_type: SynthesisType,
}

// ---------------------------------------------------------------------------
// Generated recipes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RecipeTarget {
    pub formula: String,
    pub name: String,
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrecursorChoice {
    pub element: String,
    pub precursor: &'static PrecursorInfo,
    pub stoichiometry: f64, // mol, the element's count in the target
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeConditions {
    pub temperature: String,
    pub time: String,
    pub atmosphere: String,
    pub heating_rate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcedureStep {
    pub step: usize,
    pub name: &'static str,
    pub action: Text,
    pub details: Option<Text>,
    pub temperature: Option<&'static str>,
    pub time: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteratureReference {
    pub material: String,
    pub doi: String,
    pub temperature: Option<f64>, // the record's maximum temperature
}

/// A recipe synthesized from the catalogs for an arbitrary target formula
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedRecipe {
    pub target: RecipeTarget,
    pub method: &'static SynthesisMethod,
    pub precursors: Vec<PrecursorChoice>,
    /// Elements no precursor could be found for
    pub missing_elements: Vec<String>,
    pub conditions: RecipeConditions,
    pub procedure: Vec<ProcedureStep>,
    pub characterization: Vec<Text>,
    pub safety_notes: Vec<Text>,
    pub references: Vec<LiteratureReference>,
}

// ---------------------------------------------------------------------------
// Candidate screening
// ---------------------------------------------------------------------------

/// A material record returned by the materials-database collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub material_id: Option<String>,
    pub formula: String,
    pub energy_above_hull: Option<f64>, // eV/atom
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub elements: Vec<String>,
    pub formula: String,
    pub materials_found: usize,
    pub stable_phases: usize,
    pub synthesis_recipes: usize,
    pub score: u32,
    pub reasoning: Vec<String>,
    pub known_phases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Info,
    Progress,
    Result,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
    pub message: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchResponse {
    pub steps: Vec<ResearchStep>,
    pub candidates: Vec<CandidateResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeRequest {
    pub message: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub message: String,
}
