//! Template-based recipe generation
//!
//! A recipe for an arbitrary target is assembled from the precursor table
//! and the method catalog, with a few literature references pulled from the
//! recipe store. Nothing here fails hard: missing data shortens the recipe
//! and the caller decides what counts as unusable.

use std::fmt;

use tracing::{debug, warn};

use crate::formula::{
    detect_synthesis_method, extract_target_material, material_name, parse_formula,
    parse_method_selection,
};
use crate::methods::{REDUCING_ATMOSPHERE, get_method, needs_reducing_atmosphere};
use crate::models::{
    GeneratedRecipe, Language, LiteratureReference, MethodId, PrecursorChoice, ProcedureStep,
    RecipeConditions, RecipeRequest, RecipeResponse, RecipeTarget, Text,
};
use crate::precursors::best_precursor;
use crate::store::{RecipeStore, SynthesisTypeFilter};

/// Anions and framework formers supplied by the atmosphere or the precursors
const NON_PRECURSOR_ELEMENTS: &[&str] = &["O", "N", "C", "H"];

const MAX_REFERENCES: usize = 3;
const HEATING_RATE: &str = "5°C/min";

const REDUCING_SINTERING: Text = Text::new(
    "Heat under reducing atmosphere (Ar/H2) to form metallic phase",
    "환원 분위기(Ar/H2)에서 가열하여 금속 상 형성",
);

const CHARACTERIZATION: [Text; 5] = [
    Text::new("XRD: Crystal structure and phase confirmation", "XRD: 결정 구조 및 상 확인"),
    Text::new("SEM-EDS: Morphology and composition analysis", "SEM-EDS: 형태 및 조성 분석"),
    Text::new(
        "TEM: Nanostructure observation (for nanoparticles)",
        "TEM: 나노구조 관찰 (나노입자의 경우)",
    ),
    Text::new("BET: Specific surface area measurement", "BET: 비표면적 측정"),
    Text::new("XPS: Surface chemical state analysis", "XPS: 표면 화학 상태 분석"),
];

const HEAT_GLOVES: Text = Text::new(
    "Wear heat-resistant gloves during high-temperature operations",
    "고온 작업 시 내열장갑 착용",
);
const POWDER_MASK: Text = Text::new("Wear a mask when handling powders", "분말 취급 시 마스크 착용");
const HYDROGEN_VENTILATION: Text = Text::new(
    "Ensure proper ventilation when using H2 gas",
    "H2 가스 사용 시 환기 철저",
);
const LAB_COAT: Text = Text::new(
    "Wear lab coat and safety goggles when handling chemicals",
    "화학물질 취급 시 실험복, 보안경 착용",
);

/// Middle 30%-70% of a range, e.g. (800, 1400) -> "980-1220"
fn middle_window((min, max): (f64, f64)) -> String {
    let low = min + ((max - min) * 0.3).round();
    let high = min + ((max - min) * 0.7).round();
    format!("{}-{}", low, high)
}

/// Generate a recipe for `target_formula` by `method_id`. Returns `None` when
/// the formula has no recognizable element or the method is unknown.
pub fn generate_recipe(
    target_formula: &str,
    method_id: &str,
    store: &RecipeStore,
) -> Option<GeneratedRecipe> {
    let parsed = parse_formula(target_formula);
    if parsed.unique_elements.is_empty() {
        return None;
    }
    let method = get_method(method_id)?;

    let mut precursors = Vec::new();
    let mut missing_elements = Vec::new();

    for element in &parsed.unique_elements {
        if NON_PRECURSOR_ELEMENTS.contains(&element.as_str()) {
            continue;
        }

        let chosen = best_precursor(element, method.id).or_else(|| {
            let fallback = best_precursor(element, MethodId::SolidState)
                .or_else(|| best_precursor(element, MethodId::Solution));
            if let Some(p) = fallback {
                debug!(element = %element, precursor = p.formula, "using fallback precursor");
            }
            fallback
        });

        match chosen {
            Some(precursor) => precursors.push(PrecursorChoice {
                element: element.clone(),
                precursor,
                stoichiometry: parsed.count_of(element).unwrap_or(1.0),
            }),
            None => {
                warn!(element = %element, method = %method.id, "no precursor available");
                missing_elements.push(element.clone());
            }
        }
    }

    let reducing = needs_reducing_atmosphere(method.id, &parsed.unique_elements);
    let atmosphere = if reducing {
        REDUCING_ATMOSPHERE
    } else {
        method.conditions.atmosphere.first().copied().unwrap_or("air")
    };

    let conditions = RecipeConditions {
        temperature: format!("{}°C", middle_window(method.conditions.temperature_range)),
        time: format!("{}h", middle_window(method.conditions.time_range)),
        atmosphere: atmosphere.to_string(),
        heating_rate: Some(HEATING_RATE.to_string()),
    };

    let procedure = method
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let details = if reducing && method.id == MethodId::SolidState && step.name == "sintering" {
                Some(REDUCING_SINTERING)
            } else {
                step.details
            };
            ProcedureStep {
                step: i + 1,
                name: step.name,
                action: step.description,
                details,
                temperature: step.temperature,
                time: step.time,
            }
        })
        .collect();

    let mut safety_notes = vec![HEAT_GLOVES, POWDER_MASK];
    if reducing {
        safety_notes.push(HYDROGEN_VENTILATION);
    }
    safety_notes.push(LAB_COAT);

    Some(GeneratedRecipe {
        target: RecipeTarget {
            formula: target_formula.to_string(),
            name: material_name(&parsed.unique_elements),
            elements: parsed.unique_elements.clone(),
        },
        method,
        precursors,
        missing_elements,
        conditions,
        procedure,
        characterization: CHARACTERIZATION.to_vec(),
        safety_notes,
        references: find_references(&parsed.unique_elements, store),
    })
}

/// Up to three DOI-distinct literature recipes whose target mentions one of
/// the first two elements
fn find_references(elements: &[String], store: &RecipeStore) -> Vec<LiteratureReference> {
    let mut references: Vec<LiteratureReference> = Vec::new();

    'elements: for element in elements.iter().take(2) {
        for recipe in store.search_by_formula(element, SynthesisTypeFilter::All, MAX_REFERENCES) {
            if !references.iter().any(|r| r.doi == recipe.doi) {
                references.push(LiteratureReference {
                    material: recipe.target_formula.clone(),
                    doi: recipe.doi.clone(),
                    temperature: recipe.temperature_max,
                });
            }
            if references.len() >= MAX_REFERENCES {
                break 'elements;
            }
        }
    }

    references
}

fn format_stoichiometry(count: f64) -> String {
    format!("{} mol", count)
}

/// A recipe rendered as markdown in one language
pub struct RecipeView<'a> {
    pub recipe: &'a GeneratedRecipe,
    pub language: Language,
}

impl fmt::Display for RecipeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recipe = self.recipe;
        let language = self.language;
        let ko = language == Language::Ko;

        writeln!(f, "**{} - {}**", recipe.target.formula, recipe.method.name.get(language))?;
        if !recipe.target.name.is_empty() {
            writeln!(f, "_{}_", recipe.target.name)?;
        }
        writeln!(f)?;

        writeln!(f, "{}", if ko { "📦 **전구체 (Precursors):**" } else { "📦 **Precursors:**" })?;
        for p in &recipe.precursors {
            writeln!(
                f,
                "  - {} ({}) - {}",
                p.precursor.formula,
                p.precursor.name,
                format_stoichiometry(p.stoichiometry)
            )?;
        }
        if !recipe.missing_elements.is_empty() {
            writeln!(
                f,
                "  - ⚠️ {}: {}",
                if ko { "전구체 정보 없음" } else { "No precursor data" },
                recipe.missing_elements.join(", ")
            )?;
        }
        writeln!(f)?;

        let c = &recipe.conditions;
        writeln!(f, "{}", if ko { "🔬 **합성 조건:**" } else { "🔬 **Synthesis Conditions:**" })?;
        writeln!(f, "  - 🔥 {}: {}", if ko { "온도" } else { "Temperature" }, c.temperature)?;
        writeln!(f, "  - ⏱️ {}: {}", if ko { "시간" } else { "Time" }, c.time)?;
        writeln!(f, "  - 💨 {}: {}", if ko { "분위기" } else { "Atmosphere" }, c.atmosphere)?;
        if let Some(rate) = &c.heating_rate {
            writeln!(f, "  - 📈 {}: {}", if ko { "승온 속도" } else { "Heating rate" }, rate)?;
        }
        writeln!(f)?;

        writeln!(f, "{}", if ko { "⚙️ **실험 절차:**" } else { "⚙️ **Procedure:**" })?;
        for step in &recipe.procedure {
            write!(f, "  {}. **{}**", step.step, step.action.get(language))?;
            if let Some(t) = step.temperature {
                write!(f, " ({})", t)?;
            }
            if let Some(t) = step.time {
                write!(f, " - {}", t)?;
            }
            writeln!(f)?;
            if let Some(details) = step.details {
                writeln!(f, "     _{}_", details.get(language))?;
            }
        }
        writeln!(f)?;

        writeln!(f, "{}", if ko { "🔍 **분석 방법:**" } else { "🔍 **Characterization:**" })?;
        for item in &recipe.characterization {
            writeln!(f, "  - {}", item.get(language))?;
        }
        writeln!(f)?;

        writeln!(f, "{}", if ko { "⚠️ **안전 주의사항:**" } else { "⚠️ **Safety Notes:**" })?;
        for note in &recipe.safety_notes {
            writeln!(f, "  - {}", note.get(language))?;
        }
        writeln!(f)?;

        if !recipe.references.is_empty() {
            writeln!(
                f,
                "{}",
                if ko { "📚 **유사 재료 참조:**" } else { "📚 **Similar Material References:**" }
            )?;
            for r in &recipe.references {
                write!(f, "  - {}", r.material)?;
                if let Some(t) = r.temperature {
                    write!(f, " ({}°C)", t)?;
                }
                writeln!(f, " - [DOI](https://doi.org/{})", r.doi)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "---")?;
        write!(
            f,
            "{}",
            if ko {
                "_⚠️ 자동 생성된 레시피입니다. 실험 전 반드시 문헌을 확인하세요._"
            } else {
                "_⚠️ Generated recipe. Please verify with literature before experiments._"
            }
        )
    }
}

/// Render a recipe as markdown
pub fn format_recipe(recipe: &GeneratedRecipe, language: Language) -> String {
    RecipeView { recipe, language }.to_string()
}

/// The method menu shown when a target is known but no route was chosen
pub fn format_method_selection(target: &str, language: Language) -> String {
    match language {
        Language::Ko => format!(
            "**{}** 합성을 도와드릴게요! 🧪\n\n\
             어떤 합성 방법을 원하시나요?\n\n\
             1. 🔥 **Solid-State (고상 합성)** - 고온 소결, 대량 합성에 적합\n\
             2. 🧪 **Sol-Gel (솔-겔)** - 균일한 조성, 낮은 온도\n\
             3. 💧 **Hydrothermal (수열 합성)** - 나노입자, 형태 제어\n\
             4. ⚗️ **Solution-Based (용액 기반)** - 빠른 합성, 금속 나노입자\n\n\
             _숫자나 방법명을 입력해주세요._",
            target
        ),
        Language::En => format!(
            "I'll help you synthesize **{}**! 🧪\n\n\
             Which synthesis method would you prefer?\n\n\
             1. 🔥 **Solid-State** - High-temperature sintering, suitable for bulk synthesis\n\
             2. 🧪 **Sol-Gel** - Homogeneous mixing, lower temperature\n\
             3. 💧 **Hydrothermal** - Nanoparticles, morphology control\n\
             4. ⚗️ **Solution-Based** - Fast synthesis, metal nanoparticles\n\n\
             _Enter a number or method name._",
            target
        ),
    }
}

/// Answer a single recipe request: ask for a target, offer the method menu,
/// or render the generated recipe.
pub fn respond(request: &RecipeRequest, store: &RecipeStore) -> RecipeResponse {
    let ko = request.language == Language::Ko;

    let Some(target) = extract_target_material(&request.message) else {
        let message = if ko {
            "어떤 재료를 합성하고 싶으신가요? 화학식을 입력해주세요. (예: LiCoO2, IrRuNi, BaTiO3)"
        } else {
            "What material would you like to synthesize? Please enter the chemical formula. (e.g., LiCoO2, IrRuNi, BaTiO3)"
        };
        return RecipeResponse { message: message.to_string() };
    };

    let method = detect_synthesis_method(&request.message)
        .or_else(|| parse_method_selection(&request.message));
    let Some(method) = method else {
        return RecipeResponse {
            message: format_method_selection(&target, request.language),
        };
    };

    respond_with_method(&target, method, request.language, store)
}

/// Render the recipe for a known target and method
pub fn respond_with_method(
    target: &str,
    method: MethodId,
    language: Language,
    store: &RecipeStore,
) -> RecipeResponse {
    let ko = language == Language::Ko;

    let Some(recipe) = generate_recipe(target, method.as_str(), store) else {
        let message = if ko {
            format!("죄송합니다. {}에 대한 레시피를 생성할 수 없습니다. 다른 화학식을 시도해주세요.", target)
        } else {
            format!("Sorry, I couldn't generate a recipe for {}. Please try a different formula.", target)
        };
        return RecipeResponse { message };
    };

    if recipe.precursors.is_empty() {
        let message = if ko {
            format!(
                "{}의 일부 원소에 대한 전구체 정보가 없습니다. 일반적인 원소를 포함한 화학식을 시도해주세요.",
                target
            )
        } else {
            format!(
                "Some elements in {} don't have precursor information. Please try a formula with common elements.",
                target
            )
        };
        return RecipeResponse { message };
    }

    let follow_up = if ko {
        "\n\n---\n💬 다른 조건이 필요하시면 말씀해주세요. (예: \"더 낮은 온도로\", \"다른 전구체로\", \"다른 방법으로\")"
    } else {
        "\n\n---\n💬 Let me know if you need different conditions. (e.g., \"lower temperature\", \"different precursors\", \"different method\")"
    };

    RecipeResponse {
        message: format!("{}{}", format_recipe(&recipe, language), follow_up),
    }
}
