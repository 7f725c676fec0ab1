//! Candidate screening over element combinations
//!
//! Each k-element subset of the query's universe is scored from two kinds of
//! evidence: known materials in that chemical system (materials database)
//! and literature recipes for the concatenated formula (recipe store).
//! Candidates are screened concurrently under a semaphore; a failed or slow
//! lookup only zeroes that candidate's database evidence.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use crate::combinations::{
    ResearchQuery, combination_count, generate_combinations, parse_research_query, system_name,
    unrank_combination,
};
use crate::config::ScreeningConfig;
use crate::materials::{MaterialsError, MaterialsSource};
use crate::models::{
    CandidateResult, Language, MaterialSummary, ResearchRequest, ResearchResponse, ResearchStep,
    StepKind,
};
use crate::store::{RecipeStore, SynthesisTypeFilter};

const MATERIALS_WEIGHT: u32 = 2;
const STABLE_WEIGHT: u32 = 10;
const RECIPE_WEIGHT: u32 = 5;

const KNOWN_PHASES_SHOWN: usize = 3;
const RESULTS_SHOWN: usize = 10;
const TOP_SYSTEMS_SHOWN: usize = 3;

const CATALYTIC_METALS: &[&str] = &["Pt", "Pd", "Ir", "Ru", "Rh", "Au", "Ag"];
const MAGNETIC_METALS: &[&str] = &["Fe", "Co", "Ni"];
const REFRACTORY_METALS: &[&str] = &["W", "Mo", "Ta", "Nb", "Re"];

/// Weighted desirability of a candidate system
pub fn score(materials_found: usize, stable_phases: usize, synthesis_recipes: usize) -> u32 {
    materials_found as u32 * MATERIALS_WEIGHT
        + stable_phases as u32 * STABLE_WEIGHT
        + synthesis_recipes as u32 * RECIPE_WEIGHT
}

fn contains_any(elements: &[String], group: &[&str]) -> bool {
    elements.iter().any(|e| group.contains(&e.as_str()))
}

fn reasoning_for(
    elements: &[String],
    materials_found: usize,
    stable_phases: usize,
    synthesis_recipes: usize,
    language: Language,
) -> Vec<String> {
    let ko = language == Language::Ko;
    let mut reasoning = Vec::new();

    if materials_found > 0 {
        reasoning.push(if ko {
            format!("Materials Project에서 {}개 화합물 발견", materials_found)
        } else {
            format!("{} compounds found in Materials Project", materials_found)
        });
    }
    if stable_phases > 0 {
        reasoning.push(if ko {
            format!("{}개 열역학적 안정상 존재 (E_hull ≈ 0)", stable_phases)
        } else {
            format!("{} thermodynamically stable phases (E_hull ≈ 0)", stable_phases)
        });
    }
    if synthesis_recipes > 0 {
        reasoning.push(if ko {
            format!("{}개 합성 레시피 존재 → 실험적 합성 가능성 높음", synthesis_recipes)
        } else {
            format!("{} synthesis recipes exist → likely experimentally accessible", synthesis_recipes)
        });
    }

    let heuristics = [
        (
            CATALYTIC_METALS,
            "귀금속 포함 → 촉매/전극 응용 가능",
            "Contains noble metals → catalyst/electrode applications",
        ),
        (
            MAGNETIC_METALS,
            "자성 원소 포함 → 자성체/스핀트로닉스 응용",
            "Contains magnetic elements → magnetic/spintronic applications",
        ),
        (
            REFRACTORY_METALS,
            "고융점 원소 포함 → 고온 구조재료 응용",
            "Contains refractory elements → high-temperature structural applications",
        ),
    ];
    for (group, text_ko, text_en) in heuristics {
        if contains_any(elements, group) {
            reasoning.push(if ko { text_ko } else { text_en }.to_string());
        }
    }

    reasoning
}

/// First few distinct phase formulas, in source order
fn known_phases(materials: &[MaterialSummary]) -> Vec<String> {
    let mut phases: Vec<String> = Vec::new();
    for m in materials.iter().take(KNOWN_PHASES_SHOWN) {
        if !m.formula.is_empty() && !phases.contains(&m.formula) {
            phases.push(m.formula.clone());
        }
    }
    phases
}

/// Keep candidates with evidence, best first; equal scores keep
/// enumeration order
pub fn rank_candidates(mut results: Vec<(usize, CandidateResult)>) -> Vec<CandidateResult> {
    results.retain(|(_, c)| c.score > 0);
    results.sort_by(|(ia, a), (ib, b)| b.score.cmp(&a.score).then(ia.cmp(ib)));
    results.into_iter().map(|(_, c)| c).collect()
}

/// Screens candidate systems against a materials source and the recipe store
#[derive(Clone)]
pub struct Screener {
    source: Arc<dyn MaterialsSource>,
    store: Arc<RecipeStore>,
    config: ScreeningConfig,
    call_timeout: Duration,
}

impl Screener {
    pub fn new(
        source: Arc<dyn MaterialsSource>,
        store: Arc<RecipeStore>,
        config: ScreeningConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            source,
            store,
            config,
            call_timeout,
        }
    }

    async fn lookup_materials(&self, elements: &[String]) -> Vec<MaterialSummary> {
        let limit = self.config.per_candidate_limit;
        match timeout(self.call_timeout, self.source.search_by_elements(elements, limit)).await {
            Ok(Ok(mut materials)) => {
                materials.truncate(limit);
                materials
            }
            Ok(Err(MaterialsError::NotConfigured)) => {
                debug!(elements = ?elements, "materials database not configured");
                Vec::new()
            }
            Ok(Err(e)) => {
                warn!(elements = ?elements, error = %e, "materials lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(elements = ?elements, timeout = ?self.call_timeout, "materials lookup timed out");
                Vec::new()
            }
        }
    }

    /// Gather evidence for one element subset. Never fails: lookup errors
    /// count as no materials found.
    pub async fn screen_combination(&self, elements: Vec<String>, language: Language) -> CandidateResult {
        let formula = elements.concat();
        let materials = self.lookup_materials(&elements).await;

        let materials_found = materials.len();
        let stable_phases = materials
            .iter()
            .filter(|m| {
                m.energy_above_hull
                    .is_some_and(|e| e < self.config.stable_hull_threshold)
            })
            .count();
        let synthesis_recipes = self
            .store
            .search_by_formula(&formula, SynthesisTypeFilter::All, self.config.per_candidate_limit)
            .len();

        let score = score(materials_found, stable_phases, synthesis_recipes);
        let mut reasoning = reasoning_for(&elements, materials_found, stable_phases, synthesis_recipes, language);
        if score > 0 && reasoning.is_empty() {
            reasoning.push(if language == Language::Ko {
                "데이터베이스에 관련 정보 있음".to_string()
            } else {
                "Related data found in databases".to_string()
            });
        }

        debug!(formula = %formula, score, materials_found, stable_phases, synthesis_recipes, "screened candidate");

        CandidateResult {
            known_phases: known_phases(&materials),
            elements,
            formula,
            materials_found,
            stable_phases,
            synthesis_recipes,
            score,
            reasoning,
        }
    }

    /// Screen `(enumeration index, subset)` pairs with bounded concurrency.
    /// Candidates still pending at the overall deadline are dropped.
    pub async fn screen_all(
        &self,
        candidates: Vec<(usize, Vec<String>)>,
        language: Language,
    ) -> Vec<(usize, CandidateResult)> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let deadline = Instant::now() + self.config.deadline();
        let mut tasks = JoinSet::new();

        for (index, elements) in candidates {
            let screener = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                Some((index, screener.screen_combination(elements, language).await))
            });
        }

        let mut results = Vec::new();
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(Some(result)))) => results.push(result),
                Ok(Some(Ok(None))) => {}
                Ok(Some(Err(e))) => warn!(error = %e, "screening task failed"),
                Ok(None) => break,
                Err(_) => {
                    warn!(pending = tasks.len(), "screening deadline reached");
                    tasks.abort_all();
                    break;
                }
            }
        }
        results
    }

    /// Pick the subsets to screen, keyed by enumeration rank: all of them,
    /// or `max_screened` distinct ranks drawn uniformly when the enumeration
    /// is larger. Only the drawn subsets are built.
    fn select_candidates(&self, universe: &[String], k: usize) -> Vec<(usize, Vec<String>)> {
        let total = combination_count(universe.len(), k);
        let max = self.config.max_screened;
        if total <= max as u64 {
            return generate_combinations(universe, k).into_iter().enumerate().collect();
        }

        let Ok(total) = usize::try_from(total) else {
            warn!(total, "search space too large to sample");
            return Vec::new();
        };
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ranks = index::sample(&mut rng, total, max).into_vec();
        ranks.sort_unstable();
        ranks
            .into_iter()
            .filter_map(|rank| unrank_combination(universe, k, rank as u64).map(|c| (rank, c)))
            .collect()
    }

    pub async fn conduct_research(&self, message: &str, language: Language) -> ResearchResponse {
        let query = parse_research_query(message);
        let universe = query.universe();
        let k = query.system_size;
        let total = combination_count(universe.len(), k);
        let planned = total.min(self.config.max_screened as u64);

        let mut steps = vec![
            ResearchStep {
                kind: StepKind::Info,
                content: query_analysis(&query, universe.len(), total, language),
            },
            ResearchStep {
                kind: StepKind::Progress,
                content: match language {
                    Language::Ko => format!(
                        "⏳ {}개 조합 스크리닝 중... (전체 {}개 중 샘플링)",
                        planned, total
                    ),
                    Language::En => format!(
                        "⏳ Screening {} combinations... (sampled from {} total)",
                        planned, total
                    ),
                },
            },
        ];

        let selected = self.select_candidates(&universe, k);
        let screened = selected.len();
        info!(universe = universe.len(), k, total, screened, "screening candidates");

        let ranked = rank_candidates(self.screen_all(selected, language).await);
        let valid = ranked.len();
        let top: Vec<CandidateResult> = ranked.into_iter().take(self.config.top_n).collect();
        info!(valid, reported = top.len(), "screening complete");

        steps.push(ResearchStep {
            kind: StepKind::Info,
            content: scoring_table(language),
        });
        steps.push(ResearchStep {
            kind: StepKind::Result,
            content: results_report(&top, language),
        });
        steps.push(ResearchStep {
            kind: StepKind::Summary,
            content: summary_report(&top, screened, valid, language),
        });

        ResearchResponse {
            steps,
            candidates: top,
        }
    }
}

pub async fn handle_request(screener: &Screener, request: &ResearchRequest) -> ResearchResponse {
    screener.conduct_research(&request.message, request.language).await
}

/// 12345 -> "12,345"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn query_analysis(query: &ResearchQuery, universe_size: usize, total: u64, language: Language) -> String {
    let mut out = String::new();
    let group = query.universe_name(language);
    let system = system_name(query.system_size, language);
    let total = group_thousands(total);

    match language {
        Language::Ko => {
            out.push_str(&format!(
                "🔬 **연구 쿼리 분석**\n\n- 원소 그룹: {} ({}개)\n- 시스템: {}\n- 총 조합 수: {}개\n",
                group, universe_size, system, total
            ));
            if let Some(app) = query.application {
                out.push_str(&format!("- 응용 분야: {}\n", app.as_str()));
            }
            if let Some((low, high)) = query.band_gap {
                out.push_str(&format!("- 밴드갭: {}-{} eV\n", low, high));
            }
            if query.stable {
                out.push_str("- 조건: 안정상 우선\n");
            }
        }
        Language::En => {
            out.push_str(&format!(
                "🔬 **Research Query Analysis**\n\n- Element group: {} ({})\n- System: {}\n- Total combinations: {}\n",
                group, universe_size, system, total
            ));
            if let Some(app) = query.application {
                out.push_str(&format!("- Application: {}\n", app.as_str()));
            }
            if let Some((low, high)) = query.band_gap {
                out.push_str(&format!("- Band gap: {}-{} eV\n", low, high));
            }
            if query.stable {
                out.push_str("- Condition: Stable phases priority\n");
            }
        }
    }
    out
}

fn scoring_table(language: Language) -> String {
    match language {
        Language::Ko => "📐 **스코어링 기준**\n\n\
            | 항목 | 가중치 | 근거 |\n\
            |------|--------|------|\n\
            | 안정상 | ×10 | E_hull ≈ 0 → 합성 가능성 높음 |\n\
            | 합성 레시피 | ×5 | 실험적 검증됨 |\n\
            | 재료 수 | ×2 | 연구 관심도 |\n"
            .to_string(),
        Language::En => "📐 **Scoring Methodology**\n\n\
            | Factor | Weight | Rationale |\n\
            |--------|--------|----------|\n\
            | Stable phases | ×10 | E_hull ≈ 0 → high synthesizability |\n\
            | Synthesis recipes | ×5 | Experimentally verified |\n\
            | Materials count | ×2 | Research interest |\n"
            .to_string(),
    }
}

fn results_report(top: &[CandidateResult], language: Language) -> String {
    let ko = language == Language::Ko;

    if top.is_empty() {
        return if ko {
            "❌ 스크리닝 결과 후보를 찾지 못했습니다.\n\n가능한 원인:\n\
             - 해당 조합의 화합물이 데이터베이스에 없음\n- API 호출 제한"
                .to_string()
        } else {
            "❌ No candidates found in screening.\n\nPossible reasons:\n\
             - No compounds with this combination in database\n- API rate limiting"
                .to_string()
        };
    }

    let shown = top.len().min(RESULTS_SHOWN);
    let mut out = if ko {
        format!("📊 **스크리닝 결과** (상위 {}개)\n\n", shown)
    } else {
        format!("📊 **Screening Results** (Top {})\n\n", shown)
    };

    for (i, c) in top.iter().take(RESULTS_SHOWN).enumerate() {
        out.push_str(&format!("**{}. {}** (Score: {})\n", i + 1, c.elements.join("-"), c.score));
        if !c.known_phases.is_empty() {
            out.push_str(&format!(
                "   📌 {}: {}\n",
                if ko { "알려진 상" } else { "Known phases" },
                c.known_phases.join(", ")
            ));
        }
        if !c.reasoning.is_empty() {
            out.push_str(if ko { "   💡 근거:\n" } else { "   💡 Reasoning:\n" });
            for r in &c.reasoning {
                out.push_str(&format!("      • {}\n", r));
            }
        }
        out.push_str(&if ko {
            format!(
                "   📈 통계: MP {}개 | 안정상 {}개 | 레시피 {}개\n\n",
                c.materials_found, c.stable_phases, c.synthesis_recipes
            )
        } else {
            format!(
                "   📈 Stats: MP {} | Stable {} | Recipes {}\n\n",
                c.materials_found, c.stable_phases, c.synthesis_recipes
            )
        });
    }
    out
}

fn summary_report(top: &[CandidateResult], screened: usize, valid: usize, language: Language) -> String {
    let systems = top
        .iter()
        .take(TOP_SYSTEMS_SHOWN)
        .map(|c| c.elements.join("-"))
        .collect::<Vec<_>>()
        .join(", ");

    match language {
        Language::Ko => format!(
            "📋 **요약**\n\n- 스크리닝: {}개 조합\n- 유효 후보: {}개\n- 추천 시스템: {}",
            screened, valid, systems
        ),
        Language::En => format!(
            "📋 **Summary**\n\n- Screened: {} combinations\n- Valid candidates: {}\n- Top systems: {}",
            screened, valid, systems
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::materials::chemsys;
    use crate::models::{SynthesisRecipe, SynthesisType};

    #[derive(Debug, Default)]
    struct FakeSource {
        data: HashMap<String, Vec<MaterialSummary>>,
        failing: Vec<String>,
        slow: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, system: &str, phases: &[(&str, Option<f64>)]) -> Self {
            let materials = phases
                .iter()
                .map(|(formula, hull)| MaterialSummary {
                    material_id: None,
                    formula: formula.to_string(),
                    energy_above_hull: *hull,
                })
                .collect();
            self.data.insert(system.to_string(), materials);
            self
        }
    }

    #[async_trait]
    impl MaterialsSource for FakeSource {
        async fn search_by_elements(
            &self,
            elements: &[String],
            limit: usize,
        ) -> Result<Vec<MaterialSummary>, MaterialsError> {
            let system = chemsys(elements);
            self.calls.lock().unwrap().push(system.clone());
            if self.slow.contains(&system) {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            if self.failing.contains(&system) {
                return Err(MaterialsError::Network("connection reset".into()));
            }
            let mut found = self.data.get(&system).cloned().unwrap_or_default();
            found.truncate(limit);
            Ok(found)
        }
    }

    #[derive(Debug)]
    struct HangingSource;

    #[async_trait]
    impl MaterialsSource for HangingSource {
        async fn search_by_elements(
            &self,
            _elements: &[String],
            _limit: usize,
        ) -> Result<Vec<MaterialSummary>, MaterialsError> {
            std::future::pending().await
        }
    }

    /// Records the largest number of lookups running at once
    #[derive(Debug, Default)]
    struct InFlightSource {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MaterialsSource for InFlightSource {
        async fn search_by_elements(
            &self,
            _elements: &[String],
            _limit: usize,
        ) -> Result<Vec<MaterialSummary>, MaterialsError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn store(targets: &[&str]) -> Arc<RecipeStore> {
        let recipes = targets
            .iter()
            .enumerate()
            .map(|(i, target)| SynthesisRecipe {
                id: format!("r{}", i),
                doi: format!("10.1/{}", i),
                target_formula: target.to_string(),
                target_name: String::new(),
                precursors: Vec::new(),
                temperature_min: None,
                temperature_max: None,
                time_min: None,
                time_max: None,
                atmosphere: None,
                operations: Vec::new(),
                synthesis_type: SynthesisType::SolidState,
            })
            .collect();
        Arc::new(RecipeStore::from_recipes(recipes))
    }

    fn screener(source: FakeSource, store: Arc<RecipeStore>, config: ScreeningConfig) -> Screener {
        Screener::new(Arc::new(source), store, config, Duration::from_millis(200))
    }

    fn elements(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_score_weights() {
        assert_eq!(score(0, 0, 0), 0);
        assert_eq!(score(3, 1, 2), 3 * 2 + 10 + 2 * 5);
        assert_eq!(score(3, 2, 2) - score(3, 1, 2), 10);
        assert_eq!(score(3, 1, 3) - score(3, 1, 2), 5);
        assert_eq!(score(4, 1, 2) - score(3, 1, 2), 2);
    }

    #[test]
    fn test_rank_candidates_ties_keep_enumeration_order() {
        let candidate = |formula: &str, score: u32| CandidateResult {
            elements: Vec::new(),
            formula: formula.to_string(),
            materials_found: 0,
            stable_phases: 0,
            synthesis_recipes: 0,
            score,
            reasoning: Vec::new(),
            known_phases: Vec::new(),
        };
        let ranked = rank_candidates(vec![
            (3, candidate("d", 5)),
            (0, candidate("a", 5)),
            (2, candidate("c", 0)),
            (1, candidate("b", 12)),
        ]);
        let order: Vec<&str> = ranked.iter().map(|c| c.formula.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "d"]);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(220), "220");
        assert_eq!(group_thousands(2024), "2,024");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[tokio::test]
    async fn test_screen_combination_evidence() {
        let source = FakeSource::default().with(
            "Fe-Pt",
            &[("FePt", Some(0.0)), ("Fe3Pt", Some(0.01)), ("FePt3", Some(0.2)), ("FePt", None)],
        );
        let s = screener(source, store(&["FePt", "FePt nanoparticles", "CoPt"]), ScreeningConfig::default());

        let c = s.screen_combination(elements(&["Fe", "Pt"]), Language::En).await;
        assert_eq!(c.formula, "FePt");
        assert_eq!(c.materials_found, 4);
        assert_eq!(c.stable_phases, 2);
        assert_eq!(c.synthesis_recipes, 2);
        assert_eq!(c.score, 4 * 2 + 2 * 10 + 2 * 5);
        assert_eq!(c.known_phases, vec!["FePt", "Fe3Pt", "FePt3"]);
        assert!(c.reasoning.iter().any(|r| r.contains("noble metals")));
        assert!(c.reasoning.iter().any(|r| r.contains("magnetic")));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_zero_evidence() {
        let source = FakeSource {
            failing: vec!["Co-Fe".to_string()],
            ..FakeSource::default()
        };
        let s = screener(source, store(&["FeCo"]), ScreeningConfig::default());

        let c = s.screen_combination(elements(&["Fe", "Co"]), Language::En).await;
        assert_eq!(c.materials_found, 0);
        assert_eq!(c.synthesis_recipes, 1);
        assert_eq!(c.score, 5);
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let source = FakeSource {
            slow: vec!["Mo-W".to_string()],
            ..FakeSource::default()
        }
        .with("Mo-W", &[("MoW", Some(0.0))]);
        let s = screener(source, store(&[]), ScreeningConfig::default());

        let c = s.screen_combination(elements(&["W", "Mo"]), Language::Ko).await;
        assert_eq!(c.materials_found, 0);
        assert_eq!(c.score, 0);
        assert_eq!(c.reasoning, vec!["고융점 원소 포함 → 고온 구조재료 응용"]);
    }

    #[tokio::test]
    async fn test_conduct_research_report() {
        let source = FakeSource {
            failing: vec!["Fe-Ni".to_string()],
            ..FakeSource::default()
        }
        .with("Co-Fe", &[("FeCo", Some(0.0)), ("Fe3Co", Some(0.1))]);
        let s = screener(source, store(&["FeCo"]), ScreeningConfig::default());

        let response = s.conduct_research("Fe, Co, Ni binary alloys", Language::En).await;

        let kinds: Vec<StepKind> = response.steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![StepKind::Info, StepKind::Progress, StepKind::Info, StepKind::Result, StepKind::Summary]
        );
        assert!(response.steps[0].content.contains("Element group: Fe, Co, Ni (3)"));
        assert!(response.steps[0].content.contains("System: binary"));
        assert!(response.steps[1].content.contains("Screening 3 combinations"));

        assert_eq!(response.candidates.len(), 1);
        let top = &response.candidates[0];
        assert_eq!(top.elements, vec!["Fe", "Co"]);
        assert_eq!(top.score, 2 * 2 + 10 + 5);
        assert!(response.steps[3].content.contains("**1. Fe-Co** (Score: 19)"));
        assert!(response.steps[4].content.contains("Screened: 3 combinations"));
        assert!(response.steps[4].content.contains("Valid candidates: 1"));
    }

    #[tokio::test]
    async fn test_no_candidates_report() {
        let s = screener(FakeSource::default(), store(&[]), ScreeningConfig::default());
        let response = handle_request(
            &s,
            &ResearchRequest {
                message: "Cu Zn binary".to_string(),
                language: Language::Ko,
            },
        )
        .await;
        assert!(response.candidates.is_empty());
        assert!(response.steps[3].content.starts_with("❌"));
    }

    #[tokio::test]
    async fn test_sampling_is_capped_and_seeded() {
        let config = ScreeningConfig {
            max_screened: 7,
            seed: Some(42),
            ..ScreeningConfig::default()
        };

        let mut seen = Vec::new();
        for _ in 0..2 {
            let source = Arc::new(FakeSource::default());
            let s = Screener::new(source.clone(), store(&[]), config.clone(), Duration::from_millis(200));
            let response = s.conduct_research("ternary systems", Language::En).await;
            assert!(response.steps[0].content.contains("Total combinations: 220"));
            assert!(response.steps[4].content.contains("Screened: 7 combinations"));

            let mut calls = source.calls.lock().unwrap().clone();
            calls.sort();
            assert_eq!(calls.len(), 7);
            seen.push(calls);
        }
        assert_eq!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn test_top_n_limits_candidates() {
        let config = ScreeningConfig {
            top_n: 2,
            ..ScreeningConfig::default()
        };
        let s = screener(
            FakeSource::default(),
            store(&["FeCo", "FeNi", "CoNi", "FeCo"]),
            config,
        );
        let response = s.conduct_research("Fe Co Ni binary", Language::En).await;
        assert_eq!(response.candidates.len(), 2);
        assert_eq!(response.candidates[0].formula, "FeCo");
        assert_eq!(response.candidates[0].score, 10);
        assert_eq!(response.candidates[1].formula, "FeNi");
        assert!(response.steps[4].content.contains("Valid candidates: 3"));
    }

    #[tokio::test]
    async fn test_large_universe_is_sampled_by_rank() {
        let symbols = &crate::formula::ELEMENTS[..50];
        let message = format!("quinary screening of {}", symbols.join(" "));
        let config = ScreeningConfig {
            seed: Some(1),
            ..ScreeningConfig::default()
        };
        let source = Arc::new(FakeSource::default());
        let s = Screener::new(source.clone(), store(&[]), config, Duration::from_millis(200));

        let response = s.conduct_research(&message, Language::En).await;
        assert!(response.steps[0].content.contains("(50)"));
        assert!(response.steps[0].content.contains("System: 5-component"));
        assert!(response.steps[0].content.contains("Total combinations: 2,118,760"));
        assert!(response.steps[4].content.contains("Screened: 30 combinations"));

        let mut calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 30);
        calls.sort();
        calls.dedup();
        assert_eq!(calls.len(), 30);
        assert!(calls.iter().all(|system| system.split('-').count() == 5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_drops_pending_candidates() {
        let config = ScreeningConfig {
            deadline_secs: 1,
            ..ScreeningConfig::default()
        };
        let s = Screener::new(Arc::new(HangingSource), store(&["FeCo"]), config, Duration::from_secs(3600));

        let started = Instant::now();
        let results = s
            .screen_all(
                vec![(0, elements(&["Fe", "Co"])), (1, elements(&["Fe", "Ni"]))],
                Language::En,
            )
            .await;
        assert!(results.is_empty());
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_in_flight_stay_under_concurrency() {
        let config = ScreeningConfig {
            concurrency: 3,
            ..ScreeningConfig::default()
        };
        let source = Arc::new(InFlightSource::default());
        let s = Screener::new(source.clone(), store(&[]), config.clone(), Duration::from_secs(10));

        let universe = elements(&["Ti", "V", "Cr", "Mn", "Fe", "Co"]);
        let candidates = generate_combinations(&universe, 2).into_iter().enumerate().collect();
        let results = s.screen_all(candidates, Language::En).await;

        assert_eq!(results.len(), 15);
        assert_eq!(source.peak.load(Ordering::SeqCst), config.concurrency);
        assert_eq!(source.active.load(Ordering::SeqCst), 0);
    }
}
