//! Element-subset enumeration and research-query parsing

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::formula::is_element;
use crate::models::Language;

pub const COMMON_TRANSITION_METALS: &[&str] = &[
    "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Zr", "Nb", "Mo", "Ru", "Rh", "Pd", "Ag",
    "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au",
];

pub const NOBLE_METALS: &[&str] = &["Ru", "Rh", "Pd", "Os", "Ir", "Pt", "Au", "Ag"];
pub const ALKALI_METALS: &[&str] = &["Li", "Na", "K", "Rb", "Cs"];
pub const ALKALINE_EARTH_METALS: &[&str] = &["Be", "Mg", "Ca", "Sr", "Ba"];
pub const LANTHANIDES: &[&str] = &[
    "La", "Ce", "Pr", "Nd", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
];

/// Size of the transition-metal universe used when a query names no elements
pub const DEFAULT_UNIVERSE_SIZE: usize = 12;
pub const DEFAULT_SYSTEM_SIZE: usize = 3;

lazy_static! {
    static ref BAND_GAP: Option<Regex> =
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*[-~]\s*(\d+(?:\.\d+)?)\s*eV").ok();
}

/// All `k`-element subsets of `items`, in lexicographic order of positions
pub fn generate_combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    fn combine<T: Clone>(items: &[T], k: usize, start: usize, current: &mut Vec<T>, out: &mut Vec<Vec<T>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..items.len() {
            current.push(items[i].clone());
            combine(items, k, i + 1, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if k <= items.len() {
        combine(items, k, 0, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

/// C(n, r) by the multiplicative formula, exact in integers and saturating
/// at `u64::MAX`
pub fn combination_count(n: usize, r: usize) -> u64 {
    if r > n {
        return 0;
    }
    let r = r.min(n - r);
    let mut result: u128 = 1;
    for i in 0..r {
        // C(n, i) * (n - i) is always divisible by i + 1
        result = match result.checked_mul((n - i) as u128) {
            Some(product) => product / (i + 1) as u128,
            None => return u64::MAX,
        };
    }
    u64::try_from(result).unwrap_or(u64::MAX)
}

/// The subset at position `rank` of `generate_combinations(items, k)`,
/// built without enumerating the ones before it
pub fn unrank_combination<T: Clone>(items: &[T], k: usize, mut rank: u64) -> Option<Vec<T>> {
    let n = items.len();
    if rank >= combination_count(n, k) {
        return None;
    }

    let mut subset = Vec::with_capacity(k);
    let mut next = 0;
    for slot in 0..k {
        let after = k - slot - 1;
        loop {
            if next >= n {
                return None;
            }
            // subsets that take items[next] at this slot
            let block = combination_count(n - next - 1, after);
            if rank < block {
                break;
            }
            rank -= block;
            next += 1;
        }
        subset.push(items[next].clone());
        next += 1;
    }
    Some(subset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementGroup {
    TransitionMetals,
    NobleMetals,
    Alkali,
    AlkalineEarth,
    Lanthanides,
}

impl ElementGroup {
    pub fn elements(self) -> &'static [&'static str] {
        match self {
            ElementGroup::TransitionMetals => COMMON_TRANSITION_METALS,
            ElementGroup::NobleMetals => NOBLE_METALS,
            ElementGroup::Alkali => ALKALI_METALS,
            ElementGroup::AlkalineEarth => ALKALINE_EARTH_METALS,
            ElementGroup::Lanthanides => LANTHANIDES,
        }
    }

    pub fn name(self, language: Language) -> &'static str {
        let ko = language == Language::Ko;
        match self {
            ElementGroup::TransitionMetals => if ko { "전이금속" } else { "transition metals" },
            ElementGroup::NobleMetals => if ko { "귀금속" } else { "noble metals" },
            ElementGroup::Alkali => if ko { "알칼리 금속" } else { "alkali metals" },
            ElementGroup::AlkalineEarth => if ko { "알칼리 토금속" } else { "alkaline-earth metals" },
            ElementGroup::Lanthanides => if ko { "란탄족" } else { "lanthanides" },
        }
    }
}

/// Detect a named element group in a query
pub fn parse_element_group(query: &str) -> Option<ElementGroup> {
    let q = query.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| q.contains(k));

    if has(&["전이금속", "transition metal"]) {
        Some(ElementGroup::TransitionMetals)
    } else if has(&["귀금속", "noble metal", "백금족"]) {
        Some(ElementGroup::NobleMetals)
    } else if has(&["알칼리", "alkali"]) {
        if has(&["토", "earth"]) {
            Some(ElementGroup::AlkalineEarth)
        } else {
            Some(ElementGroup::Alkali)
        }
    } else if has(&["란탄", "희토류", "lanthanide", "rare earth"]) {
        Some(ElementGroup::Lanthanides)
    } else {
        None
    }
}

/// Number of elements per candidate system, default ternary
pub fn parse_system_size(query: &str) -> usize {
    let q = query.to_lowercase();
    let sizes: [(usize, &[&str]); 4] = [
        (2, &["2원", "이원", "binary"]),
        (3, &["3원", "삼원", "ternary"]),
        (4, &["4원", "사원", "quaternary"]),
        (5, &["5원", "오원", "quinary"]),
    ];
    sizes
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| q.contains(k)))
        .map_or(DEFAULT_SYSTEM_SIZE, |(size, _)| *size)
}

pub fn system_name(size: usize, language: Language) -> String {
    let ko = language == Language::Ko;
    match size {
        2 => (if ko { "2원계" } else { "binary" }).to_string(),
        3 => (if ko { "3원계" } else { "ternary" }).to_string(),
        4 => (if ko { "4원계" } else { "quaternary" }).to_string(),
        n => format!("{}-component", n),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Application {
    Battery,
    Catalyst,
    Superconductor,
    Thermoelectric,
    Magnetic,
}

impl Application {
    pub fn as_str(self) -> &'static str {
        match self {
            Application::Battery => "battery",
            Application::Catalyst => "catalyst",
            Application::Superconductor => "superconductor",
            Application::Thermoelectric => "thermoelectric",
            Application::Magnetic => "magnetic",
        }
    }
}

const APPLICATION_KEYWORDS: [(Application, [&str; 2]); 5] = [
    (Application::Battery, ["배터리", "battery"]),
    (Application::Catalyst, ["촉매", "catalyst"]),
    (Application::Superconductor, ["초전도", "superconductor"]),
    (Application::Thermoelectric, ["열전", "thermoelectric"]),
    (Application::Magnetic, ["자성", "magnetic"]),
];

/// Structured reading of a free-text research request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchQuery {
    pub group: Option<ElementGroup>,
    /// Element symbols written out in the query, validated and de-duplicated
    pub mentioned_elements: Vec<String>,
    pub system_size: usize,
    pub band_gap: Option<(f64, f64)>,
    pub stable: bool,
    pub application: Option<Application>,
}

impl ResearchQuery {
    /// The element universe to enumerate: the named group, else the
    /// mentioned symbols, else the default transition-metal subset
    pub fn universe(&self) -> Vec<String> {
        let symbols: &[&str] = match self.group {
            Some(group) => group.elements(),
            None if !self.mentioned_elements.is_empty() => return self.mentioned_elements.clone(),
            None => &COMMON_TRANSITION_METALS[..DEFAULT_UNIVERSE_SIZE],
        };
        symbols.iter().map(|s| s.to_string()).collect()
    }

    pub fn universe_name(&self, language: Language) -> String {
        match self.group {
            Some(group) => group.name(language).to_string(),
            None if !self.mentioned_elements.is_empty() => self.mentioned_elements.join(", "),
            None if language == Language::Ko => "주요 전이금속".to_string(),
            None => "common transition metals".to_string(),
        }
    }
}

/// Standalone element symbols: an uppercase letter plus an optional
/// lowercase one, with no ASCII word character on either side
fn mentioned_elements(message: &str) -> Vec<String> {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut found: Vec<String> = Vec::new();
    let mut before: Option<char> = None;
    let mut chars = message.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !c.is_ascii_uppercase() {
            before = Some(c);
            continue;
        }

        let mut end = start + 1;
        let mut last = c;
        if let Some(&(i, next)) = chars.peek() {
            if next.is_ascii_lowercase() {
                chars.next();
                end = i + 1;
                last = next;
            }
        }

        let after = chars.peek().map(|&(_, next)| next);
        let standalone = !before.is_some_and(is_word) && !after.is_some_and(is_word);
        before = Some(last);

        let symbol = &message[start..end];
        if standalone && is_element(symbol) && !found.iter().any(|s| s == symbol) {
            found.push(symbol.to_string());
        }
    }

    found
}

pub fn parse_research_query(message: &str) -> ResearchQuery {
    let lower = message.to_lowercase();

    let band_gap = BAND_GAP.as_ref().and_then(|re| re.captures(message)).and_then(|cap| {
        let low = cap[1].parse().ok()?;
        let high = cap[2].parse().ok()?;
        Some((low, high))
    });

    // the last keyword in table order wins
    let application = APPLICATION_KEYWORDS
        .iter()
        .filter(|(_, keys)| keys.iter().any(|k| lower.contains(k)))
        .map(|(app, _)| *app)
        .last();

    ResearchQuery {
        group: parse_element_group(message),
        mentioned_elements: mentioned_elements(message),
        system_size: parse_system_size(message),
        band_gap,
        stable: lower.contains("안정") || lower.contains("stable"),
        application,
    }
}
