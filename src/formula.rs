//! Chemical formula parsing and free-text heuristics
//!
//! The parser is a greedy tokenizer: at each position every two-letter
//! element symbol is tried before the one-letter symbols, so "Co" is cobalt
//! and never carbon followed by a stray "o". Anything that is not an element
//! symbol (parentheses, hydrate dots, lowercase noise) is skipped one
//! character at a time.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{MethodId, ParsedElement, ParsedFormula};

pub const ELEMENTS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
];

lazy_static! {
    static ref TWO_LETTER_ELEMENTS: Vec<&'static str> =
        ELEMENTS.iter().copied().filter(|e| e.len() == 2).collect();

    static ref TARGET_PATTERNS: Vec<Regex> = [
        // "synthesize X", "make X", "X 합성"
        r"(?i)(?:synthesize|합성|make|create|만들|prepare)\s+([A-Z][a-zA-Z0-9]+)",
        r"(?i)([A-Z][a-zA-Z0-9]+)\s*(?:synthesis|합성|alloy|합금|compound|화합물)",
        // bare formula
        r"\b([A-Z][a-z]?(?:\d*[A-Z][a-z]?)+\d*)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
}

pub fn is_element(symbol: &str) -> bool {
    ELEMENTS.iter().any(|el| *el == symbol)
}

/// Parse a chemical formula into an element multiset. Never fails; an input
/// without any recognizable symbol yields an empty element list.
pub fn parse_formula(formula: &str) -> ParsedFormula {
    let mut tokens: Vec<(&'static str, f64)> = Vec::new();
    let mut remaining = formula.trim();

    while !remaining.is_empty() {
        let symbol = TWO_LETTER_ELEMENTS
            .iter()
            .copied()
            .find(|el| remaining.starts_with(el))
            .or_else(|| {
                ELEMENTS
                    .iter()
                    .copied()
                    .filter(|el| el.len() == 1)
                    .find(|el| remaining.starts_with(el))
            });

        match symbol {
            Some(symbol) => {
                let (count, rest) = take_count(&remaining[symbol.len()..]);
                tokens.push((symbol, count.unwrap_or(1.0)));
                remaining = rest;
            }
            None => {
                let skip = remaining.chars().next().map_or(1, char::len_utf8);
                remaining = &remaining[skip..];
            }
        }
    }

    let mut elements: Vec<ParsedElement> = Vec::new();
    for (symbol, count) in tokens {
        match elements.iter_mut().find(|e| e.symbol == symbol) {
            Some(existing) => existing.count += count,
            None => elements.push(ParsedElement {
                symbol: symbol.to_string(),
                count,
            }),
        }
    }

    let unique_elements = elements.iter().map(|e| e.symbol.clone()).collect();
    ParsedFormula {
        formula: formula.to_string(),
        elements,
        unique_elements,
    }
}

/// Split a leading numeric literal ("2", "0.5", "3.") off `s`
fn take_count(s: &str) -> (Option<f64>, &str) {
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    if int_len == 0 {
        return (None, s);
    }

    let mut len = int_len;
    if s.as_bytes().get(len) == Some(&b'.') {
        len += 1;
        len += s[len..].bytes().take_while(u8::is_ascii_digit).count();
    }

    (s[..len].parse().ok(), &s[len..])
}

/// Best-effort extraction of the material a user wants to synthesize.
/// Returns the first phrase-pattern capture that parses into at least one
/// element.
pub fn extract_target_material(message: &str) -> Option<String> {
    TARGET_PATTERNS.iter().find_map(|pattern| {
        let candidate = pattern.captures(message)?.get(1)?.as_str();
        if parse_formula(candidate).unique_elements.is_empty() {
            None
        } else {
            Some(candidate.to_string())
        }
    })
}

const METHOD_KEYWORDS: &[(MethodId, &[&str])] = &[
    (
        MethodId::SolidState,
        &["solid state", "solid-state", "고상", "고상합성", "calcin", "sinter"],
    ),
    (
        MethodId::SolGel,
        &["sol-gel", "sol gel", "솔겔", "솔-겔", "citrate", "pechini"],
    ),
    (
        MethodId::Hydrothermal,
        &["hydrothermal", "수열", "autoclave", "solvothermal"],
    ),
    (
        MethodId::Solution,
        &["solution", "용액", "wet", "precipitation", "침전", "reduction", "환원"],
    ),
];

/// Detect a synthesis route mentioned anywhere in free text
pub fn detect_synthesis_method(message: &str) -> Option<MethodId> {
    let lower = message.to_lowercase();
    METHOD_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(method, _)| *method)
}

/// Interpret an answer to the method menu ("1".."4" or a method name)
pub fn parse_method_selection(input: &str) -> Option<MethodId> {
    let lower = input.trim().to_lowercase();

    match lower.as_str() {
        "1" => return Some(MethodId::SolidState),
        "2" => return Some(MethodId::SolGel),
        "3" => return Some(MethodId::Hydrothermal),
        "4" => return Some(MethodId::Solution),
        _ => {}
    }

    if lower.contains("solid") || lower.contains("고상") {
        Some(MethodId::SolidState)
    } else if lower.contains("solution") || lower.contains("용액") {
        Some(MethodId::Solution)
    } else if lower.contains("sol") || lower.contains("gel") || lower.contains("솔겔") || lower.contains("솔-겔") {
        Some(MethodId::SolGel)
    } else if lower.contains("hydro") || lower.contains("수열") {
        Some(MethodId::Hydrothermal)
    } else {
        None
    }
}

const ELEMENT_NAMES: &[(&str, &str)] = &[
    ("Li", "lithium"), ("Na", "sodium"), ("K", "potassium"),
    ("Co", "cobalt"), ("Ni", "nickel"), ("Fe", "iron"), ("Mn", "manganese"),
    ("Ti", "titanium"), ("V", "vanadium"), ("Cr", "chromium"),
    ("Cu", "copper"), ("Zn", "zinc"), ("Al", "aluminum"),
    ("O", "oxide"), ("S", "sulfide"), ("N", "nitride"),
    ("Ir", "iridium"), ("Ru", "ruthenium"), ("Pt", "platinum"), ("Pd", "palladium"),
    ("Au", "gold"), ("Ag", "silver"),
    ("Ba", "barium"), ("Sr", "strontium"), ("Ca", "calcium"),
    ("La", "lanthanum"), ("Ce", "cerium"), ("Y", "yttrium"),
];

/// Readable material name, e.g. ["Li", "Co", "O"] -> "lithium cobalt oxide"
pub fn material_name(elements: &[String]) -> String {
    elements
        .iter()
        .map(|el| {
            ELEMENT_NAMES
                .iter()
                .find(|(symbol, _)| symbol == el)
                .map_or_else(|| el.to_lowercase(), |(_, name)| name.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(parsed: &ParsedFormula) -> Vec<(&str, f64)> {
        parsed
            .elements
            .iter()
            .map(|e| (e.symbol.as_str(), e.count))
            .collect()
    }

    #[test]
    fn test_parse_simple_formula() {
        let parsed = parse_formula("Fe2O3");
        assert_eq!(counts(&parsed), vec![("Fe", 2.0), ("O", 3.0)]);
        assert_eq!(parsed.unique_elements, vec!["Fe", "O"]);
        assert_eq!(parsed.formula, "Fe2O3");
    }

    #[test]
    fn test_repeated_symbols_are_merged() {
        let parsed = parse_formula("FeFeO");
        assert_eq!(counts(&parsed), vec![("Fe", 2.0), ("O", 1.0)]);

        let parsed = parse_formula("CH3COOH");
        assert_eq!(parsed.count_of("C"), Some(2.0));
        assert_eq!(parsed.count_of("H"), Some(4.0));
        assert_eq!(parsed.count_of("O"), Some(2.0));
        assert_eq!(parsed.unique_elements.len(), 3);
    }

    #[test]
    fn test_two_letter_symbols_win() {
        let parsed = parse_formula("Co");
        assert_eq!(counts(&parsed), vec![("Co", 1.0)]);

        let parsed = parse_formula("LiCoO2");
        assert_eq!(counts(&parsed), vec![("Li", 1.0), ("Co", 1.0), ("O", 2.0)]);

        // uppercase "CO" is carbon monoxide
        let parsed = parse_formula("CO");
        assert_eq!(counts(&parsed), vec![("C", 1.0), ("O", 1.0)]);
    }

    #[test]
    fn test_decimal_counts_and_noise() {
        let parsed = parse_formula("Li0.5Mn2O4");
        assert_eq!(parsed.count_of("Li"), Some(0.5));

        let parsed = parse_formula("Mg(NO3)2·6H2O");
        assert_eq!(parsed.unique_elements, vec!["Mg", "N", "O", "H"]);

        let parsed = parse_formula("  (..)  ");
        assert!(parsed.elements.is_empty());
        assert!(parsed.unique_elements.is_empty());

        let parsed = parse_formula("");
        assert!(parsed.elements.is_empty());
    }

    #[test]
    fn test_extract_target_material() {
        assert_eq!(
            extract_target_material("How do I synthesize LiCoO2 at home?").as_deref(),
            Some("LiCoO2")
        );
        assert_eq!(
            extract_target_material("BaTiO3 합성 방법 알려줘").as_deref(),
            Some("BaTiO3")
        );
        assert_eq!(
            extract_target_material("I need an IrRuNi alloy").as_deref(),
            Some("IrRuNi")
        );
        assert_eq!(extract_target_material("hello there"), None);
    }

    #[test]
    fn test_detect_synthesis_method() {
        assert_eq!(detect_synthesis_method("use Sol-Gel please"), Some(MethodId::SolGel));
        assert_eq!(detect_synthesis_method("in an autoclave"), Some(MethodId::Hydrothermal));
        assert_eq!(detect_synthesis_method("고상 합성으로"), Some(MethodId::SolidState));
        assert_eq!(detect_synthesis_method("LiCoO2"), None);
    }

    #[test]
    fn test_parse_method_selection() {
        assert_eq!(parse_method_selection(" 3 "), Some(MethodId::Hydrothermal));
        assert_eq!(parse_method_selection("solution please"), Some(MethodId::Solution));
        assert_eq!(parse_method_selection("sol-gel"), Some(MethodId::SolGel));
        assert_eq!(parse_method_selection("solid"), Some(MethodId::SolidState));
        assert_eq!(parse_method_selection("whatever"), None);
    }

    #[test]
    fn test_material_name() {
        let elements: Vec<String> = ["Li", "Co", "O", "Xe"].iter().map(|s| s.to_string()).collect();
        assert_eq!(material_name(&elements), "lithium cobalt oxide xe");
    }
}
