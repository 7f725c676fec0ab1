//! Precursor knowledge base: element symbol -> candidate starting compounds
//!
//! Precursor choice depends on the route (carbonates decompose cleanly in
//! solid-state firing, nitrates dissolve for sol-gel), so each entry lists the
//! methods it suits, most preferred first. Entry order within an element is
//! the tie-break.

use crate::models::{MethodId, PrecursorInfo, PrecursorKind};
use crate::models::MethodId::{Hydrothermal, SolGel, SolidState, Solution};
use crate::models::PrecursorKind::{Carbonate, Chloride, Hydroxide, Nitrate, Organic, Oxide};

const fn p(
    formula: &'static str,
    name: &'static str,
    kind: PrecursorKind,
    preferred_for: &'static [MethodId],
) -> PrecursorInfo {
    PrecursorInfo {
        formula,
        name,
        kind,
        preferred_for,
    }
}

static PRECURSORS: &[(&str, &[PrecursorInfo])] = &[
    // Alkali metals
    ("Li", &[
        p("Li2CO3", "lithium carbonate", Carbonate, &[SolidState]),
        p("LiOH·H2O", "lithium hydroxide monohydrate", Hydroxide, &[SolGel, Solution]),
        p("LiNO3", "lithium nitrate", Nitrate, &[SolGel]),
        p("Li2O", "lithium oxide", Oxide, &[SolidState]),
    ]),
    ("Na", &[
        p("Na2CO3", "sodium carbonate", Carbonate, &[SolidState]),
        p("NaOH", "sodium hydroxide", Hydroxide, &[Hydrothermal, Solution]),
        p("NaNO3", "sodium nitrate", Nitrate, &[SolGel]),
    ]),
    ("K", &[
        p("K2CO3", "potassium carbonate", Carbonate, &[SolidState]),
        p("KOH", "potassium hydroxide", Hydroxide, &[Hydrothermal, Solution]),
        p("KNO3", "potassium nitrate", Nitrate, &[SolGel]),
    ]),
    // Alkaline earth metals
    ("Mg", &[
        p("MgO", "magnesium oxide", Oxide, &[SolidState]),
        p("Mg(NO3)2·6H2O", "magnesium nitrate hexahydrate", Nitrate, &[SolGel]),
        p("MgCl2", "magnesium chloride", Chloride, &[Hydrothermal, Solution]),
    ]),
    ("Ca", &[
        p("CaCO3", "calcium carbonate", Carbonate, &[SolidState]),
        p("Ca(NO3)2·4H2O", "calcium nitrate tetrahydrate", Nitrate, &[SolGel]),
        p("CaO", "calcium oxide", Oxide, &[SolidState]),
    ]),
    ("Sr", &[
        p("SrCO3", "strontium carbonate", Carbonate, &[SolidState]),
        p("Sr(NO3)2", "strontium nitrate", Nitrate, &[SolGel]),
    ]),
    ("Ba", &[
        p("BaCO3", "barium carbonate", Carbonate, &[SolidState]),
        p("Ba(NO3)2", "barium nitrate", Nitrate, &[SolGel]),
    ]),
    // 3d transition metals
    ("Ti", &[
        p("TiO2", "titanium dioxide", Oxide, &[SolidState]),
        p("Ti(OC4H9)4", "titanium butoxide", Organic, &[SolGel]),
        p("TiCl4", "titanium tetrachloride", Chloride, &[Hydrothermal]),
    ]),
    ("V", &[
        p("V2O5", "vanadium pentoxide", Oxide, &[SolidState]),
        p("NH4VO3", "ammonium metavanadate", Nitrate, &[SolGel, Hydrothermal]),
    ]),
    ("Cr", &[
        p("Cr2O3", "chromium oxide", Oxide, &[SolidState]),
        p("Cr(NO3)3·9H2O", "chromium nitrate nonahydrate", Nitrate, &[SolGel]),
    ]),
    ("Mn", &[
        p("MnO2", "manganese dioxide", Oxide, &[SolidState]),
        p("Mn(NO3)2·4H2O", "manganese nitrate tetrahydrate", Nitrate, &[SolGel]),
        p("MnCl2·4H2O", "manganese chloride tetrahydrate", Chloride, &[Hydrothermal, Solution]),
        p("Mn(CH3COO)2", "manganese acetate", Organic, &[SolGel]),
    ]),
    ("Fe", &[
        p("Fe2O3", "iron(III) oxide", Oxide, &[SolidState]),
        p("Fe(NO3)3·9H2O", "iron nitrate nonahydrate", Nitrate, &[SolGel]),
        p("FeCl3·6H2O", "iron chloride hexahydrate", Chloride, &[Hydrothermal, Solution]),
        p("FeC2O4·2H2O", "iron oxalate dihydrate", Organic, &[SolidState]),
    ]),
    ("Co", &[
        p("Co3O4", "cobalt oxide", Oxide, &[SolidState]),
        p("Co(NO3)2·6H2O", "cobalt nitrate hexahydrate", Nitrate, &[SolGel]),
        p("CoCl2·6H2O", "cobalt chloride hexahydrate", Chloride, &[Hydrothermal, Solution]),
        p("Co(CH3COO)2", "cobalt acetate", Organic, &[SolGel]),
    ]),
    ("Ni", &[
        p("NiO", "nickel oxide", Oxide, &[SolidState]),
        p("Ni(NO3)2·6H2O", "nickel nitrate hexahydrate", Nitrate, &[SolGel]),
        p("NiCl2·6H2O", "nickel chloride hexahydrate", Chloride, &[Hydrothermal, Solution]),
        p("Ni(CH3COO)2", "nickel acetate", Organic, &[SolGel]),
    ]),
    ("Cu", &[
        p("CuO", "copper oxide", Oxide, &[SolidState]),
        p("Cu(NO3)2·3H2O", "copper nitrate trihydrate", Nitrate, &[SolGel]),
        p("CuCl2·2H2O", "copper chloride dihydrate", Chloride, &[Hydrothermal, Solution]),
        p("Cu(CH3COO)2", "copper acetate", Organic, &[SolGel]),
    ]),
    ("Zn", &[
        p("ZnO", "zinc oxide", Oxide, &[SolidState]),
        p("Zn(NO3)2·6H2O", "zinc nitrate hexahydrate", Nitrate, &[SolGel]),
        p("ZnCl2", "zinc chloride", Chloride, &[Hydrothermal, Solution]),
        p("Zn(CH3COO)2", "zinc acetate", Organic, &[SolGel]),
    ]),
    // 4d/5d transition metals, platinum group
    ("Zr", &[
        p("ZrO2", "zirconium dioxide", Oxide, &[SolidState]),
        p("Zr(NO3)4·5H2O", "zirconium nitrate", Nitrate, &[SolGel]),
        p("ZrOCl2·8H2O", "zirconium oxychloride", Chloride, &[Hydrothermal]),
    ]),
    ("Nb", &[
        p("Nb2O5", "niobium pentoxide", Oxide, &[SolidState]),
        p("NbCl5", "niobium pentachloride", Chloride, &[Hydrothermal]),
    ]),
    ("Mo", &[
        p("MoO3", "molybdenum trioxide", Oxide, &[SolidState]),
        p("(NH4)6Mo7O24", "ammonium heptamolybdate", Nitrate, &[SolGel, Hydrothermal]),
    ]),
    ("Ru", &[
        p("RuO2", "ruthenium dioxide", Oxide, &[SolidState]),
        p("RuCl3·xH2O", "ruthenium chloride hydrate", Chloride, &[Hydrothermal, Solution]),
        p("Ru(NO)(NO3)3", "ruthenium nitrosyl nitrate", Nitrate, &[SolGel]),
    ]),
    ("Rh", &[
        p("Rh2O3", "rhodium oxide", Oxide, &[SolidState]),
        p("RhCl3·xH2O", "rhodium chloride hydrate", Chloride, &[Solution]),
    ]),
    ("Pd", &[
        p("PdO", "palladium oxide", Oxide, &[SolidState]),
        p("PdCl2", "palladium chloride", Chloride, &[Solution]),
        p("Pd(NO3)2", "palladium nitrate", Nitrate, &[SolGel]),
    ]),
    ("Ag", &[
        p("Ag2O", "silver oxide", Oxide, &[SolidState]),
        p("AgNO3", "silver nitrate", Nitrate, &[SolGel, Solution]),
    ]),
    ("W", &[
        p("WO3", "tungsten trioxide", Oxide, &[SolidState]),
        p("(NH4)2WO4", "ammonium tungstate", Nitrate, &[SolGel, Hydrothermal]),
    ]),
    ("Re", &[
        p("Re2O7", "rhenium heptoxide", Oxide, &[SolidState]),
        p("NH4ReO4", "ammonium perrhenate", Nitrate, &[SolGel]),
    ]),
    ("Os", &[
        p("OsO2", "osmium dioxide", Oxide, &[SolidState]),
        p("OsCl3", "osmium trichloride", Chloride, &[Solution]),
    ]),
    ("Ir", &[
        p("IrO2", "iridium dioxide", Oxide, &[SolidState]),
        p("IrCl3·xH2O", "iridium chloride hydrate", Chloride, &[Hydrothermal, Solution]),
        p("H2IrCl6", "hexachloroiridic acid", Chloride, &[Solution]),
    ]),
    ("Pt", &[
        p("PtO2", "platinum dioxide", Oxide, &[SolidState]),
        p("H2PtCl6", "hexachloroplatinic acid", Chloride, &[Solution]),
        p("Pt(NH3)4Cl2", "tetraammineplatinum chloride", Chloride, &[Hydrothermal]),
    ]),
    ("Au", &[
        p("HAuCl4", "chloroauric acid", Chloride, &[Solution]),
        p("Au2O3", "gold oxide", Oxide, &[SolidState]),
    ]),
    // Lanthanides and Y
    ("La", &[
        p("La2O3", "lanthanum oxide", Oxide, &[SolidState]),
        p("La(NO3)3·6H2O", "lanthanum nitrate hexahydrate", Nitrate, &[SolGel]),
    ]),
    ("Ce", &[
        p("CeO2", "cerium dioxide", Oxide, &[SolidState]),
        p("Ce(NO3)3·6H2O", "cerium nitrate hexahydrate", Nitrate, &[SolGel]),
    ]),
    ("Y", &[
        p("Y2O3", "yttrium oxide", Oxide, &[SolidState]),
        p("Y(NO3)3·6H2O", "yttrium nitrate hexahydrate", Nitrate, &[SolGel]),
    ]),
    ("Nd", &[
        p("Nd2O3", "neodymium oxide", Oxide, &[SolidState]),
        p("Nd(NO3)3·6H2O", "neodymium nitrate hexahydrate", Nitrate, &[SolGel]),
    ]),
    ("Sm", &[
        p("Sm2O3", "samarium oxide", Oxide, &[SolidState]),
        p("Sm(NO3)3·6H2O", "samarium nitrate hexahydrate", Nitrate, &[SolGel]),
    ]),
    ("Gd", &[
        p("Gd2O3", "gadolinium oxide", Oxide, &[SolidState]),
        p("Gd(NO3)3·6H2O", "gadolinium nitrate hexahydrate", Nitrate, &[SolGel]),
    ]),
    // Main group
    ("Al", &[
        p("Al2O3", "aluminum oxide", Oxide, &[SolidState]),
        p("Al(NO3)3·9H2O", "aluminum nitrate nonahydrate", Nitrate, &[SolGel]),
        p("Al(OC4H9)3", "aluminum butoxide", Organic, &[SolGel]),
    ]),
    ("Si", &[
        p("SiO2", "silicon dioxide", Oxide, &[SolidState]),
        p("Si(OC2H5)4", "tetraethyl orthosilicate (TEOS)", Organic, &[SolGel]),
    ]),
    ("Sn", &[
        p("SnO2", "tin dioxide", Oxide, &[SolidState]),
        p("SnCl4·5H2O", "tin chloride pentahydrate", Chloride, &[Hydrothermal, Solution]),
    ]),
    ("Pb", &[
        p("PbO", "lead oxide", Oxide, &[SolidState]),
        p("Pb(NO3)2", "lead nitrate", Nitrate, &[SolGel]),
        p("Pb(CH3COO)2", "lead acetate", Organic, &[SolGel]),
    ]),
    ("Bi", &[
        p("Bi2O3", "bismuth oxide", Oxide, &[SolidState]),
        p("Bi(NO3)3·5H2O", "bismuth nitrate pentahydrate", Nitrate, &[SolGel]),
    ]),
    // Non-metal additives
    ("P", &[
        p("NH4H2PO4", "ammonium dihydrogen phosphate", Nitrate, &[SolidState, SolGel]),
        p("H3PO4", "phosphoric acid", Oxide, &[SolGel]),
    ]),
    ("S", &[
        p("Na2S", "sodium sulfide", Oxide, &[Hydrothermal]),
        p("thiourea", "thiourea", Organic, &[Hydrothermal, Solution]),
    ]),
    ("C", &[
        p("citric acid", "citric acid", Organic, &[SolGel]),
        p("sucrose", "sucrose", Organic, &[SolGel]),
    ]),
    ("N", &[
        p("NH4NO3", "ammonium nitrate", Nitrate, &[SolGel]),
        p("urea", "urea", Organic, &[Hydrothermal]),
    ]),
];

fn entries(element: &str) -> &'static [PrecursorInfo] {
    PRECURSORS
        .iter()
        .find(|(symbol, _)| *symbol == element)
        .map(|(_, list)| *list)
        .unwrap_or(&[])
}

/// Precursors of `element` suitable for `method`, most preferred first
pub fn get_precursors(element: &str, method: MethodId) -> Vec<&'static PrecursorInfo> {
    let mut matches: Vec<(usize, &'static PrecursorInfo)> = entries(element)
        .iter()
        .filter_map(|info| {
            info.preferred_for
                .iter()
                .position(|m| *m == method)
                .map(|rank| (rank, info))
        })
        .collect();

    // stable: catalog order breaks ties
    matches.sort_by_key(|(rank, _)| *rank);
    matches.into_iter().map(|(_, info)| info).collect()
}

pub fn best_precursor(element: &str, method: MethodId) -> Option<&'static PrecursorInfo> {
    get_precursors(element, method).into_iter().next()
}

pub fn has_element(element: &str) -> bool {
    !entries(element).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formulas(list: &[&PrecursorInfo]) -> Vec<&'static str> {
        list.iter().map(|p| p.formula).collect()
    }

    #[test]
    fn test_precursors_filtered_by_method() {
        let solid = get_precursors("Li", SolidState);
        assert_eq!(formulas(&solid), vec!["Li2CO3", "Li2O"]);

        let sol_gel = get_precursors("Li", SolGel);
        assert_eq!(formulas(&sol_gel), vec!["LiOH·H2O", "LiNO3"]);

        assert!(get_precursors("Li", Hydrothermal).is_empty());
    }

    #[test]
    fn test_preference_rank_orders_results() {
        // V: NH4VO3 lists hydrothermal second, still the only hydrothermal choice
        let hydro = get_precursors("V", Hydrothermal);
        assert_eq!(formulas(&hydro), vec!["NH4VO3"]);

        // Ir: IrCl3 has solution at rank 1, H2IrCl6 at rank 0
        let solution = get_precursors("Ir", Solution);
        assert_eq!(formulas(&solution), vec!["H2IrCl6", "IrCl3·xH2O"]);
    }

    #[test]
    fn test_best_precursor() {
        assert_eq!(best_precursor("Co", SolidState).map(|p| p.formula), Some("Co3O4"));
        assert_eq!(best_precursor("Au", Solution).map(|p| p.formula), Some("HAuCl4"));
        assert!(best_precursor("Ba", Hydrothermal).is_none());
        assert!(best_precursor("Xe", SolidState).is_none());
    }

    #[test]
    fn test_has_element() {
        assert!(has_element("Fe"));
        assert!(has_element("N"));
        assert!(!has_element("O"));
        assert!(!has_element("Xe"));
    }
}
