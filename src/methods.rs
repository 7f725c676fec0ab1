//! Synthesis method catalog: the four supported routes with their condition
//! ranges, ordered procedure templates, equipment and notes.

use crate::models::{MethodConditions, MethodId, SynthesisMethod, SynthesisStep, Text};

/// Metals that oxidize during high-temperature firing unless reduced
pub const NOBLE_METALS: &[&str] = &["Au", "Pt", "Pd", "Ag", "Ir", "Ru", "Rh", "Os"];

pub const REDUCING_ATMOSPHERE: &str = "Ar/H2 (5%)";

const fn step(name: &'static str, description: Text) -> SynthesisStep {
    SynthesisStep {
        name,
        description,
        temperature: None,
        time: None,
        atmosphere: None,
        details: None,
    }
}

impl SynthesisStep {
    const fn temperature(mut self, temperature: &'static str) -> Self {
        self.temperature = Some(temperature);
        self
    }

    const fn time(mut self, time: &'static str) -> Self {
        self.time = Some(time);
        self
    }

    const fn atmosphere(mut self, atmosphere: &'static str) -> Self {
        self.atmosphere = Some(atmosphere);
        self
    }

    const fn details(mut self, details: Text) -> Self {
        self.details = Some(details);
        self
    }
}

static METHODS: [SynthesisMethod; 4] = [
    SynthesisMethod {
        id: MethodId::SolidState,
        name: Text::new("Solid-State", "고상 합성"),
        description: Text::new(
            "High-temperature sintering of solid precursors",
            "고체 전구체의 고온 소결 반응",
        ),
        conditions: MethodConditions {
            temperature_range: (800.0, 1400.0),
            time_range: (6.0, 48.0),
            atmosphere: &["air", "Ar", "N2", "Ar/H2 (5%)", "O2"],
            pressure: None,
        },
        steps: &[
            step("weighing", Text::new(
                "Weigh precursors in stoichiometric ratio",
                "화학양론비에 맞게 전구체 칭량",
            )),
            step("mixing", Text::new("Ball mill with grinding media", "볼밀로 균일하게 혼합"))
                .time("4-6h")
                .details(Text::new(
                    "Use ethanol or acetone as mixing medium. Agate or ZrO2 balls recommended.",
                    "에탄올 또는 아세톤을 혼합 매질로 사용. 마노 또는 ZrO2 볼 권장.",
                )),
            step("drying", Text::new("Dry the mixture", "혼합물 건조"))
                .temperature("80-100°C")
                .time("overnight"),
            step("calcining", Text::new(
                "Pre-calcine to decompose carbonates/nitrates",
                "탄산염/질산염 분해를 위한 1차 하소",
            ))
            .temperature("500-700°C")
            .time("2-4h")
            .atmosphere("air"),
            step("regrinding", Text::new("Regrind and pelletize", "재분쇄 후 펠렛 성형"))
                .details(Text::new(
                    "Press into pellets at 100-200 MPa for better contact.",
                    "100-200 MPa로 가압하여 펠렛 성형.",
                )),
            step("sintering", Text::new("Final sintering at high temperature", "고온에서 최종 소결"))
                .temperature("900-1200°C")
                .time("12-24h"),
            step("cooling", Text::new("Cool to room temperature", "상온까지 서냉"))
                .details(Text::new(
                    "Cool at 2-5°C/min to prevent cracking.",
                    "균열 방지를 위해 2-5°C/분으로 서냉.",
                )),
        ],
        equipment: &["Ball mill", "Muffle furnace", "Pellet press", "Mortar & pestle"],
        advantages: &[
            Text::new("Simple setup", "간단한 장비"),
            Text::new("Scalable", "대량 합성 가능"),
            Text::new("No solvents", "용매 불필요"),
            Text::new("High purity", "고순도"),
        ],
        suitable_for: &[
            Text::new("Bulk ceramics", "벌크 세라믹"),
            Text::new("Oxides", "산화물"),
            Text::new("Battery materials", "배터리 재료"),
            Text::new("Solid electrolytes", "고체 전해질"),
        ],
        reducing_required: false,
    },
    SynthesisMethod {
        id: MethodId::SolGel,
        name: Text::new("Sol-Gel", "솔-겔"),
        description: Text::new(
            "Solution-based synthesis through gel formation",
            "겔 형성을 통한 용액 기반 합성",
        ),
        conditions: MethodConditions {
            temperature_range: (400.0, 800.0),
            time_range: (2.0, 12.0),
            atmosphere: &["air", "N2"],
            pressure: None,
        },
        steps: &[
            step("dissolution", Text::new(
                "Dissolve metal precursors in water/ethanol",
                "금속 전구체를 물/에탄올에 용해",
            ))
            .details(Text::new(
                "Heat gently if needed. Ensure complete dissolution.",
                "필요시 가열. 완전 용해 확인.",
            )),
            step("chelation", Text::new("Add chelating agent", "킬레이트제 첨가"))
                .details(Text::new(
                    "Use citric acid (molar ratio metal:citric = 1:1.5-2) or EDTA. Stir until clear.",
                    "구연산 (금속:구연산 = 1:1.5-2 몰비) 또는 EDTA 사용. 투명해질 때까지 교반.",
                )),
            step("pH-adjustment", Text::new("Adjust pH with ammonia", "암모니아로 pH 조절"))
                .details(Text::new(
                    "Adjust to pH 6-7 for stable gel formation.",
                    "안정적 겔 형성을 위해 pH 6-7로 조절.",
                )),
            step("gelation", Text::new("Evaporate to form gel", "증발시켜 겔 형성"))
                .temperature("80-120°C")
                .details(Text::new(
                    "Heat on hot plate with stirring until viscous gel forms.",
                    "핫플레이트에서 교반하며 점성 겔 형성까지 가열.",
                )),
            step("drying", Text::new("Dry the gel", "겔 건조"))
                .temperature("150-200°C")
                .time("6-12h")
                .details(Text::new(
                    "Dry in oven until xerogel (dry powder) forms.",
                    "건조 분말(xerogel)이 될 때까지 오븐에서 건조.",
                )),
            step("calcining", Text::new("Calcine to crystallize", "결정화를 위한 하소"))
                .temperature("500-800°C")
                .time("2-6h")
                .atmosphere("air")
                .details(Text::new(
                    "Slow heating (2°C/min) to avoid rapid gas evolution.",
                    "급격한 가스 발생 방지를 위해 천천히 승온 (2°C/분).",
                )),
        ],
        equipment: &["Hot plate with stirrer", "pH meter", "Drying oven", "Muffle furnace"],
        advantages: &[
            Text::new("Homogeneous mixing", "균일한 혼합"),
            Text::new("Lower temperature", "낮은 합성 온도"),
            Text::new("Nanoparticles", "나노입자 합성"),
            Text::new("Controlled stoichiometry", "정밀한 조성 제어"),
        ],
        suitable_for: &[
            Text::new("Nanoparticles", "나노입자"),
            Text::new("Thin films", "박막"),
            Text::new("Mixed oxides", "복합 산화물"),
            Text::new("Catalysts", "촉매"),
        ],
        reducing_required: false,
    },
    SynthesisMethod {
        id: MethodId::Hydrothermal,
        name: Text::new("Hydrothermal", "수열 합성"),
        description: Text::new(
            "Synthesis in aqueous solution under pressure",
            "고압 수용액 조건에서의 합성",
        ),
        conditions: MethodConditions {
            temperature_range: (120.0, 250.0),
            time_range: (6.0, 48.0),
            atmosphere: &["autogenous pressure"],
            pressure: Some("1-100 atm"),
        },
        steps: &[
            step("preparation", Text::new("Prepare aqueous precursor solution", "수용액 전구체 준비"))
                .details(Text::new(
                    "Dissolve metal salts in DI water. Concentration typically 0.01-0.1 M.",
                    "금속염을 DI water에 용해. 농도는 보통 0.01-0.1 M.",
                )),
            step("mineralizer", Text::new(
                "Add mineralizer/surfactant if needed",
                "필요시 광화제/계면활성제 첨가",
            ))
            .details(Text::new(
                "Common mineralizers: NaOH, KOH, urea. Surfactants: PVP, CTAB for morphology control.",
                "일반적 광화제: NaOH, KOH, 요소. 형태 제어용 계면활성제: PVP, CTAB.",
            )),
            step("pH-adjustment", Text::new("Adjust pH", "pH 조절"))
                .details(Text::new(
                    "pH affects crystal morphology and size. Typical range: pH 8-12.",
                    "pH가 결정 형태와 크기에 영향. 일반적 범위: pH 8-12.",
                )),
            step("transfer", Text::new(
                "Transfer to Teflon-lined autoclave",
                "테프론 라이닝 오토클레이브에 이송",
            ))
            .details(Text::new(
                "Fill to 70-80% capacity. Leave headspace for pressure.",
                "용량의 70-80%만 채움. 압력을 위한 공간 확보.",
            )),
            step("reaction", Text::new("Heat in autoclave", "오토클레이브에서 반응"))
                .temperature("150-220°C")
                .time("12-24h")
                .details(Text::new(
                    "Place in preheated oven. Do not disturb during reaction.",
                    "예열된 오븐에 넣음. 반응 중 흔들지 않음.",
                )),
            step("cooling", Text::new("Cool naturally to room temperature", "자연 냉각")),
            step("washing", Text::new("Wash and collect product", "생성물 세척 및 수집"))
                .details(Text::new(
                    "Centrifuge, wash with water and ethanol 3x each. Dry at 60°C.",
                    "원심분리 후 물과 에탄올로 각각 3회 세척. 60°C에서 건조.",
                )),
        ],
        equipment: &["Teflon-lined autoclave", "Oven", "Centrifuge", "pH meter"],
        advantages: &[
            Text::new("Low temperature", "저온 합성"),
            Text::new("Crystalline products", "결정성 생성물"),
            Text::new("Morphology control", "형태 제어"),
            Text::new("One-pot synthesis", "원팟 합성"),
        ],
        suitable_for: &[
            Text::new("Nanostructures", "나노구조"),
            Text::new("Zeolites", "제올라이트"),
            Text::new("Metal oxides", "금속 산화물"),
            Text::new("Quantum dots", "양자점"),
        ],
        reducing_required: false,
    },
    SynthesisMethod {
        id: MethodId::Solution,
        name: Text::new("Solution-Based", "용액 기반"),
        description: Text::new(
            "Wet chemical reduction or precipitation",
            "습식 화학 환원 또는 침전법",
        ),
        conditions: MethodConditions {
            temperature_range: (25.0, 100.0),
            time_range: (0.5, 6.0),
            atmosphere: &["air", "N2", "Ar"],
            pressure: None,
        },
        steps: &[
            step("dissolution", Text::new("Dissolve metal salts in solvent", "금속염을 용매에 용해"))
                .details(Text::new(
                    "Use water, ethanol, or ethylene glycol. Sonicate if needed.",
                    "물, 에탄올, 또는 에틸렌 글리콜 사용. 필요시 초음파 처리.",
                )),
            step("stabilizer", Text::new("Add capping agent/stabilizer", "캡핑제/안정제 첨가"))
                .details(Text::new(
                    "PVP, citrate, or oleylamine to prevent agglomeration.",
                    "응집 방지를 위해 PVP, 시트레이트, 또는 올레일아민 사용.",
                )),
            step("reduction", Text::new("Add reducing agent and react", "환원제 첨가 및 반응"))
                .temperature("RT-100°C")
                .time("1-4h")
                .details(Text::new(
                    "Common reducers: NaBH4 (fast, strong), ascorbic acid (mild), EG (polyol).",
                    "일반적 환원제: NaBH4 (빠름, 강함), 아스코르브산 (온화), EG (폴리올).",
                )),
            step("color-change", Text::new("Monitor color change", "색 변화 관찰"))
                .details(Text::new(
                    "Color change indicates reduction: e.g., yellow→brown (Au), orange→black (Pt).",
                    "색 변화가 환원을 나타냄: 예) 노랑→갈색 (Au), 주황→검정 (Pt).",
                )),
            step("separation", Text::new("Separate product", "생성물 분리"))
                .details(Text::new(
                    "Centrifuge at 8000-10000 rpm for 10-15 min.",
                    "8000-10000 rpm에서 10-15분 원심분리.",
                )),
            step("washing", Text::new("Wash multiple times", "여러 번 세척"))
                .details(Text::new(
                    "Wash with ethanol and water alternately, 3x each.",
                    "에탄올과 물로 번갈아 각각 3회 세척.",
                )),
            step("drying", Text::new("Dry under vacuum or inert gas", "진공 또는 불활성 기체 하에서 건조"))
                .temperature("60°C")
                .time("12h")
                .details(Text::new(
                    "Vacuum dry to prevent oxidation of metal nanoparticles.",
                    "금속 나노입자 산화 방지를 위해 진공 건조.",
                )),
        ],
        equipment: &[
            "Round-bottom flask",
            "Magnetic stirrer",
            "Centrifuge",
            "Vacuum oven",
            "Schlenk line (optional)",
        ],
        advantages: &[
            Text::new("Low temperature", "저온"),
            Text::new("Fast", "빠른 합성"),
            Text::new("Simple equipment", "간단한 장비"),
            Text::new("Size control", "크기 제어 가능"),
        ],
        suitable_for: &[
            Text::new("Metal nanoparticles", "금속 나노입자"),
            Text::new("Alloys", "합금"),
            Text::new("Catalysts", "촉매"),
            Text::new("Colloidal dispersions", "콜로이드 분산액"),
        ],
        reducing_required: true,
    },
];

pub fn all_methods() -> &'static [SynthesisMethod] {
    &METHODS
}

pub fn method(id: MethodId) -> &'static SynthesisMethod {
    // METHODS holds exactly one entry per MethodId, in declaration order
    &METHODS[id as usize]
}

/// Look up a method by its id string ("solid-state", "sol-gel", ...)
pub fn get_method(id: &str) -> Option<&'static SynthesisMethod> {
    id.parse::<MethodId>().ok().map(method)
}

/// Solid-state firing of a target containing a noble or platinum-group
/// metal must run under a reducing atmosphere to keep the metallic phase.
pub fn needs_reducing_atmosphere<S: AsRef<str>>(method: MethodId, elements: &[S]) -> bool {
    method == MethodId::SolidState
        && elements
            .iter()
            .any(|el| NOBLE_METALS.contains(&el.as_ref()))
}
