// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Folds a free-text survey label into a comparable form: trimmed,
/// lowercased, with the Spanish diacritics removed.
///
/// All the label parsers in this crate go through this function, so
/// "Sin instrucción", "sin instruccion" and "SIN INSTRUCCIÓN" are the
/// same category.
pub fn fold_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            _ => c,
        })
        .collect()
}

/// Parses a yes/no survey answer. Unrecognized content maps to `None`,
/// never to a default answer.
pub fn parse_yes_no(raw: &str) -> Option<bool> {
    match fold_label(raw).as_str() {
        "si" | "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

/// Parses the numeric yes/no coding used by the national household survey
/// (1 = yes, 2 = no; 9 and anything else = not answered).
pub fn yes_no_from_code(code: i64) -> Option<bool> {
    match code {
        1 => Some(true),
        2 => Some(false),
        _ => None,
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn from_label(raw: &str) -> Option<Sex> {
        match fold_label(raw).as_str() {
            "varon" | "hombre" | "masculino" => Some(Sex::Male),
            "mujer" | "femenino" => Some(Sex::Female),
            _ => None,
        }
    }

    /// The survey codes sex as 1 = male, 2 = female.
    pub fn from_survey_code(code: i64) -> Option<Sex> {
        match code {
            1 => Some(Sex::Male),
            2 => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Varón",
            Sex::Female => "Mujer",
        }
    }
}

/// The 7 recognized educational-attainment categories, lowest first.
///
/// The derived ordering is the attainment ordering: `NoInstruction` is the
/// minimum and `TertiaryComplete` the maximum.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum EducationLevel {
    NoInstruction,
    PrimaryIncomplete,
    PrimaryComplete,
    SecondaryIncomplete,
    SecondaryComplete,
    TertiaryIncomplete,
    TertiaryComplete,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 7] = [
        EducationLevel::NoInstruction,
        EducationLevel::PrimaryIncomplete,
        EducationLevel::PrimaryComplete,
        EducationLevel::SecondaryIncomplete,
        EducationLevel::SecondaryComplete,
        EducationLevel::TertiaryIncomplete,
        EducationLevel::TertiaryComplete,
    ];

    /// Position in the attainment ordering, 0 = no instruction. This is the
    /// index used for score-table lookups.
    pub fn index(&self) -> usize {
        match self {
            EducationLevel::NoInstruction => 0,
            EducationLevel::PrimaryIncomplete => 1,
            EducationLevel::PrimaryComplete => 2,
            EducationLevel::SecondaryIncomplete => 3,
            EducationLevel::SecondaryComplete => 4,
            EducationLevel::TertiaryIncomplete => 5,
            EducationLevel::TertiaryComplete => 6,
        }
    }

    pub fn from_label(raw: &str) -> Option<EducationLevel> {
        match fold_label(raw).as_str() {
            "sin instruccion" => Some(EducationLevel::NoInstruction),
            "primario incompleto" | "primaria incompleta" => {
                Some(EducationLevel::PrimaryIncomplete)
            }
            "primario completo" | "primaria completa" => Some(EducationLevel::PrimaryComplete),
            "secundario incompleto" | "secundaria incompleta" => {
                Some(EducationLevel::SecondaryIncomplete)
            }
            "secundario completo" | "secundaria completa" => {
                Some(EducationLevel::SecondaryComplete)
            }
            "superior universitario incompleto" | "superior universitaria incompleta" => {
                Some(EducationLevel::TertiaryIncomplete)
            }
            "superior universitario completo" | "superior universitaria completa" => {
                Some(EducationLevel::TertiaryComplete)
            }
            _ => None,
        }
    }

    /// NIVEL_ED coding of the national household survey. Code 9 (no answer)
    /// and anything uncoded map to `None`.
    pub fn from_survey_code(code: i64) -> Option<EducationLevel> {
        match code {
            1 => Some(EducationLevel::PrimaryIncomplete),
            2 => Some(EducationLevel::PrimaryComplete),
            3 => Some(EducationLevel::SecondaryIncomplete),
            4 => Some(EducationLevel::SecondaryComplete),
            5 => Some(EducationLevel::TertiaryIncomplete),
            6 => Some(EducationLevel::TertiaryComplete),
            7 => Some(EducationLevel::NoInstruction),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EducationLevel::NoInstruction => "Sin instrucción",
            EducationLevel::PrimaryIncomplete => "Primario incompleto",
            EducationLevel::PrimaryComplete => "Primario completo",
            EducationLevel::SecondaryIncomplete => "Secundario incompleto",
            EducationLevel::SecondaryComplete => "Secundario completo",
            EducationLevel::TertiaryIncomplete => "Superior universitario incompleto",
            EducationLevel::TertiaryComplete => "Superior universitario completo",
        }
    }
}

/// The 6 geographic macro-regions of the survey.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Region {
    GranBuenosAires,
    Noroeste,
    Noreste,
    Cuyo,
    Pampeana,
    Patagonia,
}

impl Region {
    pub fn from_label(raw: &str) -> Option<Region> {
        match fold_label(raw).as_str() {
            "gran buenos aires" | "gba" => Some(Region::GranBuenosAires),
            "noroeste" | "noa" => Some(Region::Noroeste),
            "noreste" | "nea" => Some(Region::Noreste),
            "cuyo" => Some(Region::Cuyo),
            "pampeana" => Some(Region::Pampeana),
            "patagonia" | "patagonica" => Some(Region::Patagonia),
            _ => None,
        }
    }

    /// REGION coding of the national household survey.
    pub fn from_survey_code(code: i64) -> Option<Region> {
        match code {
            1 => Some(Region::GranBuenosAires),
            40 => Some(Region::Noroeste),
            41 => Some(Region::Noreste),
            42 => Some(Region::Cuyo),
            43 => Some(Region::Pampeana),
            44 => Some(Region::Patagonia),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::GranBuenosAires => "Gran Buenos Aires",
            Region::Noroeste => "Noroeste",
            Region::Noreste => "Noreste",
            Region::Cuyo => "Cuyo",
            Region::Pampeana => "Pampeana",
            Region::Patagonia => "Patagonia",
        }
    }
}

/// One respondent's categorical attributes.
///
/// Every field is optional: a missing or unmapped source value must stay an
/// explicit unknown, it may never default to a valid category. Age, region
/// and province are pass-through attributes kept for reporting; they feed no
/// indicator.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct PersonRecord {
    pub sex: Option<Sex>,
    pub age: Option<u32>,
    pub education_level: Option<EducationLevel>,
    pub has_computer_access: Option<bool>,
    pub has_internet_access: Option<bool>,
    pub has_ict_training: Option<bool>,
    pub region: Option<Region>,
    pub province: Option<String>,
}

/// Ages outside 0..=120 are out of domain and resolve to unknown.
pub const MAX_AGE: u32 = 120;

// ******** Output data structures *********

/// The four computed indicators for one record.
///
/// A `None` field is the explicit undefined marker produced when a required
/// source attribute is missing or out of domain. The result is a pure
/// function of (`PersonRecord`, `FormulaConfig`): it has no identity and is
/// recomputed, never mutated.
#[derive(PartialEq, Debug, Clone)]
pub struct IndicatorResult {
    /// 1 iff the record is excluded on every configured dimension.
    pub binary_exclusion: Option<u8>,
    /// Ranked access measure; raw count or floored percentage depending on
    /// the configured rule.
    pub ordinal_exclusion: Option<f64>,
    pub digital_vulnerability_pct: Option<f64>,
    pub mobility_vulnerability_pct: Option<f64>,
}

/// Errors that prevent a formula configuration from being applied.
#[derive(PartialEq, Debug, Clone)]
pub enum IndicatorErrors {
    EmptyScoreTable,
    /// Score tables carry one entry per recognized education category:
    /// 7 for the canonical set, 9 for the raw-survey set.
    WrongScoreTableSize(usize),
    /// Burden must not increase with attainment.
    NonMonotonicScoreTable,
    OutOfRangeFloor(f64),
    OutOfRangeWeight(f64),
}

impl Error for IndicatorErrors {}

impl Display for IndicatorErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorErrors::EmptyScoreTable => write!(f, "the score table is empty"),
            IndicatorErrors::WrongScoreTableSize(n) => {
                write!(f, "the score table must have 7 or 9 entries, found {}", n)
            }
            IndicatorErrors::NonMonotonicScoreTable => {
                write!(f, "the score table must not increase with attainment")
            }
            IndicatorErrors::OutOfRangeFloor(x) => {
                write!(f, "floor {} is outside the [0, 100) range", x)
            }
            IndicatorErrors::OutOfRangeWeight(x) => {
                write!(f, "weight {} is outside the [0, 100] range", x)
            }
        }
    }
}

// ********* Configuration **********

// The configuration options express every formula variant observed across
// the revisions of the original calculator. One engine, several presets.

/// Which access/training attributes feed the access count `k`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AccessDimensions {
    /// k over {computer, internet}, k_max = 2.
    ComputerInternet,
    /// k over {computer, internet, ICT training}, k_max = 3.
    ComputerInternetTraining,
}

impl AccessDimensions {
    pub fn k_max(&self) -> u32 {
        match self {
            AccessDimensions::ComputerInternet => 2,
            AccessDimensions::ComputerInternetTraining => 3,
        }
    }
}

/// Shape of the ordinal exclusion index.
///
/// The two-dimension ternary variant (0/1/2) is `RawCount` together with
/// `AccessDimensions::ComputerInternet`.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum OrdinalRule {
    /// ordinal = k, range 0..=k_max.
    RawCount,
    /// ordinal = floor + k/k_max * (100 - floor). No record scores below the
    /// floor, even at k = 0.
    FlooredPercent { floor: f64 },
}

/// Shape of the digital-vulnerability percentage. Monotonically
/// non-increasing in k under every variant.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum DigitalRule {
    /// (k_max - k)/k_max * 100.
    Linear,
    /// floor + (k_max - k)/k_max * (100 - floor).
    LinearFloored { floor: f64 },
    /// Tiered on computer and internet only: 100 if neither, 80 if exactly
    /// one, 0 if both; then + penalty when ICT training is absent and the
    /// tier value is below 100, capped at 100.
    Stepped { training_penalty: f64 },
}

/// Burden weights indexed by education level, entry 0 = no instruction.
///
/// 7 entries for the canonical category set; 9 for the raw-survey set,
/// whose two extra categories are collapsed onto the canonical levels at
/// ingestion time.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoreTable {
    pub scores: Vec<f64>,
}

impl ScoreTable {
    /// The canonical 7-entry table: score 7 for no instruction down to
    /// score 1 for complete tertiary.
    pub fn canonical() -> ScoreTable {
        ScoreTable {
            scores: vec![7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        }
    }

    pub fn max_score(&self) -> f64 {
        // Validation guarantees a non-empty, non-increasing table.
        self.scores[0]
    }

    pub fn score_for(&self, level: EducationLevel) -> f64 {
        self.scores[level.index()]
    }

    pub fn validate(&self) -> Result<(), IndicatorErrors> {
        if self.scores.is_empty() {
            return Err(IndicatorErrors::EmptyScoreTable);
        }
        if self.scores.len() != 7 && self.scores.len() != 9 {
            return Err(IndicatorErrors::WrongScoreTableSize(self.scores.len()));
        }
        let monotonic = self.scores.windows(2).all(|w| w[0] >= w[1]);
        if !monotonic || self.scores[0] <= 0.0 {
            return Err(IndicatorErrors::NonMonotonicScoreTable);
        }
        Ok(())
    }
}

/// Shape of the social-mobility vulnerability percentage.
#[derive(PartialEq, Debug, Clone)]
pub enum MobilityRule {
    /// Fixed penalties summed and clamped to [0, 100].
    ThresholdAdditive {
        /// Education levels at or below this cutoff take the education
        /// penalty.
        low_attainment_cutoff: EducationLevel,
        education_penalty: f64,
        training_penalty: f64,
        /// When set, records with binary exclusion = 1 take this penalty
        /// too.
        exclusion_penalty: Option<f64>,
    },
    /// floor + score/max_score * education_weight + training_penalty (if
    /// ICT training absent), clamped to [floor, 100].
    ScoreTable {
        table: ScoreTable,
        education_weight: f64,
        training_penalty: f64,
        floor: f64,
    },
}

/// What an unmapped education level yields for mobility vulnerability.
///
/// Either way it never coerces to a valid category's score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MissingEducationPolicy {
    /// The education term contributes 0 (the observed threshold-additive
    /// policy).
    Zero,
    /// The whole indicator is undefined (the observed score-table policy).
    Undefined,
}

/// Selects among the observed calculation variants.
#[derive(PartialEq, Debug, Clone)]
pub struct FormulaConfig {
    pub dimensions: AccessDimensions,
    pub ordinal_rule: OrdinalRule,
    pub digital_rule: DigitalRule,
    pub mobility_rule: MobilityRule,
    pub missing_education_policy: MissingEducationPolicy,
}

impl FormulaConfig {
    /// The behavior of record: the most complete revision. Three-dimension
    /// k, floor-10 percentage scales, score-table mobility with base 10 and
    /// up to 50 + 50 on top, clamped at 100.
    pub fn reference() -> FormulaConfig {
        FormulaConfig {
            dimensions: AccessDimensions::ComputerInternetTraining,
            ordinal_rule: OrdinalRule::FlooredPercent { floor: 10.0 },
            digital_rule: DigitalRule::LinearFloored { floor: 10.0 },
            mobility_rule: MobilityRule::ScoreTable {
                table: ScoreTable::canonical(),
                education_weight: 50.0,
                training_penalty: 50.0,
                floor: 10.0,
            },
            missing_education_policy: MissingEducationPolicy::Undefined,
        }
    }

    /// Three-dimension k with raw-count ordinal, linear digital
    /// vulnerability and 50/50 additive mobility penalties.
    pub fn threshold_additive() -> FormulaConfig {
        FormulaConfig {
            dimensions: AccessDimensions::ComputerInternetTraining,
            ordinal_rule: OrdinalRule::RawCount,
            digital_rule: DigitalRule::Linear,
            mobility_rule: MobilityRule::ThresholdAdditive {
                low_attainment_cutoff: EducationLevel::PrimaryIncomplete,
                education_penalty: 50.0,
                training_penalty: 50.0,
                exclusion_penalty: None,
            },
            missing_education_policy: MissingEducationPolicy::Zero,
        }
    }

    /// The earliest revision: computer and internet only, ternary ordinal,
    /// linear digital vulnerability, 50/50 additive mobility.
    pub fn legacy_two_dimension() -> FormulaConfig {
        FormulaConfig {
            dimensions: AccessDimensions::ComputerInternet,
            ordinal_rule: OrdinalRule::RawCount,
            digital_rule: DigitalRule::Linear,
            mobility_rule: MobilityRule::ThresholdAdditive {
                low_attainment_cutoff: EducationLevel::PrimaryIncomplete,
                education_penalty: 50.0,
                training_penalty: 50.0,
                exclusion_penalty: None,
            },
            missing_education_policy: MissingEducationPolicy::Zero,
        }
    }

    /// Tiered digital vulnerability (100/80/0 on computer and internet,
    /// +20 when training is absent) with 40/30/30 additive mobility.
    pub fn stepped() -> FormulaConfig {
        FormulaConfig {
            dimensions: AccessDimensions::ComputerInternet,
            ordinal_rule: OrdinalRule::RawCount,
            digital_rule: DigitalRule::Stepped {
                training_penalty: 20.0,
            },
            mobility_rule: MobilityRule::ThresholdAdditive {
                low_attainment_cutoff: EducationLevel::PrimaryIncomplete,
                education_penalty: 40.0,
                training_penalty: 30.0,
                exclusion_penalty: Some(30.0),
            },
            missing_education_policy: MissingEducationPolicy::Zero,
        }
    }

    pub fn validate(&self) -> Result<(), IndicatorErrors> {
        let check_floor = |floor: f64| {
            if !(0.0..100.0).contains(&floor) {
                Err(IndicatorErrors::OutOfRangeFloor(floor))
            } else {
                Ok(())
            }
        };
        let check_weight = |weight: f64| {
            if !(0.0..=100.0).contains(&weight) {
                Err(IndicatorErrors::OutOfRangeWeight(weight))
            } else {
                Ok(())
            }
        };
        if let OrdinalRule::FlooredPercent { floor } = self.ordinal_rule {
            check_floor(floor)?;
        }
        match self.digital_rule {
            DigitalRule::LinearFloored { floor } => check_floor(floor)?,
            DigitalRule::Stepped { training_penalty } => check_weight(training_penalty)?,
            DigitalRule::Linear => {}
        }
        match &self.mobility_rule {
            MobilityRule::ThresholdAdditive {
                education_penalty,
                training_penalty,
                exclusion_penalty,
                ..
            } => {
                check_weight(*education_penalty)?;
                check_weight(*training_penalty)?;
                if let Some(p) = exclusion_penalty {
                    check_weight(*p)?;
                }
            }
            MobilityRule::ScoreTable {
                table,
                education_weight,
                training_penalty,
                floor,
            } => {
                table.validate()?;
                check_weight(*education_weight)?;
                check_weight(*training_penalty)?;
                check_floor(*floor)?;
            }
        }
        Ok(())
    }
}
