use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::{prelude::*, ResultExt};
use std::collections::HashMap;
use std::fs;

use exclusion_indicators::*;

use crate::calc::{CalcError, CalcResult, OpeningJsonSnafu, ParsingJsonSnafu};

// **** Structures that describe the JSON configuration file. ****

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub survey_name: String,
    pub output_directory: Option<String>,
    pub survey_date: Option<String>,
    pub jurisdiction: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> OutputSettings {
        OutputSettings {
            survey_name: "Indicadores de exclusión digital".to_string(),
            output_directory: None,
            survey_date: None,
            jurisdiction: None,
        }
    }
}

/// The configuration block echoed at the top of the JSON summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    pub survey: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub variant: Option<String>,
}

/// One spreadsheet of records to ingest.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSource {
    /// csv, xlsx or eph.
    pub provider: String,
    pub file_path: String,
    pub excel_worksheet_name: Option<String>,
    /// Source column name to canonical column name. Both sides are
    /// normalized before matching.
    pub column_aliases: Option<HashMap<String, String>>,
    /// Companion household table for the eph provider.
    pub household_file_path: Option<String>,
    /// Key columns of the household merge. Defaults to the survey's
    /// household key.
    pub merge_key_columns: Option<Vec<String>>,
    /// Column holding the record identifier. When absent, identifiers are
    /// derived from the file name and line number.
    pub id_column: Option<String>,
}

/// The formula selection, as written in the configuration file. A variant
/// preset plus optional parameter overrides.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaRules {
    /// reference, thresholdAdditive, legacyTwoDimension or stepped.
    pub variant: Option<String>,
    /// computerInternet or computerInternetTraining.
    pub dimensions: Option<String>,
    pub ordinal_floor: Option<f64>,
    pub digital_floor: Option<f64>,
    pub low_attainment_cutoff: Option<String>,
    pub education_penalty: Option<f64>,
    pub training_penalty: Option<f64>,
    pub exclusion_penalty: Option<f64>,
    pub score_table: Option<Vec<f64>>,
    pub education_weight: Option<f64>,
    pub missing_education_policy: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcConfig {
    #[serde(default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub record_file_sources: Vec<FileSource>,
    #[serde(default)]
    pub formula: FormulaRules,
}

impl CalcConfig {
    /// The configuration used when no file is provided: no sources, default
    /// formula. Sources and overrides then come from the command line.
    pub fn empty() -> CalcConfig {
        CalcConfig {
            output_settings: OutputSettings::default(),
            record_file_sources: Vec::new(),
            formula: FormulaRules::default(),
        }
    }
}

pub fn read_calc_config(path: String) -> CalcResult<CalcConfig> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let config: CalcConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Reads a reference summary, keeping it as a JSON value: it is only
/// compared, never interpreted.
pub fn read_summary(path: String) -> CalcResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Resolves the declared rules into a concrete formula: preset first, then
/// the explicit parameter overrides, then a validation pass.
pub fn validate_formula(rules: &FormulaRules) -> CalcResult<FormulaConfig> {
    let variant = rules.variant.as_deref().unwrap_or("reference");
    let mut config = match variant {
        "reference" => FormulaConfig::reference(),
        "thresholdAdditive" => FormulaConfig::threshold_additive(),
        "legacyTwoDimension" => FormulaConfig::legacy_two_dimension(),
        "stepped" => FormulaConfig::stepped(),
        x => whatever!(
            "Unknown formula variant {:?}: expected reference, thresholdAdditive, legacyTwoDimension or stepped",
            x
        ),
    };

    if let Some(dims) = &rules.dimensions {
        config.dimensions = match dims.as_str() {
            "computerInternet" => AccessDimensions::ComputerInternet,
            "computerInternetTraining" => AccessDimensions::ComputerInternetTraining,
            x => whatever!("Unknown dimension set {:?}", x),
        };
    }
    if let Some(floor) = rules.ordinal_floor {
        config.ordinal_rule = OrdinalRule::FlooredPercent { floor };
    }
    if let Some(floor) = rules.digital_floor {
        config.digital_rule = DigitalRule::LinearFloored { floor };
    }

    if let Some(cutoff) = &rules.low_attainment_cutoff {
        let level = match EducationLevel::from_label(cutoff) {
            Some(level) => level,
            None => whatever!("Unknown education level {:?}", cutoff),
        };
        match &mut config.mobility_rule {
            MobilityRule::ThresholdAdditive {
                low_attainment_cutoff,
                ..
            } => *low_attainment_cutoff = level,
            MobilityRule::ScoreTable { .. } => {
                whatever!("lowAttainmentCutoff does not apply to the score-table mobility rule")
            }
        }
    }
    if let Some(penalty) = rules.education_penalty {
        match &mut config.mobility_rule {
            MobilityRule::ThresholdAdditive {
                education_penalty, ..
            } => *education_penalty = penalty,
            MobilityRule::ScoreTable { .. } => {
                whatever!("educationPenalty does not apply to the score-table mobility rule")
            }
        }
    }
    if let Some(penalty) = rules.training_penalty {
        match &mut config.mobility_rule {
            MobilityRule::ThresholdAdditive {
                training_penalty, ..
            } => *training_penalty = penalty,
            MobilityRule::ScoreTable {
                training_penalty, ..
            } => *training_penalty = penalty,
        }
    }
    if let Some(penalty) = rules.exclusion_penalty {
        match &mut config.mobility_rule {
            MobilityRule::ThresholdAdditive {
                exclusion_penalty, ..
            } => *exclusion_penalty = Some(penalty),
            MobilityRule::ScoreTable { .. } => {
                whatever!("exclusionPenalty does not apply to the score-table mobility rule")
            }
        }
    }
    if let Some(scores) = &rules.score_table {
        match &mut config.mobility_rule {
            MobilityRule::ScoreTable { table, .. } => {
                *table = ScoreTable {
                    scores: scores.clone(),
                }
            }
            MobilityRule::ThresholdAdditive { .. } => {
                whatever!("scoreTable does not apply to the additive mobility rule")
            }
        }
    }
    if let Some(weight) = rules.education_weight {
        match &mut config.mobility_rule {
            MobilityRule::ScoreTable {
                education_weight, ..
            } => *education_weight = weight,
            MobilityRule::ThresholdAdditive { .. } => {
                whatever!("educationWeight does not apply to the additive mobility rule")
            }
        }
    }
    if let Some(policy) = &rules.missing_education_policy {
        config.missing_education_policy = match policy.as_str() {
            "zero" => MissingEducationPolicy::Zero,
            "undefined" => MissingEducationPolicy::Undefined,
            x => whatever!("Unknown missing-education policy {:?}", x),
        };
    }

    config.validate().map_err(|e| CalcError::InvalidFormula {
        message: e.to_string(),
    })?;
    Ok(config)
}
