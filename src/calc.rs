use log::{info, warn};

use exclusion_indicators::builder::Builder;
use exclusion_indicators::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_eph;
pub mod io_xlsx;

pub use crate::calc::config_reader::*;

/// Canonical column vocabulary, after name normalization.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "sexo",
    "edad",
    "nivel_educativo",
    "acceso_computadora",
    "acceso_internet",
    "capacitacion_tic",
    "region",
    "provincia",
];

/// The columns that feed at least one indicator. A source exposing none of
/// them cannot be calculated at all.
pub const INDICATOR_INPUT_COLUMNS: [&str; 4] = [
    "nivel_educativo",
    "acceso_computadora",
    "acceso_internet",
    "capacitacion_tic",
];

#[derive(Debug, Snafu)]
pub enum CalcError {
    #[snafu(display("Error opening spreadsheet {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No usable worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error processing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error writing results to {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing to {path}"))]
    WritingResults {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(
        "None of the expected columns {expected:?} appear in the header of {path}"
    ))]
    MissingIndicatorColumns {
        expected: Vec<String>,
        path: String,
    },
    #[snafu(display("Missing merge key column {name} in {path}"))]
    MissingKeyColumn { name: String, path: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("The formula configuration was rejected: {message}"))]
    InvalidFormula { message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CalcResult<T> = Result<T, CalcError>;

/// A row as parsed by the readers.
/// This is before locating the canonical columns and validating the values.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRow {
    pub id: String,
    /// Normalized column name to raw cell content. Empty cells are absent.
    pub fields: HashMap<String, String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RowBatch {
    /// Normalized column names, in source order.
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

/// Locates the canonical columns in a batch and validates every row into a
/// typed record.
///
/// Values outside the recognized vocabulary resolve to the unknown state for
/// that field. Only a header exposing none of the indicator inputs is a
/// source-level failure.
pub fn validate_rows(batch: &RowBatch, source: &FileSource) -> CalcResult<Vec<PersonRecord>> {
    let aliases: HashMap<String, String> = source
        .column_aliases
        .clone()
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| {
            (
                io_common::normalize_column_name(k),
                io_common::normalize_column_name(v),
            )
        })
        .collect();

    let resolve = |canonical: &str| -> Option<String> {
        if batch.headers.iter().any(|h| h == canonical) {
            return Some(canonical.to_string());
        }
        batch
            .headers
            .iter()
            .find(|h| aliases.get(h.as_str()).map(|c| c == canonical) == Some(true))
            .cloned()
    };

    let columns: HashMap<&str, Option<String>> = CANONICAL_COLUMNS
        .iter()
        .map(|c| (*c, resolve(c)))
        .collect();

    if !INDICATOR_INPUT_COLUMNS.iter().any(|c| columns[c].is_some()) {
        return MissingIndicatorColumnsSnafu {
            expected: INDICATOR_INPUT_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            path: source.file_path.clone(),
        }
        .fail();
    }

    let mut records: Vec<PersonRecord> = Vec::new();
    for row in batch.rows.iter() {
        let get = |canonical: &str| -> &str {
            columns[canonical]
                .as_ref()
                .and_then(|h| row.fields.get(h))
                .map(|s| s.as_str())
                .unwrap_or("")
        };
        let record = PersonRecord {
            sex: Sex::from_label(get("sexo")),
            age: get("edad")
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|a| *a <= MAX_AGE),
            education_level: EducationLevel::from_label(get("nivel_educativo")),
            has_computer_access: parse_yes_no(get("acceso_computadora")),
            has_internet_access: parse_yes_no(get("acceso_internet")),
            has_ict_training: parse_yes_no(get("capacitacion_tic")),
            region: Region::from_label(get("region")),
            province: match get("provincia").trim() {
                "" => None,
                p => Some(p.to_string()),
            },
        };
        records.push(record);
    }
    Ok(records)
}

fn read_rows(root_path: &str, source: &FileSource) -> CalcResult<RowBatch> {
    let p: PathBuf = [root_path, source.file_path.as_str()].iter().collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read record file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_rows(p2, source),
        "xlsx" => io_xlsx::read_xlsx_rows(p2, source),
        "eph" => io_eph::read_eph_rows(root_path, p2, source),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// Integers print bare, everything else with two decimals. Keeps the CSV and
// the JSON summary stable for reference comparisons.
fn format_number(x: f64) -> String {
    if (x - x.round()).abs() < 1e-9 {
        format!("{}", x.round() as i64)
    } else {
        format!("{:.2}", x)
    }
}

fn format_opt_number(x: Option<f64>) -> String {
    x.map(format_number).unwrap_or_default()
}

fn yes_no_label(x: Option<bool>) -> &'static str {
    match x {
        Some(true) => "Sí",
        Some(false) => "No",
        None => "",
    }
}

pub fn write_results_csv(
    path: &str,
    ids: &[String],
    records: &[PersonRecord],
    results: &[IndicatorResult],
) -> CalcResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    wtr.write_record([
        "id",
        "sexo",
        "edad",
        "nivel_educativo",
        "acceso_computadora",
        "acceso_internet",
        "capacitacion_tic",
        "region",
        "provincia",
        "indice_binario",
        "indice_ordinal",
        "vulnerabilidad_digital",
        "vulnerabilidad_movilidad",
    ])
    .context(CsvWriteSnafu { path })?;
    for ((id, record), res) in ids.iter().zip(records.iter()).zip(results.iter()) {
        let fields: Vec<String> = vec![
            id.clone(),
            record.sex.map(|s| s.label()).unwrap_or("").to_string(),
            record.age.map(|a| a.to_string()).unwrap_or_default(),
            record
                .education_level
                .map(|l| l.label())
                .unwrap_or("")
                .to_string(),
            yes_no_label(record.has_computer_access).to_string(),
            yes_no_label(record.has_internet_access).to_string(),
            yes_no_label(record.has_ict_training).to_string(),
            record.region.map(|r| r.label()).unwrap_or("").to_string(),
            record.province.clone().unwrap_or_default(),
            res.binary_exclusion
                .map(|b| b.to_string())
                .unwrap_or_default(),
            format_opt_number(res.ordinal_exclusion),
            format_opt_number(res.digital_vulnerability_pct),
            format_opt_number(res.mobility_vulnerability_pct),
        ];
        wtr.write_record(&fields).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingResultsSnafu { path })?;
    Ok(())
}

fn result_stats_to_json(
    ids: &[String],
    records: &[PersonRecord],
    results: &[IndicatorResult],
) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for ((id, record), res) in ids.iter().zip(records.iter()).zip(results.iter()) {
        l.push(json!({
            "id": id,
            "sexo": record.sex.map(|s| s.label()),
            "edad": record.age,
            "nivelEducativo": record.education_level.map(|l| l.label()),
            "region": record.region.map(|r| r.label()),
            "provincia": record.province,
            "indiceBinario": res.binary_exclusion,
            "indiceOrdinal": res.ordinal_exclusion.map(round2),
            "vulnerabilidadDigital": res.digital_vulnerability_pct.map(round2),
            "vulnerabilidadMovilidad": res.mobility_vulnerability_pct.map(round2),
        }));
    }
    l
}

fn build_summary_js(
    config: &CalcConfig,
    ids: &[String],
    records: &[PersonRecord],
    results: &[IndicatorResult],
) -> JSValue {
    let c = OutputConfig {
        survey: config.output_settings.survey_name.clone(),
        date: config.output_settings.survey_date.clone(),
        jurisdiction: config.output_settings.jurisdiction.clone(),
        variant: config
            .formula
            .variant
            .clone()
            .or_else(|| Some("reference".to_string())),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(ids, records, results) })
}

fn load_config(args: &Args) -> CalcResult<(CalcConfig, String)> {
    let (mut config, root_path) = if let Some(config_path) = &args.config {
        let config = read_calc_config(config_path.clone())?;
        let root_p = Path::new(config_path.as_str())
            .parent()
            .context(MissingParentDirSnafu {})?;
        (config, root_p.display().to_string())
    } else {
        (CalcConfig::empty(), ".".to_string())
    };
    if let Some(input) = &args.input {
        config.record_file_sources.push(FileSource {
            provider: args.input_type.clone().unwrap_or_else(|| "csv".to_string()),
            file_path: input.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
            household_file_path: args.household_input.clone(),
            ..FileSource::default()
        });
    }
    if let Some(variant) = &args.variant {
        config.formula.variant = Some(variant.clone());
    }
    Ok((config, root_path))
}

fn results_csv_path(args: &Args, root_path: &str, config: &CalcConfig) -> Option<String> {
    if let Some(p) = &args.results {
        return Some(p.clone());
    }
    config.output_settings.output_directory.as_ref().map(|d| {
        let p: PathBuf = [root_path, d.as_str(), "resultados.csv"].iter().collect();
        p.display().to_string()
    })
}

fn check_reference(pretty_js_stats: &str, summary_path: String) -> CalcResult<()> {
    let summary_ref = read_summary(summary_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

fn write_summary(args: &Args, summary: &JSValue) -> CalcResult<()> {
    let pretty_js_stats = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        Some("stdout") | None => println!("summary:{}", pretty_js_stats),
        Some(path) => {
            fs::write(path, &pretty_js_stats).context(WritingResultsSnafu { path })?;
            info!("Wrote summary to {:?}", path);
        }
    }
    if let Some(summary_p) = args.reference.clone() {
        check_reference(&pretty_js_stats, summary_p)?;
    }
    Ok(())
}

fn engine<T>(res: Result<T, IndicatorErrors>) -> CalcResult<T> {
    res.map_err(|e| CalcError::InvalidFormula {
        message: e.to_string(),
    })
}

fn run_single_record(args: &Args, config: &CalcConfig, formula: &FormulaConfig) -> CalcResult<()> {
    let mut builder = engine(Builder::new(formula))?;
    let age = args.age.map(|a| a.to_string()).unwrap_or_default();
    engine(builder.add_record_labels(
        args.sex.as_deref().unwrap_or(""),
        &age,
        args.education.as_deref().unwrap_or(""),
        args.computer.as_deref().unwrap_or(""),
        args.internet.as_deref().unwrap_or(""),
        args.training.as_deref().unwrap_or(""),
        args.region.as_deref().unwrap_or(""),
        args.province.as_deref().unwrap_or(""),
    ))?;
    let results = engine(builder.compute())?;
    let res = &results[0];

    let undefined = "indefinido".to_string();
    println!(
        "Índice Binario de Exclusión Digital: {}",
        res.binary_exclusion
            .map(|b| b.to_string())
            .unwrap_or_else(|| undefined.clone())
    );
    println!(
        "Índice Ordinal de Exclusión Digital: {}",
        res.ordinal_exclusion
            .map(format_number)
            .unwrap_or_else(|| undefined.clone())
    );
    println!(
        "Porcentaje de Vulnerabilidad Digital: {}",
        res.digital_vulnerability_pct
            .map(|v| format!("{}%", format_number(v)))
            .unwrap_or_else(|| undefined.clone())
    );
    println!(
        "Porcentaje de Vulnerabilidad de Movilidad Social: {}",
        res.mobility_vulnerability_pct
            .map(|v| format!("{}%", format_number(v)))
            .unwrap_or(undefined)
    );

    let ids = vec![format!("manual-{:08}", 1)];
    let records = builder.records().to_vec();
    if let Some(path) = &args.results {
        write_results_csv(path, &ids, &records, &results)?;
        info!("Wrote results to {:?}", path);
    }
    if args.out.is_some() || args.reference.is_some() {
        let summary = build_summary_js(config, &ids, &records, &results);
        write_summary(args, &summary)?;
    }
    Ok(())
}

pub fn run_calculator(args: &Args) -> CalcResult<()> {
    let (config, root_path) = load_config(args)?;
    info!("config: {:?}", config);

    // Validate the formula selection before touching any input.
    let formula = validate_formula(&config.formula)?;
    info!("formula: {:?}", formula);

    if config.record_file_sources.is_empty() {
        return run_single_record(args, &config, &formula);
    }

    let mut ids: Vec<String> = Vec::new();
    let mut records: Vec<PersonRecord> = Vec::new();
    for source in config.record_file_sources.iter() {
        let batch = read_rows(&root_path, source)?;
        let mut source_records = validate_rows(&batch, source)?;
        ids.extend(batch.rows.iter().map(|r| r.id.clone()));
        records.append(&mut source_records);
    }
    info!("Validated {:?} records", records.len());

    let results = engine(run_indicator_stats(&records, &formula))?;

    if let Some(path) = results_csv_path(args, &root_path, &config) {
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context(WritingResultsSnafu { path: path.clone() })?;
            }
        }
        write_results_csv(&path, &ids, &records, &results)?;
        info!("Wrote results to {:?}", path);
    }

    let summary = build_summary_js(&config, &ids, &records, &results);
    write_summary(args, &summary)?;

    Ok(())
}
