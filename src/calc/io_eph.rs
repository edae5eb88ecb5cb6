use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;

use exclusion_indicators::{yes_no_from_code, EducationLevel, Region, Sex};

use crate::calc::io_common::normalize_column_name;
use crate::calc::{
    io_csv, io_xlsx, CalcResult, FileSource, MissingKeyColumnSnafu, ParsedRow, RowBatch,
};

/// Survey column to canonical column, after name normalization. The
/// individual table carries the person attributes; the access attributes
/// live in the household table.
const EPH_COLUMN_ALIASES: &[(&str, &str)] = &[
    ("ch04", "sexo"),
    ("ch06", "edad"),
    ("nivel_ed", "nivel_educativo"),
    ("region", "region"),
    ("ih_ii_01", "acceso_computadora"),
    ("ih_ii_02", "acceso_internet"),
    ("ip_iii_06", "capacitacion_tic"),
];

/// The published microdata keys a household by questionnaire code and
/// household number.
const DEFAULT_MERGE_KEY: [&str; 2] = ["codusu", "nro_hogar"];

/// Reads a batch of records from the national household survey microdata:
/// the individual table, optionally merged with the household table, with
/// the survey's column names and numeric codes brought back to the
/// canonical vocabulary.
pub fn read_eph_rows(root_path: &str, path: String, cfs: &FileSource) -> CalcResult<RowBatch> {
    let mut batch = read_table(path, cfs)?;
    if let Some(household_lpath) = &cfs.household_file_path {
        let p: PathBuf = [root_path, household_lpath.as_str()].iter().collect();
        let household_path = p.as_path().display().to_string();
        info!("Attempting to read household file {:?}", household_path);
        let household = read_table(household_path.clone(), cfs)?;
        merge_household(&mut batch, &household, &merge_key(cfs), &household_path)?;
    }
    Ok(remap_survey_batch(&batch))
}

// The microdata circulates both as delimited text and as Excel exports.
fn read_table(path: String, cfs: &FileSource) -> CalcResult<RowBatch> {
    if path.to_lowercase().ends_with(".xlsx") {
        io_xlsx::read_xlsx_rows(path, cfs)
    } else {
        io_csv::read_csv_rows(path, cfs)
    }
}

fn merge_key(cfs: &FileSource) -> Vec<String> {
    match &cfs.merge_key_columns {
        Some(columns) => columns.iter().map(|c| normalize_column_name(c)).collect(),
        None => DEFAULT_MERGE_KEY.iter().map(|c| c.to_string()).collect(),
    }
}

/// Left-joins the household table onto the individual batch. Individual
/// fields win on collision; individuals without a household row keep their
/// fields untouched.
pub(crate) fn merge_household(
    batch: &mut RowBatch,
    household: &RowBatch,
    key_columns: &[String],
    household_path: &str,
) -> CalcResult<()> {
    for c in key_columns.iter() {
        if !household.headers.contains(c) {
            return MissingKeyColumnSnafu {
                name: c.clone(),
                path: household_path,
            }
            .fail();
        }
    }

    let key_of = |row: &ParsedRow| -> String {
        key_columns
            .iter()
            .map(|c| row.fields.get(c).cloned().unwrap_or_default())
            .collect::<Vec<String>>()
            .join("|")
    };
    let by_key: HashMap<String, &ParsedRow> = household
        .rows
        .iter()
        .map(|row| (key_of(row), row))
        .collect();
    debug!("merge_household: {} household keys", by_key.len());

    for row in batch.rows.iter_mut() {
        if let Some(household_row) = by_key.get(&key_of(row)) {
            for (column, value) in household_row.fields.iter() {
                row.fields
                    .entry(column.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }
    for header in household.headers.iter() {
        if !batch.headers.contains(header) {
            batch.headers.push(header.clone());
        }
    }
    Ok(())
}

/// Renames the survey columns to the canonical vocabulary and translates the
/// numeric codes into the canonical labels. Codes outside the published
/// coding (including the 9 = no answer markers) drop out, leaving the field
/// in the unknown state.
pub(crate) fn remap_survey_batch(batch: &RowBatch) -> RowBatch {
    let alias_of = |header: &str| -> Option<&'static str> {
        EPH_COLUMN_ALIASES
            .iter()
            .find(|(survey, _)| *survey == header)
            .map(|(_, canonical)| *canonical)
    };
    let headers: Vec<String> = batch
        .headers
        .iter()
        .map(|h| alias_of(h).unwrap_or(h.as_str()).to_string())
        .collect();
    let rows = batch
        .rows
        .iter()
        .map(|row| {
            let mut fields: HashMap<String, String> = HashMap::new();
            for (column, value) in row.fields.iter() {
                let canonical = alias_of(column).unwrap_or(column.as_str());
                if let Some(mapped) = remap_value(canonical, value) {
                    fields.insert(canonical.to_string(), mapped);
                }
            }
            ParsedRow {
                id: row.id.clone(),
                fields,
            }
        })
        .collect();
    RowBatch { headers, rows }
}

fn remap_value(canonical: &str, raw: &str) -> Option<String> {
    let code = raw.trim().parse::<i64>();
    match canonical {
        "sexo" => match code {
            Ok(c) => Sex::from_survey_code(c).map(|s| s.label().to_string()),
            Err(_) => Some(raw.to_string()),
        },
        "nivel_educativo" => match code {
            Ok(c) => EducationLevel::from_survey_code(c).map(|l| l.label().to_string()),
            Err(_) => Some(raw.to_string()),
        },
        "region" => match code {
            Ok(c) => Region::from_survey_code(c).map(|r| r.label().to_string()),
            Err(_) => Some(raw.to_string()),
        },
        "acceso_computadora" | "acceso_internet" | "capacitacion_tic" => match code {
            Ok(c) => yes_no_from_code(c).map(|b| if b { "Sí" } else { "No" }.to_string()),
            Err(_) => Some(raw.to_string()),
        },
        _ => Some(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::CalcError;

    fn row(id: &str, fields: &[(&str, &str)]) -> ParsedRow {
        ParsedRow {
            id: id.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn survey_codes_remap_to_canonical_labels() {
        let batch = RowBatch {
            headers: vec![
                "codusu".to_string(),
                "ch04".to_string(),
                "ch06".to_string(),
                "nivel_ed".to_string(),
                "region".to_string(),
                "ih_ii_01".to_string(),
                "ih_ii_02".to_string(),
            ],
            rows: vec![row(
                "r-1",
                &[
                    ("codusu", "TQRMNOPQRS"),
                    ("ch04", "2"),
                    ("ch06", "34"),
                    ("nivel_ed", "2"),
                    ("region", "42"),
                    ("ih_ii_01", "1"),
                    ("ih_ii_02", "2"),
                ],
            )],
        };
        let out = remap_survey_batch(&batch);
        assert_eq!(
            out.headers,
            vec![
                "codusu",
                "sexo",
                "edad",
                "nivel_educativo",
                "region",
                "acceso_computadora",
                "acceso_internet"
            ]
        );
        let fields = &out.rows[0].fields;
        assert_eq!(fields["sexo"], "Mujer");
        assert_eq!(fields["edad"], "34");
        assert_eq!(fields["nivel_educativo"], "Primario completo");
        assert_eq!(fields["region"], "Cuyo");
        assert_eq!(fields["acceso_computadora"], "Sí");
        assert_eq!(fields["acceso_internet"], "No");
        // Pass-through columns keep their content.
        assert_eq!(fields["codusu"], "TQRMNOPQRS");
    }

    #[test]
    fn no_answer_codes_drop_to_unknown() {
        let batch = RowBatch {
            headers: vec!["nivel_ed".to_string(), "ih_ii_01".to_string()],
            rows: vec![row("r-1", &[("nivel_ed", "9"), ("ih_ii_01", "0")])],
        };
        let out = remap_survey_batch(&batch);
        assert!(!out.rows[0].fields.contains_key("nivel_educativo"));
        assert!(!out.rows[0].fields.contains_key("acceso_computadora"));
    }

    #[test]
    fn household_merge_is_a_left_join() {
        let mut batch = RowBatch {
            headers: vec![
                "codusu".to_string(),
                "nro_hogar".to_string(),
                "ch04".to_string(),
            ],
            rows: vec![
                row("r-1", &[("codusu", "A"), ("nro_hogar", "1"), ("ch04", "2")]),
                row("r-2", &[("codusu", "B"), ("nro_hogar", "1"), ("ch04", "1")]),
            ],
        };
        let household = RowBatch {
            headers: vec![
                "codusu".to_string(),
                "nro_hogar".to_string(),
                "ih_ii_01".to_string(),
            ],
            rows: vec![row(
                "h-1",
                &[("codusu", "A"), ("nro_hogar", "1"), ("ih_ii_01", "1")],
            )],
        };
        let keys = vec!["codusu".to_string(), "nro_hogar".to_string()];
        merge_household(&mut batch, &household, &keys, "hogares.csv").unwrap();
        assert_eq!(batch.rows[0].fields["ih_ii_01"], "1");
        // No household row for codusu B: fields stay untouched.
        assert!(!batch.rows[1].fields.contains_key("ih_ii_01"));
        assert!(batch.headers.contains(&"ih_ii_01".to_string()));
    }

    #[test]
    fn household_merge_requires_the_key_columns() {
        let mut batch = RowBatch {
            headers: vec!["codusu".to_string()],
            rows: vec![],
        };
        let household = RowBatch {
            headers: vec!["ih_ii_01".to_string()],
            rows: vec![],
        };
        let keys = vec!["codusu".to_string(), "nro_hogar".to_string()];
        let res = merge_household(&mut batch, &household, &keys, "hogares.csv");
        assert!(matches!(res, Err(CalcError::MissingKeyColumn { .. })));
    }
}
