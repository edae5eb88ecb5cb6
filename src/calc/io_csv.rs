use log::debug;
use snafu::prelude::*;
use std::collections::HashMap;

use crate::calc::io_common::{make_default_id, normalize_column_name};
use crate::calc::{
    CsvLineParseSnafu, CsvOpenSnafu, FileSource, CalcResult, ParsedRow, RowBatch,
};

pub fn read_csv_rows(path: String, cfs: &FileSource) -> CalcResult<RowBatch> {
    let default_id = make_default_id(&path);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path.clone())
        .context(CsvOpenSnafu { path })?;

    let headers: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu {})?
        .iter()
        .map(normalize_column_name)
        .collect();
    debug!("read_csv_rows: header: {:?}", headers);
    let id_column = cfs.id_column.as_deref().map(normalize_column_name);

    let mut rows: Vec<ParsedRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // 1-based, counting the header line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let mut fields: HashMap<String, String> = HashMap::new();
        for (header, value) in headers.iter().zip(line.iter()) {
            let value = value.trim();
            if !header.is_empty() && !value.is_empty() {
                fields.insert(header.clone(), value.to_string());
            }
        }
        let id = id_column
            .as_ref()
            .and_then(|c| fields.get(c).cloned())
            .unwrap_or_else(|| default_id(lineno));
        debug!("read_csv_rows: row {}: {:?}", lineno, fields);
        rows.push(ParsedRow { id, fields });
    }
    Ok(RowBatch { headers, rows })
}
