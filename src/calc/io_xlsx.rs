use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;
use std::collections::HashMap;

use crate::calc::io_common::{make_default_id, normalize_column_name};
use crate::calc::{
    CalcResult, EmptyExcelSnafu, FileSource, OpeningExcelSnafu, ParsedRow, RowBatch,
};

fn get_range(path: &str, cfs: &FileSource) -> CalcResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let sheet_names = workbook.sheet_names().to_vec();
    let name = match &cfs.excel_worksheet_name {
        Some(n) => n.clone(),
        None => sheet_names
            .first()
            .cloned()
            .context(EmptyExcelSnafu { path })?,
    };
    match workbook.worksheet_range(&name) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(e).context(OpeningExcelSnafu { path }),
        None => whatever!(
            "Worksheet {:?} not found in {:?}. Available worksheets: {:?}",
            name,
            path,
            sheet_names
        ),
    }
}

/// The spreadsheet cells are typed; everything is brought back to the string
/// vocabulary of the CSV reader. Integral floats print bare because Excel
/// stores the survey codes as floats.
fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        // {:.0} keeps integral floats exact at any magnitude, where an i64
        // cast would wrap.
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{:.0}", f)),
        DataType::Float(f) => Some(format!("{}", f)),
        DataType::Int(i) => Some(format!("{}", i)),
        DataType::Bool(b) => Some(if *b { "Sí" } else { "No" }.to_string()),
        _ => None,
    }
}

pub fn read_xlsx_rows(path: String, cfs: &FileSource) -> CalcResult<RowBatch> {
    let default_id = make_default_id(&path);
    let wrange = get_range(&path, cfs)?;
    let mut row_iter = wrange.rows();
    let header_row = row_iter.next().context(EmptyExcelSnafu { path })?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| {
            cell_to_string(cell)
                .map(|s| normalize_column_name(&s))
                .unwrap_or_default()
        })
        .collect();
    debug!("read_xlsx_rows: header: {:?}", headers);
    let id_column = cfs.id_column.as_deref().map(normalize_column_name);

    let mut rows: Vec<ParsedRow> = Vec::new();
    for (idx, cells) in row_iter.enumerate() {
        // 1-based, counting the header line.
        let lineno = idx + 2;
        let mut fields: HashMap<String, String> = HashMap::new();
        for (header, cell) in headers.iter().zip(cells.iter()) {
            if header.is_empty() {
                continue;
            }
            if let Some(value) = cell_to_string(cell) {
                fields.insert(header.clone(), value);
            }
        }
        let id = id_column
            .as_ref()
            .and_then(|c| fields.get(c).cloned())
            .unwrap_or_else(|| default_id(lineno));
        rows.push(ParsedRow { id, fields });
    }
    Ok(RowBatch { headers, rows })
}
