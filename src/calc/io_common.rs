use std::path::Path;

use exclusion_indicators::fold_label;

/// A short identifier prefix derived from a file name: the stem, folded,
/// with runs of non-alphanumeric characters collapsed to a single dash.
pub fn simplify_file_name(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("records");
    let mut out = String::new();
    for c in fold_label(stem).chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "records".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds the fallback record identifier for a source: file stem plus the
/// 1-based line number.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let prefix = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", prefix, lineno)
}

/// Folds a raw column name into the canonical form: trimmed, lowercased,
/// accents removed, runs of non-alphanumeric characters collapsed to a
/// single underscore.
///
/// "Nivel Educativo", "NIVEL_ED " and "nivel-educativo" normalize to
/// "nivel_educativo", "nivel_ed" and "nivel_educativo".
pub fn normalize_column_name(raw: &str) -> String {
    let mut out = String::new();
    for c in fold_label(raw).chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_name_normalization() {
        assert_eq!(normalize_column_name("Nivel Educativo"), "nivel_educativo");
        assert_eq!(normalize_column_name("NIVEL_ED"), "nivel_ed");
        assert_eq!(normalize_column_name("  Región  "), "region");
        assert_eq!(normalize_column_name("¿Acceso a internet?"), "acceso_a_internet");
        assert_eq!(normalize_column_name("IH_II_01"), "ih_ii_01");
        assert_eq!(normalize_column_name(""), "");
    }

    #[test]
    fn default_ids_derive_from_the_file_name() {
        let make = make_default_id("/data/Usu Individual T423.csv");
        assert_eq!(make(2), "usu-individual-t423-00000002");
        let make = make_default_id("***.csv");
        assert_eq!(make(10), "records-00000010");
    }
}
