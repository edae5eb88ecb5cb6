use clap::Parser;

/// Calculator for digital-exclusion and social-mobility indicators.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file selecting the formula
    /// variant and describing the record sources. For the file format, read
    /// the crate manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path or empty) The spreadsheet of records to process. When this
    /// flag and the configuration sources are both absent, the program runs
    /// in single-record mode over the --sex/--age/... flags.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, xlsx or eph. See the manual
    /// for all the input types.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path or empty) Companion household table for the eph input
    /// type, merged with the individual table on the shared key.
    #[clap(long, value_parser)]
    pub household_input: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default reference) The formula preset: reference, thresholdAdditive,
    /// legacyTwoDimension or stepped. Overridden by the configuration file.
    #[clap(long, value_parser)]
    pub variant: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the
    /// computation will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the per-record results will be
    /// written as a CSV spreadsheet to the given location.
    #[clap(long, value_parser)]
    pub results: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, excalc
    /// will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Single-record entry, mirroring the manual form.
    /// Sexo (Varón / Mujer)
    #[clap(long, value_parser)]
    pub sex: Option<String>,
    /// Edad (0-120)
    #[clap(long, value_parser)]
    pub age: Option<u32>,
    /// Nivel educativo (e.g. "Primario completo")
    #[clap(long, value_parser)]
    pub education: Option<String>,
    /// ¿Tiene acceso a computadora? (Sí / No)
    #[clap(long, value_parser)]
    pub computer: Option<String>,
    /// ¿Tiene acceso a internet? (Sí / No)
    #[clap(long, value_parser)]
    pub internet: Option<String>,
    /// ¿Tiene capacitación en TIC? (Sí / No)
    #[clap(long, value_parser)]
    pub training: Option<String>,
    /// Región (e.g. "Gran Buenos Aires")
    #[clap(long, value_parser)]
    pub region: Option<String>,
    /// Provincia (optional)
    #[clap(long, value_parser)]
    pub province: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
