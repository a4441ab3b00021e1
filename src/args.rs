use clap::Parser;

/// Normalizes the per-election-district returns of the NYC Board of Elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The export of the Board of Elections, in CSV or Excel format.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (mayor, president or empty) A built-in election. Ignored if --config is given.
    #[clap(short, long, value_parser)]
    pub election: Option<String>,

    /// (file path, optional) A JSON description of the election: candidates, ballot methods
    /// and layout of the export. See the manual of district_returns for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (csv or excel) The type of the input. By default, it is guessed from the extension of the input.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: the first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) Where the summary of the election is written in JSON format.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory path, optional) If specified, the tables are also written as CSV files in this directory.
    #[clap(long, value_parser)]
    pub out_dir: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, nycvotes will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
