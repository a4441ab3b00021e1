use log::{debug, info, warn};

use district_returns::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod config_reader;
pub mod io_csv;
pub mod io_excel;
pub mod output;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    Pipeline { source: ReturnsError },
    #[snafu(display("Unknown election {name}, expected one of {expected:?} or a configuration file"))]
    UnknownElection {
        name: String,
        expected: Vec<&'static str>,
    },
    #[snafu(display("Unknown input type {input_type}, expected csv or excel"))]
    UnknownInputType { input_type: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CliResult<T> = Result<T, CliError>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Excel,
}

impl InputType {
    /// The explicit type if given, otherwise guessed from the extension of the file.
    pub fn resolve(input_type: Option<&str>, path: &str) -> CliResult<InputType> {
        match input_type.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "csv" => Ok(InputType::Csv),
            Some(s) if s == "excel" || s == "xlsx" => Ok(InputType::Excel),
            Some(s) => UnknownInputTypeSnafu { input_type: s }.fail(),
            None => {
                let ext = Path::new(path)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
                match ext.as_deref() {
                    Some("xlsx") | Some("xlsm") => Ok(InputType::Excel),
                    _ => Ok(InputType::Csv),
                }
            }
        }
    }
}

fn election_config(args: &Args) -> CliResult<ElectionConfig> {
    if let Some(path) = &args.config {
        if args.election.is_some() {
            warn!("election_config: --election is ignored when --config is given");
        }
        return config_reader::read_config(path);
    }
    let name = args.election.clone().unwrap_or_else(|| "mayor".to_string());
    ElectionConfig::builtin(&name).context(UnknownElectionSnafu {
        name,
        expected: ElectionConfig::BUILTIN_NAMES.to_vec(),
    })
}

fn read_records(args: &Args) -> CliResult<Vec<Vec<String>>> {
    let input_type = InputType::resolve(args.input_type.as_deref(), &args.input)?;
    info!("read_records: reading {} as {:?}", args.input, input_type);
    match input_type {
        InputType::Csv => io_csv::read_csv_records(&args.input),
        InputType::Excel => {
            io_excel::read_excel_records(&args.input, args.excel_worksheet_name.as_deref())
        }
    }
}

/// Runs the normalization described by the command line.
pub fn run(args: &Args) -> CliResult<()> {
    let config = election_config(args)?;
    debug!("run: config: {:?}", config);

    let records = read_records(args)?;
    let tables = normalize_records(records, &config).context(PipelineSnafu {})?;

    let summary_js = output::build_summary_js(&config, &tables);
    let pretty_js_summary = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_summary),
        Some(path) => {
            fs::write(path, &pretty_js_summary).context(WritingOutputSnafu { path })?;
            info!("run: summary written to {}", path);
        }
    }

    if let Some(dir) = &args.out_dir {
        io_csv::write_tables(Path::new(dir), &tables)?;
    }

    if let Some(reference_p) = &args.reference {
        check_reference(reference_p, &pretty_js_summary)?;
    }

    Ok(())
}

/// Compares the summary with a summary written by a previous run.
fn check_reference(reference_p: &str, pretty_js_summary: &str) -> CliResult<()> {
    let summary_ref = read_summary(reference_p)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_summary, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("check_reference: the summary matches {}", reference_p);
    Ok(())
}

pub fn read_summary(path: &str) -> CliResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use district_returns::builder::ReturnsBuilder;
    use std::env;

    fn temp_path(name: &str) -> String {
        env::temp_dir()
            .join(format!("nycvotes-{}-{}", std::process::id(), name))
            .to_string_lossy()
            .to_string()
    }

    fn args(input: &str) -> Args {
        Args {
            input: input.to_string(),
            election: Some("mayor".to_string()),
            config: None,
            input_type: None,
            excel_worksheet_name: None,
            out: None,
            out_dir: None,
            reference: None,
            verbose: false,
        }
    }

    fn write_sample(path: &str) {
        let config = ElectionConfig::mayor_2025();
        let mut b = ReturnsBuilder::new(&config.layout);
        b.add_votes("Kings", 57, 1, "Zohran Kwame Mamdani (Democratic)", 1400);
        b.add_votes("Kings", 57, 1, "Zohran Kwame Mamdani (Working Families)", 50);
        b.add_votes("Kings", 57, 1, "Public Counter", 1450);
        b.add_combined("Kings", 57, 2, "Jim Walden", 57, 1);
        io_csv::write_records(path, &b.records()).unwrap();
    }

    #[test]
    fn input_types() {
        assert_eq!(InputType::resolve(None, "a/b.csv").unwrap(), InputType::Csv);
        assert_eq!(InputType::resolve(None, "a/b.XLSX").unwrap(), InputType::Excel);
        assert_eq!(InputType::resolve(None, "a/b").unwrap(), InputType::Csv);
        assert_eq!(
            InputType::resolve(Some("excel"), "a/b.csv").unwrap(),
            InputType::Excel
        );
        assert!(InputType::resolve(Some("ess"), "a/b.csv").is_err());
    }

    #[test]
    fn unknown_election() {
        let mut a = args("unused.csv");
        a.election = Some("governor".to_string());
        assert!(matches!(
            election_config(&a),
            Err(CliError::UnknownElection { .. })
        ));
    }

    #[test]
    fn run_and_compare() {
        let input = temp_path("run_and_compare.csv");
        let out = temp_path("run_and_compare.json");
        write_sample(&input);

        let mut a = args(&input);
        a.out = Some(out.clone());
        run(&a).unwrap();

        let js = read_summary(&out).unwrap();
        assert_eq!(js["counties"]["Kings"]["total"], 1450);

        // The same run matches its own output.
        a.reference = Some(out.clone());
        a.out = Some(temp_path("run_and_compare_2.json"));
        run(&a).unwrap();

        // A different election does not.
        fs::write(&out, "{\"election\": \"president\"}").unwrap();
        assert!(matches!(run(&a), Err(CliError::Whatever { .. })));
    }

    #[test]
    fn pipeline_errors_are_reported() {
        let input = temp_path("pipeline_errors.csv");
        write_sample(&input);
        let mut a = args(&input);
        a.election = Some("president".to_string());
        a.out = Some(temp_path("pipeline_errors.json"));
        match run(&a) {
            Err(CliError::Pipeline {
                source: ReturnsError::UnknownVoteChoice { line, .. },
            }) => assert_eq!(line, Some(1)),
            x => panic!("unexpected result {:?}", x),
        }
    }
}
