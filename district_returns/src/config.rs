// ********* Geography ***********

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;

use crate::labels::{strip_party_suffix, MarkerPattern};

/// The five counties of New York City.
///
/// The declaration order is the order in which the counties are reported.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum County {
    NewYork,
    Kings,
    Queens,
    Bronx,
    Richmond,
}

impl County {
    pub const ALL: [County; 5] = [
        County::NewYork,
        County::Kings,
        County::Queens,
        County::Bronx,
        County::Richmond,
    ];

    /// The county name, as written in the Board of Elections exports.
    pub fn name(self) -> &'static str {
        match self {
            County::NewYork => "New York",
            County::Kings => "Kings",
            County::Queens => "Queens",
            County::Bronx => "Bronx",
            County::Richmond => "Richmond",
        }
    }

    /// The borough name.
    pub fn display_name(self) -> &'static str {
        match self {
            County::NewYork => "Manhattan",
            County::Kings => "Brooklyn",
            County::Queens => "Queens",
            County::Bronx => "Bronx",
            County::Richmond => "Staten Island",
        }
    }

    /// Accepts either the county name or the borough name, ignoring case.
    pub fn from_name(s: &str) -> Option<County> {
        let s = s.trim();
        County::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s) || c.display_name().eq_ignore_ascii_case(s))
    }
}

impl Display for County {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifier of an election district: assembly_district * 1000 + election_district.
///
/// This is the join key with the district geometries.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ElectDist(u32);

impl ElectDist {
    /// Returns None if the election district does not fit in three digits.
    pub fn new(assembly_district: u32, election_district: u32) -> Option<ElectDist> {
        if election_district >= 1000 {
            return None;
        }
        assembly_district
            .checked_mul(1000)
            .and_then(|x| x.checked_add(election_district))
            .map(ElectDist)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn assembly_district(self) -> u32 {
        self.0 / 1000
    }

    pub fn election_district(self) -> u32 {
        self.0 % 1000
    }
}

impl Display for ElectDist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ********* Input data structures ***********

/// One line of the export, after the constant columns have been projected away.
///
/// All the fields are kept as text: combined districts carry notes where
/// numbers are expected.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub county: String,
    pub assembly_district: String,
    pub election_district: String,
    pub status: Option<String>,
    pub vote_choice: String,
    pub vote_count: String,
    /// The complete line, for error reports.
    pub raw: String,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub assembly_district: u32,
    pub election_district: u32,
    pub county: County,
    pub elect_dist: ElectDist,
    pub vote_choice: String,
    pub vote_count: u64,
}

/// Votes for one candidate (or the scattered bucket) in one election district.
pub type CandidateRecord = VoteRecord;

/// Votes cast with one ballot method in one election district.
pub type BallotTypeRecord = VoteRecord;

/// An election district that did not report: its votes are included in the
/// totals of the reporting district.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct MergedDistrictRecord {
    pub source_ad: u32,
    pub source_ed: u32,
    pub county: County,
    pub reported_ad: u32,
    pub reported_ed: u32,
}

impl MergedDistrictRecord {
    pub fn source(&self) -> Option<ElectDist> {
        ElectDist::new(self.source_ad, self.source_ed)
    }

    pub fn reported(&self) -> Option<ElectDist> {
        ElectDist::new(self.reported_ad, self.reported_ed)
    }
}

/// Errors that prevent the normalization from completing.
///
/// Row-level errors carry the line number and the raw content of the line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ReturnsError {
    /// Structural problem: missing columns, wrong column count, non numeric districts.
    MalformedInput {
        line: Option<usize>,
        message: String,
        raw: String,
    },
    /// The label is neither a configured candidate nor a configured ballot method.
    UnknownVoteChoice {
        line: Option<usize>,
        label: String,
        raw: String,
    },
    MergedDistrictParse {
        line: usize,
        note: String,
        reason: String,
        raw: String,
    },
    UnknownCounty {
        line: usize,
        county: String,
        raw: String,
    },
    DistrictOutsideCounty {
        line: usize,
        county: County,
        assembly_district: u32,
        raw: String,
    },
    /// The same district is folded into two different reporting districts.
    ConflictingMergedDistrict {
        county: County,
        source_ad: u32,
        source_ed: u32,
        first: (u32, u32),
        second: (u32, u32),
    },
    DuplicateElectDist {
        line: usize,
        elect_dist: ElectDist,
        first: County,
        second: County,
    },
    InvalidConfig {
        message: String,
    },
    VoteConservation {
        county: County,
        expected: u64,
        actual: u64,
    },
}

impl ReturnsError {
    pub(crate) fn malformed(line: Option<usize>, message: impl Into<String>, raw: &str) -> ReturnsError {
        ReturnsError::MalformedInput {
            line,
            message: message.into(),
            raw: raw.to_string(),
        }
    }

    /// The line of the export where the error was detected, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ReturnsError::MalformedInput { line, .. } => *line,
            ReturnsError::UnknownVoteChoice { line, .. } => *line,
            ReturnsError::MergedDistrictParse { line, .. } => Some(*line),
            ReturnsError::UnknownCounty { line, .. } => Some(*line),
            ReturnsError::DistrictOutsideCounty { line, .. } => Some(*line),
            ReturnsError::DuplicateElectDist { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl Error for ReturnsError {}

impl Display for ReturnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnsError::MalformedInput {
                line: Some(line),
                message,
                raw,
            } => write!(f, "malformed input at line {}: {} ({:?})", line, message, raw),
            ReturnsError::MalformedInput { message, .. } => {
                write!(f, "malformed input: {}", message)
            }
            ReturnsError::UnknownVoteChoice {
                line: Some(line),
                label,
                raw,
            } => write!(f, "unknown vote choice {:?} at line {} ({:?})", label, line, raw),
            ReturnsError::UnknownVoteChoice { label, raw, .. } => {
                write!(f, "unknown vote choice {:?} ({})", label, raw)
            }
            ReturnsError::MergedDistrictParse {
                line,
                note,
                reason,
                raw,
            } => write!(
                f,
                "cannot read combined district note {:?} at line {}: {} ({:?})",
                note, line, reason, raw
            ),
            ReturnsError::UnknownCounty { line, county, raw } => {
                write!(f, "unknown county {:?} at line {} ({:?})", county, line, raw)
            }
            ReturnsError::DistrictOutsideCounty {
                line,
                county,
                assembly_district,
                raw,
            } => write!(
                f,
                "assembly district {} is not part of {} (line {}: {:?})",
                assembly_district, county, line, raw
            ),
            ReturnsError::ConflictingMergedDistrict {
                county,
                source_ad,
                source_ed,
                first,
                second,
            } => write!(
                f,
                "district {}/{} in {} is combined into both {}/{} and {}/{}",
                source_ed, source_ad, county, first.1, first.0, second.1, second.0
            ),
            ReturnsError::DuplicateElectDist {
                line,
                elect_dist,
                first,
                second,
            } => write!(
                f,
                "election district {} appears in both {} and {} (line {})",
                elect_dist, first, second, line
            ),
            ReturnsError::InvalidConfig { message } => {
                write!(f, "invalid election configuration: {}", message)
            }
            ReturnsError::VoteConservation {
                county,
                expected,
                actual,
            } => write!(
                f,
                "vote totals changed for {}: {} before, {} after",
                county, expected, actual
            ),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateSpec {
    /// The name as printed on the ballot, without party annotation.
    pub name: String,
    /// A shorter name used in the output tables.
    pub display_name: Option<String>,
}

impl CandidateSpec {
    pub fn new(name: &str) -> CandidateSpec {
        CandidateSpec {
            name: name.to_string(),
            display_name: None,
        }
    }

    pub fn with_display_name(name: &str, display_name: &str) -> CandidateSpec {
        CandidateSpec {
            name: name.to_string(),
            display_name: Some(display_name.to_string()),
        }
    }

    /// The name under which the votes are reported.
    pub fn canonical(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    fn matches(&self, label: &str) -> bool {
        self.name.eq_ignore_ascii_case(label)
            || self
                .display_name
                .as_deref()
                .map(|d| d.eq_ignore_ascii_case(label))
                .unwrap_or(false)
    }
}

/// Where to find the fields in the raw export.
///
/// Column names are compared after trimming and ignoring case.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExportLayout {
    /// If false, every line starts with the column labels followed by the values
    /// (the "extended" export of the Board of Elections).
    pub has_header_row: bool,
    pub min_columns: usize,
    pub assembly_district: String,
    pub election_district: String,
    pub county: String,
    pub status: Option<String>,
    pub vote_choice: String,
    pub vote_count: String,
    /// Status of a district that reported its own votes.
    pub in_play_status: String,
    /// Regular expression with the named groups `ed` and `ad`, giving the
    /// district that reported the votes of a combined district.
    pub combined_marker: String,
}

impl ExportLayout {
    pub const DEFAULT_COMBINED_MARKER: &'static str =
        r"(?i)COMBINED\s+INTO\D*?(?P<ed>\d{1,3})\s*/\s*(?P<ad>\d{1,3})\s*$";

    /// The 22-column export published by the NYC Board of Elections.
    pub fn nyc_extended() -> ExportLayout {
        ExportLayout {
            has_header_row: false,
            min_columns: 22,
            assembly_district: "AD".to_string(),
            election_district: "ED".to_string(),
            county: "County".to_string(),
            status: Some("EDAD Status".to_string()),
            vote_choice: "Unit Name".to_string(),
            vote_count: "Tally".to_string(),
            in_play_status: "IN-PLAY".to_string(),
            combined_marker: ExportLayout::DEFAULT_COMBINED_MARKER.to_string(),
        }
    }
}

impl Default for ExportLayout {
    fn default() -> Self {
        ExportLayout::nyc_extended()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VoteChoiceKind {
    Candidate,
    BallotType,
}

/// Everything that differs from one election to the next.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionConfig {
    pub name: String,
    /// In the order of the output columns.
    pub candidates: Vec<CandidateSpec>,
    pub ballot_types: Vec<String>,
    pub scattered_label: String,
    /// Other labels counted in the scattered bucket.
    pub write_in_labels: Vec<String>,
    /// Assembly districts of each county. A county without entry is not checked.
    pub county_districts: BTreeMap<County, BTreeSet<u32>>,
    pub layout: ExportLayout,
}

impl ElectionConfig {
    pub const BUILTIN_NAMES: [&'static str; 2] = ["mayor", "president"];

    pub fn builtin(name: &str) -> Option<ElectionConfig> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mayor" => Some(ElectionConfig::mayor_2025()),
            "president" => Some(ElectionConfig::president_2024()),
            _ => None,
        }
    }

    /// 2025 general election for Mayor.
    pub fn mayor_2025() -> ElectionConfig {
        ElectionConfig {
            name: "mayor".to_string(),
            candidates: vec![
                CandidateSpec::with_display_name("Andrew M. Cuomo", "Andrew Cuomo"),
                CandidateSpec::with_display_name("Curtis A. Sliwa", "Curtis Sliwa"),
                CandidateSpec::with_display_name("Eric L. Adams", "Eric Adams"),
                CandidateSpec::new("Irene Estrada"),
                CandidateSpec::new("Jim Walden"),
                CandidateSpec::new("Joseph Hernandez"),
                CandidateSpec::with_display_name("Zohran Kwame Mamdani", "Zohran Mamdani"),
            ],
            ballot_types: vec![
                "Public Counter".to_string(),
                "Absentee / Military".to_string(),
                "Affidavit".to_string(),
                "Manually Counted Emergency".to_string(),
            ],
            scattered_label: "Scattered".to_string(),
            write_in_labels: vec!["Write-in".to_string(), "Irregular".to_string()],
            county_districts: nyc_assembly_districts(),
            layout: ExportLayout::nyc_extended(),
        }
    }

    /// 2024 general election for President and Vice President.
    pub fn president_2024() -> ElectionConfig {
        ElectionConfig {
            name: "president".to_string(),
            candidates: vec![
                CandidateSpec::with_display_name("Donald J. Trump / JD Vance", "Trump"),
                CandidateSpec::with_display_name("Kamala D. Harris / Tim Walz", "Harris"),
            ],
            ballot_types: vec![
                "Public Counter".to_string(),
                "Absentee / Military".to_string(),
                "Affidavit".to_string(),
                "Manually Counted Emergency".to_string(),
                "Federal".to_string(),
            ],
            scattered_label: "Scattered".to_string(),
            write_in_labels: vec!["Write-in".to_string(), "Irregular".to_string()],
            county_districts: nyc_assembly_districts(),
            layout: ExportLayout::nyc_extended(),
        }
    }

    /// The columns of the candidate tables: the candidates in configuration
    /// order, then the scattered bucket.
    pub fn candidate_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for c in self.candidates.iter() {
            let name = c.canonical().to_string();
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        if !columns.contains(&self.scattered_label) {
            columns.push(self.scattered_label.clone());
        }
        columns
    }

    /// The name under which the votes for this label are counted, if the
    /// label belongs to a candidate or to the scattered bucket.
    pub fn canonical_candidate(&self, label: &str) -> Option<String> {
        let stripped = strip_party_suffix(label);
        if let Some(c) = self.candidates.iter().find(|c| c.matches(&stripped)) {
            return Some(c.canonical().to_string());
        }
        let is_scattered = self.scattered_label.eq_ignore_ascii_case(&stripped)
            || self
                .write_in_labels
                .iter()
                .any(|w| w.eq_ignore_ascii_case(&stripped));
        if is_scattered {
            Some(self.scattered_label.clone())
        } else {
            None
        }
    }

    /// The configured spelling of a ballot method.
    pub fn ballot_type_label(&self, label: &str) -> Option<&str> {
        let label = label.trim();
        self.ballot_types
            .iter()
            .find(|b| b.eq_ignore_ascii_case(label))
            .map(|b| b.as_str())
    }

    pub fn classify(&self, label: &str) -> Option<VoteChoiceKind> {
        if self.ballot_type_label(label).is_some() {
            Some(VoteChoiceKind::BallotType)
        } else if self.canonical_candidate(label).is_some() {
            Some(VoteChoiceKind::Candidate)
        } else {
            None
        }
    }

    pub fn district_in_county(&self, county: County, assembly_district: u32) -> bool {
        match self.county_districts.get(&county) {
            Some(districts) => districts.contains(&assembly_district),
            None => true,
        }
    }

    pub fn validate(&self) -> Result<(), ReturnsError> {
        let invalid = |message: String| Err(ReturnsError::InvalidConfig { message });
        if self.candidates.is_empty() {
            return invalid(format!("election {:?} has no candidates", self.name));
        }
        if self.scattered_label.trim().is_empty() {
            return invalid("the scattered label is empty".to_string());
        }
        for b in self.ballot_types.iter() {
            if self.canonical_candidate(b).is_some() {
                return invalid(format!(
                    "{:?} is both a ballot method and a candidate",
                    b
                ));
            }
        }
        if self.layout.min_columns == 0 {
            return invalid("min_columns must be at least 1".to_string());
        }
        MarkerPattern::new(&self.layout.combined_marker)?;
        Ok(())
    }
}

/// Assembly districts of each county (2022 district lines).
///
/// Districts 61 and 64 straddle two counties.
pub fn nyc_assembly_districts() -> BTreeMap<County, BTreeSet<u32>> {
    let mut res: BTreeMap<County, BTreeSet<u32>> = BTreeMap::new();
    res.insert(
        County::NewYork,
        std::iter::once(61).chain(65..=76).collect(),
    );
    res.insert(County::Kings, (41..=60).chain(std::iter::once(64)).collect());
    res.insert(County::Queens, (23..=40).collect());
    res.insert(County::Bronx, (77..=87).collect());
    res.insert(County::Richmond, (61..=64).collect());
    res
}
