//! Normalization of the per-election-district returns published by the NYC
//! Board of Elections.
//!
//! The raw export has one line per (election district, vote choice) and
//! repeats a lot of metadata on every line. This crate turns it into:
//! - the candidate votes per election district, one row per candidate (all
//!   the party lines of a candidate are summed)
//! - the votes per ballot method
//! - the districts that did not report, and the district that reported for them
//! - one table per county with the votes of each candidate per assembly district
//!
//! The total number of votes is the same before and after the transformation.
//!
//! See the [manual] for the input format and the configuration.

mod config;
pub mod aggregate;
pub mod builder;
pub mod labels;
pub mod manual;
pub mod merged;
pub mod normalize;
pub mod pivot;
pub mod summary;
pub mod table;

use log::{debug, info, warn};
use std::collections::BTreeMap;

pub use crate::config::*;
pub use crate::pivot::CountyVoteTable;
pub use crate::summary::{CandidateTotal, DistrictShares, MergedDistrictIndex, ShareDifference};
pub use crate::table::RawTable;

/// All the tables produced from one export.
#[derive(PartialEq, Debug, Clone)]
pub struct ElectionTables {
    pub candidates: Vec<CandidateRecord>,
    pub ballot_types: Vec<BallotTypeRecord>,
    pub merged_districts: Vec<MergedDistrictRecord>,
    /// All five counties are present.
    pub county_tables: BTreeMap<County, CountyVoteTable>,
    pub district_shares: DistrictShares,
    pub citywide: Vec<CandidateTotal>,
}

impl ElectionTables {
    /// The table of a county, by county or borough name.
    pub fn county_table(&self, name: &str) -> Option<&CountyVoteTable> {
        County::from_name(name).and_then(|c| self.county_tables.get(&c))
    }

    pub fn merged_index(&self) -> MergedDistrictIndex {
        MergedDistrictIndex::new(&self.merged_districts)
    }
}

/// Loads the records of an export and runs all the stages.
///
/// Arguments:
/// * `records` the lines of the file, split into cells, in file order
/// * `config` the configuration of the election
pub fn normalize_records(
    records: Vec<Vec<String>>,
    config: &ElectionConfig,
) -> Result<ElectionTables, ReturnsError> {
    config.validate()?;
    let table = RawTable::from_records(records, &config.layout)?;
    run_pipeline(&table, config)
}

/// Runs the stages on a loaded export.
pub fn run_pipeline(table: &RawTable, config: &ElectionConfig) -> Result<ElectionTables, ReturnsError> {
    info!(
        "run_pipeline: election {:?}: processing {} rows",
        config.name,
        table.len()
    );
    config.validate()?;

    let rows = table.rows(&config.layout)?;
    let normalized = normalize::normalize_rows(&rows, config)?;
    let merged_districts = merged::resolve_merged_districts(&normalized.combined, config)?;
    let candidates = aggregate::aggregate_candidates(&normalized.candidates, config)?;
    let ballot_types = aggregate::aggregate_ballot_types(&normalized.ballot_types, config)?;
    let county_tables = pivot::build_county_tables(&candidates, config)?;
    check_vote_conservation(&normalized.candidates, &county_tables)?;
    let district_shares = summary::district_shares(&candidates, config)?;
    for m in merged_districts.iter() {
        let reported = m.reported().and_then(|r| district_shares.get(r));
        if reported.is_none() {
            warn!(
                "run_pipeline: {} district {}/{} is combined into {}/{}, which has no votes",
                m.county, m.source_ed, m.source_ad, m.reported_ed, m.reported_ad
            );
        }
    }
    let citywide = summary::citywide_totals(&county_tables);

    for t in citywide.iter() {
        info!("run_pipeline: {:>10} {:>6.2}% {}", t.votes, t.percentage, t.name);
    }

    Ok(ElectionTables {
        candidates,
        ballot_types,
        merged_districts,
        county_tables,
        district_shares,
        citywide,
    })
}

/// Checks that every county table holds exactly the votes of the raw candidate rows of the county.
pub fn check_vote_conservation(
    raw_candidates: &[CandidateRecord],
    county_tables: &BTreeMap<County, CountyVoteTable>,
) -> Result<(), ReturnsError> {
    let expected = aggregate::totals_by_county(raw_candidates);
    for (county, expected) in expected.into_iter() {
        let actual = county_tables.get(&county).map(|t| t.total()).unwrap_or(0);
        debug!(
            "check_vote_conservation: {}: {} raw votes, {} in table",
            county, expected, actual
        );
        if actual != expected {
            return Err(ReturnsError::VoteConservation {
                county,
                expected,
                actual,
            });
        }
    }
    Ok(())
}
