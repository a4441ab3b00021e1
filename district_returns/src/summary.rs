//! Tables derived from the candidate votes for the map and dashboard layers:
//! vote shares per election district and citywide totals.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::config::*;
use crate::pivot::CountyVoteTable;

/// Votes of each candidate column in one election district.
#[derive(PartialEq, Debug, Clone)]
pub struct DistrictShare {
    pub county: County,
    pub elect_dist: ElectDist,
    /// Same order as the columns of the candidate tables.
    pub votes: Vec<u64>,
    pub total: u64,
}

impl DistrictShare {
    /// Percentage of the district votes, rounded to 2 decimals. 0 for a district without votes.
    pub fn share(&self, column: usize) -> Option<f64> {
        let votes = *self.votes.get(column)?;
        Some(percentage(votes, self.total))
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct DistrictShares {
    columns: Vec<String>,
    districts: BTreeMap<ElectDist, DistrictShare>,
}

impl DistrictShares {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, elect_dist: ElectDist) -> Option<&DistrictShare> {
        self.districts.get(&elect_dist)
    }

    /// The district, or the district that reported its votes when it was combined.
    pub fn lookup(&self, elect_dist: ElectDist, merged: &MergedDistrictIndex) -> Option<&DistrictShare> {
        self.get(elect_dist)
            .or_else(|| merged.reported_for(elect_dist).and_then(|r| self.get(r)))
    }

    pub fn votes(&self, elect_dist: ElectDist, candidate: &str) -> Option<u64> {
        let idx = self.columns.iter().position(|c| c == candidate)?;
        self.get(elect_dist).map(|d| d.votes[idx])
    }

    pub fn share(&self, elect_dist: ElectDist, candidate: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == candidate)?;
        self.get(elect_dist).and_then(|d| d.share(idx))
    }

    fn column_index(&self, candidate: &str) -> Result<usize, ReturnsError> {
        self.columns
            .iter()
            .position(|c| c == candidate)
            .ok_or_else(|| ReturnsError::UnknownVoteChoice {
                line: None,
                label: candidate.to_string(),
                raw: format!("columns {:?}", self.columns),
            })
    }

    /// By increasing district.
    pub fn iter(&self) -> impl Iterator<Item = &DistrictShare> + '_ {
        self.districts.values()
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }
}

pub fn district_shares(
    records: &[CandidateRecord],
    config: &ElectionConfig,
) -> Result<DistrictShares, ReturnsError> {
    let columns = config.candidate_columns();
    let mut districts: BTreeMap<ElectDist, DistrictShare> = BTreeMap::new();
    for r in records.iter() {
        let idx = columns
            .iter()
            .position(|c| *c == r.vote_choice)
            .ok_or_else(|| ReturnsError::UnknownVoteChoice {
                line: None,
                label: r.vote_choice.clone(),
                raw: format!("{} election district {}", r.county, r.elect_dist),
            })?;
        let d = districts.entry(r.elect_dist).or_insert_with(|| DistrictShare {
            county: r.county,
            elect_dist: r.elect_dist,
            votes: vec![0; columns.len()],
            total: 0,
        });
        d.votes[idx] += r.vote_count;
        d.total += r.vote_count;
    }
    debug!("district_shares: {} election districts", districts.len());
    Ok(DistrictShares { columns, districts })
}

#[derive(PartialEq, Debug, Clone)]
pub struct CandidateTotal {
    pub name: String,
    pub votes: u64,
    pub percentage: f64,
}

/// Votes of each candidate over the five counties.
pub fn citywide_totals(tables: &BTreeMap<County, CountyVoteTable>) -> Vec<CandidateTotal> {
    let columns: Vec<String> = match tables.values().next() {
        Some(t) => t.columns().to_vec(),
        None => return vec![],
    };
    let votes: Vec<u64> = columns
        .iter()
        .map(|c| {
            tables
                .values()
                .filter_map(|t| t.column_total(c))
                .sum::<u64>()
        })
        .collect();
    let total: u64 = votes.iter().sum();
    columns
        .into_iter()
        .zip(votes)
        .map(|(name, votes)| CandidateTotal {
            name,
            votes,
            percentage: percentage(votes, total),
        })
        .collect()
}

/// Vote shares of one candidate of each table in an election district, and their difference.
#[derive(PartialEq, Debug, Clone)]
pub struct ShareDifference {
    pub county: County,
    pub elect_dist: ElectDist,
    pub first: f64,
    pub second: f64,
    /// first - second, in percentage points.
    pub difference: f64,
}

/// Compares the share of a candidate with the share of another candidate,
/// district by district.
///
/// The two tables may come from the same election (two candidates of a race) or
/// from two elections (the winners of both). Only the districts present in both
/// tables are compared.
pub fn compare_shares(
    first: &DistrictShares,
    first_candidate: &str,
    second: &DistrictShares,
    second_candidate: &str,
) -> Result<Vec<ShareDifference>, ReturnsError> {
    let first_idx = first.column_index(first_candidate)?;
    let second_idx = second.column_index(second_candidate)?;
    let res: Vec<ShareDifference> = first
        .iter()
        .filter_map(|a| {
            let b = second.get(a.elect_dist)?;
            let x = a.share(first_idx)?;
            let y = b.share(second_idx)?;
            Some(ShareDifference {
                county: a.county,
                elect_dist: a.elect_dist,
                first: x,
                second: y,
                difference: ((x - y) * 100.0).round() / 100.0,
            })
        })
        .collect();
    debug!(
        "compare_shares: {} vs {}: {} common election districts",
        first_candidate,
        second_candidate,
        res.len()
    );
    Ok(res)
}

/// Finds the district that reported the votes of a combined district.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MergedDistrictIndex {
    reported: HashMap<ElectDist, ElectDist>,
}

impl MergedDistrictIndex {
    pub fn new(merged: &[MergedDistrictRecord]) -> MergedDistrictIndex {
        MergedDistrictIndex {
            reported: merged
                .iter()
                .filter_map(|m| Some((m.source()?, m.reported()?)))
                .collect(),
        }
    }

    pub fn reported_for(&self, elect_dist: ElectDist) -> Option<ElectDist> {
        self.reported.get(&elect_dist).copied()
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 / total as f64 * 10_000.0).round() / 100.0
}
