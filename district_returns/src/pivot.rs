use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;

/// Votes per assembly district (rows) and candidate (columns) in one county.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountyVoteTable {
    county: County,
    columns: Vec<String>,
    // Invariant: every row has one cell per column.
    rows: BTreeMap<u32, Vec<u64>>,
}

impl CountyVoteTable {
    pub fn new(county: County, columns: &[String]) -> CountyVoteTable {
        CountyVoteTable {
            county,
            columns: columns.to_vec(),
            rows: BTreeMap::new(),
        }
    }

    pub fn county(&self) -> County {
        self.county
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// In increasing order.
    pub fn assembly_districts(&self) -> Vec<u32> {
        self.rows.keys().cloned().collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, &[u64])> + '_ {
        self.rows.iter().map(|(ad, cells)| (*ad, cells.as_slice()))
    }

    pub fn row(&self, assembly_district: u32) -> Option<&[u64]> {
        self.rows.get(&assembly_district).map(|cells| cells.as_slice())
    }

    /// The votes of a candidate in a district. Absent combinations are 0,
    /// None means the district or the candidate is not in the table.
    pub fn get(&self, assembly_district: u32, candidate: &str) -> Option<u64> {
        let idx = self.column_index(candidate)?;
        self.row(assembly_district).map(|cells| cells[idx])
    }

    pub fn row_total(&self, assembly_district: u32) -> Option<u64> {
        self.row(assembly_district).map(|cells| cells.iter().sum())
    }

    pub fn column_total(&self, candidate: &str) -> Option<u64> {
        let idx = self.column_index(candidate)?;
        Some(self.rows.values().map(|cells| cells[idx]).sum())
    }

    pub fn total(&self) -> u64 {
        self.rows.values().flat_map(|cells| cells.iter()).sum()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, candidate: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == candidate)
    }

    fn add(&mut self, assembly_district: u32, column: usize, count: u64) {
        let width = self.columns.len();
        let cells = self
            .rows
            .entry(assembly_district)
            .or_insert_with(|| vec![0; width]);
        cells[column] += count;
    }
}

/// Builds the table of each of the five counties from the candidate rows.
///
/// A county without rows gets an empty table.
pub fn build_county_tables(
    records: &[CandidateRecord],
    config: &ElectionConfig,
) -> Result<BTreeMap<County, CountyVoteTable>, ReturnsError> {
    let columns = config.candidate_columns();
    let mut tables: BTreeMap<County, CountyVoteTable> = County::ALL
        .iter()
        .map(|c| (*c, CountyVoteTable::new(*c, &columns)))
        .collect();

    for r in records.iter() {
        let column = columns
            .iter()
            .position(|c| *c == r.vote_choice)
            .or_else(|| {
                config
                    .canonical_candidate(&r.vote_choice)
                    .and_then(|name| columns.iter().position(|c| *c == name))
            })
            .ok_or_else(|| ReturnsError::UnknownVoteChoice {
                line: None,
                label: r.vote_choice.clone(),
                raw: format!("{} election district {}", r.county, r.elect_dist),
            })?;
        if let Some(table) = tables.get_mut(&r.county) {
            table.add(r.assembly_district, column, r.vote_count);
        }
    }

    for table in tables.values() {
        debug!(
            "build_county_tables: {}: {} assembly districts, {} votes",
            table.county(),
            table.len(),
            table.total()
        );
    }
    info!(
        "build_county_tables: {} candidate rows, {} columns",
        records.len(),
        columns.len()
    );
    Ok(tables)
}
