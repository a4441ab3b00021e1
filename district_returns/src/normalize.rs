use std::collections::HashMap;

use log::{debug, info};

use crate::config::*;
use crate::labels::{parse_vote_count, MarkerPattern};

/// A line reporting that the votes of its district are counted in another district.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CombinedMarker {
    pub line: usize,
    pub county: County,
    pub assembly_district: u32,
    /// As found in the export: it may hold the note instead of a number.
    pub election_district: String,
    pub vote_choice: String,
    /// The text that names the reporting district.
    pub note: String,
    pub raw: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct NormalizedReturns {
    pub candidates: Vec<CandidateRecord>,
    pub ballot_types: Vec<BallotTypeRecord>,
    pub combined: Vec<CombinedMarker>,
}

/// Splits the rows into candidate votes, ballot method votes and combined district markers.
///
/// Every label must be known to the configuration: dropping a line would
/// change the vote totals.
pub fn normalize_rows(
    rows: &[RawRow],
    config: &ElectionConfig,
) -> Result<NormalizedReturns, ReturnsError> {
    let marker = MarkerPattern::new(&config.layout.combined_marker)?;
    let mut res = NormalizedReturns::default();
    let mut counties_by_elect_dist: HashMap<ElectDist, County> = HashMap::new();

    for row in rows.iter() {
        let county = County::from_name(&row.county).ok_or_else(|| ReturnsError::UnknownCounty {
            line: row.line,
            county: row.county.clone(),
            raw: row.raw.clone(),
        })?;

        let assembly_district = parse_district(&row.assembly_district, "assembly district", row)?;
        if !config.district_in_county(county, assembly_district) {
            return Err(ReturnsError::DistrictOutsideCounty {
                line: row.line,
                county,
                assembly_district,
                raw: row.raw.clone(),
            });
        }

        if let Some(note) = combined_note(row, config, &marker) {
            debug!("normalize_rows: line {}: combined district: {:?}", row.line, note);
            res.combined.push(CombinedMarker {
                line: row.line,
                county,
                assembly_district,
                election_district: row.election_district.clone(),
                vote_choice: row.vote_choice.clone(),
                note,
                raw: row.raw.clone(),
            });
            continue;
        }

        let election_district = parse_district(&row.election_district, "election district", row)?;
        let elect_dist = ElectDist::new(assembly_district, election_district).ok_or_else(|| {
            ReturnsError::malformed(
                Some(row.line),
                format!("election district {} has more than 3 digits", election_district),
                &row.raw,
            )
        })?;
        if let Some(previous) = counties_by_elect_dist.insert(elect_dist, county) {
            if previous != county {
                return Err(ReturnsError::DuplicateElectDist {
                    line: row.line,
                    elect_dist,
                    first: previous,
                    second: county,
                });
            }
        }

        let vote_count = parse_vote_count(&row.vote_count).ok_or_else(|| {
            ReturnsError::malformed(
                Some(row.line),
                format!(
                    "vote count {:?} is not an integer between 0 and {}",
                    row.vote_count,
                    u32::MAX
                ),
                &row.raw,
            )
        })?;

        let kind = config
            .classify(&row.vote_choice)
            .ok_or_else(|| ReturnsError::UnknownVoteChoice {
                line: Some(row.line),
                label: row.vote_choice.clone(),
                raw: row.raw.clone(),
            })?;

        let record = VoteRecord {
            assembly_district,
            election_district,
            county,
            elect_dist,
            vote_choice: row.vote_choice.trim().to_string(),
            vote_count,
        };
        match kind {
            VoteChoiceKind::Candidate => res.candidates.push(record),
            VoteChoiceKind::BallotType => res.ballot_types.push(record),
        }
    }

    info!(
        "normalize_rows: {} rows: {} candidate rows, {} ballot method rows, {} combined district rows",
        rows.len(),
        res.candidates.len(),
        res.ballot_types.len(),
        res.combined.len()
    );
    Ok(res)
}

// The note of a combined district is in the status column, or written in place
// of the tally or of the election district.
fn combined_note(row: &RawRow, config: &ElectionConfig, marker: &MarkerPattern) -> Option<String> {
    if let Some(status) = row.status.as_deref() {
        let status = status.trim();
        if !status.is_empty() && !status.eq_ignore_ascii_case(config.layout.in_play_status.trim()) {
            return Some(status.to_string());
        }
    }
    [&row.vote_count, &row.election_district]
        .iter()
        .find(|field| marker.is_match(field))
        .map(|field| field.trim().to_string())
}

fn parse_district(text: &str, what: &str, row: &RawRow) -> Result<u32, ReturnsError> {
    text.trim().parse::<u32>().map_err(|_| {
        ReturnsError::malformed(
            Some(row.line),
            format!("{} {:?} is not a number", what, text),
            &row.raw,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, county: &str, ad: &str, ed: &str, status: &str, choice: &str, count: &str) -> RawRow {
        RawRow {
            line,
            county: county.to_string(),
            assembly_district: ad.to_string(),
            election_district: ed.to_string(),
            status: Some(status.to_string()),
            vote_choice: choice.to_string(),
            vote_count: count.to_string(),
            raw: format!("{},{},{},{},{},{}", county, ad, ed, status, choice, count),
        }
    }

    #[test]
    fn splits_rows() {
        let config = ElectionConfig::mayor_2025();
        let rows = vec![
            row(1, "Kings", "57", "001", "IN-PLAY", "Public Counter", "450"),
            row(2, "Kings", "57", "001", "IN-PLAY", "Zohran Mamdani (Democratic)", "400"),
            row(3, "Kings", "57", "001", "IN-PLAY", "Zohran Mamdani (Working Families)", "50"),
            row(4, "New York", "61", "005", "COMBINED INTO 012/65", "Jim Walden", "0"),
        ];
        let res = normalize_rows(&rows, &config).unwrap();
        assert_eq!(res.ballot_types.len(), 1);
        assert_eq!(res.candidates.len(), 2);
        assert_eq!(res.combined.len(), 1);
        let c = &res.candidates[0];
        assert_eq!(c.elect_dist.value(), 57001);
        assert_eq!(c.county, County::Kings);
        assert_eq!(c.vote_choice, "Zohran Mamdani (Democratic)");
        assert_eq!(c.vote_count, 400);
        assert_eq!(res.combined[0].note, "COMBINED INTO 012/65");
        assert_eq!(res.combined[0].election_district, "005");
    }

    #[test]
    fn marker_in_tally() {
        let mut config = ElectionConfig::mayor_2025();
        config.layout.status = None;
        let mut r = row(7, "Kings", "57", "002", "", "Jim Walden", "COMBINED INTO 001/57");
        r.status = None;
        let res = normalize_rows(&[r], &config).unwrap();
        assert_eq!(res.combined.len(), 1);
        assert_eq!(res.combined[0].note, "COMBINED INTO 001/57");
    }

    #[test]
    fn unknown_vote_choice() {
        let config = ElectionConfig::mayor_2025();
        let rows = vec![row(9, "Kings", "57", "001", "IN-PLAY", "Kamala D. Harris / Tim Walz", "3")];
        let err = normalize_rows(&rows, &config).unwrap_err();
        assert!(matches!(
            err,
            ReturnsError::UnknownVoteChoice { line: Some(9), .. }
        ));
    }

    #[test]
    fn unknown_county() {
        let config = ElectionConfig::mayor_2025();
        let rows = vec![row(2, "Nassau", "57", "001", "IN-PLAY", "Jim Walden", "3")];
        let err = normalize_rows(&rows, &config).unwrap_err();
        assert_eq!(
            err,
            ReturnsError::UnknownCounty {
                line: 2,
                county: "Nassau".to_string(),
                raw: "Nassau,57,001,IN-PLAY,Jim Walden,3".to_string()
            }
        );
    }

    #[test]
    fn district_outside_county() {
        let config = ElectionConfig::mayor_2025();
        let rows = vec![row(2, "Bronx", "57", "001", "IN-PLAY", "Jim Walden", "3")];
        assert!(matches!(
            normalize_rows(&rows, &config),
            Err(ReturnsError::DistrictOutsideCounty { assembly_district: 57, .. })
        ));
    }

    #[test]
    fn bad_counts() {
        let config = ElectionConfig::mayor_2025();
        for count in ["-1", "abc", ""] {
            let rows = vec![row(4, "Kings", "57", "001", "IN-PLAY", "Jim Walden", count)];
            let err = normalize_rows(&rows, &config).unwrap_err();
            assert_eq!(err.line(), Some(4));
        }
    }

    #[test]
    fn elect_dist_shared_by_two_counties() {
        let config = ElectionConfig::mayor_2025();
        let rows = vec![
            row(1, "New York", "61", "010", "IN-PLAY", "Jim Walden", "3"),
            row(2, "Richmond", "61", "010", "IN-PLAY", "Jim Walden", "3"),
        ];
        assert!(matches!(
            normalize_rows(&rows, &config),
            Err(ReturnsError::DuplicateElectDist { line: 2, .. })
        ));
    }
}
