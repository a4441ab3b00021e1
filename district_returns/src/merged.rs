use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;
use crate::labels::{leading_number, MarkerPattern};
use crate::normalize::CombinedMarker;

/// Reads the districts that did not report and the district that reported their votes.
///
/// The export repeats the note on every line of the district, one line per
/// vote choice: identical mappings are collapsed. The votes are not moved.
pub fn resolve_merged_districts(
    markers: &[CombinedMarker],
    config: &ElectionConfig,
) -> Result<Vec<MergedDistrictRecord>, ReturnsError> {
    let pattern = MarkerPattern::new(&config.layout.combined_marker)?;
    let mut resolved: BTreeMap<(County, u32, u32), (u32, u32)> = BTreeMap::new();

    for marker in markers.iter() {
        let record = parse_marker(marker, &pattern)?;
        let key = (record.county, record.source_ad, record.source_ed);
        let target = (record.reported_ad, record.reported_ed);
        match resolved.get(&key) {
            Some(previous) if *previous != target => {
                return Err(ReturnsError::ConflictingMergedDistrict {
                    county: record.county,
                    source_ad: record.source_ad,
                    source_ed: record.source_ed,
                    first: *previous,
                    second: target,
                });
            }
            Some(_) => {}
            None => {
                debug!("resolve_merged_districts: {:?}", record);
                resolved.insert(key, target);
            }
        }
    }

    info!(
        "resolve_merged_districts: {} combined district rows, {} merged districts",
        markers.len(),
        resolved.len()
    );

    Ok(resolved
        .into_iter()
        .map(
            |((county, source_ad, source_ed), (reported_ad, reported_ed))| MergedDistrictRecord {
                source_ad,
                source_ed,
                county,
                reported_ad,
                reported_ed,
            },
        )
        .collect())
}

/// Reads a single marker.
pub fn parse_marker(
    marker: &CombinedMarker,
    pattern: &MarkerPattern,
) -> Result<MergedDistrictRecord, ReturnsError> {
    let parse_error = |reason: &str| ReturnsError::MergedDistrictParse {
        line: marker.line,
        note: marker.note.clone(),
        reason: reason.to_string(),
        raw: marker.raw.clone(),
    };

    let source_ed = leading_number(&marker.election_district)
        .ok_or_else(|| parse_error("the election district of the line is not a number"))?;
    let (reported_ad, reported_ed) = pattern
        .reported_district(&marker.note)
        .ok_or_else(|| parse_error("the note does not name the reporting district"))?;

    let record = MergedDistrictRecord {
        source_ad: marker.assembly_district,
        source_ed,
        county: marker.county,
        reported_ad,
        reported_ed,
    };
    if record.source().is_none() || record.reported().is_none() {
        return Err(parse_error("election districts have at most 3 digits"));
    }
    Ok(record)
}
