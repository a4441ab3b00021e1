use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;

/// Sums the votes of each candidate across all the party lines, per district.
///
/// The party annotation is removed, write-ins go to the scattered bucket and
/// the display names of the configuration are applied. The rows come out
/// ordered by county, district and configured candidate order.
pub fn aggregate_candidates(
    records: &[CandidateRecord],
    config: &ElectionConfig,
) -> Result<Vec<CandidateRecord>, ReturnsError> {
    let columns = config.candidate_columns();
    let res = sum_by_label(records, &columns, |label| config.canonical_candidate(label))?;
    info!(
        "aggregate_candidates: {} candidate rows aggregated into {} rows",
        records.len(),
        res.len()
    );
    Ok(res)
}

/// Same as `aggregate_candidates`, for the ballot methods.
pub fn aggregate_ballot_types(
    records: &[BallotTypeRecord],
    config: &ElectionConfig,
) -> Result<Vec<BallotTypeRecord>, ReturnsError> {
    let res = sum_by_label(records, &config.ballot_types, |label| {
        config.ballot_type_label(label).map(|s| s.to_string())
    })?;
    debug!(
        "aggregate_ballot_types: {} rows aggregated into {} rows",
        records.len(),
        res.len()
    );
    Ok(res)
}

fn sum_by_label<F>(
    records: &[VoteRecord],
    labels: &[String],
    canonical: F,
) -> Result<Vec<VoteRecord>, ReturnsError>
where
    F: Fn(&str) -> Option<String>,
{
    // The label is stored as its position in `labels` to keep the configured order.
    let mut sums: BTreeMap<(County, ElectDist, usize), u64> = BTreeMap::new();
    for r in records.iter() {
        let label_idx = canonical(&r.vote_choice)
            .and_then(|name| labels.iter().position(|l| *l == name))
            .ok_or_else(|| ReturnsError::UnknownVoteChoice {
                line: None,
                label: r.vote_choice.clone(),
                raw: format!("{} election district {}", r.county, r.elect_dist),
            })?;
        *sums.entry((r.county, r.elect_dist, label_idx)).or_insert(0) += r.vote_count;
    }

    Ok(sums
        .into_iter()
        .map(|((county, elect_dist, label_idx), vote_count)| VoteRecord {
            assembly_district: elect_dist.assembly_district(),
            election_district: elect_dist.election_district(),
            county,
            elect_dist,
            vote_choice: labels[label_idx].clone(),
            vote_count,
        })
        .collect())
}

/// Total votes per (county, district).
pub fn totals_by_district(records: &[VoteRecord]) -> BTreeMap<(County, ElectDist), u64> {
    let mut res: BTreeMap<(County, ElectDist), u64> = BTreeMap::new();
    for r in records.iter() {
        *res.entry((r.county, r.elect_dist)).or_insert(0) += r.vote_count;
    }
    res
}

/// Total votes per county. All the counties are present.
pub fn totals_by_county(records: &[VoteRecord]) -> BTreeMap<County, u64> {
    let mut res: BTreeMap<County, u64> = County::ALL.iter().map(|c| (*c, 0)).collect();
    for r in records.iter() {
        *res.entry(r.county).or_insert(0) += r.vote_count;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(county: County, ad: u32, ed: u32, choice: &str, count: u64) -> VoteRecord {
        VoteRecord {
            assembly_district: ad,
            election_district: ed,
            county,
            elect_dist: ElectDist::new(ad, ed).unwrap(),
            vote_choice: choice.to_string(),
            vote_count: count,
        }
    }

    #[test]
    fn sums_party_lines() {
        let config = ElectionConfig::mayor_2025();
        let records = vec![
            record(County::Kings, 57, 1, "Zohran Kwame Mamdani (Democratic)", 400),
            record(County::Kings, 57, 1, "Curtis A. Sliwa (Republican)", 20),
            record(County::Kings, 57, 1, "Zohran Kwame Mamdani (Working Families)", 50),
            record(County::Kings, 57, 1, "Curtis A. Sliwa (Protect Animals)", 2),
            record(County::Kings, 57, 2, "Zohran Kwame Mamdani (Democratic)", 7),
        ];
        let res = aggregate_candidates(&records, &config).unwrap();
        assert_eq!(
            res,
            vec![
                record(County::Kings, 57, 1, "Curtis Sliwa", 22),
                record(County::Kings, 57, 1, "Zohran Mamdani", 450),
                record(County::Kings, 57, 2, "Zohran Mamdani", 7),
            ]
        );
    }

    #[test]
    fn write_ins_are_scattered() {
        let config = ElectionConfig::president_2024();
        let records = vec![
            record(County::Queens, 23, 4, "Scattered", 3),
            record(County::Queens, 23, 4, "Write-in", 2),
        ];
        let res = aggregate_candidates(&records, &config).unwrap();
        assert_eq!(res, vec![record(County::Queens, 23, 4, "Scattered", 5)]);
    }

    #[test]
    fn conserves_votes() {
        let config = ElectionConfig::president_2024();
        let mut records = Vec::new();
        for (i, county) in County::ALL.iter().enumerate() {
            let ad = [70, 50, 30, 80, 62][i];
            for ed in 1..4u32 {
                records.push(record(*county, ad, ed, "Donald J. Trump / JD Vance (Republican)", 10 * ed as u64));
                records.push(record(*county, ad, ed, "Donald J. Trump / JD Vance (Conservative)", ed as u64));
                records.push(record(*county, ad, ed, "Kamala D. Harris / Tim Walz (Democratic)", 100));
                records.push(record(*county, ad, ed, "Write-in", 1));
            }
        }
        let res = aggregate_candidates(&records, &config).unwrap();
        assert_eq!(totals_by_district(&res), totals_by_district(&records));
        assert_eq!(totals_by_county(&res), totals_by_county(&records));
        assert_eq!(res.len(), 5 * 3 * 3);
    }

    #[test]
    fn ballot_types() {
        let config = ElectionConfig::mayor_2025();
        let records = vec![
            record(County::Bronx, 80, 1, "Affidavit", 3),
            record(County::Bronx, 80, 1, "Public Counter", 300),
            record(County::Bronx, 80, 1, "affidavit", 1),
        ];
        let res = aggregate_ballot_types(&records, &config).unwrap();
        assert_eq!(
            res,
            vec![
                record(County::Bronx, 80, 1, "Public Counter", 300),
                record(County::Bronx, 80, 1, "Affidavit", 4),
            ]
        );
    }

    #[test]
    fn unknown_candidate() {
        let config = ElectionConfig::mayor_2025();
        let records = vec![record(County::Bronx, 80, 1, "Nobody", 3)];
        assert!(matches!(
            aggregate_candidates(&records, &config),
            Err(ReturnsError::UnknownVoteChoice { line: None, .. })
        ));
    }

    #[test]
    fn empty_totals() {
        let totals = totals_by_county(&[]);
        assert_eq!(totals.len(), 5);
        assert!(totals.values().all(|v| *v == 0));
    }
}
