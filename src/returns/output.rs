// The JSON summary of an election.

use serde_json::json;
use serde_json::Map as JSMap;

use crate::returns::*;

fn county_table_to_json(table: &CountyVoteTable) -> JSValue {
    let rows: Vec<JSValue> = table
        .rows()
        .map(|(ad, cells)| {
            json!({
                "assemblyDistrict": ad,
                "votes": cells,
                "total": cells.iter().sum::<u64>(),
            })
        })
        .collect();
    json!({
        "borough": table.county().display_name(),
        "columns": table.columns(),
        "rows": rows,
        "total": table.total(),
    })
}

fn ballot_totals_to_json(config: &ElectionConfig, tables: &ElectionTables) -> JSValue {
    let mut totals: JSMap<String, JSValue> = JSMap::new();
    for b in config.ballot_types.iter() {
        let votes: u64 = tables
            .ballot_types
            .iter()
            .filter(|r| r.vote_choice == *b)
            .map(|r| r.vote_count)
            .sum();
        totals.insert(b.clone(), json!(votes));
    }
    JSValue::Object(totals)
}

pub fn build_summary_js(config: &ElectionConfig, tables: &ElectionTables) -> JSValue {
    let mut counties: JSMap<String, JSValue> = JSMap::new();
    for (county, table) in tables.county_tables.iter() {
        counties.insert(county.name().to_string(), county_table_to_json(table));
    }

    let merged: Vec<JSValue> = tables
        .merged_districts
        .iter()
        .map(|m| {
            json!({
                "county": m.county.name(),
                "sourceAd": m.source_ad,
                "sourceEd": m.source_ed,
                "reportedAd": m.reported_ad,
                "reportedEd": m.reported_ed,
            })
        })
        .collect();

    let citywide: Vec<JSValue> = tables
        .citywide
        .iter()
        .map(|t| json!({"name": t.name, "votes": t.votes, "percentage": t.percentage}))
        .collect();

    json!({
        "election": config.name,
        "columns": config.candidate_columns(),
        "electionDistricts": tables.district_shares.len(),
        "citywide": citywide,
        "ballotTypes": ballot_totals_to_json(config, tables),
        "counties": counties,
        "mergedDistricts": merged,
    })
}
