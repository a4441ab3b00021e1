use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::returns::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsCandidate {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// Every key is optional: missing keys take the value of the 22-column export.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsLayout {
    #[serde(rename = "hasHeaderRow")]
    pub has_header_row: Option<bool>,
    #[serde(rename = "minColumns")]
    pub min_columns: Option<usize>,
    #[serde(rename = "assemblyDistrictColumn")]
    pub assembly_district_column: Option<String>,
    #[serde(rename = "electionDistrictColumn")]
    pub election_district_column: Option<String>,
    #[serde(rename = "countyColumn")]
    pub county_column: Option<String>,
    #[serde(rename = "statusColumn")]
    pub status_column: Option<String>,
    #[serde(rename = "voteChoiceColumn")]
    pub vote_choice_column: Option<String>,
    #[serde(rename = "voteCountColumn")]
    pub vote_count_column: Option<String>,
    #[serde(rename = "inPlayStatus")]
    pub in_play_status: Option<String>,
    #[serde(rename = "combinedMarker")]
    pub combined_marker: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsElectionConfig {
    pub name: String,
    pub candidates: Vec<JsCandidate>,
    #[serde(rename = "ballotTypes")]
    pub ballot_types: Vec<String>,
    #[serde(rename = "scatteredLabel")]
    pub scattered_label: Option<String>,
    #[serde(rename = "writeInLabels")]
    pub write_in_labels: Option<Vec<String>>,
    #[serde(rename = "countyDistricts")]
    pub county_districts: Option<BTreeMap<String, Vec<u32>>>,
    pub layout: Option<JsLayout>,
}

pub fn read_config(path: &str) -> CliResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config = parse_config(&contents)?;
    info!(
        "read_config: {}: election {:?} with {} candidates",
        path,
        config.name,
        config.candidates.len()
    );
    Ok(config)
}

pub fn parse_config(contents: &str) -> CliResult<ElectionConfig> {
    let js: JsElectionConfig = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    debug!("parse_config: {:?}", js);
    let config = to_election_config(js)?;
    config.validate().context(PipelineSnafu {})?;
    Ok(config)
}

fn to_election_config(js: JsElectionConfig) -> CliResult<ElectionConfig> {
    let candidates: Vec<CandidateSpec> = js
        .candidates
        .iter()
        .map(|c| match c.display_name.as_deref() {
            Some(d) if !d.trim().is_empty() => CandidateSpec::with_display_name(&c.name, d),
            _ => CandidateSpec::new(&c.name),
        })
        .collect();

    let county_districts = match js.county_districts {
        None => nyc_assembly_districts(),
        Some(m) => {
            let mut res: BTreeMap<County, BTreeSet<u32>> = BTreeMap::new();
            for (name, districts) in m.into_iter() {
                let county = match County::from_name(&name) {
                    Some(c) => c,
                    None => whatever!("Unknown county in countyDistricts: {}", name),
                };
                res.entry(county).or_default().extend(districts);
            }
            res
        }
    };

    Ok(ElectionConfig {
        name: js.name,
        candidates,
        ballot_types: js.ballot_types,
        scattered_label: js.scattered_label.unwrap_or_else(|| "Scattered".to_string()),
        write_in_labels: js.write_in_labels.unwrap_or_default(),
        county_districts,
        layout: to_layout(js.layout.unwrap_or_default()),
    })
}

fn to_layout(js: JsLayout) -> ExportLayout {
    let default = ExportLayout::nyc_extended();
    ExportLayout {
        has_header_row: js.has_header_row.unwrap_or(default.has_header_row),
        min_columns: js.min_columns.unwrap_or(default.min_columns),
        assembly_district: js
            .assembly_district_column
            .unwrap_or(default.assembly_district),
        election_district: js
            .election_district_column
            .unwrap_or(default.election_district),
        county: js.county_column.unwrap_or(default.county),
        // An empty name means that the export has no status column.
        status: match js.status_column {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s),
            None => default.status,
        },
        vote_choice: js.vote_choice_column.unwrap_or(default.vote_choice),
        vote_count: js.vote_count_column.unwrap_or(default.vote_count),
        in_play_status: js.in_play_status.unwrap_or(default.in_play_status),
        combined_marker: js.combined_marker.unwrap_or(default.combined_marker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let config = parse_config(
            r#"{
                "name": "comptroller",
                "candidates": [
                    {"name": "Mark D. Levine", "displayName": "Mark Levine"},
                    {"name": "Peter Kefalinos"}
                ],
                "ballotTypes": ["Public Counter", "Affidavit"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.name, "comptroller");
        assert_eq!(
            config.candidate_columns(),
            vec!["Mark Levine", "Peter Kefalinos", "Scattered"]
        );
        assert_eq!(config.layout, ExportLayout::nyc_extended());
        assert_eq!(config.county_districts, nyc_assembly_districts());
        assert!(config.write_in_labels.is_empty());
    }

    #[test]
    fn layout_and_counties() {
        let config = parse_config(
            r#"{
                "name": "council",
                "candidates": [{"name": "Jane Doe", "displayName": ""}],
                "ballotTypes": [],
                "writeInLabels": ["Write-in"],
                "countyDistricts": {"Brooklyn": [41, 42], "Kings": [43]},
                "layout": {"hasHeaderRow": true, "minColumns": 6, "statusColumn": ""}
            }"#,
        )
        .unwrap();
        assert_eq!(config.candidates[0].display_name, None);
        assert_eq!(
            config.county_districts[&County::Kings],
            [41, 42, 43].into_iter().collect::<BTreeSet<u32>>()
        );
        assert_eq!(config.county_districts.len(), 1);
        assert!(config.layout.has_header_row);
        assert_eq!(config.layout.min_columns, 6);
        assert_eq!(config.layout.status, None);
        assert_eq!(config.layout.vote_count, "Tally");
    }

    #[test]
    fn full_layout() {
        let config = parse_config(
            r#"{
                "name": "comptroller",
                "candidates": [{"name": "Mark D. Levine", "displayName": "Mark Levine"}],
                "ballotTypes": ["Public Counter"],
                "layout": {
                    "hasHeaderRow": false,
                    "minColumns": 22,
                    "assemblyDistrictColumn": "AD",
                    "electionDistrictColumn": "ED",
                    "countyColumn": "County",
                    "statusColumn": "EDAD Status",
                    "voteChoiceColumn": "Unit Name",
                    "voteCountColumn": "Tally",
                    "inPlayStatus": "IN-PLAY",
                    "combinedMarker": "(?i)COMBINED\\s+INTO\\D*?(?P<ed>\\d{1,3})\\s*[/]\\s*(?P<ad>\\d{1,3})\\s*$"
                }
            }"#,
        )
        .unwrap();
        let marker =
            district_returns::labels::MarkerPattern::new(&config.layout.combined_marker).unwrap();
        assert_eq!(marker.reported_district("COMBINED INTO 012/65"), Some((65, 12)));
        assert_eq!(
            ExportLayout {
                combined_marker: ExportLayout::DEFAULT_COMBINED_MARKER.to_string(),
                ..config.layout
            },
            ExportLayout::nyc_extended()
        );
    }

    #[test]
    fn unknown_county() {
        let res = parse_config(
            r#"{"name": "x", "candidates": [{"name": "A"}], "ballotTypes": [],
                "countyDistricts": {"Nassau": [1]}}"#,
        );
        assert!(matches!(res, Err(CliError::Whatever { .. })));
    }

    #[test]
    fn invalid_marker() {
        let res = parse_config(
            r#"{"name": "x", "candidates": [{"name": "A"}], "ballotTypes": [],
                "layout": {"combinedMarker": "COMBINED (\\d+)"}}"#,
        );
        assert!(matches!(
            res,
            Err(CliError::Pipeline {
                source: ReturnsError::InvalidConfig { .. }
            })
        ));
    }

    #[test]
    fn not_json() {
        assert!(matches!(
            parse_config("candidates:"),
            Err(CliError::ParsingJson { .. })
        ));
    }
}
