use crate::config::*;
use crate::table::RawTable;

/// A builder for exports in the layout of the Board of Elections.
///
/// Every line starts with the 11 column labels, followed by the 11 values.
/// This is useful to feed the pipeline from data that was not read from a file.
///
/// ```
/// use district_returns::builder::ReturnsBuilder;
/// use district_returns::{normalize_records, County, ElectionConfig};
/// # use district_returns::ReturnsError;
///
/// let config = ElectionConfig::mayor_2025();
/// let mut builder = ReturnsBuilder::new(&config.layout);
/// builder.add_votes("Kings", 57, 1, "Zohran Mamdani (Democratic)", 400);
/// builder.add_votes("Kings", 57, 1, "Zohran Mamdani (Working Families)", 50);
///
/// let tables = normalize_records(builder.records(), &config)?;
/// assert_eq!(tables.county_tables[&County::Kings].get(57, "Zohran Mamdani"), Some(450));
/// # Ok::<(), ReturnsError>(())
/// ```
pub struct ReturnsBuilder {
    labels: Vec<String>,
    event: String,
    office: String,
    rows: Vec<Vec<String>>,
}

impl ReturnsBuilder {
    pub fn new(layout: &ExportLayout) -> ReturnsBuilder {
        let labels = vec![
            layout.assembly_district.clone(),
            layout.election_district.clone(),
            layout.county.clone(),
            layout
                .status
                .clone()
                .unwrap_or_else(|| "EDAD Status".to_string()),
            "Event".to_string(),
            "Party/Independent Body".to_string(),
            "Office/Position Title".to_string(),
            "District Key".to_string(),
            "VoteFor".to_string(),
            layout.vote_choice.clone(),
            layout.vote_count.clone(),
        ];
        ReturnsBuilder {
            labels,
            event: "General Election".to_string(),
            office: "Mayor".to_string(),
            rows: Vec::new(),
        }
    }

    pub fn event(self, event: &str) -> ReturnsBuilder {
        ReturnsBuilder {
            event: event.to_string(),
            ..self
        }
    }

    pub fn office(self, office: &str) -> ReturnsBuilder {
        ReturnsBuilder {
            office: office.to_string(),
            ..self
        }
    }

    /// Adds the votes of a district that reported.
    pub fn add_votes(&mut self, county: &str, ad: u32, ed: u32, vote_choice: &str, count: u64) {
        self.add_row(
            county,
            &ad.to_string(),
            &format!("{:03}", ed),
            "IN-PLAY",
            vote_choice,
            &group_thousands(count),
        );
    }

    /// Adds the line of a district whose votes are reported by (reported_ad, reported_ed).
    pub fn add_combined(
        &mut self,
        county: &str,
        ad: u32,
        ed: u32,
        vote_choice: &str,
        reported_ad: u32,
        reported_ed: u32,
    ) {
        self.add_row(
            county,
            &ad.to_string(),
            &format!("{:03}", ed),
            &format!("COMBINED INTO {:03}/{:02}", reported_ed, reported_ad),
            vote_choice,
            "0",
        );
    }

    /// Adds a line with arbitrary content.
    pub fn add_row(
        &mut self,
        county: &str,
        ad: &str,
        ed: &str,
        status: &str,
        vote_choice: &str,
        tally: &str,
    ) {
        let party = vote_choice
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(p, _)| p.trim().to_string())
            .unwrap_or_default();
        let mut row = self.labels.clone();
        row.extend([
            ad.to_string(),
            ed.to_string(),
            county.to_string(),
            status.to_string(),
            self.event.clone(),
            party,
            self.office.clone(),
            "Citywide".to_string(),
            "1".to_string(),
            vote_choice.to_string(),
            tally.to_string(),
        ]);
        self.rows.push(row);
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows.clone()
    }

    pub fn build(&self, layout: &ExportLayout) -> Result<RawTable, ReturnsError> {
        RawTable::from_records(self.records(), layout)
    }
}

// 1234567 -> "1,234,567", as in the exports.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut res = String::new();
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}
