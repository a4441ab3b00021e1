//! Loading of the raw export.
//!
//! Most of the columns of the export repeat the same value on every line
//! (labels, name of the election, office). They are found with a first scan over
//! all the rows and projected away in a second pass. Their values are kept as
//! file-level metadata, so a field that happens to be constant (a single county
//! in the file) can still be read.

use log::{debug, info};

use crate::config::*;

#[derive(Eq, PartialEq, Debug, Clone)]
struct RawRecord {
    line: usize,
    values: Vec<String>,
    raw: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum FieldSource<'a> {
    Column(usize),
    Constant(&'a str),
}

/// The rows of an export, restricted to the columns that vary.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
    constants: Vec<(String, String)>,
}

impl RawTable {
    /// Builds the table from the records of a file, in file order.
    pub fn from_records(
        records: Vec<Vec<String>>,
        layout: &ExportLayout,
    ) -> Result<RawTable, ReturnsError> {
        let mut numbered: Vec<(usize, Vec<String>)> = records
            .into_iter()
            .enumerate()
            .map(|(idx, r)| (idx + 1, r))
            .collect();

        let header: Option<Vec<String>> = if layout.has_header_row {
            if numbered.is_empty() {
                return Err(ReturnsError::malformed(None, "the export is empty", ""));
            }
            Some(numbered.remove(0).1)
        } else {
            None
        };

        let (first_line, first) = match numbered.first() {
            Some((line, r)) => (*line, r.clone()),
            None => {
                return Err(ReturnsError::malformed(
                    None,
                    "the export has no data rows",
                    "",
                ))
            }
        };
        let width = header.as_ref().map(|h| h.len()).unwrap_or(first.len());
        if width < layout.min_columns {
            return Err(ReturnsError::malformed(
                Some(first_line),
                format!(
                    "expected at least {} columns, found {}",
                    layout.min_columns, width
                ),
                &first.join(","),
            ));
        }

        // First pass: all the rows have the same shape, find the columns with a single value.
        let mut constant: Vec<bool> = vec![true; width];
        for (line, record) in numbered.iter() {
            if record.len() != width {
                return Err(ReturnsError::malformed(
                    Some(*line),
                    format!("expected {} columns, found {}", width, record.len()),
                    &record.join(","),
                ));
            }
            for (col, value) in record.iter().enumerate() {
                if constant[col] && *value != first[col] {
                    constant[col] = false;
                }
            }
        }

        let (names, value_start): (Vec<String>, usize) = match header {
            Some(h) => (h.iter().map(|s| normalize_column_name(s)).collect(), 0),
            None => {
                if width % 2 != 0 {
                    return Err(ReturnsError::malformed(
                        Some(first_line),
                        format!(
                            "a labelled export has pairs of label and value columns, found {} columns",
                            width
                        ),
                        &first.join(","),
                    ));
                }
                let half = width / 2;
                if let Some(col) = (0..half).find(|c| !constant[*c]) {
                    return Err(ReturnsError::malformed(
                        None,
                        format!(
                            "label column {} does not hold the same label on every line",
                            col + 1
                        ),
                        "",
                    ));
                }
                let names = (0..width)
                    .map(|c| {
                        if c < half {
                            String::new()
                        } else {
                            normalize_column_name(&first[c - half])
                        }
                    })
                    .collect();
                (names, half)
            }
        };

        // Second pass: projection.
        let kept: Vec<usize> = (value_start..width).filter(|c| !constant[*c]).collect();
        let constants: Vec<(String, String)> = (value_start..width)
            .filter(|c| constant[*c])
            .map(|c| (names[c].clone(), first[c].trim().to_string()))
            .collect();
        let columns: Vec<String> = kept.iter().map(|c| names[*c].clone()).collect();
        debug!(
            "from_records: kept columns: {:?} constants: {:?}",
            columns, constants
        );

        let rows: Vec<RawRecord> = numbered
            .into_iter()
            .map(|(line, record)| RawRecord {
                line,
                values: kept.iter().map(|c| record[*c].clone()).collect(),
                raw: record.join(","),
            })
            .collect();

        info!(
            "from_records: {} rows, {} varying columns, {} constant columns dropped",
            rows.len(),
            columns.len(),
            width - columns.len()
        );

        Ok(RawTable {
            columns,
            rows,
            constants,
        })
    }

    /// The names of the columns that vary, normalized.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The (name, value) pairs of the columns that were dropped.
    pub fn constants(&self) -> &[(String, String)] {
        &self.constants
    }

    pub fn constant(&self, name: &str) -> Option<&str> {
        let key = normalize_column_name(name);
        self.constants
            .iter()
            .find(|(n, _)| *n == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extracts the fields described by the layout.
    pub fn rows(&self, layout: &ExportLayout) -> Result<Vec<RawRow>, ReturnsError> {
        let county = self.required(&layout.county)?;
        let assembly_district = self.required(&layout.assembly_district)?;
        let election_district = self.required(&layout.election_district)?;
        let vote_choice = self.required(&layout.vote_choice)?;
        let vote_count = self.required(&layout.vote_count)?;
        let status = match layout.status.as_deref() {
            Some(name) => Some(self.required(name)?),
            None => None,
        };

        Ok(self
            .rows
            .iter()
            .map(|r| RawRow {
                line: r.line,
                county: field_value(&county, r),
                assembly_district: field_value(&assembly_district, r),
                election_district: field_value(&election_district, r),
                status: status.as_ref().map(|s| field_value(s, r)),
                vote_choice: field_value(&vote_choice, r),
                vote_count: field_value(&vote_count, r),
                raw: r.raw.clone(),
            })
            .collect())
    }

    fn required(&self, name: &str) -> Result<FieldSource<'_>, ReturnsError> {
        let key = normalize_column_name(name);
        if let Some(idx) = self.columns.iter().position(|c| *c == key) {
            return Ok(FieldSource::Column(idx));
        }
        if let Some(v) = self.constant(name) {
            return Ok(FieldSource::Constant(v));
        }
        Err(ReturnsError::malformed(
            None,
            format!(
                "missing column {:?} (found {:?} and constants {:?})",
                name,
                self.columns,
                self.constants.iter().map(|(n, _)| n).collect::<Vec<_>>()
            ),
            "",
        ))
    }
}

fn field_value(source: &FieldSource, record: &RawRecord) -> String {
    match source {
        FieldSource::Column(idx) => record.values[*idx].trim().to_string(),
        FieldSource::Constant(v) => v.to_string(),
    }
}

fn normalize_column_name(name: &str) -> String {
    // Spreadsheet exports may start with a byte order mark.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn header_layout() -> ExportLayout {
        ExportLayout {
            has_header_row: true,
            min_columns: 6,
            ..ExportLayout::nyc_extended()
        }
    }

    #[test]
    fn drops_constant_columns() {
        let records = vec![
            rec(&["AD", "ED", "County", "EDAD Status", "Unit Name", "Tally", "Event"]),
            rec(&["57", "001", "Kings", "IN-PLAY", "Jim Walden", "3", "General"]),
            rec(&["57", "002", "Kings", "IN-PLAY", "Jim Walden", "4", "General"]),
        ];
        let table = RawTable::from_records(records, &header_layout()).unwrap();
        assert_eq!(table.columns(), &["ed".to_string(), "tally".to_string()]);
        assert_eq!(table.constant("Event"), Some("General"));
        assert_eq!(table.constant("County"), Some("Kings"));
        assert_eq!(table.len(), 2);

        let rows = table.rows(&header_layout()).unwrap();
        assert_eq!(rows[1].county, "Kings");
        assert_eq!(rows[1].election_district, "002");
        assert_eq!(rows[1].vote_count, "4");
        assert_eq!(rows[1].status.as_deref(), Some("IN-PLAY"));
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn inline_labels() {
        let labels = ["\u{feff}AD", "ED", "County", "EDAD Status", "Unit Name", "Tally"];
        let mut a = rec(&labels);
        a.extend(rec(&["57", "001", "Kings", "IN-PLAY", "Jim Walden", "3"]));
        let mut b = rec(&labels);
        b.extend(rec(&["58", "001", "Kings", "IN-PLAY", "Jim Walden", "1,204"]));
        let layout = ExportLayout {
            min_columns: 12,
            ..ExportLayout::nyc_extended()
        };
        let table = RawTable::from_records(vec![a, b], &layout).unwrap();
        assert_eq!(table.columns(), &["ad".to_string(), "tally".to_string()]);
        let rows = table.rows(&layout).unwrap();
        assert_eq!(rows[1].assembly_district, "58");
        assert_eq!(rows[1].vote_count, "1,204");
        assert_eq!(rows[0].raw.split(',').count(), 12);
    }

    #[test]
    fn too_few_columns() {
        let records = vec![rec(&["AD", "ED"]), rec(&["57", "1"])];
        let err = RawTable::from_records(records, &ExportLayout::nyc_extended()).unwrap_err();
        assert!(matches!(err, ReturnsError::MalformedInput { line: Some(1), .. }));
    }

    #[test]
    fn ragged_rows() {
        let records = vec![
            rec(&["AD", "ED", "County", "EDAD Status", "Unit Name", "Tally"]),
            rec(&["57", "001", "Kings", "IN-PLAY", "Jim Walden", "3"]),
            rec(&["57", "002", "Kings", "IN-PLAY", "Jim Walden"]),
        ];
        let err = RawTable::from_records(records, &header_layout()).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn missing_field() {
        let records = vec![
            rec(&["AD", "ED", "Borough", "EDAD Status", "Unit Name", "Tally"]),
            rec(&["57", "001", "Kings", "IN-PLAY", "Jim Walden", "3"]),
        ];
        let table = RawTable::from_records(records, &header_layout()).unwrap();
        let err = table.rows(&header_layout()).unwrap_err();
        match err {
            ReturnsError::MalformedInput { message, .. } => assert!(message.contains("County")),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn no_data_rows() {
        let records = vec![rec(&["AD", "ED", "County", "EDAD Status", "Unit Name", "Tally"])];
        assert!(RawTable::from_records(records, &header_layout()).is_err());
        assert!(RawTable::from_records(vec![], &ExportLayout::nyc_extended()).is_err());
    }

    #[test]
    fn varying_labels_are_rejected() {
        let mut a = rec(&["AD", "ED", "County", "EDAD Status", "Unit Name", "Tally"]);
        a.extend(rec(&["57", "001", "Kings", "IN-PLAY", "Jim Walden", "3"]));
        let mut b = rec(&["AD", "ED", "Boro", "EDAD Status", "Unit Name", "Tally"]);
        b.extend(rec(&["57", "002", "Kings", "IN-PLAY", "Jim Walden", "3"]));
        let layout = ExportLayout {
            min_columns: 12,
            ..ExportLayout::nyc_extended()
        };
        assert!(RawTable::from_records(vec![a, b], &layout).is_err());
    }
}
