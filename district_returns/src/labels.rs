//! Text rules applied to the labels and notes of the export.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ReturnsError;

// Everything from the first opening parenthesis to the last closing one.
static PARTY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(.*\)").expect("static party suffix pattern"));

/// Removes the party annotation from a vote choice:
/// `Zohran Kwame Mamdani (Working Families)` becomes `Zohran Kwame Mamdani`.
///
/// Applying it twice gives the same result as applying it once.
pub fn strip_party_suffix(label: &str) -> String {
    PARTY_SUFFIX.replace_all(label, "").trim().to_string()
}

/// The pattern of the notes written in place of the votes of a combined district.
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    re: Regex,
}

impl MarkerPattern {
    /// The pattern must define the named groups `ed` and `ad`.
    pub fn new(pattern: &str) -> Result<MarkerPattern, ReturnsError> {
        let re = Regex::new(pattern).map_err(|e| ReturnsError::InvalidConfig {
            message: format!("combined district pattern {:?}: {}", pattern, e),
        })?;
        let names: Vec<&str> = re.capture_names().flatten().collect();
        for required in ["ed", "ad"] {
            if !names.contains(&required) {
                return Err(ReturnsError::InvalidConfig {
                    message: format!(
                        "combined district pattern {:?} has no group named {:?}",
                        pattern, required
                    ),
                });
            }
        }
        Ok(MarkerPattern { re })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.re.is_match(text.trim())
    }

    /// The (assembly district, election district) named by the note.
    pub fn reported_district(&self, note: &str) -> Option<(u32, u32)> {
        let caps = self.re.captures(note.trim())?;
        let ad = caps.name("ad")?.as_str().parse::<u32>().ok()?;
        let ed = caps.name("ed")?.as_str().parse::<u32>().ok()?;
        Some((ad, ed))
    }
}

/// The number at the start of a field such as `005` or `005 COMBINED INTO 012/65`.
pub fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok()
}

/// Vote counts are exported with thousands separators: `1,234`.
///
/// A single line holds at most `u32::MAX` votes, so the sums over all the lines fit in a `u64`.
pub fn parse_vote_count(text: &str) -> Option<u64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<u32>().ok().map(u64::from)
}
