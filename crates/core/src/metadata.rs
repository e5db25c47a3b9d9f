//! Respondent metadata parsing.
//!
//! The info slide of each block holds free-form `Label: value` lines typed by
//! the respondent's group. Labels are the Danish field names used in the
//! survey template.

use std::collections::HashMap;

/// Label for the respondent's name.
pub const NAME_KEY: &str = "Navn";
/// Label for the respondent's age.
pub const AGE_KEY: &str = "Alder";
/// Label for the respondent's gender.
pub const GENDER_KEY: &str = "Køn";
/// Label for the respondent's postal code.
pub const POSTAL_CODE_KEY: &str = "Postnummer";

/// Name used when the info slide has no name line.
pub const UNKNOWN_NAME: &str = "unknown";

/// Split `key: value` lines into a map.
///
/// Each line is split once on its first colon and both sides are trimmed.
/// Lines without a colon are ignored. A repeated key keeps its last value.
pub fn parse_fields(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in text.split('\n') {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if let Some(previous) = fields.insert(key.to_string(), value.trim().to_string()) {
            log::debug!("Duplicate field '{}' overrides earlier value '{}'", key, previous);
        }
    }
    fields
}

/// Respondent details read from an info slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondentInfo {
    /// Name with spaces replaced by underscores, safe for file names.
    pub name: String,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub postal_code: Option<String>,
}

impl RespondentInfo {
    /// Parse the info slide text.
    pub fn parse(text: &str) -> Self {
        let mut fields = parse_fields(text);
        let name = fields
            .remove(NAME_KEY)
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        Self {
            name: filename_safe(&name),
            age: fields.remove(AGE_KEY),
            gender: fields.remove(GENDER_KEY),
            postal_code: fields.remove(POSTAL_CODE_KEY),
        }
    }
}

fn filename_safe(name: &str) -> String {
    name.replace(' ', "_")
}
