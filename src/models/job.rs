use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN: &str = "unknown";

/// Placeholders that count as "nothing found" when deciding whether a field
/// may be overwritten by a later tier.
const SENTINELS: [&str; 3] = [UNKNOWN_TITLE, UNKNOWN, "Not specified"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default = "unknown_title", deserialize_with = "string_or_sentinel::title")]
    pub title: String,
    #[serde(default = "unknown", deserialize_with = "string_or_sentinel::unknown")]
    pub company: String,
    #[serde(default = "unknown", deserialize_with = "string_or_sentinel::unknown")]
    pub location: String,
    #[serde(default = "unknown", deserialize_with = "string_or_sentinel::unknown")]
    pub salary: String,
    #[serde(default, deserialize_with = "string_or_sentinel::empty")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn unknown_title() -> String {
    UNKNOWN_TITLE.to_string()
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

mod string_or_sentinel {
    use serde::{Deserialize, Deserializer};

    fn or<'de, D: Deserializer<'de>>(d: D, fallback: &str) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_else(|| fallback.to_string()))
    }

    pub fn title<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        or(d, super::UNKNOWN_TITLE)
    }

    pub fn unknown<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        or(d, super::UNKNOWN)
    }

    pub fn empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        or(d, "")
    }
}

fn lenient_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.map(|v| list_from_value(&v)).unwrap_or_default())
}

/// Accepts an array of scalars or a single newline separated string.
fn list_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .lines()
            .map(|line| crate::utils::text::strip_bullet(line).to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(value))
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            title: unknown_title(),
            company: unknown(),
            location: unknown(),
            salary: unknown(),
            description: String::new(),
            requirements: Vec::new(),
            responsibilities: Vec::new(),
            keywords: Vec::new(),
            url: None,
            timestamp: Utc::now(),
        }
    }
}

impl JobRecord {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Title and company known, and both bullet sections found.
    pub fn is_complete(&self) -> bool {
        !is_missing(&self.title)
            && !is_missing(&self.company)
            && !self.requirements.is_empty()
            && !self.responsibilities.is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("salary", &self.salary),
            ("description", &self.description),
        ] {
            if is_missing(value) {
                missing.push(name);
            }
        }
        for (name, value) in [
            ("requirements", &self.requirements),
            ("responsibilities", &self.responsibilities),
            ("keywords", &self.keywords),
        ] {
            if value.is_empty() {
                missing.push(name);
            }
        }
        missing
    }

    /// Copies values from `fields` into every field that is still missing.
    /// Fields that already hold real data are never touched. Returns the
    /// names of the fields that were filled.
    pub fn merge_missing(&mut self, fields: &Map<String, Value>) -> Vec<&'static str> {
        let mut filled = Vec::new();

        for (name, slot) in [
            ("title", &mut self.title),
            ("company", &mut self.company),
            ("location", &mut self.location),
            ("salary", &mut self.salary),
            ("description", &mut self.description),
        ] {
            if !is_missing(slot.as_str()) {
                continue;
            }
            if let Some(candidate) = fields.get(name).and_then(Value::as_str)
                && !is_missing(candidate)
            {
                *slot = candidate.trim().to_string();
                filled.push(name);
            }
        }

        for (name, slot) in [
            ("requirements", &mut self.requirements),
            ("responsibilities", &mut self.responsibilities),
            ("keywords", &mut self.keywords),
        ] {
            if !slot.is_empty() {
                continue;
            }
            let candidate = fields.get(name).map(list_from_value).unwrap_or_default();
            if !candidate.is_empty() {
                *slot = candidate;
                filled.push(name);
            }
        }

        filled
    }
}
