use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static SALARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:From |starting at )?\$[\d,]+(?:\.?\d{2})?(?:\s*-\s*\$[\d,]+(?:\.?\d{2})?)?(?:\s*(?:per hour|an hour))?",
    )
    .expect("salary pattern compiles")
});

static HIRING_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:is looking for|seeking|hiring)\s+(?:a |an )?([A-Z][A-Za-z\s-]+?)(?:\s+(?:to|who|that|in|at|with|for)\b|[.,])",
    )
    .expect("title pattern compiles")
});

static LEADING_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:The |A |An )?([A-Z][A-Za-z\s-]+?)(?:\s+(?:role|position|job)\b|\s+(?:to|who|that|in|at|with|is)\b|[.,])")
        .expect("title pattern compiles")
});

static COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:at|for|with|join)\s+([A-Z][A-Za-z\s&.-]+?)(?:\s+(?:to|is|in|seeks|requires|team)\b|[.,])",
    )
    .expect("company pattern compiles")
});

/// Fields recovered from a free-text AI summary of a posting.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SummaryHints {
    pub title: Option<String>,
    pub company: Option<String>,
    pub salary: Option<String>,
}

impl SummaryHints {
    pub fn parse(summary: &str) -> Self {
        let summary = summary.trim();

        let salary = SALARY.find(summary).map(|m| m.as_str().trim().to_string());
        let title = HIRING_TITLE
            .captures(summary)
            .or_else(|| LEADING_TITLE.captures(summary))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());
        let company = COMPANY
            .captures(summary)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_end_matches('.').to_string())
            .filter(|c| !c.is_empty());

        Self {
            title,
            company,
            salary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.company.is_none() && self.salary.is_none()
    }

    /// Shape suitable for [`JobRecord::merge_missing`](crate::models::job::JobRecord::merge_missing).
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for (name, value) in [
            ("title", &self.title),
            ("company", &self.company),
            ("salary", &self.salary),
        ] {
            if let Some(value) = value {
                fields.insert(name.to_string(), Value::String(value.clone()));
            }
        }
        fields
    }
}
