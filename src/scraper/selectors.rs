//! Selector strategies for job posting pages, in priority order.
//!
//! Job boards reshuffle their markup often. When a field stops resolving,
//! capture the page, add the new selector in front of the list and add a
//! fixture test in `extract.rs`.

use super::extract::Strategy;
use super::extract::Strategy::{Attr, Joined, Nested, Text};

pub const TITLE: &[Strategy] = &[
    Text(r#"h1[data-testid="jobsearch-JobInfoHeader-title"]"#),
    Text("h1.top-card-layout__title"),
    Text("h1.jobsearch-JobInfoHeader-title"),
    Text("h2.jobsearch-JobInfoHeader-title"),
    Text("h1"),
    Text("title"),
];

pub const COMPANY: &[Strategy] = &[
    Nested {
        outer: r#"div[data-testid="inlineHeader-companyName"]"#,
        inner: "a",
    },
    Text(r#"div[data-testid="inlineHeader-companyName"]"#),
    Text("a.topcard__org-name-link"),
    Text("div.company-name"),
    Text("div.JobInfoHeader-company-location"),
    Text(r#"span[data-testid="company-name"]"#),
];

pub const LOCATION: &[Strategy] = &[
    Text(r#"div[data-testid="inlineHeader-companyLocation"]"#),
    Nested {
        outer: r#"div[data-testid="text-location"]"#,
        inner: "span",
    },
    Text(r#"div[data-testid="text-location"]"#),
    Text("div.css-16tkvfy"),
    Text("span.topcard__flavor--bullet"),
    Text("div.location"),
];

/// Element based salary lookups; the page-text regex runs after these.
pub const SALARY: &[Strategy] = &[
    Nested {
        outer: "div#salaryInfoAndJobType",
        inner: "span",
    },
    Text("div#salaryInfoAndJobType"),
    Text(r#"div[data-testid="jobsearch-OtherJobDetailsContainer"] span[data-testid*="salary"]"#),
];

pub const DESCRIPTION: &[Strategy] = &[
    Text("div#jobDescriptionText"),
    Text("div.description__text"),
    Text("div.jobDetailsHeader-descriptionDetails"),
    Attr {
        selector: r#"meta[name="description"]"#,
        attr: "content",
    },
    Joined {
        selector: "p",
        separator: " ",
    },
];

pub const REQUIREMENT_HEADINGS: &[&str] = &[
    "Requirements",
    "Qualifications",
    "What You'll Need",
    "Skills",
];

pub const RESPONSIBILITY_HEADINGS: &[&str] = &[
    "Responsibilities",
    "Duties",
    "What You'll Do",
    "The Role",
];

/// Skills looked for anywhere in the page text.
pub const COMMON_SKILLS: &[&str] = &[
    "Python",
    "Java",
    "JavaScript",
    "HTML",
    "CSS",
    "SQL",
    "React",
    "Angular",
    "Node.js",
    "PHP",
    "C#",
    "C++",
    "Ruby",
    "Swift",
    "Kotlin",
    "Rust",
    "AWS",
    "Azure",
    "Docker",
    "Kubernetes",
    "Excel",
    "Word",
    "PowerPoint",
    "Tableau",
    "Power BI",
    "Agile",
    "Scrum",
    "Project Management",
    "Marketing",
    "Sales",
    "Communication",
    "Leadership",
    "Management",
    "Customer Service",
    "Accounting",
    "Finance",
];
