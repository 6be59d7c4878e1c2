use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::selectors;
use crate::models::job::{JobRecord, UNKNOWN, UNKNOWN_TITLE};
use crate::utils::text::{clean_lines, is_bullet, strip_bullet};

/// Longest run of lines a section heading may own.
const MAX_SECTION_LINES: usize = 25;

const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];
const BLOCK_ELEMENTS: [&str; 25] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "p", "section", "tr",
];

static SALARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$[\d,.]+\s*(?:to|–|-)\s*\$[\d,.]+(?:\s*(?:per|an?|/)\s*(?:hour|year|month|annum|yr))?|\$[\d,.]+\s*(?:per|an?|/)\s*(?:hour|year|month|annum|yr)",
    )
    .expect("salary pattern compiles")
});

static SKILL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    selectors::COMMON_SKILLS
        .iter()
        .filter_map(|skill| keyword_pattern(skill).map(|re| (*skill, re)))
        .collect()
});

/// Case-insensitive match on non-alphanumeric boundaries, so `C++` and
/// `Node.js` work but `Java` does not match inside `JavaScript`.
fn keyword_pattern(keyword: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?i)(?:^|[^A-Za-z0-9]){}(?:$|[^A-Za-z0-9+#])",
        regex::escape(keyword.trim())
    );
    Regex::new(&pattern).ok()
}

/// One attempt at locating a field in a document. Strategies are stateless;
/// a selector that fails to parse or matches nothing resolves to `None`.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Text of the first non-empty match.
    Text(&'static str),
    /// Text of the first `inner` match inside the first `outer` match.
    Nested {
        outer: &'static str,
        inner: &'static str,
    },
    /// Attribute of the first match.
    Attr {
        selector: &'static str,
        attr: &'static str,
    },
    /// Texts of every non-empty match, joined.
    Joined {
        selector: &'static str,
        separator: &'static str,
    },
}

impl Strategy {
    pub fn apply(&self, document: &Html) -> Option<String> {
        match *self {
            Strategy::Text(selector) => {
                let selector = Selector::parse(selector).ok()?;
                document
                    .select(&selector)
                    .map(element_text)
                    .find(|text| !text.is_empty())
            }
            Strategy::Nested { outer, inner } => {
                let outer = Selector::parse(outer).ok()?;
                let inner = Selector::parse(inner).ok()?;
                let container = document.select(&outer).next()?;
                container
                    .select(&inner)
                    .next()
                    .map(element_text)
                    .filter(|text| !text.is_empty())
            }
            Strategy::Attr { selector, attr } => {
                let selector = Selector::parse(selector).ok()?;
                document
                    .select(&selector)
                    .filter_map(|element| element.value().attr(attr))
                    .map(collapse_whitespace)
                    .find(|text| !text.is_empty())
            }
            Strategy::Joined {
                selector,
                separator,
            } => {
                let selector = Selector::parse(selector).ok()?;
                let parts = document
                    .select(&selector)
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>();
                (!parts.is_empty()).then(|| parts.join(separator))
            }
        }
    }

    #[cfg(test)]
    pub fn selectors(&self) -> Vec<&'static str> {
        match *self {
            Strategy::Text(selector) => vec![selector],
            Strategy::Nested { outer, inner } => vec![outer, inner],
            Strategy::Attr { selector, .. } | Strategy::Joined { selector, .. } => vec![selector],
        }
    }
}

/// First strategy that yields something wins.
pub fn first_match(document: &Html, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy.apply(document))
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: JobRecord,
    /// Visible page text, one block per line, boilerplate removed.
    pub page_text: String,
}

/// Runs every field's selector cascade over `html`. Missing fields come back
/// as their sentinel; this never fails.
pub fn extract_job(html: &str, url: &str) -> Extraction {
    let document = Html::parse_document(html);
    let lines = page_lines(&document);
    let page_text = lines.join("\n");

    let mut record = JobRecord::for_url(url);

    record.title = resolve("title", &document, selectors::TITLE, UNKNOWN_TITLE);
    record.company = resolve("company", &document, selectors::COMPANY, UNKNOWN);
    record.location = resolve("location", &document, selectors::LOCATION, UNKNOWN);
    record.salary = first_match(&document, selectors::SALARY)
        .or_else(|| salary_in(&page_text))
        .unwrap_or_else(|| {
            debug!("no salary found on {}", url);
            UNKNOWN.to_string()
        });
    record.description = resolve("description", &document, selectors::DESCRIPTION, "");
    record.requirements = section_items(&lines, selectors::REQUIREMENT_HEADINGS);
    record.responsibilities = section_items(&lines, selectors::RESPONSIBILITY_HEADINGS);
    record.keywords = keywords_in(&page_text);

    debug!(
        "extracted {} requirements, {} responsibilities, {} keywords from {}",
        record.requirements.len(),
        record.responsibilities.len(),
        record.keywords.len(),
        url
    );

    Extraction { record, page_text }
}

fn resolve(field: &str, document: &Html, strategies: &[Strategy], sentinel: &str) -> String {
    match first_match(document, strategies) {
        Some(value) => {
            debug!("found {}: {}", field, value);
            value
        }
        None => {
            debug!("could not find {}", field);
            sentinel.to_string()
        }
    }
}

pub fn salary_in(text: &str) -> Option<String> {
    SALARY.find(text).map(|m| m.as_str().trim().to_string())
}

pub fn keywords_in(text: &str) -> Vec<String> {
    SKILL_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(skill, _)| skill.to_string())
        .collect()
}

/// Whether `text` mentions `keyword` as a whole word.
pub fn mentions(text: &str, keyword: &str) -> bool {
    !keyword.trim().is_empty() && keyword_pattern(keyword).is_some_and(|re| re.is_match(text))
}

/// Visible text of the document split at block elements.
pub fn page_lines(document: &Html) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    collect_lines(document.root_element(), &mut current, &mut lines);
    flush(&mut current, &mut lines);

    clean_lines(lines.iter().map(String::as_str))
}

fn collect_lines(element: ElementRef<'_>, current: &mut String, lines: &mut Vec<String>) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        flush(current, lines);
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            current.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            collect_lines(child, current, lines);
        }
    }

    if block {
        flush(current, lines);
    }
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

/// Items listed under the first of `headings` found in `lines`. Items run
/// until the next heading-looking line. Text after `Heading:` on the same
/// line counts as an item.
pub fn section_items(lines: &[String], headings: &[&str]) -> Vec<String> {
    for (idx, line) in lines.iter().enumerate() {
        let Some(inline) = heading_remainder(line, headings) else {
            continue;
        };

        let mut items = Vec::new();
        if !inline.is_empty() {
            items.push(strip_bullet(&inline).to_string());
        }

        for next in lines.iter().skip(idx + 1).take(MAX_SECTION_LINES) {
            if looks_like_heading(next) {
                break;
            }
            let item = strip_bullet(next);
            if !item.is_empty() {
                items.push(item.to_string());
            }
        }

        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}

/// `Some(rest)` when `line` is one of `headings`, optionally followed by a
/// colon and inline text.
fn heading_remainder(line: &str, headings: &[&str]) -> Option<String> {
    let line = line.replace('’', "'");
    let line = line.trim();

    headings.iter().find_map(|heading| {
        let prefix = line.get(..heading.len())?;
        if !prefix.eq_ignore_ascii_case(heading) {
            return None;
        }
        let rest = line[heading.len()..].trim();
        if rest.is_empty() {
            Some(String::new())
        } else if let Some(inline) = rest.strip_prefix(':') {
            Some(inline.trim().to_string())
        } else if rest.ends_with(':') && rest.len() < 40 {
            Some(String::new())
        } else {
            None
        }
    })
}

fn looks_like_heading(line: &str) -> bool {
    let all = selectors::REQUIREMENT_HEADINGS
        .iter()
        .chain(selectors::RESPONSIBILITY_HEADINGS)
        .copied()
        .collect::<Vec<_>>();

    heading_remainder(line, &all).is_some()
        || (line.ends_with(':') && line.len() < 60 && !is_bullet(line))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEED: &str = r#"
        <html>
          <head><title>Backend Developer - Toronto, ON - Indeed.com</title>
            <script>var tracking = "Requirements: none";</script>
          </head>
          <body>
            <nav><ul><li><a href="/">Home</a></li><li><a href="/cmp">Company reviews</a></li></ul></nav>
            <h1 data-testid="jobsearch-JobInfoHeader-title"><span>Backend Developer</span></h1>
            <div data-testid="inlineHeader-companyName"><span><a href="/cmp/initech">Initech</a></span></div>
            <div data-testid="inlineHeader-companyLocation"><div>Toronto, ON</div></div>
            <div id="salaryInfoAndJobType"><span>$85,000–$105,000 a year</span> - Full-time</div>
            <div id="jobDescriptionText">
              <p>We build payment APIs.</p>
              <p><b>Responsibilities:</b></p>
              <ul>
                <li>Design REST services in <b>Rust</b> and Python</li>
                <li>Review pull requests</li>
              </ul>
              <p>Qualifications:</p>
              <ul>
                <li>3+ years with SQL and Docker</li>
                <li>Experience with C++ or C#</li>
              </ul>
              <p>Benefits:</p>
              <ul><li>Dental care</li></ul>
            </div>
          </body>
        </html>
    "#;

    #[test]
    fn indeed_page_resolves_primary_selectors() {
        let Extraction { record, page_text } = extract_job(INDEED, "https://ca.indeed.com/viewjob?jk=1");

        assert_eq!(record.title, "Backend Developer");
        assert_eq!(record.company, "Initech");
        assert_eq!(record.location, "Toronto, ON");
        assert_eq!(record.salary, "$85,000–$105,000 a year");
        assert!(record.description.starts_with("We build payment APIs."));
        assert_eq!(
            record.responsibilities,
            vec!["Design REST services in Rust and Python", "Review pull requests"]
        );
        assert_eq!(
            record.requirements,
            vec!["3+ years with SQL and Docker", "Experience with C++ or C#"]
        );
        assert_eq!(record.url.as_deref(), Some("https://ca.indeed.com/viewjob?jk=1"));
        assert!(record.is_complete());

        assert!(!page_text.contains("tracking"));
        assert!(!page_text.lines().any(|line| line == "Home" || line == "Company reviews"));
        assert!(page_text.lines().any(|line| line == "Review pull requests"));
    }

    #[test]
    fn alternate_selectors_are_used_when_primary_is_missing() {
        let html = r##"
            <h1 class="top-card-layout__title">Data Analyst</h1>
            <a class="topcard__org-name-link" href="#"> Globex </a>
            <span class="topcard__flavor--bullet">Vancouver, BC</span>
            <div class="description__text">Crunch numbers in Excel and Tableau.</div>
        "##;
        let record = extract_job(html, "https://linkedin.com/jobs/1").record;

        assert_eq!(record.title, "Data Analyst");
        assert_eq!(record.company, "Globex");
        assert_eq!(record.location, "Vancouver, BC");
        assert_eq!(record.description, "Crunch numbers in Excel and Tableau.");
        assert_eq!(record.keywords, vec!["Excel", "Tableau"]);
    }

    #[test]
    fn missing_and_malformed_nodes_yield_sentinels() {
        for html in [
            "",
            "<div><h1>   </h1",
            r#"<div data-testid="inlineHeader-companyName"></div><div id="salaryInfoAndJobType"><span></span></div>"#,
            "<<<>>>",
        ] {
            let record = extract_job(html, "https://example.com").record;
            assert_eq!(record.title, UNKNOWN_TITLE, "html: {html}");
            assert_eq!(record.company, UNKNOWN);
            assert_eq!(record.location, UNKNOWN);
            assert_eq!(record.salary, UNKNOWN);
            assert!(record.description.is_empty());
            assert!(record.requirements.is_empty());
            assert!(record.responsibilities.is_empty());
        }
    }

    #[test]
    fn page_without_salary_element_reports_unknown() {
        let html = r#"<h1 data-testid="jobsearch-JobInfoHeader-title">Cashier</h1><p>Friendly team.</p>"#;
        let record = extract_job(html, "https://ca.indeed.com/viewjob?jk=2").record;
        assert_eq!(record.title, "Cashier");
        assert_eq!(record.salary, "unknown");
    }

    #[test]
    fn salary_falls_back_to_page_text() {
        let html = "<h1>Barista</h1><p>Pay: $17.50 per hour plus tips</p>";
        let record = extract_job(html, "https://example.com").record;
        assert_eq!(record.salary, "$17.50 per hour");

        assert_eq!(salary_in("between $50,000 - $60,000 annually").as_deref(), Some("$50,000 - $60,000"));
        assert!(salary_in("competitive pay").is_none());
    }

    #[test]
    fn invalid_selector_does_not_abort_the_cascade() {
        let document = Html::parse_document("<h1>Welder</h1>");
        let strategies = [Strategy::Text("h1[[["), Strategy::Text("h1")];
        assert_eq!(first_match(&document, &strategies).as_deref(), Some("Welder"));
    }

    #[test]
    fn attribute_and_joined_strategies() {
        let document = Html::parse_document(
            r#"<head><meta name="description" content="  Short   blurb "></head><p>One</p><p> </p><p>Two</p>"#,
        );
        let attr = Strategy::Attr {
            selector: r#"meta[name="description"]"#,
            attr: "content",
        };
        let joined = Strategy::Joined {
            selector: "p",
            separator: " | ",
        };
        assert_eq!(attr.apply(&document).as_deref(), Some("Short blurb"));
        assert_eq!(joined.apply(&document).as_deref(), Some("One | Two"));
    }

    #[test]
    fn inline_section_text_counts_as_item() {
        let lines = vec![
            "About us".to_string(),
            "Requirements: valid driver's licence".to_string(),
            "• Lift 50 lbs".to_string(),
            "Duties:".to_string(),
            "Load trucks".to_string(),
        ];
        assert_eq!(
            section_items(&lines, selectors::REQUIREMENT_HEADINGS),
            vec!["valid driver's licence", "Lift 50 lbs"]
        );
        assert_eq!(
            section_items(&lines, selectors::RESPONSIBILITY_HEADINGS),
            vec!["Load trucks"]
        );
    }

    #[test]
    fn keywords_respect_word_boundaries() {
        let found = keywords_in("We use JavaScript, Node.js and C++ daily");
        assert!(found.contains(&"JavaScript".to_string()));
        assert!(found.contains(&"Node.js".to_string()));
        assert!(found.contains(&"C++".to_string()));
        assert!(!found.contains(&"Java".to_string()));
        assert!(!found.contains(&"C#".to_string()));
    }

    #[test]
    fn mentions_arbitrary_keywords() {
        let resume = "Shipped services in Rust; led a Power BI rollout.";
        assert!(mentions(resume, "rust"));
        assert!(mentions(resume, "Power BI"));
        assert!(!mentions(resume, "Ruby"));
        assert!(!mentions(resume, "  "));
    }
}
