/// Site chrome that job boards repeat on every page and that only wastes
/// prompt budget.
const BOILERPLATE: [&str; 24] = [
    "Home",
    "Company reviews",
    "Salary guide",
    "Employers",
    "Create your resume",
    "Resume services",
    "Change country",
    "Help",
    "Privacy Centre",
    "Part-time",
    "Full-time",
    "Hiring Lab",
    "Career advice",
    "Browse jobs",
    "Browse companies",
    "Salaries",
    "Indeed Events",
    "Work at Indeed",
    "Countries",
    "About",
    "ESG at Indeed",
    "Accessibility at Indeed",
    "Privacy Centre and Ad Choices",
    "Terms",
];

/// Cuts `text` to at most `max_chars` characters, never splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Like [`truncate_chars`] but marks the cut with an ellipsis.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

/// Replaces `{name}` placeholders in a single pass. Substituted text is
/// never searched for placeholders; unknown ones are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let known = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match known {
            Some((value, close)) => {
                filled.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                filled.push('{');
                rest = after;
            }
        }
    }

    filled.push_str(rest);
    filled
}

pub fn is_boilerplate(line: &str) -> bool {
    let line = line.trim();
    BOILERPLATE.iter().any(|b| b.eq_ignore_ascii_case(line))
        || (line.starts_with('©') && line.contains("Indeed"))
}

/// Trims every line, drops empty and boilerplate lines.
pub fn clean_lines<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_boilerplate(line))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// Strips a leading bullet (`•`, `-`, `–`, `*`, `1.`, `2)`) from a line.
pub fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    let without_symbol = line.trim_start_matches(['•', '-', '–', '—', '*', '·', '▪']);
    if without_symbol.len() != line.len() {
        return without_symbol.trim();
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && digits < 3 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }

    line
}

pub fn is_bullet(line: &str) -> bool {
    strip_bullet(line).len() != line.trim().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc...");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }

    #[test]
    fn templates_fill_in_one_pass() {
        let template = "Job:\n{description}\n\nResume:\n{resume}\n{\"shape\": 1}";
        let filled = fill_template(
            template,
            &[("description", "paste your {resume} here"), ("resume", "Rust, SQL")],
        );
        assert_eq!(
            filled,
            "Job:\npaste your {resume} here\n\nResume:\nRust, SQL\n{\"shape\": 1}"
        );
        assert_eq!(fill_template("{a}{b}{", &[("a", "{b}")]), "{b}{b}{");
    }

    #[test]
    fn boilerplate_lines_are_dropped() {
        let lines = clean_lines(["  Home ", "Senior   Rust Engineer", "", "© 2025 Indeed", "help"]);
        assert_eq!(lines, vec!["Senior Rust Engineer".to_string()]);
    }

    #[test]
    fn bullets_are_stripped() {
        assert_eq!(strip_bullet("• Write code"), "Write code");
        assert_eq!(strip_bullet("- Review PRs"), "Review PRs");
        assert_eq!(strip_bullet("3. Ship it"), "Ship it");
        assert_eq!(strip_bullet("2024 was a year"), "2024 was a year");
        assert!(is_bullet("* item"));
        assert!(!is_bullet("plain text"));
    }
}
