use std::path::{Path, PathBuf};
use std::sync::Mutex;

use calamine::{Reader, Xlsx, open_workbook};
use eyre::{Result, WrapErr};
use log::{debug, info};
use rust_xlsxwriter::{Format, Workbook};

use crate::models::job::JobRecord;
use crate::utils::text::truncate_with_ellipsis;

pub const COLUMNS: [&str; 10] = [
    "Job Title",
    "Company",
    "Location",
    "Salary",
    "Description",
    "Requirements",
    "Responsibilities",
    "Keywords",
    "URL",
    "Timestamp",
];

const WIDE: f64 = 50.0;
const NARROW: f64 = 15.0;
const URL_WIDTH: f64 = 20.0;
const MAX_WIDTH: f64 = 255.0;

// excel rejects cells longer than 32,767 characters
const MAX_CELL_CHARS: usize = 32_000;

/// Workbook of scraped jobs, one row per record. Appending never
/// deduplicates.
pub struct Spreadsheet {
    path: PathBuf,
    // serialises read-modify-write cycles
    write_lock: Mutex<()>,
}

impl Spreadsheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds `records` after the rows already in the file, creating it when
    /// needed. Returns the number of data rows now in the file.
    pub fn append(&self, records: &[JobRecord]) -> Result<usize> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut rows = if self.path.exists() {
            read_rows(&self.path)?
        } else {
            Vec::new()
        };
        debug!("{} existing rows in {}", rows.len(), self.path.display());

        rows.extend(records.iter().map(to_row));

        let mut workbook = build(&rows)?;
        workbook
            .save(&self.path)
            .wrap_err_with(|| format!("could not write {}", self.path.display()))?;

        info!(
            "saved {} job(s) to {} ({} total)",
            records.len(),
            self.path.display(),
            rows.len()
        );
        Ok(rows.len())
    }
}

/// An in-memory workbook holding only `records`.
pub fn render(records: &[JobRecord]) -> Result<Vec<u8>> {
    let rows: Vec<_> = records.iter().map(to_row).collect();
    Ok(build(&rows)?.save_to_buffer()?)
}

fn to_row(record: &JobRecord) -> Vec<String> {
    vec![
        record.title.clone(),
        record.company.clone(),
        record.location.clone(),
        record.salary.clone(),
        record.description.clone(),
        record.requirements.join("\n"),
        record.responsibilities.join("\n"),
        record.keywords.join(", "),
        record.url.clone().unwrap_or_default(),
        record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

/// Data rows of the first sheet, header skipped, padded to the known
/// columns.
fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).wrap_err_with(|| format!("could not open {}", path.display()))?;

    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range?;

    Ok(range
        .rows()
        .skip(1)
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            cells.resize(COLUMNS.len(), String::new());
            cells
        })
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .collect())
}

fn build(rows: &[Vec<String>]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let header = Format::new().set_bold().set_text_wrap();
    let wrapped = Format::new().set_text_wrap();

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().take(COLUMNS.len()).enumerate() {
            let value = truncate_with_ellipsis(value, MAX_CELL_CHARS);
            sheet.write_string_with_format(idx as u32 + 1, col as u16, &value, &wrapped)?;
        }
    }

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.set_column_width(col as u16, column_width(name, col, rows))?;
    }

    Ok(workbook)
}

fn column_width(name: &str, col: usize, rows: &[Vec<String>]) -> f64 {
    match name {
        "Description" | "Requirements" | "Responsibilities" => WIDE,
        "Job Title" | "Company" | "Location" | "Salary" => NARROW,
        "URL" => URL_WIDTH,
        _ => {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .flat_map(|cell| cell.lines())
                .map(|line| line.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0);
            (longest as f64 + 2.0).min(MAX_WIDTH)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("jobbot-{}-{}.xlsx", name, std::process::id()))
    }

    fn record() -> JobRecord {
        JobRecord {
            title: "Backend Developer".to_string(),
            company: "Initech".to_string(),
            requirements: vec!["SQL".to_string(), "Docker".to_string()],
            keywords: vec!["SQL".to_string(), "Docker".to_string()],
            url: Some("https://ca.indeed.com/viewjob?jk=1".to_string()),
            ..JobRecord::default()
        }
    }

    #[test]
    fn saving_twice_appends_two_rows() {
        let path = temp_path("append");
        let _ = std::fs::remove_file(&path);
        let sheet = Spreadsheet::new(&path);

        assert_eq!(sheet.append(&[record()]).unwrap(), 1);
        assert_eq!(sheet.append(&[record()]).unwrap(), 2);

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<_> = range.rows().collect();
        let _ = std::fs::remove_file(&path);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("Job Title".to_string()));
        assert_eq!(rows[1][1], Data::String("Initech".to_string()));
        assert_eq!(rows[2][1], Data::String("Initech".to_string()));
        assert_eq!(rows[2][5], Data::String("SQL\nDocker".to_string()));
        assert_eq!(rows[2][3], Data::String("unknown".to_string()));
    }

    #[test]
    fn oversized_cells_are_truncated() {
        let path = temp_path("oversized");
        let _ = std::fs::remove_file(&path);
        let long = JobRecord {
            description: "x".repeat(40_000),
            ..record()
        };

        assert_eq!(Spreadsheet::new(&path).append(&[long.clone()]).unwrap(), 1);

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let description = range.get((1, 4)).unwrap().to_string();
        let _ = std::fs::remove_file(&path);

        assert_eq!(description.chars().count(), MAX_CELL_CHARS + 3);
        assert!(description.ends_with("..."));
        assert!(render(&[long]).is_ok());
    }

    #[test]
    fn render_produces_a_workbook() {
        let bytes = render(&[record()]).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn widths_follow_column_kind() {
        let rows = vec![to_row(&record())];
        assert_eq!(column_width("Description", 4, &rows), 50.0);
        assert_eq!(column_width("Company", 1, &rows), 15.0);
        assert_eq!(column_width("URL", 8, &rows), 20.0);
        assert_eq!(column_width("Keywords", 7, &rows), 13.0);
        assert_eq!(column_width("Timestamp", 9, &rows), 21.0);
    }
}
