//! Roster import from spreadsheet (CSV) exports.
//!
//! Columns are matched by header name, so exports from different tools work
//! as long as they carry recognizable first/last name headers (or a single
//! full-name column).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::models::NewStudent;

const FIRST_NAME_HEADERS: &[&str] = &["firstname", "first", "givenname"];
const LAST_NAME_HEADERS: &[&str] = &["lastname", "last", "surname", "familyname"];
const FULL_NAME_HEADERS: &[&str] = &["name", "fullname", "studentname"];
const EMAIL_HEADERS: &[&str] = &["email", "emailaddress"];
const PHONE_HEADERS: &[&str] = &["phone", "phonenumber", "mobile", "cell", "telephone"];

/// A data row that could not be turned into a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterImport {
    pub students: Vec<NewStudent>,
    pub skipped: Vec<SkippedRow>,
}

impl RosterImport {
    /// e.g. "12 students ready, 2 rows skipped (lines 4, 9)"
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} student{} ready",
            self.students.len(),
            if self.students.len() == 1 { "" } else { "s" }
        );
        if !self.skipped.is_empty() {
            let lines = self
                .skipped
                .iter()
                .map(|s| s.line.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            text.push_str(&format!(
                ", {} row{} skipped (line{} {})",
                self.skipped.len(),
                if self.skipped.len() == 1 { "" } else { "s" },
                if self.skipped.len() == 1 { "" } else { "s" },
                lines
            ));
        }
        text
    }
}

enum NameColumns {
    Split { first: usize, last: usize },
    Full(usize),
}

struct ColumnMap {
    names: NameColumns,
    email: Option<usize>,
    phone: Option<usize>,
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_column(headers: &[String], variants: &[&str]) -> Option<usize> {
    headers.iter().position(|h| variants.contains(&h.as_str()))
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

        let first = find_column(&normalized, FIRST_NAME_HEADERS);
        let last = find_column(&normalized, LAST_NAME_HEADERS);
        let names = match (first, last, find_column(&normalized, FULL_NAME_HEADERS)) {
            (Some(first), Some(last), _) => NameColumns::Split { first, last },
            (_, _, Some(full)) => NameColumns::Full(full),
            (None, _, None) => bail!("Missing a first name column (e.g. \"First Name\")"),
            (Some(_), None, None) => bail!("Missing a last name column (e.g. \"Last Name\")"),
        };

        Ok(Self {
            names,
            email: find_column(&normalized, EMAIL_HEADERS),
            phone: find_column(&normalized, PHONE_HEADERS),
        })
    }

    fn names(&self, record: &StringRecord) -> (String, String) {
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        match self.names {
            NameColumns::Split { first, last } => (field(first), field(last)),
            NameColumns::Full(i) => split_full_name(&field(i)),
        }
    }

    fn optional(&self, record: &StringRecord, column: Option<usize>) -> String {
        column
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

/// Split "Mary Ann Smith" into ("Mary Ann", "Smith").
fn split_full_name(full: &str) -> (String, String) {
    let full = full.split_whitespace().collect::<Vec<_>>().join(" ");
    match full.rsplit_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full, String::new()),
    }
}

/// Read a roster CSV file from disk.
pub fn read_roster_file(path: &Path) -> Result<RosterImport> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("roster.csv")
        .to_string();
    read_roster(file, &filename)
}

/// Read roster rows from any CSV source with a header row.
pub fn read_roster<R: Read>(source: R, filename: &str) -> Result<RosterImport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row in {}", filename))?
        .clone();
    let columns = ColumnMap::from_headers(&headers).with_context(|| format!("Unrecognized columns in {}", filename))?;

    let mut import = RosterImport::default();
    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV line {} in {}", index + 2, filename))?;
        let line = record.position().map(|p| p.line()).unwrap_or(index as u64 + 2);

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let (first_name, last_name) = columns.names(&record);
        let candidate = NewStudent {
            first_name,
            last_name,
            email: columns.optional(&record, columns.email),
            phone: columns.optional(&record, columns.phone),
        };

        match candidate.validate() {
            Ok(student) => import.students.push(student),
            Err(e) => {
                warn!(line, reason = %e, "Skipping roster row");
                import.skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    debug!(
        file = filename,
        students = import.students.len(),
        skipped = import.skipped.len(),
        "Parsed roster"
    );
    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> RosterImport {
        read_roster(csv.as_bytes(), "test.csv").expect("roster should parse")
    }

    #[test]
    fn test_header_variants() {
        let import = parse(
            "Given Name,Family_Name,E-Mail,Mobile\n\
             Amina,Khan,amina@example.com,555-0100\n",
        );
        assert_eq!(
            import.students,
            vec![NewStudent {
                first_name: "Amina".to_string(),
                last_name: "Khan".to_string(),
                email: "amina@example.com".to_string(),
                phone: "555-0100".to_string(),
            }]
        );
        assert!(import.skipped.is_empty());
    }

    #[test]
    fn test_full_name_column_splits_on_last_space() {
        let import = parse("Full Name,Email\nMary Ann  Smith,\nYusuf,\n");
        assert_eq!(import.students.len(), 1);
        assert_eq!(import.students[0].first_name, "Mary Ann");
        assert_eq!(import.students[0].last_name, "Smith");
        assert_eq!(import.skipped.len(), 1);
        assert_eq!(import.skipped[0].line, 3);
    }

    #[test]
    fn test_rows_without_names_are_reported() {
        let import = parse(
            "first name,last name,email\n\
             Omar,Farooq,\n\
             ,Hassan,h@example.com\n\
             ,,\n\
             Sara,Ali,not-an-email\n",
        );
        assert_eq!(import.students.len(), 1);
        let lines: Vec<u64> = import.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 5]);
        assert_eq!(import.skipped[0].reason, "First name is required");
        assert_eq!(import.summary(), "1 student ready, 2 rows skipped (lines 3, 5)");
    }

    #[test]
    fn test_missing_name_columns_is_error() {
        let err = read_roster("email,phone\na@b.co,1\n".as_bytes(), "bad.csv").expect_err("should fail");
        assert!(format!("{:#}", err).contains("first name"));

        let err = read_roster("First,Email\nA,a@b.co\n".as_bytes(), "bad.csv").expect_err("should fail");
        assert!(format!("{:#}", err).contains("last name"));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let import = parse("Last Name,First Name,Phone\nKhan,Amina\n");
        assert_eq!(import.students[0].first_name, "Amina");
        assert_eq!(import.students[0].phone, "");
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" E-Mail Address "), "emailaddress");
        assert_eq!(normalize_header("FIRST_NAME"), "firstname");
    }
}
