//! Contributor Identifiers
//!
//! Normalisation of sheet entries, the ordered contributor set, and the
//! diff against the known contributors list.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{ClaBotError, Result};

/// Separator between authors in one sheet cell
pub const AUTHOR_SEPARATOR: &str = ", ";

/// Username-style prefix used in some sheet entries
pub const SIGIL: char = '@';

/// One raw spreadsheet row; only the first cell is consulted
pub type SheetRow = Vec<String>;

/// A contributor identifier with at most one leading `@` removed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContributorId(String);

impl ContributorId {
    /// Normalise a raw sheet token
    pub fn parse(raw: &str) -> Self {
        let id = raw.strip_prefix(SIGIL).unwrap_or(raw);
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ContributorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contributor identifiers in first-seen order, without duplicates
#[derive(Debug, Clone, Default)]
pub struct ContributorSet {
    ordered: Vec<ContributorId>,
    seen: HashSet<ContributorId>,
}

impl ContributorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier; returns false if it was already present
    pub fn insert(&mut self, id: ContributorId) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.ordered.push(id);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContributorId> {
        self.ordered.iter()
    }
}

impl FromIterator<ContributorId> for ContributorSet {
    fn from_iter<I: IntoIterator<Item = ContributorId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl IntoIterator for ContributorSet {
    type Item = ContributorId;
    type IntoIter = std::vec::IntoIter<ContributorId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.into_iter()
    }
}

/// Flatten the first cell of every row into normalised, deduplicated signups
///
/// A row without a first cell is a fatal input error.
pub fn signups_from_rows(rows: &[SheetRow]) -> Result<ContributorSet> {
    let mut signups = ContributorSet::new();

    for (index, row) in rows.iter().enumerate() {
        let cell = row
            .first()
            .ok_or(ClaBotError::MalformedRow { row: index + 1 })?;

        for token in cell.split(AUTHOR_SEPARATOR) {
            if token.is_empty() {
                debug!(row = index + 1, "Skipping empty author entry");
                continue;
            }
            signups.insert(ContributorId::parse(token));
        }
    }

    Ok(signups)
}

/// Identifiers present in the sheet but not in `known`, in first-seen order
///
/// # Arguments
/// * `known` - Contributors already on record
/// * `rows` - Raw sheet rows, first cell holding `", "`-separated authors
pub fn find_new_contributors(known: &[String], rows: &[SheetRow]) -> Result<Vec<String>> {
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();

    let new_contributors = signups_from_rows(rows)?
        .into_iter()
        .filter(|id| !known.contains(id.as_str()))
        .map(ContributorId::into_string)
        .collect();

    Ok(new_contributors)
}

/// Read a JSON array of contributor identifiers
pub fn read_contributors(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path)?;
    let contributors: Vec<String> = serde_json::from_str(&data)?;
    Ok(contributors)
}

/// Write a JSON array of contributor identifiers followed by a newline
pub fn write_contributors<W: Write>(mut writer: W, contributors: &[String]) -> Result<()> {
    serde_json::to_writer(&mut writer, contributors)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    fn rows(cells: &[&str]) -> Vec<SheetRow> {
        cells.iter().map(|c| vec![c.to_string()]).collect()
    }

    #[test]
    fn test_parse_strips_one_sigil() {
        assert_eq!(ContributorId::parse("@alice").as_str(), "alice");
        assert_eq!(ContributorId::parse("alice").as_str(), "alice");
        assert_eq!(ContributorId::parse("@@alice").as_str(), "@alice");
    }

    #[test]
    fn test_set_keeps_first_occurrence_order() {
        let set: ContributorSet = ["b", "@a", "b", "a", "c"]
            .iter()
            .map(|s| ContributorId::parse(s))
            .collect();

        let ids: Vec<&str> = set.iter().map(ContributorId::as_str).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_no_rows() {
        assert!(find_new_contributors(&known(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_known_contributors_ignored_in_any_form() {
        let output = find_new_contributors(&known(), &rows(&["a", "@a", "a, @b"])).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_new_contributors_returned_in_first_seen_order() {
        let output = find_new_contributors(&known(), &rows(&["d", "@d", "c, @c, d, @e"])).unwrap();
        assert_eq!(output, vec!["d", "e"]);
    }

    #[test]
    fn test_diff_is_idempotent_after_merge() {
        let sheet = rows(&["x, @y", "@z, x"]);
        let first = find_new_contributors(&known(), &sheet).unwrap();
        assert_eq!(first, vec!["x", "y", "z"]);

        let mut merged = known();
        merged.extend(first);
        assert!(find_new_contributors(&merged, &sheet).unwrap().is_empty());
    }

    #[test]
    fn test_empty_author_entries_skipped() {
        let output = find_new_contributors(&known(), &rows(&["a, ", "@d, ", ""])).unwrap();
        assert_eq!(output, vec!["d"]);
    }

    #[test]
    fn test_row_without_cell_is_fatal() {
        let sheet = vec![vec!["d".to_string()], Vec::new()];
        let err = find_new_contributors(&known(), &sheet).unwrap_err();
        assert!(matches!(err, ClaBotError::MalformedRow { row: 2 }));
    }

    #[test]
    fn test_read_and_write_contributors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contributors");
        fs::write(&path, r#"["a", "b"]"#).unwrap();

        assert_eq!(read_contributors(&path).unwrap(), vec!["a", "b"]);

        let mut out = Vec::new();
        write_contributors(&mut out, &["d".to_string(), "e".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\"d\",\"e\"]\n");
    }

    #[test]
    fn test_read_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contributors");
        fs::write(&path, r#"{"a": 1}"#).unwrap();

        assert!(matches!(
            read_contributors(&path),
            Err(ClaBotError::Json(_))
        ));
    }
}
