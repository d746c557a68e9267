//! Parsers for git's textual output formats.
//!
//! Log and ref listings use NUL-separated custom formats so that
//! subjects and names containing tabs or quotes survive intact; numstat
//! and name-status are tab-separated; untracked listings are one path
//! per line. All parsers tolerate CRLF line endings and drop blank
//! lines, and skip records they cannot make sense of rather than
//! failing the whole listing.

use chrono::DateTime;
use tracing::warn;

use crate::models::{Commit, FileStatus};

/// Custom `git log` format: sha, subject, author, email, strict ISO date,
/// NUL-separated.
pub const LOG_FORMAT: &str = "%H%x00%s%x00%an%x00%ae%x00%aI";

/// `git for-each-ref` format for branch listings; the third field is `*`
/// for the ref HEAD points at.
pub const BRANCH_FORMAT: &str = "%(refname:short)%00%(objectname)%00%(HEAD)";

/// `git for-each-ref` format for tag listings.
pub const TAG_FORMAT: &str = "%(refname:short)%00%(objectname)";

/// Split raw output into non-empty lines, stripping trailing `\r`.
pub fn lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
}

/// Parse a plain newline-delimited path listing (e.g. untracked files).
pub fn parse_path_list(raw: &str) -> Vec<String> {
    lines(raw).map(str::to_string).collect()
}

/// Parse NUL-separated commit log records produced with [`LOG_FORMAT`].
pub fn parse_log(raw: &str) -> Vec<Commit> {
    lines(raw)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\0').collect();
            if fields.len() != 5 {
                warn!(line, "skipping malformed log record");
                return None;
            }
            let date = match DateTime::parse_from_rfc3339(fields[4]) {
                Ok(date) => date,
                Err(err) => {
                    warn!(line, %err, "skipping log record with unparseable date");
                    return None;
                }
            };
            Some(Commit {
                sha: fields[0].to_string(),
                message: fields[1].to_string(),
                author: fields[2].to_string(),
                author_email: fields[3].to_string(),
                date,
            })
        })
        .collect()
}

/// One entry of a `for-each-ref` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: String,
    pub sha: String,
    pub is_head: bool,
}

/// Parse NUL-separated ref records: `name NUL sha [NUL head-marker]`.
pub fn parse_refs(raw: &str) -> Vec<RefEntry> {
    lines(raw)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\0').collect();
            if fields.len() < 2 {
                warn!(line, "skipping malformed ref record");
                return None;
            }
            Some(RefEntry {
                name: fields[0].to_string(),
                sha: fields[1].to_string(),
                is_head: fields.get(2).map(|m| *m == "*").unwrap_or(false),
            })
        })
        .collect()
}

/// One line of `--numstat` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub additions: u64,
    pub deletions: u64,
    pub path: String,
    /// Both numeric columns were the `-` sentinel git emits for binary files.
    pub is_binary: bool,
}

/// Parse `additions TAB deletions TAB path` records. A literal `-` in a
/// numeric column (git's binary-file sentinel) maps to 0. The path is
/// everything after the first two tab fields, so file names containing
/// tabs survive.
pub fn parse_numstat(raw: &str) -> Vec<NumstatEntry> {
    lines(raw)
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let additions = fields.next()?;
            let deletions = fields.next()?;
            let path = fields.next()?;
            Some(NumstatEntry {
                additions: additions.parse().unwrap_or(0),
                deletions: deletions.parse().unwrap_or(0),
                path: path.to_string(),
                is_binary: additions == "-" && deletions == "-",
            })
        })
        .collect()
}

/// One line of `--name-status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatusEntry {
    pub status: FileStatus,
    pub path: String,
    /// Previous path, for renames and copies (three-column rows).
    pub old_path: Option<String>,
}

/// Parse `status TAB path` or `status TAB old TAB new` records. Rename
/// and copy statuses carry a similarity score suffix (`R100`, `C75`);
/// only the leading letter matters.
pub fn parse_name_status(raw: &str) -> Vec<NameStatusEntry> {
    lines(raw)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            let letter = fields.first()?.chars().next()?;
            let status = FileStatus::from_letter(letter);
            match fields.len() {
                2 => Some(NameStatusEntry {
                    status,
                    path: fields[1].to_string(),
                    old_path: None,
                }),
                3 => Some(NameStatusEntry {
                    status,
                    path: fields[2].to_string(),
                    old_path: Some(fields[1].to_string()),
                }),
                _ => {
                    warn!(line, "skipping malformed name-status record");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_strip_crlf_and_blanks() {
        let parsed = parse_path_list("a.ts\r\nb.ts\r\n");
        assert_eq!(parsed, vec!["a.ts".to_string(), "b.ts".to_string()]);
    }

    #[test]
    fn test_lines_drop_trailing_newline_artifacts() {
        let parsed = parse_path_list("one\n\ntwo\n");
        assert_eq!(parsed, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_parse_log() {
        let raw = "abc123\0Fix bug\0Alice\0alice@example.com\02024-03-01T12:00:00+01:00\n\
                   def456\0Add feature\0Bob\0bob@example.com\02024-02-28T09:30:00Z\n";
        let commits = parse_log(raw);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, "abc123");
        assert_eq!(commits[0].message, "Fix bug");
        assert_eq!(commits[0].author, "Alice");
        assert_eq!(commits[0].author_email, "alice@example.com");
        assert_eq!(commits[1].sha, "def456");
    }

    #[test]
    fn test_parse_log_skips_malformed_records() {
        let raw = "only-a-sha\nabc\0msg\0a\0a@x\02024-01-01T00:00:00Z\n";
        let commits = parse_log(raw);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].sha, "abc");
    }

    #[test]
    fn test_parse_refs_with_head_marker() {
        let raw = "main\0abc123\0*\nfeature\0def456\0\n";
        let refs = parse_refs(raw);
        assert_eq!(refs.len(), 2);
        assert!(refs[0].is_head);
        assert_eq!(refs[0].name, "main");
        assert!(!refs[1].is_head);
    }

    #[test]
    fn test_parse_refs_without_marker_field() {
        let raw = "v1.0\0abc123\nv2.0\0def456\n";
        let refs = parse_refs(raw);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "v1.0");
        assert!(!refs[0].is_head);
    }

    #[test]
    fn test_parse_numstat() {
        let raw = "10\t5\tsrc/a.ts\n0\t2\tREADME.md\n";
        let entries = parse_numstat(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].additions, 10);
        assert_eq!(entries[0].deletions, 5);
        assert_eq!(entries[0].path, "src/a.ts");
        assert!(!entries[0].is_binary);
    }

    #[test]
    fn test_parse_numstat_binary_sentinel() {
        let entries = parse_numstat("-\t-\tbinary.bin\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].additions, 0);
        assert_eq!(entries[0].deletions, 0);
        assert!(entries[0].is_binary);
        assert_eq!(entries[0].path, "binary.bin");
    }

    #[test]
    fn test_parse_numstat_path_with_tab() {
        let entries = parse_numstat("1\t2\tweird\tname.txt\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "weird\tname.txt");
    }

    #[test]
    fn test_parse_name_status_two_columns() {
        let entries = parse_name_status("M\tsrc/a.ts\nA\tsrc/new.ts\nD\tgone.ts\n");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].status, FileStatus::Modified);
        assert_eq!(entries[1].status, FileStatus::Added);
        assert_eq!(entries[2].status, FileStatus::Deleted);
        assert!(entries[0].old_path.is_none());
    }

    #[test]
    fn test_parse_name_status_rename_with_score() {
        let entries = parse_name_status("R100\told.ts\tnew.ts\nC75\tsrc.ts\tcopy.ts\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, FileStatus::Renamed);
        assert_eq!(entries[0].path, "new.ts");
        assert_eq!(entries[0].old_path.as_deref(), Some("old.ts"));
        assert_eq!(entries[1].status, FileStatus::Copied);
        assert_eq!(entries[1].path, "copy.ts");
    }

    #[test]
    fn test_parse_name_status_unknown_letter_defaults_to_modified() {
        let entries = parse_name_status("T\tsome/file\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, FileStatus::Modified);
    }
}
