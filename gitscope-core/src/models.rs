use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// How a tracked file changed between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "added" => Some(FileStatus::Added),
            "modified" => Some(FileStatus::Modified),
            "deleted" => Some(FileStatus::Deleted),
            "renamed" => Some(FileStatus::Renamed),
            "copied" => Some(FileStatus::Copied),
            _ => None,
        }
    }

    /// Map a name-status letter to a status. Unknown letters fall back to
    /// `Modified` rather than failing the whole listing.
    pub fn from_letter(letter: char) -> Self {
        match letter {
            'A' => FileStatus::Added,
            'M' => FileStatus::Modified,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'C' => FileStatus::Copied,
            _ => FileStatus::Modified,
        }
    }

    pub fn is_rename_or_copy(&self) -> bool {
        matches!(self, FileStatus::Renamed | FileStatus::Copied)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub author_email: String,
    pub date: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub sha: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub sha: String,
}

/// One file's entry in a structured change listing.
///
/// `old_path` is set only for renames and copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

/// Which phases of the working tree a query should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiffFilter {
    #[default]
    All,
    Staged,
    Unstaged,
}

impl DiffFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(DiffFilter::All),
            "staged" => Some(DiffFilter::Staged),
            "unstaged" => Some(DiffFilter::Unstaged),
            _ => None,
        }
    }

    pub fn includes_staged(&self) -> bool {
        matches!(self, DiffFilter::All | DiffFilter::Staged)
    }

    pub fn includes_unstaged(&self) -> bool {
        matches!(self, DiffFilter::All | DiffFilter::Unstaged)
    }

    pub fn includes_untracked(&self) -> bool {
        matches!(self, DiffFilter::All)
    }
}

/// Structured view of the working tree. Each list is empty unless its
/// phase was requested by the filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorktreeChanges {
    pub staged: Vec<ChangedFile>,
    pub unstaged: Vec<ChangedFile>,
    pub untracked: Vec<String>,
}

/// Concatenated unified diff for the working tree plus the metadata of
/// the untracked-file cap mechanism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorktreeDiff {
    pub diff: String,
    pub untracked_diffs_capped: bool,
    pub untracked_total: usize,
    pub untracked_processed: usize,
}

/// Changes and diff computed in one pass over the working tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorktreeView {
    pub changes: WorktreeChanges,
    pub diff: WorktreeDiff,
}

/// Hard caps bounding a single engine call. Instance configuration rather
/// than constants so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum bytes of subprocess stdout accepted per invocation.
    pub max_buffer_bytes: usize,
    /// Untracked files larger than this get a placeholder instead of a diff.
    pub max_untracked_file_size: u64,
    /// Maximum number of untracked files diffed per call.
    pub max_untracked_diffs: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 10 * 1024 * 1024,
            max_untracked_file_size: 1024 * 1024,
            max_untracked_diffs: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_status_round_trip() {
        for status in [
            FileStatus::Added,
            FileStatus::Modified,
            FileStatus::Deleted,
            FileStatus::Renamed,
            FileStatus::Copied,
        ] {
            assert_eq!(FileStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FileStatus::parse("unknown"), None);
    }

    #[test]
    fn test_file_status_from_letter() {
        assert_eq!(FileStatus::from_letter('A'), FileStatus::Added);
        assert_eq!(FileStatus::from_letter('M'), FileStatus::Modified);
        assert_eq!(FileStatus::from_letter('D'), FileStatus::Deleted);
        assert_eq!(FileStatus::from_letter('R'), FileStatus::Renamed);
        assert_eq!(FileStatus::from_letter('C'), FileStatus::Copied);
        // Unknown letters degrade to modified.
        assert_eq!(FileStatus::from_letter('T'), FileStatus::Modified);
        assert_eq!(FileStatus::from_letter('X'), FileStatus::Modified);
    }

    #[test]
    fn test_diff_filter_phases() {
        assert!(DiffFilter::All.includes_staged());
        assert!(DiffFilter::All.includes_unstaged());
        assert!(DiffFilter::All.includes_untracked());

        assert!(DiffFilter::Staged.includes_staged());
        assert!(!DiffFilter::Staged.includes_unstaged());
        assert!(!DiffFilter::Staged.includes_untracked());

        assert!(!DiffFilter::Unstaged.includes_staged());
        assert!(DiffFilter::Unstaged.includes_unstaged());
        assert!(!DiffFilter::Unstaged.includes_untracked());
    }

    #[test]
    fn test_diff_filter_parse() {
        assert_eq!(DiffFilter::parse("all"), Some(DiffFilter::All));
        assert_eq!(DiffFilter::parse("staged"), Some(DiffFilter::Staged));
        assert_eq!(DiffFilter::parse("unstaged"), Some(DiffFilter::Unstaged));
        assert_eq!(DiffFilter::parse("everything"), None);
    }

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_buffer_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.max_untracked_file_size, 1024 * 1024);
        assert_eq!(limits.max_untracked_diffs, 50);
    }

    #[test]
    fn test_changed_file_serializes_without_empty_old_path() {
        let file = ChangedFile {
            path: "src/a.rs".into(),
            status: FileStatus::Modified,
            additions: 10,
            deletions: 5,
            old_path: None,
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(!json.contains("old_path"));
        assert!(json.contains("\"modified\""));
    }
}
