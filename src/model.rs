use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: i64,
    pub number: i64,
    pub repo_url: String,
    pub html_url: String,
    /// Kept verbatim from the dataset.
    pub merged_at: Option<String>,
    pub language: Option<String>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub pr_id: i64,
    pub committed_at: Option<String>,
}

/// One row of the per-file detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub additions: i64,
}

/// A commit summary paired with one of its detail rows, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedCommit {
    pub sha: String,
    pub pr_id: i64,
    pub additions: i64,
    pub committed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedCommit {
    pub sha: String,
    pub pr_id: i64,
    pub additions: i64,
    pub committed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub id: String,
    pub number_pr: i64,
    pub number_commit: i64,
    pub repo_url: String,
    pub merged_at: Option<String>,
    pub id_pr: i64,
    pub sha_commit: String,
    pub url_commit: String,
    pub url_pr: String,
    pub parent: Option<String>,
    pub child: String,
}

pub const OUTPUT_COLUMNS: [&str; 11] = [
    "id",
    "number_pr",
    "number_commit",
    "repo_url",
    "merged_at",
    "id_pr",
    "sha_commit",
    "url_commit",
    "url_pr",
    "parent",
    "child",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCountAggregate {
    pub id_pr: i64,
    pub num_commits: u64,
}

/// How the `parent` column of exported rows is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentLinkage {
    /// `parent` is always null.
    #[default]
    Omit,
    /// Row 1 points at the PR base SHA, row n at the SHA of row n-1.
    Chain,
}

impl ParentLinkage {
    pub fn rows_file_suffix(&self) -> &'static str {
        match self {
            ParentLinkage::Omit => "pr_commits_without_parents",
            ParentLinkage::Chain => "pr_commits_with_parents",
        }
    }
}

/// A PR whose base SHA is looked up during enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub pr_id: i64,
    pub repo_url: String,
    pub number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFiles {
    pub rows: String,
    pub boxplot: Option<String>,
    pub single_commit: String,
    pub multi_commit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub language: String,
    pub parent_linkage: ParentLinkage,
    pub merged_prs: usize,
    pub qualified_commits: usize,
    pub rows: usize,
    pub prs_with_rows: usize,
    pub base_shas_resolved: usize,
    pub single_commit_prs: usize,
    pub multi_commit_prs: usize,
    pub stats: Option<DescribeStats>,
    pub files: OutputFiles,
}
