use crate::model::{CommitDetail, CommitSummary, JoinedCommit, PullRequest, QualifiedCommit, Repository};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Merged PRs with a repository row of language `language`, with the language joined in.
///
/// A URL may appear on several repository rows; a PR qualifies when any of them matches.
pub fn select_prs(prs: &[PullRequest], repos: &[Repository], language: &str) -> Vec<PullRequest> {
    let matching: HashSet<&str> = repos
        .iter()
        .filter(|repo| repo.language.as_deref() == Some(language))
        .map(|repo| repo.url.as_str())
        .collect();

    let selected: Vec<PullRequest> = prs
        .iter()
        .filter(|pr| pr.is_merged() && matching.contains(pr.repo_url.as_str()))
        .map(|pr| PullRequest {
            language: Some(language.to_string()),
            ..pr.clone()
        })
        .collect();

    debug!(total = prs.len(), selected = selected.len(), %language, "pull requests selected");
    selected
}

/// Inner join on SHA. Left order is kept, matches follow detail order.
pub fn join_commits(summaries: &[CommitSummary], details: &[CommitDetail]) -> Vec<JoinedCommit> {
    let mut by_sha: HashMap<&str, Vec<i64>> = HashMap::new();
    for detail in details {
        by_sha
            .entry(detail.sha.as_str())
            .or_default()
            .push(detail.additions);
    }

    summaries
        .iter()
        .flat_map(|summary| {
            by_sha
                .get(summary.sha.as_str())
                .into_iter()
                .flatten()
                .map(move |&additions| JoinedCommit {
                    sha: summary.sha.clone(),
                    pr_id: summary.pr_id,
                    additions,
                    committed_at: summary.committed_at.clone(),
                })
        })
        .collect()
}

/// Keeps commits with additions, first occurrence per (sha, pr id), belonging to a selected PR.
pub fn qualify_commits(joined: Vec<JoinedCommit>, prs: &[PullRequest]) -> Vec<QualifiedCommit> {
    let pr_ids: HashSet<i64> = prs.iter().map(|pr| pr.id).collect();
    let mut seen: HashSet<(String, i64)> = HashSet::new();

    let before = joined.len();
    let qualified: Vec<QualifiedCommit> = joined
        .into_iter()
        .filter(|c| c.additions > 0)
        .filter(|c| seen.insert((c.sha.clone(), c.pr_id)))
        .filter(|c| pr_ids.contains(&c.pr_id))
        .map(|c| QualifiedCommit {
            sha: c.sha,
            pr_id: c.pr_id,
            additions: c.additions,
            committed_at: c.committed_at,
        })
        .collect();

    debug!(joined = before, qualified = qualified.len(), "commits qualified");
    qualified
}
