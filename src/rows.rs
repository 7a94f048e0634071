use crate::model::{FetchTarget, OutputRow, ParentLinkage, PullRequest, QualifiedCommit};
use crate::util::parse_timestamp;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Qualified commits grouped by PR id, groups in ascending id, commits in input order.
pub fn group_by_pr(commits: &[QualifiedCommit]) -> BTreeMap<i64, Vec<&QualifiedCommit>> {
    let mut groups: BTreeMap<i64, Vec<&QualifiedCommit>> = BTreeMap::new();
    for commit in commits {
        groups.entry(commit.pr_id).or_default().push(commit);
    }
    groups
}

/// PRs that will emit rows, i.e. the ones whose base SHA is looked up.
pub fn lineage_targets(commits: &[QualifiedCommit], prs: &[PullRequest]) -> Vec<FetchTarget> {
    let index = index_prs(prs);
    group_by_pr(commits)
        .keys()
        .filter_map(|pr_id| index.get(pr_id))
        .map(|pr| FetchTarget {
            pr_id: pr.id,
            repo_url: pr.repo_url.clone(),
            number: pr.number,
        })
        .collect()
}

pub fn build_rows(
    commits: &[QualifiedCommit],
    prs: &[PullRequest],
    base_shas: &HashMap<i64, Option<String>>,
    linkage: ParentLinkage,
) -> Vec<OutputRow> {
    let index = index_prs(prs);
    let mut rows = Vec::with_capacity(commits.len());

    for (pr_id, mut group) in group_by_pr(commits) {
        let Some(pr) = index.get(&pr_id) else {
            debug!(pr_id, "no pull request metadata, group skipped");
            continue;
        };

        sort_by_commit_time(&mut group);

        let mut previous = base_shas.get(&pr_id).cloned().flatten();
        for (i, commit) in group.iter().enumerate() {
            let parent = match linkage {
                ParentLinkage::Omit => None,
                ParentLinkage::Chain => previous.take(),
            };
            let seq = i as i64 + 1;

            rows.push(OutputRow {
                id: format!("{}_rev{}", pr.number, seq),
                number_pr: pr.number,
                number_commit: seq,
                repo_url: pr.repo_url.clone(),
                merged_at: pr.merged_at.clone(),
                id_pr: pr_id,
                sha_commit: commit.sha.clone(),
                url_commit: format!("{}/commit/{}", pr.repo_url, commit.sha),
                url_pr: pr.html_url.clone(),
                parent,
                child: commit.sha.clone(),
            });

            previous = Some(commit.sha.clone());
        }
    }

    rows
}

fn index_prs(prs: &[PullRequest]) -> HashMap<i64, &PullRequest> {
    let mut index = HashMap::with_capacity(prs.len());
    for pr in prs {
        index.entry(pr.id).or_insert(pr);
    }
    index
}

// Stable; commits without a parseable timestamp go last. Groups without any timestamp keep input order.
fn sort_by_commit_time(group: &mut [&QualifiedCommit]) {
    if group.iter().all(|c| c.committed_at.is_none()) {
        return;
    }
    group.sort_by_cached_key(|c| {
        let parsed = c.committed_at.as_deref().and_then(parse_timestamp);
        (parsed.is_none(), parsed, c.committed_at.clone())
    });
}
