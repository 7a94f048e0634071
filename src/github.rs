use crate::cache::BaseShaCache;
use crate::error::{LineageError, Result};
use crate::model::FetchTarget;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("prlineage/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

/// Extracts owner and repository name from a `github.com/{owner}/{repo}` or
/// `api.github.com/repos/{owner}/{repo}` URL.
pub fn parse_repo_url(repo_url: &str) -> Result<RepoSlug> {
    let url = Url::parse(repo_url.trim())?;
    let unsupported = || LineageError::RepoUrl(repo_url.to_string());

    if !matches!(url.scheme(), "https" | "http") {
        return Err(unsupported());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let (owner, name) = match (url.host_str(), segments.as_slice()) {
        (Some("api.github.com"), ["repos", owner, name]) => (*owner, *name),
        (Some("github.com"), [owner, name]) => (*owner, *name),
        _ => return Err(unsupported()),
    };

    let name = name.strip_suffix(".git").unwrap_or(name);
    if owner.is_empty() || name.is_empty() {
        return Err(unsupported());
    }

    Ok(RepoSlug {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

#[derive(Deserialize)]
struct PullResponse {
    base: Option<BaseRef>,
}

#[derive(Deserialize)]
struct BaseRef {
    sha: Option<String>,
}

pub fn make_agent(timeout: Option<Duration>) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .user_agent(USER_AGENT)
        .build()
        .new_agent()
}

/// Looks up the base commit of pull requests through the REST API.
pub struct BaseShaClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl BaseShaClient {
    pub fn new(agent: ureq::Agent, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn pull_url(&self, slug: &RepoSlug, number: i64) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, slug.owner, slug.name, number
        )
    }

    /// One GET for the pull request. Every failure is logged and yields `None`.
    pub fn fetch(&self, repo_url: &str, number: i64) -> Option<String> {
        let slug = match parse_repo_url(repo_url) {
            Ok(slug) => slug,
            Err(e) => {
                warn!(%repo_url, error = %e, "cannot derive API URL for base SHA");
                return None;
            }
        };
        self.fetch_slug(&slug, number)
    }

    fn fetch_slug(&self, slug: &RepoSlug, number: i64) -> Option<String> {
        let url = self.pull_url(slug, number);
        let response = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", &format!("Bearer {}", self.token))
            .call();

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "base SHA request failed");
                return None;
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            warn!(%url, status, "failed to fetch base SHA");
            return None;
        }

        match response.into_body().read_json::<PullResponse>() {
            Ok(pull) => pull.base.and_then(|b| b.sha),
            Err(e) => {
                warn!(%url, error = %e, "unreadable pull request body");
                None
            }
        }
    }

    /// Resolves every target once per PR id, `concurrency` requests at a time.
    ///
    /// Cached answers are used first; only successful lookups are written back.
    pub fn fetch_all(
        &self,
        targets: &[FetchTarget],
        concurrency: usize,
        mut cache: Option<&mut BaseShaCache>,
    ) -> Result<HashMap<i64, Option<String>>> {
        let mut resolved: HashMap<i64, Option<String>> = HashMap::with_capacity(targets.len());
        let mut pending: Vec<(&FetchTarget, Option<RepoSlug>)> = Vec::new();

        for target in targets {
            if resolved.contains_key(&target.pr_id) {
                continue;
            }
            let slug = parse_repo_url(&target.repo_url).ok();
            if let (Some(cache), Some(slug)) = (cache.as_deref(), slug.as_ref()) {
                if let Some(sha) = cache.get(slug, target.number)? {
                    resolved.insert(target.pr_id, Some(sha));
                    continue;
                }
            }
            resolved.insert(target.pr_id, None);
            pending.push((target, slug));
        }

        debug!(
            cached = resolved.len() - pending.len(),
            pending = pending.len(),
            "base SHA lookups planned"
        );

        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Fetching base SHAs");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .build()?;

        let fetched: Vec<(i64, Option<RepoSlug>, i64, Option<String>)> = pool.install(|| {
            pending
                .par_iter()
                .map(|(target, slug)| {
                    let sha = match slug {
                        Some(slug) => self.fetch_slug(slug, target.number),
                        None => self.fetch(&target.repo_url, target.number),
                    };
                    pb.inc(1);
                    (target.pr_id, slug.clone(), target.number, sha)
                })
                .collect()
        });
        pb.finish_and_clear();

        let mut fresh = Vec::new();
        for (pr_id, slug, number, sha) in fetched {
            if let (Some(slug), Some(sha)) = (slug, sha.as_ref()) {
                fresh.push((slug, number, sha.clone()));
            }
            resolved.insert(pr_id, sha);
        }

        if let Some(cache) = cache.as_deref_mut() {
            cache.store(&fresh)?;
        }

        let hits = resolved.values().filter(|v| v.is_some()).count();
        info!(prs = resolved.len(), resolved = hits, "base SHAs resolved");
        Ok(resolved)
    }
}
