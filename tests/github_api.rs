mod common;

use common::{pull_body, serve, PY_REPO};
use prlineage::cache::BaseShaCache;
use prlineage::github::{make_agent, parse_repo_url, BaseShaClient};
use prlineage::model::FetchTarget;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::tempdir;

fn client(base_url: &str) -> BaseShaClient {
    BaseShaClient::new(make_agent(Some(Duration::from_secs(10))), base_url, "secret")
}

fn target(pr_id: i64, number: i64) -> FetchTarget {
    FetchTarget {
        pr_id,
        repo_url: PY_REPO.to_string(),
        number,
    }
}

#[test]
fn fetch_reads_base_sha_on_200() {
    let api = serve(HashMap::from([(
        "/repos/octo/py/pulls/42".to_string(),
        (200, pull_body("abc123")),
    )]));

    let sha = client(&api.base_url).fetch(PY_REPO, 42);
    assert_eq!(sha.as_deref(), Some("abc123"));

    let requests = api.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.as_deref(), Some("Bearer secret"));
}

#[test]
fn fetch_returns_none_on_404() {
    let api = serve(HashMap::new());
    assert_eq!(client(&api.base_url).fetch(PY_REPO, 42), None);
    assert_eq!(api.requests.lock().unwrap().len(), 1);
}

#[test]
fn fetch_returns_none_on_unexpected_body() {
    let api = serve(HashMap::from([
        ("/repos/octo/py/pulls/1".to_string(), (200, "not json".to_string())),
        ("/repos/octo/py/pulls/2".to_string(), (200, r#"{"number":2}"#.to_string())),
    ]));
    let client = client(&api.base_url);
    assert_eq!(client.fetch(PY_REPO, 1), None);
    assert_eq!(client.fetch(PY_REPO, 2), None);
}

#[test]
fn fetch_returns_none_when_unreachable_or_unparseable() {
    // nothing listens on the discard port
    let client = client("http://127.0.0.1:9");
    assert_eq!(client.fetch(PY_REPO, 42), None);
    assert_eq!(client.fetch("https://example.com/octo/py", 42), None);
}

#[test]
fn fetch_all_deduplicates_and_uses_cache() {
    let api = serve(HashMap::from([
        ("/repos/octo/py/pulls/42".to_string(), (200, pull_body("base42"))),
        ("/repos/octo/py/pulls/7".to_string(), (200, pull_body("base7"))),
    ]));
    let dir = tempdir().unwrap();
    let targets = vec![target(1, 42), target(2, 7), target(3, 13), target(1, 42)];

    let mut cache = BaseShaCache::new(dir.path()).unwrap();
    let resolved = client(&api.base_url)
        .fetch_all(&targets, 3, Some(&mut cache))
        .unwrap();

    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved[&1].as_deref(), Some("base42"));
    assert_eq!(resolved[&2].as_deref(), Some("base7"));
    assert_eq!(resolved[&3], None);
    assert_eq!(api.requests.lock().unwrap().len(), 3);

    // Only successes were stored.
    assert_eq!(cache.len().unwrap(), 2);
    let slug = parse_repo_url(PY_REPO).unwrap();
    assert_eq!(cache.get(&slug, 42).unwrap().as_deref(), Some("base42"));

    // A second run answers from the cache, the failed PR is retried.
    let offline = client("http://127.0.0.1:9");
    let again = offline.fetch_all(&targets, 1, Some(&mut cache)).unwrap();
    assert_eq!(again, resolved);
}

#[test]
fn fetch_all_without_cache_hits_the_api_each_time() {
    let api = serve(HashMap::from([(
        "/repos/octo/py/pulls/42".to_string(),
        (200, pull_body("base42")),
    )]));
    let client = client(&api.base_url);
    let targets = vec![target(1, 42)];

    client.fetch_all(&targets, 1, None).unwrap();
    client.fetch_all(&targets, 1, None).unwrap();
    assert_eq!(api.requests.lock().unwrap().len(), 2);
}
