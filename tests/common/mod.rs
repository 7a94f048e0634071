#![allow(dead_code)]

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

pub const PY_REPO: &str = "https://api.github.com/repos/octo/py";
pub const RS_REPO: &str = "https://api.github.com/repos/octo/rs";

fn strings(values: &[Option<&str>]) -> ArrayRef {
    Arc::new(values.iter().copied().collect::<StringArray>())
}

fn ints(values: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(values.to_vec()))
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    let batch = RecordBatch::try_from_iter(columns).unwrap();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Writes the four dataset tables.
///
/// PR 1001 (#42, Python) has commits sha1 < sha2, plus a duplicate summary row and a
/// zero-addition file row for sha2. PR 1002 (#7, Python) has one zero-addition commit and
/// one real one. PR 1003 (#8) is Rust, PR 1004 (#9) is not merged, PR 1005 (#13) is
/// Python and answers 404 on the API.
pub fn write_fixture_datasets(dir: &Path) {
    write_parquet(
        &dir.join("repository.parquet"),
        vec![
            ("id", ints(&[1, 2])),
            ("url", strings(&[Some(PY_REPO), Some(RS_REPO)])),
            ("language", strings(&[Some("Python"), Some("Rust")])),
        ],
    );

    write_parquet(
        &dir.join("pull_request.parquet"),
        vec![
            ("id", ints(&[1001, 1002, 1003, 1004, 1005])),
            ("number", ints(&[42, 7, 8, 9, 13])),
            (
                "repo_url",
                strings(&[Some(PY_REPO), Some(PY_REPO), Some(RS_REPO), Some(PY_REPO), Some(PY_REPO)]),
            ),
            (
                "html_url",
                strings(&[
                    Some("https://github.com/octo/py/pull/42"),
                    Some("https://github.com/octo/py/pull/7"),
                    Some("https://github.com/octo/rs/pull/8"),
                    Some("https://github.com/octo/py/pull/9"),
                    Some("https://github.com/octo/py/pull/13"),
                ]),
            ),
            (
                "merged_at",
                strings(&[
                    Some("2025-06-03T10:00:00Z"),
                    Some("2025-06-04T10:00:00Z"),
                    Some("2025-06-05T10:00:00Z"),
                    None,
                    Some("2025-06-06T10:00:00Z"),
                ]),
            ),
            ("title", strings(&[Some("a"), Some("b"), Some("c"), Some("d"), Some("e")])),
        ],
    );

    write_parquet(
        &dir.join("pr_commits.parquet"),
        vec![
            (
                "sha",
                strings(&[
                    Some("sha2"),
                    Some("sha1"),
                    Some("zero"),
                    Some("keep7"),
                    Some("rs1"),
                    Some("nm1"),
                    Some("m1"),
                    Some("sha1"),
                ]),
            ),
            ("pr_id", ints(&[1001, 1001, 1002, 1002, 1003, 1004, 1005, 1001])),
            (
                "committed_at",
                strings(&[
                    Some("2025-06-01T12:00:00Z"),
                    Some("2025-06-01T09:00:00Z"),
                    Some("2025-06-02T08:00:00Z"),
                    Some("2025-06-02T09:00:00Z"),
                    Some("2025-06-02T10:00:00Z"),
                    Some("2025-06-02T11:00:00Z"),
                    Some("2025-06-02T12:00:00Z"),
                    Some("2025-06-01T09:00:00Z"),
                ]),
            ),
        ],
    );

    write_parquet(
        &dir.join("pr_commit_details.parquet"),
        vec![
            (
                "sha",
                strings(&[
                    Some("sha1"),
                    Some("sha2"),
                    Some("sha2"),
                    Some("zero"),
                    Some("keep7"),
                    Some("rs1"),
                    Some("nm1"),
                    Some("m1"),
                ]),
            ),
            ("pr_id", ints(&[1001, 1001, 1001, 1002, 1002, 1003, 1004, 1005])),
            ("additions", ints(&[3, 5, 0, 0, 2, 4, 4, 1])),
            (
                "filename",
                strings(&[
                    Some("a.py"),
                    Some("b.py"),
                    Some("c.py"),
                    Some("d.py"),
                    Some("e.py"),
                    Some("f.rs"),
                    Some("g.py"),
                    Some("h.py"),
                ]),
            ),
        ],
    );
}

pub fn write_config_files(dir: &Path, language: &str) {
    std::fs::write(dir.join("token.ini"), "[github]\ntoken = test-token\n").unwrap();
    std::fs::write(
        dir.join("settings.ini"),
        format!("[DETAILS]\nlanguage = {language}\n"),
    )
    .unwrap();
}

/// A stand-in for the REST API. Unknown paths answer 404.
pub struct MockApi {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

pub fn pull_body(base_sha: &str) -> String {
    serde_json::json!({ "number": 1, "base": { "ref": "main", "sha": base_sha } }).to_string()
}

pub fn serve(routes: HashMap<String, (u16, String)>) -> MockApi {
    serve_bytes(
        routes
            .into_iter()
            .map(|(path, (status, body))| (path, (status, body.into_bytes())))
            .collect(),
    )
}

/// Like [`serve`], with raw response bodies.
pub fn serve_bytes(routes: HashMap<String, (u16, Vec<u8>)>) -> MockApi {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let path = request.url().to_string();
            seen.lock().unwrap().push((path.clone(), auth));

            let (status, body) = routes
                .get(&path)
                .cloned()
                .unwrap_or_else(|| (404, br#"{"message":"Not Found"}"#.to_vec()));
            let response = tiny_http::Response::from_data(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });

    MockApi {
        base_url: format!("http://{addr}"),
        requests,
    }
}

pub fn fixture_api() -> MockApi {
    serve(HashMap::from([
        ("/repos/octo/py/pulls/42".to_string(), (200, pull_body("base42"))),
        ("/repos/octo/py/pulls/7".to_string(), (200, pull_body("base7"))),
    ]))
}
