use crate::error::{LineageError, Result};
use crate::model::{CommitDetail, CommitSummary, PullRequest, Repository};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const REPOSITORIES: &str = "repository.parquet";
pub const PULL_REQUESTS: &str = "pull_request.parquet";
pub const COMMITS: &str = "pr_commits.parquet";
pub const COMMIT_DETAILS: &str = "pr_commit_details.parquet";

/// Where the four parquet tables come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Remote(String),
    Local(PathBuf),
}

impl DatasetSource {
    /// Returns a local path for `name`, downloading it into `cache_dir` first for remote sources.
    pub fn fetch(&self, name: &str, cache_dir: &Path, agent: &ureq::Agent) -> Result<PathBuf> {
        match self {
            DatasetSource::Local(dir) => {
                let path = dir.join(name);
                if !path.exists() {
                    return Err(LineageError::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("dataset file not found: {}", path.display()),
                    )));
                }
                Ok(path)
            }
            DatasetSource::Remote(base) => {
                let dir = cache_dir.join("datasets");
                let path = dir.join(name);
                if path.exists() {
                    debug!(path = %path.display(), "using cached dataset");
                    return Ok(path);
                }
                fs::create_dir_all(&dir)?;
                let url = format!("{}/{}", base.trim_end_matches('/'), name);
                download(agent, &url, &path)?;
                Ok(path)
            }
        }
    }
}

fn download(agent: &ureq::Agent, url: &str, dest: &Path) -> Result<()> {
    info!(%url, "downloading dataset");
    let response = agent.get(url).call()?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(LineageError::Download {
            url: url.to_string(),
            status,
        });
    }

    // Write to a sibling file so an interrupted download never looks cached.
    let partial = dest.with_extension("part");
    let mut reader = response.into_body().into_reader();
    let mut writer = BufWriter::new(File::create(&partial)?);
    io::copy(&mut reader, &mut writer)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    fs::rename(&partial, dest)?;
    Ok(())
}

pub struct Datasets {
    pub repositories: Vec<Repository>,
    pub pull_requests: Vec<PullRequest>,
    pub commits: Vec<CommitSummary>,
    pub commit_details: Vec<CommitDetail>,
}

impl Datasets {
    pub fn load(source: &DatasetSource, cache_dir: &Path, agent: &ureq::Agent) -> Result<Self> {
        let repositories = load_repositories(&source.fetch(REPOSITORIES, cache_dir, agent)?)?;
        let pull_requests = load_pull_requests(&source.fetch(PULL_REQUESTS, cache_dir, agent)?)?;
        let commits = load_commit_summaries(&source.fetch(COMMITS, cache_dir, agent)?)?;
        let commit_details = load_commit_details(&source.fetch(COMMIT_DETAILS, cache_dir, agent)?)?;

        info!(
            repositories = repositories.len(),
            pull_requests = pull_requests.len(),
            commits = commits.len(),
            commit_details = commit_details.len(),
            "datasets loaded"
        );

        Ok(Self {
            repositories,
            pull_requests,
            commits,
            commit_details,
        })
    }
}

pub fn load_repositories(path: &Path) -> Result<Vec<Repository>> {
    let mut out = Vec::new();
    for batch in read_batches(path, &["url", "language"])? {
        let table = Table::new(&batch, REPOSITORIES);
        let urls = table.required_strings("url")?;
        let languages = table.strings("language")?;
        for (url, language) in urls.into_iter().zip(languages) {
            out.push(Repository { url, language });
        }
    }
    Ok(out)
}

pub fn load_pull_requests(path: &Path) -> Result<Vec<PullRequest>> {
    let mut out = Vec::new();
    let columns = ["id", "number", "repo_url", "html_url", "merged_at"];
    for batch in read_batches(path, &columns)? {
        let table = Table::new(&batch, PULL_REQUESTS);
        let ids = table.required_ints("id")?;
        let numbers = table.required_ints("number")?;
        let repo_urls = table.required_strings("repo_url")?;
        let html_urls = table.strings("html_url")?;
        let merged = table.strings("merged_at")?;

        for i in 0..batch.num_rows() {
            out.push(PullRequest {
                id: ids[i],
                number: numbers[i],
                repo_url: repo_urls[i].clone(),
                html_url: html_urls[i].clone().unwrap_or_default(),
                merged_at: merged[i].clone(),
                language: None,
            });
        }
    }
    Ok(out)
}

pub fn load_commit_summaries(path: &Path) -> Result<Vec<CommitSummary>> {
    let mut out = Vec::new();
    for batch in read_batches(path, &["sha", "pr_id", "committed_at"])? {
        let table = Table::new(&batch, COMMITS);
        let shas = table.required_strings("sha")?;
        let pr_ids = table.required_ints("pr_id")?;
        let committed = table.optional_strings("committed_at")?;

        for (i, (sha, pr_id)) in shas.into_iter().zip(pr_ids).enumerate() {
            out.push(CommitSummary {
                sha,
                pr_id,
                committed_at: committed.as_ref().and_then(|c| c[i].clone()),
            });
        }
    }
    Ok(out)
}

pub fn load_commit_details(path: &Path) -> Result<Vec<CommitDetail>> {
    let mut out = Vec::new();
    for batch in read_batches(path, &["sha", "additions"])? {
        let table = Table::new(&batch, COMMIT_DETAILS);
        let shas = table.required_strings("sha")?;
        let additions = table.ints("additions")?;
        for (sha, additions) in shas.into_iter().zip(additions) {
            // Missing additions never pass the `additions > 0` filter.
            out.push(CommitDetail {
                sha,
                additions: additions.unwrap_or(0),
            });
        }
    }
    Ok(out)
}

/// Reads only `columns` from the parquet file. Columns absent from the file are simply not projected.
fn read_batches(path: &Path, columns: &[&str]) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let roots: Vec<usize> = builder
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| columns.contains(&field.name().as_str()))
        .map(|(i, _)| i)
        .collect();
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
    let reader = builder.with_projection(mask).build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    debug!(path = %path.display(), batches = batches.len(), "parquet file read");
    Ok(batches)
}

struct Table<'a> {
    batch: &'a RecordBatch,
    name: &'a str,
}

impl<'a> Table<'a> {
    fn new(batch: &'a RecordBatch, name: &'a str) -> Self {
        Self { batch, name }
    }

    fn column(&self, column: &str) -> Result<&'a dyn Array> {
        self.batch
            .column_by_name(column)
            .map(|c| c.as_ref())
            .ok_or_else(|| LineageError::MissingColumn {
                table: self.name.to_string(),
                column: column.to_string(),
            })
    }

    fn null_error(&self, column: &str) -> LineageError {
        LineageError::NullValue {
            table: self.name.to_string(),
            column: column.to_string(),
        }
    }

    fn strings(&self, column: &str) -> Result<Vec<Option<String>>> {
        string_values(self.column(column)?)
    }

    fn optional_strings(&self, column: &str) -> Result<Option<Vec<Option<String>>>> {
        match self.batch.column_by_name(column) {
            Some(array) => Ok(Some(string_values(array.as_ref())?)),
            None => Ok(None),
        }
    }

    fn required_strings(&self, column: &str) -> Result<Vec<String>> {
        self.strings(column)?
            .into_iter()
            .map(|v| v.ok_or_else(|| self.null_error(column)))
            .collect()
    }

    fn ints(&self, column: &str) -> Result<Vec<Option<i64>>> {
        let array = cast(self.column(column)?, &DataType::Int64)?;
        Ok(array.as_primitive::<Int64Type>().iter().collect())
    }

    fn required_ints(&self, column: &str) -> Result<Vec<i64>> {
        self.ints(column)?
            .into_iter()
            .map(|v| v.ok_or_else(|| self.null_error(column)))
            .collect()
    }
}

// Casting covers LargeUtf8, dictionary and timestamp columns alike.
fn string_values(array: &dyn Array) -> Result<Vec<Option<String>>> {
    let array = cast(array, &DataType::Utf8)?;
    Ok(array
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
