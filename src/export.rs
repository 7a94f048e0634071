use crate::error::{LineageError, Result};
use crate::model::{CommitCountAggregate, OutputRow, OUTPUT_COLUMNS};
use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray, UInt64Array};
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Int64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub fn rows_file(output_dir: &Path, slug: &str, suffix: &str) -> PathBuf {
    output_dir.join(format!("{slug}_{suffix}.csv"))
}

pub fn boxplot_file(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("boxplot_{slug}.png"))
}

pub fn single_commit_file(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("{slug}_prs_single_commit.csv"))
}

pub fn multi_commit_file(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("{slug}_prs_multi_commit.csv"))
}

pub fn rows_schema() -> SchemaRef {
    let fields: Vec<Field> = OUTPUT_COLUMNS
        .iter()
        .map(|&name| {
            let data_type = match name {
                "number_pr" | "number_commit" | "id_pr" => DataType::Int64,
                _ => DataType::Utf8,
            };
            Field::new(name, data_type, true)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn counts_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id_pr", DataType::Int64, false),
        Field::new("num_commits", DataType::UInt64, false),
    ]))
}

fn strings<'a>(rows: &'a [OutputRow], f: impl Fn(&'a OutputRow) -> Option<&'a str>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<StringArray>())
}

fn ints(rows: &[OutputRow], f: impl Fn(&OutputRow) -> i64) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(rows.iter().map(f)))
}

/// Writes the lineage rows as CSV with a header; null cells stay empty.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let columns: Vec<ArrayRef> = vec![
        strings(rows, |r| Some(r.id.as_str())),
        ints(rows, |r| r.number_pr),
        ints(rows, |r| r.number_commit),
        strings(rows, |r| Some(r.repo_url.as_str())),
        strings(rows, |r| r.merged_at.as_deref()),
        ints(rows, |r| r.id_pr),
        strings(rows, |r| Some(r.sha_commit.as_str())),
        strings(rows, |r| Some(r.url_commit.as_str())),
        strings(rows, |r| Some(r.url_pr.as_str())),
        strings(rows, |r| r.parent.as_deref()),
        strings(rows, |r| Some(r.child.as_str())),
    ];
    let batch = RecordBatch::try_new(rows_schema(), columns)?;
    write_batch(path, &batch)?;
    debug!(path = %path.display(), rows = rows.len(), "rows written");
    Ok(())
}

pub fn write_counts(path: &Path, counts: &[CommitCountAggregate]) -> Result<()> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(counts.iter().map(|c| c.id_pr))),
        Arc::new(UInt64Array::from_iter_values(counts.iter().map(|c| c.num_commits))),
    ];
    let batch = RecordBatch::try_new(counts_schema(), columns)?;
    write_batch(path, &batch)
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    Ok(())
}

/// Reloads an exported rows file and counts rows per `id_pr`, ascending by id.
pub fn read_commit_counts(path: &Path) -> Result<Vec<CommitCountAggregate>> {
    let file = BufReader::new(File::open(path)?);
    let reader = ReaderBuilder::new(rows_schema())
        .with_header(true)
        .build(file)?;

    let mut per_pr: BTreeMap<i64, u64> = BTreeMap::new();
    for batch in reader {
        let batch = batch?;
        let ids = column(&batch, "id_pr", path)?.as_primitive::<Int64Type>();
        let shas = column(&batch, "sha_commit", path)?.as_string::<i32>();

        for i in 0..batch.num_rows() {
            if ids.is_null(i) {
                continue;
            }
            let count = per_pr.entry(ids.value(i)).or_insert(0);
            // Like a dataframe `count`, empty SHAs are not counted.
            if shas.is_valid(i) && !shas.value(i).is_empty() {
                *count += 1;
            }
        }
    }

    Ok(per_pr
        .into_iter()
        .map(|(id_pr, num_commits)| CommitCountAggregate { id_pr, num_commits })
        .collect())
}

fn column<'a>(batch: &'a RecordBatch, name: &str, path: &Path) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| LineageError::MissingColumn {
            table: path.display().to_string(),
            column: name.to_string(),
        })
}

/// Splits into PRs with exactly one commit and PRs with more than one.
pub fn split_counts(
    counts: &[CommitCountAggregate],
) -> (Vec<CommitCountAggregate>, Vec<CommitCountAggregate>) {
    let single = counts.iter().filter(|c| c.num_commits == 1).copied().collect();
    let multi = counts.iter().filter(|c| c.num_commits > 1).copied().collect();
    (single, multi)
}
