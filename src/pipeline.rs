use crate::cache::BaseShaCache;
use crate::config::AppConfig;
use crate::dataset::Datasets;
use crate::export::{
    boxplot_file, multi_commit_file, read_commit_counts, rows_file, single_commit_file,
    split_counts, write_counts, write_rows,
};
use crate::filter::{join_commits, qualify_commits, select_prs};
use crate::github::{make_agent, BaseShaClient};
use crate::model::{OutputFiles, RunSummary, SCHEMA_VERSION};
use crate::plot::render_boxplot;
use crate::rows::{build_rows, lineage_targets};
use crate::stats::{describe, print_describe};
use crate::util::language_slug;
use anyhow::Context;
use chrono::Utc;
use console::style;
use std::collections::HashSet;
use tracing::info;

pub fn exec(config: AppConfig, json: bool) -> anyhow::Result<()> {
    let agent = make_agent(config.timeout);

    if !json {
        println!(
            "Filtering pull requests for language: {}",
            style(&config.language).cyan()
        );
    }

    let datasets = Datasets::load(&config.dataset, &config.cache_dir, &agent)
        .context("Failed to load datasets")?;

    let client = BaseShaClient::new(agent, config.api_url.clone(), config.token.clone());
    let summary = run(&config, &datasets, &client, !json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output_summary(&summary);
    }
    Ok(())
}

/// Runs every stage after loading. `verbose` prints the statistics table.
pub fn run(
    config: &AppConfig,
    datasets: &Datasets,
    client: &BaseShaClient,
    verbose: bool,
) -> anyhow::Result<RunSummary> {
    let prs = select_prs(
        &datasets.pull_requests,
        &datasets.repositories,
        &config.language,
    );
    let joined = join_commits(&datasets.commits, &datasets.commit_details);
    let commits = qualify_commits(joined, &prs);

    let targets = lineage_targets(&commits, &prs);
    let mut cache = if config.use_cache {
        Some(BaseShaCache::new(&config.cache_dir).context("Failed to initialize cache")?)
    } else {
        None
    };
    let base_shas = client
        .fetch_all(&targets, config.concurrency, cache.as_mut())
        .context("Failed to resolve base SHAs")?;

    let rows = build_rows(&commits, &prs, &base_shas, config.parent_linkage);
    info!(rows = rows.len(), "lineage rows built");

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let slug = language_slug(&config.language);
    let rows_path = rows_file(
        &config.output_dir,
        &slug,
        config.parent_linkage.rows_file_suffix(),
    );
    write_rows(&rows_path, &rows).context("Failed to write rows CSV")?;

    let counts = read_commit_counts(&rows_path).context("Failed to reload rows CSV")?;
    let stats = describe(&counts);
    if verbose {
        println!();
        print_describe(stats.as_ref());
    }

    let boxplot_path = if config.plot && !counts.is_empty() {
        let path = boxplot_file(&config.output_dir, &slug);
        render_boxplot(&path, &counts).context("Failed to render boxplot")?;
        Some(path)
    } else {
        None
    };

    let (single, multi) = split_counts(&counts);
    let single_path = single_commit_file(&config.output_dir, &slug);
    let multi_path = multi_commit_file(&config.output_dir, &slug);
    write_counts(&single_path, &single).context("Failed to write single-commit CSV")?;
    write_counts(&multi_path, &multi).context("Failed to write multi-commit CSV")?;

    let prs_with_rows: HashSet<i64> = rows.iter().map(|r| r.id_pr).collect();

    Ok(RunSummary {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        language: config.language.clone(),
        parent_linkage: config.parent_linkage,
        merged_prs: prs.len(),
        qualified_commits: commits.len(),
        rows: rows.len(),
        prs_with_rows: prs_with_rows.len(),
        base_shas_resolved: base_shas.values().filter(|v| v.is_some()).count(),
        single_commit_prs: single.len(),
        multi_commit_prs: multi.len(),
        stats,
        files: OutputFiles {
            rows: rows_path.to_string_lossy().to_string(),
            boxplot: boxplot_path.map(|p| p.to_string_lossy().to_string()),
            single_commit: single_path.to_string_lossy().to_string(),
            multi_commit: multi_path.to_string_lossy().to_string(),
        },
    })
}

fn output_summary(summary: &RunSummary) {
    println!("\n{}", style("Lineage Summary").bold());
    println!("{}", "─".repeat(50));
    println!("Merged PRs in language: {}", style(summary.merged_prs).cyan());
    println!("Qualified commits: {}", style(summary.qualified_commits).cyan());
    println!(
        "Rows written: {} across {} PRs",
        style(summary.rows).green(),
        style(summary.prs_with_rows).green()
    );
    println!(
        "Base SHAs resolved: {}",
        style(summary.base_shas_resolved).yellow()
    );
    println!("PRs with 1 commit: {}", style(summary.single_commit_prs).cyan());
    println!("PRs with more than 1 commit: {}", style(summary.multi_commit_prs).cyan());

    println!("\n{}", style("Files").bold());
    println!("- {}", summary.files.rows);
    if let Some(boxplot) = &summary.files.boxplot {
        println!("- {}", boxplot);
    }
    println!("- {}", summary.files.single_commit);
    println!("- {}", summary.files.multi_commit);
}
