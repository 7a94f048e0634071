use crate::config::{load_language, load_token, AppConfig, DEFAULT_API_URL, DEFAULT_DATASET_URL};
use crate::dataset::DatasetSource;
use crate::model::ParentLinkage;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "prlineage")]
#[command(about = "Per-commit lineage export for merged pull requests of one language")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "INI file with a [github] token", default_value = "token.ini")]
    pub token_file: PathBuf,

    #[arg(long, help = "INI file with a [DETAILS] language", default_value = "settings.ini")]
    pub settings: PathBuf,

    #[arg(long, help = "Target language, overrides the settings file")]
    pub language: Option<String>,

    #[arg(long, help = "Base URL of the parquet dataset", default_value = DEFAULT_DATASET_URL)]
    pub dataset_url: String,

    #[arg(long, help = "Read the parquet files from this directory instead of downloading")]
    pub dataset_dir: Option<PathBuf>,

    #[arg(long, help = "GitHub REST API base URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, help = "Directory for output files", default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, help = "Cache directory for datasets and base SHAs", default_value = ".prlineage")]
    pub cache: PathBuf,

    #[arg(long, help = "Do not read or write the base SHA cache", default_value_t = false)]
    pub no_cache: bool,

    #[arg(long, help = "Parallel base SHA requests", default_value_t = 1)]
    pub concurrency: usize,

    #[arg(long, help = "Per-request HTTP timeout (e.g. 30s, 2m)", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    #[arg(long, help = "Fill `parent` with the previous commit, starting at the PR base SHA", default_value_t = false)]
    pub link_parents: bool,

    #[arg(long, help = "Skip the boxplot", default_value_t = false)]
    pub no_plot: bool,

    #[arg(long, help = "Print the run summary as JSON")]
    pub json: bool,
}

fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(input).map_err(|e| e.to_string())
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn config(&self) -> Result<AppConfig> {
        let token = load_token(&self.token_file).context("Failed to read GitHub token")?;
        let language = match &self.language {
            Some(language) => language.clone(),
            None => load_language(&self.settings).context("Failed to read target language")?,
        };

        let dataset = match &self.dataset_dir {
            Some(dir) => DatasetSource::Local(dir.clone()),
            None => DatasetSource::Remote(self.dataset_url.clone()),
        };

        Ok(AppConfig {
            token,
            language,
            dataset,
            api_url: self.api_url.clone(),
            output_dir: self.output_dir.clone(),
            cache_dir: self.cache.clone(),
            use_cache: !self.no_cache,
            concurrency: self.concurrency.max(1),
            timeout: self.timeout,
            parent_linkage: if self.link_parents {
                ParentLinkage::Chain
            } else {
                ParentLinkage::Omit
            },
            plot: !self.no_plot,
        })
    }

    pub fn execute(self) -> Result<()> {
        let config = self.config()?;
        crate::pipeline::exec(config, self.json)
    }
}
