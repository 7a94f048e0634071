use crate::dataset::DatasetSource;
use crate::error::{LineageError, Result};
use crate::model::ParentLinkage;
use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATASET_URL: &str = "https://huggingface.co/datasets/hao-li/AIDev/resolve/main";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: String,
    pub language: String,
    pub dataset: DatasetSource,
    pub api_url: String,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    pub concurrency: usize,
    pub timeout: Option<Duration>,
    pub parent_linkage: ParentLinkage,
    pub plot: bool,
}

pub fn load_token<P: AsRef<Path>>(path: P) -> Result<String> {
    let conf = open_ini(path.as_ref())?;
    token_from_ini(&conf)
}

pub fn load_language<P: AsRef<Path>>(path: P) -> Result<String> {
    let conf = open_ini(path.as_ref())?;
    language_from_ini(&conf)
}

pub fn token_from_ini(conf: &Ini) -> Result<String> {
    required_value(conf, "github", "token")
}

pub fn language_from_ini(conf: &Ini) -> Result<String> {
    required_value(conf, "DETAILS", "language")
}

fn open_ini(path: &Path) -> Result<Ini> {
    if !path.exists() {
        return Err(LineageError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    Ok(Ini::load_from_file(path)?)
}

// Section names match exactly, option names ignore case.
fn required_value(conf: &Ini, section: &str, key: &str) -> Result<String> {
    let props = conf
        .section(Some(section))
        .ok_or_else(|| LineageError::Config(format!("Missing section [{section}]")))?;

    props
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LineageError::Config(format!("Missing key '{key}' in section [{section}]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_token_and_language() {
        let token = Ini::load_from_str("[github]\ntoken = ghp_abc123\n").unwrap();
        assert_eq!(token_from_ini(&token).unwrap(), "ghp_abc123");

        let settings = Ini::load_from_str("[DETAILS]\nLanguage = Python\n").unwrap();
        assert_eq!(language_from_ini(&settings).unwrap(), "Python");
    }

    #[test]
    fn missing_keys_are_config_errors() {
        let conf = Ini::load_from_str("[github]\nuser = me\n").unwrap();
        assert!(matches!(token_from_ini(&conf), Err(LineageError::Config(_))));

        let conf = Ini::load_from_str("[details]\nlanguage = Rust\n").unwrap();
        assert!(matches!(language_from_ini(&conf), Err(LineageError::Config(_))));

        let conf = Ini::load_from_str("[DETAILS]\nlanguage =\n").unwrap();
        assert!(matches!(language_from_ini(&conf), Err(LineageError::Config(_))));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_token(dir.path().join("token.ini")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
