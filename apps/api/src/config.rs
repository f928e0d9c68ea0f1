use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; CLI flags override after loading.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub output_dir: PathBuf,
    pub skip_pdf: bool,
    /// `None` uses the built-in template.
    pub cover_letter_template: Option<PathBuf>,
    pub resume_template: Option<PathBuf>,
    pub typst_bin: PathBuf,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            output_dir: PathBuf::from("output"),
            skip_pdf: false,
            cover_letter_template: None,
            resume_template: None,
            typst_bin: PathBuf::from("typst"),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            port: match lookup("PORT") {
                Some(port) => port
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            skip_pdf: match lookup("SKIP_PDF") {
                Some(flag) => parse_flag(&flag).context("SKIP_PDF must be true or false")?,
                None => defaults.skip_pdf,
            },
            cover_letter_template: lookup("COVER_LETTER_TEMPLATE").map(PathBuf::from),
            resume_template: lookup("RESUME_TEMPLATE").map(PathBuf::from),
            typst_bin: lookup("TYPST_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.typst_bin),
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(!config.skip_pdf);
        assert!(config.resume_template.is_none());
        assert_eq!(config.typst_bin, PathBuf::from("typst"));
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("PORT", "9000"),
            ("OUTPUT_DIR", "/tmp/out"),
            ("SKIP_PDF", "TRUE"),
            ("RESUME_TEMPLATE", "custom.typ"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.skip_pdf);
        assert_eq!(config.resume_template, Some(PathBuf::from("custom.typ")));
    }

    #[test]
    fn test_invalid_port() {
        let err = config_with(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_invalid_flag() {
        assert!(config_with(&[("SKIP_PDF", "maybe")]).is_err());
    }
}
