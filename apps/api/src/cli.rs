use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::models::{CoverLetterData, ResumeData};
use crate::render::assets::TemplateStore;
use crate::render::compiler::{DocumentCompiler, TypstCompiler};
use crate::render::output::{render_cover_letter, render_resume, RenderResponse};
use crate::scrape::parse_resume;

/// Vitae - render and scrape Typst résumés and cover letters
#[derive(Parser, Debug)]
#[command(name = "vitae")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory for generated .typ and .pdf files
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write the markup only, do not run the compiler
    #[arg(long, global = true)]
    pub skip_pdf: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Render a cover letter from JSON
    CoverLetter(RenderArgs),

    /// Render a résumé from JSON
    Resume(RenderArgs),

    /// Parse a Typst résumé into JSON
    Parse {
        /// Typst résumé to read
        input: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: RecordInput,

    /// Template file; defaults to the built-in template
    #[arg(long)]
    pub template: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RecordInput {
    /// JSON file holding the record
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Inline JSON record
    #[arg(long, value_name = "JSON")]
    pub json: Option<String>,
}

impl RecordInput {
    fn read(&self) -> Result<String> {
        match (&self.data, &self.json) {
            (Some(path), _) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read data file {}", path.display())),
            (None, Some(json)) => Ok(json.clone()),
            (None, None) => anyhow::bail!("either --data or --json is required"),
        }
    }
}

impl Cli {
    /// Global flags take precedence over the environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.skip_pdf {
            config.skip_pdf = true;
        }
        if let Some(Command::Serve { port: Some(port) }) = &self.command {
            config.port = *port;
        }
    }
}

pub async fn run_cover_letter(args: &RenderArgs, config: &Config) -> Result<()> {
    let data: CoverLetterData =
        serde_json::from_str(&args.input.read()?).context("invalid cover letter JSON")?;
    let template = args.template.as_deref().or(config.cover_letter_template.as_deref());
    let store = TemplateStore::load(template, None)?;
    let compiler = compiler_for(config);

    let outcome = render_cover_letter(
        &store.cover_letter,
        compiler.as_ref(),
        &data,
        &config.output_dir,
        config.skip_pdf,
    )
    .await
    .context("failed to render cover letter")?;

    info!(markup = %outcome.markup_path.display(), "cover letter done");
    print_response(&RenderResponse::from(&outcome))
}

pub async fn run_resume(args: &RenderArgs, config: &Config) -> Result<()> {
    let data: ResumeData =
        serde_json::from_str(&args.input.read()?).context("invalid resume JSON")?;
    let template = args.template.as_deref().or(config.resume_template.as_deref());
    let store = TemplateStore::load(None, template)?;
    let compiler = compiler_for(config);

    let outcome = render_resume(
        &store.resume,
        compiler.as_ref(),
        &data,
        &config.output_dir,
        config.skip_pdf,
    )
    .await
    .context("failed to render resume")?;

    info!(markup = %outcome.markup_path.display(), "resume done");
    print_response(&RenderResponse::from(&outcome))
}

pub fn run_parse(input: &Path, output: Option<&Path>) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let document = parse_resume(&content);
    let json = serde_json::to_string_pretty(&document)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "parsed resume written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn compiler_for(config: &Config) -> Arc<dyn DocumentCompiler> {
    Arc::new(TypstCompiler::new(config.typst_bin.clone()))
}

fn print_response(response: &RenderResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["vitae"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vitae",
            "resume",
            "--json",
            "{}",
            "--output-dir",
            "out",
            "--skip-pdf",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.skip_pdf);
        assert!(matches!(cli.command, Some(Command::Resume(_))));
    }

    #[test]
    fn test_data_and_json_are_exclusive() {
        let result = Cli::try_parse_from([
            "vitae",
            "cover-letter",
            "--data",
            "a.json",
            "--json",
            "{}",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_input_is_required() {
        assert!(Cli::try_parse_from(["vitae", "resume"]).is_err());
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["vitae", "serve", "--port", "9999"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.port, 9999);
    }

    #[test]
    fn test_run_parse_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("resume.typ");
        let output = dir.path().join("resume.json");
        std::fs::write(&input, "= Summary\nBuilds things.\n").unwrap();

        run_parse(&input, Some(&output)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(json["summary"], "Builds things.");
    }

    #[test]
    fn test_run_parse_missing_file() {
        let err = run_parse(Path::new("/nonexistent/resume.typ"), None).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[tokio::test]
    async fn test_run_resume_skip_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            skip_pdf: true,
            ..Config::default()
        };
        let args = RenderArgs {
            input: RecordInput {
                data: None,
                json: Some(
                    r#"{"author":{"firstname":"Ada","lastname":"Lovelace","email":"a@b.c"}}"#
                        .to_string(),
                ),
            },
            template: None,
        };

        run_resume(&args, &config).await.unwrap();
        assert!(dir.path().join("Resume_Ada_Lovelace.typ").exists());
    }

    #[tokio::test]
    async fn test_run_cover_letter_rejects_bad_json() {
        let config = Config::default();
        let args = RenderArgs {
            input: RecordInput {
                data: None,
                json: Some("{}".to_string()),
            },
            template: None,
        };
        let err = run_cover_letter(&args, &config).await.unwrap_err();
        assert!(err.to_string().contains("invalid cover letter JSON"));
    }
}
