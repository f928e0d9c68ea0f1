mod cli;
mod config;
mod errors;
mod models;
mod render;
mod routes;
mod scrape;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::render::assets::TemplateStore;
use crate::render::compiler::TypstCompiler;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment first, then CLI flags on top
    let mut config = Config::from_env()?;
    cli.apply_overrides(&mut config);

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        None | Some(Command::Serve { .. }) => serve(config).await,
        Some(Command::CoverLetter(args)) => cli::run_cover_letter(args, &config).await,
        Some(Command::Resume(args)) => cli::run_resume(args, &config).await,
        Some(Command::Parse { input, output }) => cli::run_parse(input, output.as_deref()),
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Vitae v{}", env!("CARGO_PKG_VERSION"));

    // Templates are parsed once; a broken template is fatal here rather than per request
    let templates = TemplateStore::load(
        config.cover_letter_template.as_deref(),
        config.resume_template.as_deref(),
    )?;

    let compiler = Arc::new(TypstCompiler::new(config.typst_bin.clone()));
    info!(
        "Compiler: {} (skip_pdf default: {})",
        config.typst_bin.display(),
        config.skip_pdf
    );

    let state = AppState {
        config: config.clone(),
        templates: Arc::new(templates),
        compiler,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}, writing to {}", config.output_dir.display());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
