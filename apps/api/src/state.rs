use std::sync::Arc;

use crate::config::Config;
use crate::render::assets::TemplateStore;
use crate::render::compiler::DocumentCompiler;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Parsed once at startup; read-only afterwards.
    pub templates: Arc<TemplateStore>,
    /// Pluggable PDF compiler. Default: TypstCompiler.
    pub compiler: Arc<dyn DocumentCompiler>,
}
