use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler exited with {status}: {output}")]
    Failed { status: ExitStatus, output: String },
}

/// Turns a markup file into a PDF. Swappable so render paths can be tested without a
/// Typst installation.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    async fn compile(&self, source: &Path, destination: &Path) -> Result<(), CompileError>;
}

/// Runs `<bin> compile <source> <destination>`.
#[derive(Debug, Clone)]
pub struct TypstCompiler {
    binary: PathBuf,
}

impl TypstCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TypstCompiler {
    fn default() -> Self {
        Self::new("typst")
    }
}

#[async_trait]
impl DocumentCompiler for TypstCompiler {
    async fn compile(&self, source: &Path, destination: &Path) -> Result<(), CompileError> {
        debug!(
            binary = %self.binary.display(),
            source = %source.display(),
            destination = %destination.display(),
            "compiling document"
        );

        let output = Command::new(&self.binary)
            .arg("compile")
            .arg(source)
            .arg(destination)
            .output()
            .await
            .map_err(|source| CompileError::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        warn!(status = %output.status, "typst compile failed");
        Err(CompileError::Failed {
            status: output.status,
            output: combined.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let compiler = TypstCompiler::new("/nonexistent/typst-binary");
        let err = compiler
            .compile(Path::new("in.typ"), Path::new("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_failed() {
        // `false` ignores its arguments and exits 1.
        let compiler = TypstCompiler::new("false");
        let err = compiler
            .compile(Path::new("in.typ"), Path::new("out.pdf"))
            .await
            .unwrap_err();
        match err {
            CompileError::Failed { status, .. } => assert!(!status.success()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_ok() {
        let compiler = TypstCompiler::new("true");
        assert!(compiler
            .compile(Path::new("in.typ"), Path::new("out.pdf"))
            .await
            .is_ok());
    }
}
