//! PDF renderer: hands LaTeX source to an external typesetting engine.
//!
//! `LatexRenderer` writes the source into a scratch directory, runs the engine there,
//! and reads back the PDF. The trait exists so handlers and tests can swap engines.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

const RENDER_TIMEOUT: Duration = Duration::from_secs(60);
const SOURCE_FILE: &str = "resume.tex";
const OUTPUT_FILE: &str = "resume.pdf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{engine} exited with status {status}: {stderr}")]
    EngineFailed {
        engine: String,
        status: String,
        stderr: String,
    },

    #[error("Rendering timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, latex_source: &str) -> Result<Bytes, RenderError>;
}

/// Runs `tectonic` (default) or a `*latex` binary such as `pdflatex`.
pub struct LatexRenderer {
    engine: String,
}

impl LatexRenderer {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    fn command(&self, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.engine);
        cmd.current_dir(workdir).kill_on_drop(true);
        if self.engine.ends_with("tectonic") {
            cmd.args(["--chatter", "minimal", "--outdir", "."]);
        } else {
            cmd.args(["-interaction=nonstopmode", "-halt-on-error", "-output-directory", "."]);
        }
        cmd.arg(SOURCE_FILE);
        cmd
    }
}

#[async_trait]
impl PdfRenderer for LatexRenderer {
    async fn render(&self, latex_source: &str) -> Result<Bytes, RenderError> {
        let workdir = tempfile::tempdir()?;
        tokio::fs::write(workdir.path().join(SOURCE_FILE), latex_source).await?;

        let output = tokio::time::timeout(RENDER_TIMEOUT, self.command(workdir.path()).output())
            .await
            .map_err(|_| RenderError::Timeout(RENDER_TIMEOUT))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            warn!("{} failed: {}", self.engine, stderr);
            return Err(RenderError::EngineFailed {
                engine: self.engine.clone(),
                status: output.status.to_string(),
                stderr: tail(if stderr.trim().is_empty() { &stdout } else { &stderr }, 2000),
            });
        }

        let pdf = tokio::fs::read(workdir.path().join(OUTPUT_FILE)).await?;
        debug!("Rendered PDF ({} bytes) with {}", pdf.len(), self.engine);
        Ok(Bytes::from(pdf))
    }
}

/// Last `max` bytes of engine output, on a char boundary.
fn tail(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_short_text() {
        assert_eq!(tail("short", 10), "short");
    }

    #[test]
    fn test_tail_truncates_on_char_boundary() {
        let text = "é".repeat(10);
        let out = tail(&text, 5);
        assert!(out.len() <= 5);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_engine_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let tectonic = LatexRenderer::new("tectonic").command(dir.path());
        let args: Vec<_> = tectonic.as_std().get_args().collect();
        assert!(args.contains(&std::ffi::OsStr::new("--outdir")));

        let pdflatex = LatexRenderer::new("pdflatex").command(dir.path());
        let args: Vec<_> = pdflatex.as_std().get_args().collect();
        assert!(args.contains(&std::ffi::OsStr::new("-halt-on-error")));
        assert_eq!(args.last(), Some(&std::ffi::OsStr::new(SOURCE_FILE)));
    }

    #[tokio::test]
    async fn test_missing_engine_is_io_error() {
        let renderer = LatexRenderer::new("definitely-not-a-latex-engine");
        let err = renderer.render("\\documentclass{article}").await.unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
    }
}
