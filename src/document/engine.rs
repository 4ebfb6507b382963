//! Typst rendering engine.
//!
//! Writes the Typst source and its attachments into a private temporary directory,
//! invokes the compiler and leaves the PDF at the requested output path.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

use super::render::TypstDocument;
use super::DocumentError;

const SOURCE_FILENAME: &str = "document.typ";

/// PDF backend used by the generation pipeline.
#[async_trait]
pub trait PdfBackend {
    /// Compile `document` into a PDF at `output`.
    ///
    /// On failure nothing is left at `output`.
    async fn render_to_file(
        &self,
        document: &TypstDocument,
        output: &Path,
    ) -> Result<(), DocumentError>;
}

/// Shells out to the `typst` CLI.
#[derive(Debug, Clone)]
pub struct TypstRenderEngine {
    binary: PathBuf,
}

impl Default for TypstRenderEngine {
    fn default() -> Self {
        Self::new("typst")
    }
}

impl TypstRenderEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Blocking compile. Use [`PdfBackend::render_to_file`] from async code.
    pub fn compile(&self, document: &TypstDocument, output: &Path) -> Result<(), DocumentError> {
        let result = self.compile_inner(document, output);
        if result.is_err() && output.exists() {
            if let Err(e) = fs::remove_file(output) {
                log::warn!("Failed to remove partial PDF {}: {}", output.display(), e);
            }
        }
        result
    }

    fn compile_inner(&self, document: &TypstDocument, output: &Path) -> Result<(), DocumentError> {
        let temp_dir = tempdir().map_err(DocumentError::TempDir)?;
        let typ_path = temp_dir.path().join(SOURCE_FILENAME);
        fs::write(&typ_path, &document.source).map_err(DocumentError::WriteTypst)?;

        for attachment in &document.attachments {
            let name = Path::new(&attachment.name)
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("attachment"));
            fs::write(temp_dir.path().join(name), &attachment.bytes)
                .map_err(DocumentError::WriteTypst)?;
        }

        log::debug!(
            "Compiling {} ({} bytes, {} attachments)",
            typ_path.display(),
            document.source.len(),
            document.attachments.len()
        );

        let result = Command::new(&self.binary)
            .arg("compile")
            .arg(&typ_path)
            .arg(output)
            .current_dir(temp_dir.path())
            .output()
            .map_err(DocumentError::TypstIo)?;

        if !result.status.success() {
            let code = result.status.code().unwrap_or(-1);
            log::error!(
                "Typst exited with status {}: {}",
                code,
                String::from_utf8_lossy(&result.stderr).trim()
            );
            return Err(DocumentError::TypstExit(code));
        }

        // A zero exit status alone does not guarantee the PDF was written.
        fs::metadata(output).map_err(DocumentError::ReadPdf)?;
        Ok(())
    }
}

#[async_trait]
impl PdfBackend for TypstRenderEngine {
    async fn render_to_file(
        &self,
        document: &TypstDocument,
        output: &Path,
    ) -> Result<(), DocumentError> {
        let engine = self.clone();
        let document = document.clone();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || engine.compile(&document, &output))
            .await
            .map_err(|e| DocumentError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> TypstDocument {
        TypstDocument {
            source: "#\"hello\"".to_string(),
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_typst_io_error() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let engine = TypstRenderEngine::new(dir.path().join("no-such-typst"));

        let err = engine.render_to_file(&document(), &output).await.unwrap_err();
        assert!(matches!(err, DocumentError::TypstIo(_)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_compiler_leaves_no_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("typst");
        // Writes a partial file then fails.
        fs::write(&script, "#!/bin/sh\necho partial > \"$3\"\nexit 3\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let output = dir.path().join("out.pdf");
        let engine = TypstRenderEngine::new(&script);
        let err = engine.render_to_file(&document(), &output).await.unwrap_err();

        assert!(matches!(err, DocumentError::TypstExit(3)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_attachments_are_written_next_to_source() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("typst");
        // Succeeds only when the attachment exists in the working directory.
        fs::write(&script, "#!/bin/sh\n[ -f letterhead.png ] || exit 9\ncp letterhead.png \"$3\"\n")
            .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut doc = document();
        doc.attachments.push(super::super::render::Attachment {
            name: "letterhead.png".to_string(),
            bytes: b"PNG".to_vec(),
        });
        let output = dir.path().join("out.pdf");
        TypstRenderEngine::new(&script)
            .render_to_file(&doc, &output)
            .await
            .unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"PNG");
    }
}
