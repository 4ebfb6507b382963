//! Generation pipeline: template + entity ids in, shared PDF out.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use utoipa::ToSchema;

use super::common::output_filename;
use super::context::{ContextBuilder, ContextRequest, DocumentContext, DocumentType};
use super::engine::PdfBackend;
use super::format::FormatConfig;
use super::markup::{format_blocks, RenderedBlock};
use super::render::{render_document, Attachment, Letterhead, LetterheadOption, PageLayout};
use super::resolver::Resolver;
use super::validation::{
    validate_id, validate_optional_id, ValidationError, ValidationErrors, Validator,
};
use super::DocumentError;
use crate::db::DocumentRepository;
use crate::storage::ObjectStorage;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateDocumentRequest {
    pub template_id: i64,
    pub document_type: DocumentType,
    #[serde(flatten)]
    pub targets: ContextRequest,
    #[serde(default)]
    pub letterhead: LetterheadOption,
    /// Company whose letterhead is printed. Defaults to `company_id`.
    #[serde(default)]
    pub letterhead_company_id: Option<i64>,
}

impl GenerateDocumentRequest {
    fn letterhead_company(&self) -> Option<i64> {
        self.letterhead_company_id.or(self.targets.company_id)
    }
}

impl Validator for GenerateDocumentRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_id(self.template_id, "template_id", "Template", &mut errors);
        validate_optional_id(
            self.letterhead_company_id,
            "letterhead_company_id",
            "Letterhead company",
            &mut errors,
        );
        if self.letterhead == LetterheadOption::Company && self.letterhead_company().is_none() {
            errors.add(
                ValidationError::missing("letterhead_company_id", "Letterhead company")
                    .with_suggestion("Pass letterhead_company_id or company_id, or use letterhead \"none\""),
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedDocument {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
    pub document_type: DocumentType,
    pub generated_at: DateTime<Utc>,
}

/// Preview a stored template or unsaved editor content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreviewRequest {
    #[serde(default)]
    pub template_id: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    pub document_type: DocumentType,
    #[serde(flatten)]
    pub targets: ContextRequest,
}

impl Validator for PreviewRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        match (self.template_id, &self.content) {
            (Some(_), Some(_)) => errors.add(ValidationError::new(
                "content",
                "Pass either template_id or content, not both",
            )),
            (None, None) => errors.add(ValidationError::missing("template_id", "Template id or content")),
            (id, _) => validate_optional_id(id, "template_id", "Template", &mut errors),
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreviewResponse {
    /// Template text after substitution.
    pub text: String,
    pub blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub format: FormatConfig,
    pub layout: PageLayout,
    pub documents_folder: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            format: FormatConfig::default(),
            layout: PageLayout::default(),
            documents_folder: "documents".to_string(),
        }
    }
}

/// Substitute and format `template` against an already built context.
pub fn render_template(
    template: &str,
    context: &DocumentContext,
    format: &FormatConfig,
) -> (String, Vec<RenderedBlock>) {
    let text = Resolver::new(context, format).render(template);
    let blocks = format_blocks(&text);
    (text, blocks)
}

pub struct DocumentService {
    repository: Arc<dyn DocumentRepository + Send + Sync>,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
    pdf: Arc<dyn PdfBackend + Send + Sync>,
    settings: DocumentSettings,
}

impl DocumentService {
    pub fn new(
        repository: Arc<dyn DocumentRepository + Send + Sync>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        pdf: Arc<dyn PdfBackend + Send + Sync>,
        settings: DocumentSettings,
    ) -> Self {
        Self {
            repository,
            storage,
            pdf,
            settings,
        }
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub async fn generate_document(
        &self,
        request: GenerateDocumentRequest,
    ) -> Result<GeneratedDocument, DocumentError> {
        request.validate().map_err(DocumentError::Validation)?;

        let template = self
            .repository
            .get_template(request.template_id)
            .await?
            .ok_or(DocumentError::TemplateNotFound(request.template_id))?;

        let generated_at = Utc::now();
        let today = generated_at.with_timezone(&Local).date_naive();
        let context = ContextBuilder::new(self.repository.as_ref())
            .build(request.document_type, &request.targets, today)
            .await?;

        let (text, blocks) = render_template(&template.content, &context, &self.settings.format);
        log::debug!(
            "Template {} resolved to {} chars, {} blocks",
            template.id,
            text.len(),
            blocks.len()
        );

        let letterhead = self.load_letterhead(&request).await?;
        let document = render_document(&blocks, &letterhead, &self.settings.layout);

        let filename = output_filename(request.document_type.as_str(), &template.name, generated_at);
        let work_dir = tempfile::tempdir().map_err(DocumentError::TempDir)?;
        let pdf_path = work_dir.path().join(&filename);
        self.pdf.render_to_file(&document, &pdf_path).await?;
        let pdf = tokio::fs::read(&pdf_path)
            .await
            .map_err(DocumentError::ReadPdf)?;

        let object = self.object_path(&filename);
        if let Err(e) = self.storage.upload_file(&object, &pdf).await {
            log::error!("Failed to share {}: {}", object, e);
            if let Err(cleanup) = self.storage.delete_file(&object).await {
                log::warn!("Cleanup of {} after failed upload also failed: {}", object, cleanup);
            }
            return Err(DocumentError::Storage(e));
        }

        let url = self.storage.get_asset_url(&object);
        log::info!(
            "Generated {} from template {} ({} bytes): {}",
            request.document_type.as_str(),
            template.id,
            pdf.len(),
            url
        );

        Ok(GeneratedDocument {
            filename,
            url,
            size_bytes: pdf.len() as u64,
            document_type: request.document_type,
            generated_at,
        })
    }

    pub async fn preview(&self, request: PreviewRequest) -> Result<PreviewResponse, DocumentError> {
        request.validate().map_err(DocumentError::Validation)?;

        let content = match (request.template_id, request.content) {
            (Some(id), _) => {
                self.repository
                    .get_template(id)
                    .await?
                    .ok_or(DocumentError::TemplateNotFound(id))?
                    .content
            }
            (None, Some(content)) => content,
            (None, None) => String::new(),
        };

        let today = Local::now().date_naive();
        let context = ContextBuilder::new(self.repository.as_ref())
            .build(request.document_type, &request.targets, today)
            .await?;
        let (text, blocks) = render_template(&content, &context, &self.settings.format);
        Ok(PreviewResponse { text, blocks })
    }

    fn object_path(&self, filename: &str) -> String {
        let folder = self.settings.documents_folder.trim_matches('/');
        if folder.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", folder, filename)
        }
    }

    /// A missing company or image degrades the header instead of failing the render.
    async fn load_letterhead(
        &self,
        request: &GenerateDocumentRequest,
    ) -> Result<Letterhead, DocumentError> {
        if request.letterhead == LetterheadOption::None {
            return Ok(Letterhead::None);
        }
        let Some(company_id) = request.letterhead_company() else {
            return Ok(Letterhead::None);
        };
        let Some(company) = self.repository.get_company(company_id).await? else {
            log::warn!("Letterhead company {} not found, rendering without letterhead", company_id);
            return Ok(Letterhead::None);
        };

        let image = match company.letterhead_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(Attachment {
                    name: letterhead_attachment_name(path),
                    bytes,
                }),
                Err(e) => {
                    log::warn!(
                        "Letterhead image {} for company {} unavailable ({}), using text header",
                        path,
                        company.id,
                        e
                    );
                    None
                }
            },
            None => None,
        };

        Ok(Letterhead::Company { company, image })
    }
}

fn letterhead_attachment_name(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png")
        .to_ascii_lowercase();
    format!("letterhead.{}", extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(letterhead: LetterheadOption) -> GenerateDocumentRequest {
        GenerateDocumentRequest {
            template_id: 1,
            document_type: DocumentType::Agreement,
            targets: ContextRequest::default(),
            letterhead,
            letterhead_company_id: None,
        }
    }

    #[test]
    fn test_generate_request_validation() {
        assert!(generate(LetterheadOption::None).validate().is_ok());

        let mut request = generate(LetterheadOption::None);
        request.template_id = 0;
        assert!(request.validate().unwrap_err().contains("template_id"));

        let request = generate(LetterheadOption::Company);
        assert!(request.validate().unwrap_err().contains("letterhead_company_id"));

        let mut request = generate(LetterheadOption::Company);
        request.targets.company_id = Some(2);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_generate_request_json_shape() {
        let request: GenerateDocumentRequest = serde_json::from_str(
            r#"{"template_id": 4, "document_type": "payment_request", "client_id": 9, "payment_request_id": 12}"#,
        )
        .unwrap();
        assert_eq!(request.targets.client_id, Some(9));
        assert_eq!(request.targets.payment_request_id, Some(12));
        assert_eq!(request.letterhead, LetterheadOption::None);
    }

    #[test]
    fn test_preview_request_validation() {
        let request = PreviewRequest {
            template_id: None,
            content: Some("Hi".to_string()),
            document_type: DocumentType::Agreement,
            targets: ContextRequest::default(),
        };
        assert!(request.validate().is_ok());

        let mut both = request.clone();
        both.template_id = Some(1);
        assert!(both.validate().is_err());

        let mut neither = request;
        neither.content = None;
        assert!(neither.validate().is_err());
    }

    #[test]
    fn test_letterhead_attachment_name() {
        assert_eq!(letterhead_attachment_name("/srv/acme/Head.PNG"), "letterhead.png");
        assert_eq!(letterhead_attachment_name("/srv/acme/head.jpg"), "letterhead.jpg");
        assert_eq!(letterhead_attachment_name("/srv/acme/head"), "letterhead.png");
    }
}
