use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::extraction::DocumentFormat;
use crate::models::JobRoleSpec;
use crate::scoring::ScoringWeights;

/// One uploaded resume.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Resolves the format from the filename, falling back to the declared content type.
    pub fn format(&self) -> Result<DocumentFormat, AppError> {
        DocumentFormat::from_hint(&self.filename)
            .or_else(|e| match &self.content_type {
                Some(ct) => DocumentFormat::from_hint(ct),
                None => Err(e),
            })
            .map_err(|e| AppError::UnsupportedFormat(format!("{}: {e}", self.filename)))
    }
}

/// Fields of an upload form: any number of `file` parts plus optional JSON `job_role` and
/// `weights` parts.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub job_role: Option<JobRoleSpec>,
    pub weights: Option<ScoringWeights>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "files" => {
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("upload-{}", form.files.len() + 1));
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    if bytes.len() > max_file_bytes {
                        return Err(AppError::PayloadTooLarge(format!(
                            "{filename} is {} bytes, limit is {max_file_bytes}",
                            bytes.len()
                        )));
                    }
                    form.files.push(UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    });
                }
                "job_role" => {
                    let text = field.text().await?;
                    let role = serde_json::from_str(&text)
                        .map_err(|e| AppError::Validation(format!("job_role is not valid JSON: {e}")))?;
                    form.job_role = Some(role);
                }
                "weights" => {
                    let text = field.text().await?;
                    form.weights = Some(parse_weights(&text)?);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn require_job_role(&mut self) -> Result<JobRoleSpec, AppError> {
        self.job_role
            .take()
            .ok_or_else(|| AppError::Validation("missing 'job_role' field".to_string()))
    }
}

/// Parses a `{"semantic": 0.4, ...}` object. Shape errors are validation errors; bad values
/// are weight errors.
pub fn parse_weights(text: &str) -> Result<ScoringWeights, AppError> {
    let map: HashMap<String, f64> = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("weights must be a JSON object of numbers: {e}")))?;
    Ok(ScoringWeights::from_map(&map)?)
}
