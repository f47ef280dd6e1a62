//! Multipart parsing and file checks for document uploads

use axum::extract::Multipart;
use portal_core::models::DocumentType;
use portal_core::AppError;
use portal_services::DocumentFile;

use crate::constants::{DOC_TYPE_FIELD, FILE_FIELD};

const MAX_FILENAME_LENGTH: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File is empty")]
    EmptyFile,

    #[error("File size {size} exceeds maximum {max}")]
    FileTooLarge { size: usize, max: usize },

    #[error("Missing file extension (filename: {0})")]
    MissingExtension(String),

    #[error("Invalid file extension '{extension}'. Allowed extensions: {}", .allowed.join(", "))]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
}

/// Upload limits taken from configuration.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
}

/// A parsed upload form before validation.
#[derive(Debug)]
pub struct DocumentForm {
    pub doc_type: DocumentType,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Read the `doc_type` and `file` fields. Exactly one of each is accepted.
pub async fn extract_document_form(mut multipart: Multipart) -> Result<DocumentForm, AppError> {
    let mut doc_type: Option<DocumentType> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == DOC_TYPE_FIELD {
            if doc_type.is_some() {
                return Err(AppError::InvalidInput(
                    "Send exactly one 'doc_type' field".to_string(),
                ));
            }
            let value = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read doc_type: {}", e)))?;
            doc_type = Some(value.parse::<DocumentType>().map_err(AppError::InvalidInput)?);
        } else if field_name == FILE_FIELD {
            if file.is_some() {
                return Err(AppError::InvalidInput(
                    "Send exactly one 'file' field".to_string(),
                ));
            }
            let file_name = field.file_name().unwrap_or("unknown").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;
            file = Some((file_name, content_type, data.to_vec()));
        }
    }

    let doc_type =
        doc_type.ok_or_else(|| AppError::InvalidInput("No document type provided".to_string()))?;
    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(DocumentForm {
        doc_type,
        file_name,
        content_type,
        data,
    })
}

/// Check size and extension and turn the form into a storable file.
pub fn validate_document(
    form: DocumentForm,
    limits: &UploadLimits,
) -> Result<(DocumentType, DocumentFile), ValidationError> {
    validate_file_size(form.data.len(), limits.max_file_size)?;
    let file_name = sanitize_filename(&form.file_name)?;
    validate_file_extension(&file_name, &limits.allowed_extensions)?;

    Ok((
        form.doc_type,
        DocumentFile {
            file_name,
            content_type: normalize_mime_type(&form.content_type).to_string(),
            data: form.data,
        },
    ))
}

pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), ValidationError> {
    if file_size == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if file_size > max_size {
        return Err(ValidationError::FileTooLarge {
            size: file_size,
            max: max_size,
        });
    }
    Ok(())
}

pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, ValidationError> {
    let extension = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
        _ => return Err(ValidationError::MissingExtension(filename.to_string())),
    };

    if !allowed_extensions.contains(&extension) {
        return Err(ValidationError::InvalidExtension {
            extension,
            allowed: allowed_extensions.to_vec(),
        });
    }

    Ok(extension)
}

/// Strip directories and replace anything outside `[A-Za-z0-9._-]`.
///
/// The result becomes the tail of the storage key, so traversal sequences are refused.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    if filename_only.contains("..") {
        return Err(ValidationError::InvalidFilename(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Keep the extension when truncating long names.
    let sanitized = if sanitized.len() > MAX_FILENAME_LENGTH {
        match sanitized.rsplit_once('.') {
            Some((stem, ext)) if ext.len() < 16 => {
                let keep = MAX_FILENAME_LENGTH - ext.len() - 1;
                format!("{}.{}", &stem[..keep.min(stem.len())], ext)
            }
            _ => sanitized[..MAX_FILENAME_LENGTH].to_string(),
        }
    } else {
        sanitized
    };

    if sanitized.trim_matches('.').is_empty() {
        return Err(ValidationError::InvalidFilename(
            "Filename is empty".to_string(),
        ));
    }

    Ok(sanitized)
}

/// "application/pdf; charset=binary" -> "application/pdf"
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> UploadLimits {
        UploadLimits {
            max_file_size: 1024,
            allowed_extensions: vec!["pdf".to_string(), "docx".to_string()],
        }
    }

    #[test]
    fn sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("foo..bar.pdf").is_err());
        assert!(sanitize_filename("...").is_err());
    }

    #[test]
    fn sanitize_filename_strips_directories_and_odd_characters() {
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\ISO cert (2024).pdf").unwrap(),
            "ISO_cert__2024_.pdf"
        );
        assert_eq!(sanitize_filename("/tmp/policy.pdf").unwrap(), "policy.pdf");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let name = format!("{}.pdf", "a".repeat(400));
        let sanitized = sanitize_filename(&name).unwrap();
        assert_eq!(sanitized.len(), MAX_FILENAME_LENGTH);
        assert!(sanitized.ends_with(".pdf"));
    }

    #[test]
    fn extension_must_be_allowed() {
        assert_eq!(
            validate_file_extension("Report.PDF", &limits().allowed_extensions).unwrap(),
            "pdf"
        );
        assert!(matches!(
            validate_file_extension("run.exe", &limits().allowed_extensions),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validate_file_extension("README", &limits().allowed_extensions),
            Err(ValidationError::MissingExtension(_))
        ));
    }

    #[test]
    fn validate_document_checks_size() {
        let form = |data: Vec<u8>| DocumentForm {
            doc_type: DocumentType::HrPolicy,
            file_name: "hr.pdf".to_string(),
            content_type: "application/pdf; charset=binary".to_string(),
            data,
        };

        assert!(matches!(
            validate_document(form(vec![]), &limits()),
            Err(ValidationError::EmptyFile)
        ));
        assert!(matches!(
            validate_document(form(vec![0; 2048]), &limits()),
            Err(ValidationError::FileTooLarge { .. })
        ));

        let (doc_type, file) = validate_document(form(vec![1, 2, 3]), &limits()).unwrap();
        assert_eq!(doc_type, DocumentType::HrPolicy);
        assert_eq!(file.content_type, "application/pdf");
    }
}
