//! Buffered `multipart/form-data` extractor.

use crate::errors::AppError;
use axum::extract::{FromRequest, Multipart, Request};
use std::collections::HashMap;

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Every part of a multipart body, read into memory.
///
/// Parts with a `filename` land in `files` (in upload order). All other parts
/// are decoded as UTF-8 text into `fields`.
///
/// The router's `DefaultBodyLimit` bounds the total size.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub files: Vec<FilePart>,
    pub fields: HashMap<String, String>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Files uploaded under `name`, in order.
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FilePart> + 'a {
        self.files.iter().filter(move |f| f.field == name)
    }

    /// Parse a JSON text field into `T`.
    pub fn json_field<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.field(name)
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| AppError::BadRequest(format!("Invalid JSON in field '{}': {}", name, e)))
            })
            .transpose()
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_some() {
                let bytes = field.bytes().await?.to_vec();
                form.files.push(FilePart {
                    field: name,
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }
}
