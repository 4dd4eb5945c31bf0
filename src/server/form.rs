use crate::models::MediaReference;
use crate::{Error, Result};
use axum::extract::Multipart;
use std::collections::HashMap;

/// Field names that carry an uploaded file.
const FILE_FIELDS: [&str; 2] = ["file", "image"];
/// Field names that carry a remote media URL.
const URL_FIELDS: [&str; 3] = ["fileUrl", "imageUrl", "url"];

/// Multipart body split into text fields and at most one upload.
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    upload: Option<(Vec<u8>, Option<String>)>,
}

impl FormFields {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::Validation(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let is_upload = field.file_name().is_some() || FILE_FIELDS.contains(&name.as_str());

            if is_upload {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read upload: {}", e)))?;
                if !bytes.is_empty() {
                    fields.upload = Some((bytes.to_vec(), content_type));
                }
            } else {
                let value = field.text().await.map_err(|e| {
                    Error::Validation(format!("Failed to read field {}: {}", name, e))
                })?;
                fields.text.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Value of `name` exactly as sent. Blank values count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.text
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.text(name).is_some_and(|value| parse_flag(&value))
    }

    /// The upload if present, otherwise the first URL field.
    pub fn media(&mut self) -> Option<MediaReference> {
        if let Some((bytes, content_type)) = self.upload.take() {
            return Some(MediaReference::inline(bytes, content_type));
        }
        URL_FIELDS
            .iter()
            .find_map(|name| self.text(name))
            .map(MediaReference::remote)
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
