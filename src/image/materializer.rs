use crate::media::mime::{extension_for_mime, OCTET_STREAM};
use crate::models::ImageResult;
use crate::presets::OutputPolicy;
use crate::{Error, Result};
use base64::Engine as _;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Writes generated images to the output directory or hands back raw bytes.
///
/// Filenames are `generated_<unix millis>.<ext>`. Two images written in the
/// same millisecond collide and the later one wins.
pub struct ImageMaterializer {
    output_dir: PathBuf,
    public_path: String,
}

impl ImageMaterializer {
    /// Create the materializer, creating `output_dir` if it does not exist.
    pub fn new(output_dir: &Path, public_path: &str) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        tracing::info!("Image output directory: {}", output_dir.display());

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            public_path: public_path.trim_end_matches('/').to_string(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn decode(data: &str) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| Error::Decode(format!("Failed to decode generated image: {}", e)))
    }

    /// Convert an inline image into the form `policy` asks for.
    ///
    /// Images that are already materialized are returned unchanged.
    pub async fn materialize(
        &self,
        image: ImageResult,
        policy: OutputPolicy,
    ) -> Result<ImageResult> {
        let (data, mime_type) = match image {
            ImageResult::Inline { data, mime_type } => (data, mime_type),
            already @ (ImageResult::File { .. } | ImageResult::Buffer { .. }) => return Ok(already),
        };

        match policy {
            OutputPolicy::Inline => Ok(ImageResult::Inline { data, mime_type }),
            OutputPolicy::Buffer => Ok(ImageResult::Buffer {
                bytes: Self::decode(&data)?,
                mime_type,
            }),
            OutputPolicy::File => {
                let bytes = Self::decode(&data)?;
                let filename = format!(
                    "generated_{}.{}",
                    chrono::Utc::now().timestamp_millis(),
                    extension_for_mime(&mime_type)
                );
                let path = self.output_dir.join(&filename);

                tokio::fs::write(&path, &bytes).await?;
                tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());

                Ok(ImageResult::File {
                    url: format!("{}/{}", self.public_path, filename),
                    mime_type,
                })
            }
        }
    }

    /// Read back a previously written file by bare name.
    ///
    /// Returns `None` for names that are missing or try to leave the directory.
    pub async fn load(&self, name: &str) -> Result<Option<(Vec<u8>, String)>> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return Ok(None);
        }

        let path = self.output_dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mime_type = ImageFormat::from_path(&path)
            .map(|format| format.to_mime_type())
            .unwrap_or(OCTET_STREAM)
            .to_string();

        Ok(Some((bytes, mime_type)))
    }
}
