//! Profile picture storage lifecycle.
//!
//! A customer holds at most one active asset reference. On re-upload the
//! new file is written and the reference swap is authoritative; the
//! superseded file is reclaimed best-effort afterwards, so the failure
//! mode is a lingering old file, never a record pointing at nothing.

use std::path::{Path, PathBuf};

use validator::{ValidationError, ValidationErrors};

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{Result, ServerError};

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
const PROFILE_DIR: &str = "profile_picture";

fn invalid_upload(message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "profilePicture",
        ValidationError::new("invalid_upload").with_message(message.into()),
    );
    errors
}

/// An in-flight binary upload.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-provided file name; only its extension is trusted.
    pub file_name: String,
    /// Raw file content.
    pub bytes: axum::body::Bytes,
}

/// Manages stored profile pictures under a root directory.
pub struct AssetManager {
    root: PathBuf,
    max_bytes: u64,
}

impl AssetManager {
    /// Create a new [`AssetManager`].
    pub fn new(root: impl Into<PathBuf>, max_bytes: Option<u64>) -> Self {
        Self {
            root: root.into(),
            max_bytes: max_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    /// Resolve a stored reference to its on-disk path.
    fn path(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }

    fn extension(file_name: &str) -> Result<String> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                invalid_upload("File must have an image extension.")
            })?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(invalid_upload("Only image files are allowed.").into());
        }

        Ok(extension)
    }

    /// Persist a profile picture and return its reference.
    ///
    /// The path is derived deterministically from the customer ID, so two
    /// uploads with the same extension overwrite in place.
    pub async fn store_profile(
        &self,
        customer_id: &str,
        upload: &Upload,
    ) -> Result<String> {
        let extension = Self::extension(&upload.file_name)?;

        if upload.bytes.len() as u64 > self.max_bytes {
            return Err(invalid_upload("Uploaded file is too large.").into());
        }

        let reference =
            format!("{PROFILE_DIR}/profile_{customer_id}.{extension}");
        let path = self.path(&reference);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                ServerError::Internal {
                    details: err.to_string(),
                }
            })?;
        }
        tokio::fs::write(&path, &upload.bytes).await.map_err(|err| {
            ServerError::Internal {
                details: err.to_string(),
            }
        })?;

        Ok(reference)
    }

    /// Best-effort reclaim of a superseded or abandoned file.
    ///
    /// Failure to delete is logged and swallowed; the caller has already
    /// committed the new state and must not be aborted by cleanup.
    pub async fn reclaim(&self, reference: &str) {
        let path = self.path(reference);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(
                reference,
                error = %err,
                "could not reclaim stored asset"
            );
        }
    }
}
