use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, error, info};

use super::request::{ConflictBehavior, RequestSpec};
use super::GraphClient;
use crate::error::{GraphError, GraphResult};
use crate::http_client::HttpResponse;
use crate::naming::percent_encode;

/// Local file access used by uploads
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Whether `path` is an existing regular file
    async fn exists(&self, path: &Path) -> bool;

    /// Whole content of `path`
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Reads files with `tokio::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileReader;

#[async_trait]
impl FileReader for TokioFileReader {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Percent-encode each `/`-separated segment, dropping empty ones
fn encode_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(percent_encode)
        .collect()
}

impl GraphClient {
    /// API path that receives the content of `encoded_name` inside
    /// `remote_folder`
    fn content_path(&self, remote_folder: &str, encoded_name: &str) -> String {
        let mut segments = encode_segments(remote_folder);
        segments.push(encoded_name.to_string());
        format!(
            "{}:/{}:/content",
            self.config.base_folder.trim_end_matches('/'),
            segments.join("/")
        )
    }

    /// API path an upload of `file_name` into `remote_folder` would use.
    ///
    /// Reserved names get a fresh random suffix on every call. A name that
    /// normalizes to nothing is an upload error.
    pub fn upload_path(&self, remote_folder: &str, file_name: &str) -> GraphResult<String> {
        let encoded = self.normalizer.encode(file_name);
        if encoded.is_empty() {
            return Err(GraphError::upload(
                format!("{}/{}", remote_folder.trim_end_matches('/'), file_name),
                format!("'{}' has no characters left after normalization", file_name),
            ));
        }
        Ok(self.content_path(remote_folder, &encoded))
    }

    /// Browser link to a file in the SharePoint document library
    pub fn display_url(&self, remote_folder: &str, file_name: &str) -> String {
        let mut segments = encode_segments(&self.config.display_folder_prefix);
        segments.extend(encode_segments(remote_folder));
        segments.push(self.normalizer.encode(file_name));
        format!(
            "https://{}.sharepoint.com/{}",
            self.config.domain,
            segments.join("/")
        )
    }

    /// Upload `local_dir/file_name` into `remote_folder`.
    ///
    /// Returns `Ok(None)` when the local file does not exist. The remote
    /// name is normalized and encoded; a name that normalizes to nothing is
    /// rejected before any request. Every failure is reported as
    /// `GraphError::Upload` carrying the remote path.
    pub async fn upload_file(
        &mut self,
        local_dir: &Path,
        remote_folder: &str,
        file_name: &str,
        conflict: Option<ConflictBehavior>,
    ) -> GraphResult<Option<HttpResponse>> {
        let local_path = local_dir.join(file_name);
        if !self.files.exists(&local_path).await {
            info!(
                operation = "upload",
                local_path = %local_path.display(),
                "Local file not found, nothing to upload"
            );
            return Ok(None);
        }

        let remote_path = self.upload_path(remote_folder, file_name).map_err(|e| {
            error!(operation = "upload", file_name = %file_name, error = %e, "Unusable remote name");
            e
        })?;

        let bytes = self.files.read(&local_path).await.map_err(|e| {
            error!(
                operation = "upload",
                local_path = %local_path.display(),
                error = %e,
                "Failed to read local file"
            );
            GraphError::upload(remote_path.clone(), e)
        })?;

        debug!(
            operation = "upload",
            local_path = %local_path.display(),
            remote_path = %remote_path,
            size = bytes.len(),
            "Uploading file"
        );

        let spec = RequestSpec::put(remote_path.clone())
            .with_header("Content-Type", "application/octet-stream")
            .with_bytes(bytes)
            .with_conflict(conflict);

        match self.request(&spec).await {
            Ok(response) => {
                info!(operation = "upload", remote_path = %remote_path, "Upload finished");
                Ok(response)
            }
            Err(e) => {
                error!(operation = "upload", remote_path = %remote_path, error = %e, "Upload failed");
                Err(GraphError::upload(remote_path, e))
            }
        }
    }
}
