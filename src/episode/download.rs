use std::path::Path;

use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use url::Url;

use crate::error::DownloadError;
use crate::http::HttpClient;
use crate::progress::ProgressEvent;

/// Outcome of a successful episode download
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub bytes_downloaded: u64,
    pub content_hash: String,
}

/// Download an episode's enclosure to `output_path`.
///
/// The body streams into `<output_path>.partial` and is renamed into place
/// only once fully flushed, so a crash can never leave a half-written file
/// under the final name. On any failure the partial file is removed and the
/// error returned; the caller decides whether to continue with other
/// episodes.
pub async fn download_episode<C: HttpClient>(
    client: &C,
    url: &Url,
    output_path: &Path,
    progress: impl Fn(ProgressEvent),
) -> Result<DownloadResult, DownloadError> {
    let partial_path = partial_path_for(output_path);

    let result = stream_to_partial(client, url, output_path, &partial_path, &progress).await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&partial_path).await;
    }
    result
}

async fn stream_to_partial<C: HttpClient>(
    client: &C,
    url: &Url,
    output_path: &Path,
    partial_path: &Path,
    progress: &impl Fn(ProgressEvent),
) -> Result<DownloadResult, DownloadError> {
    let url = url.as_str();

    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let mut file = File::create(partial_path)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: partial_path.to_path_buf(),
            source: e,
        })?;

    let mut bytes_downloaded: u64 = 0;
    let mut hasher = Sha256::new();
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: partial_path.to_path_buf(),
                source: e,
            })?;

        hasher.update(&chunk);
        bytes_downloaded += chunk.len() as u64;

        progress(ProgressEvent::DownloadProgress {
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: partial_path.to_path_buf(),
            source: e,
        })?;
    drop(file);

    tokio::fs::rename(partial_path, output_path)
        .await
        .map_err(|e| DownloadError::FinalizeFailed {
            from: partial_path.to_path_buf(),
            to: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(DownloadResult {
        bytes_downloaded,
        content_hash: format!("sha256:{:x}", hasher.finalize()),
    })
}

fn partial_path_for(output_path: &Path) -> std::path::PathBuf {
    let mut name = output_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output_path.with_file_name(name)
}
