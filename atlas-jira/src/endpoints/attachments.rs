//! # Jira Attachment Endpoints
//!
//! Listing, downloading and uploading issue attachments. Downloads are
//! streamed to disk chunk by chunk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::client::error_for_status;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraAttachment, JiraIssue};

/// Outcome of [`AttachmentsApi::download_all`]
#[derive(Debug, Default)]
pub struct DownloadReport {
  pub downloaded: Vec<PathBuf>,
  /// Filename and error message of each attachment that could not be saved
  pub failed: Vec<(String, String)>,
}

/// Attachment operations, borrowed from [`JiraFetcher::attachments`]
pub struct AttachmentsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> AttachmentsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn get_attachments(&self, issue_key: &str) -> Result<Vec<JiraAttachment>> {
    let client = self.fetcher.client();
    let issue: JiraIssue = client
      .get_json(
        &client.api_url(&format!("issue/{issue_key}")),
        &[("fields", "attachment".to_string())],
        &format!("Issue {issue_key}"),
      )
      .await?;
    Ok(issue.fields.attachments)
  }

  /// Save one attachment into `target_dir` and return the written path.
  ///
  /// Existing files are never overwritten: a clash on the filename gets a
  /// numbered suffix (`image-1.png`, `image-2.png`, ...).
  #[instrument(skip(self, attachment), fields(filename = %attachment.filename), level = "debug")]
  pub async fn download_attachment(&self, attachment: &JiraAttachment, target_dir: &Path) -> Result<PathBuf> {
    let file_name = Path::new(&attachment.filename)
      .file_name()
      .ok_or_else(|| anyhow::anyhow!("Attachment {} has an invalid filename", attachment.id))?;

    let client = self.fetcher.client();
    let mut response = client
      .request(Method::GET, &attachment.content)
      .send()
      .await
      .with_context(|| format!("Failed to download attachment {}", attachment.filename))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(error_for_status(
        status,
        &body,
        &format!("Attachment {}", attachment.filename),
      ));
    }

    let (target, mut file) = create_unique_file(target_dir, Path::new(file_name)).await?;
    let streamed: Result<usize> = async {
      let mut written = 0;
      while let Some(chunk) = response.chunk().await.context("Failed to read attachment body")? {
        file.write_all(&chunk).await?;
        written += chunk.len();
      }
      file.flush().await?;
      Ok(written)
    }
    .await;

    match streamed {
      Ok(written) => {
        debug!("Wrote {} bytes to {}", written, target.display());
        Ok(target)
      }
      Err(e) => {
        drop(file);
        if let Err(remove_err) = fs::remove_file(&target).await {
          warn!("Failed to remove partial download {}: {}", target.display(), remove_err);
        }
        Err(e)
      }
    }
  }

  /// Download every attachment of an issue, continuing past failures
  #[instrument(skip(self), level = "debug")]
  pub async fn download_all(&self, issue_key: &str, target_dir: &Path) -> Result<DownloadReport> {
    let attachments = self.get_attachments(issue_key).await?;
    fs::create_dir_all(target_dir)
      .await
      .with_context(|| format!("Failed to create directory {}", target_dir.display()))?;

    let mut report = DownloadReport::default();
    for attachment in &attachments {
      match self.download_attachment(attachment, target_dir).await {
        Ok(path) => report.downloaded.push(path),
        Err(e) => {
          warn!("Failed to download {}: {}", attachment.filename, e);
          report.failed.push((attachment.filename.clone(), e.to_string()));
        }
      }
    }

    info!(
      "Downloaded {} of {} attachments from {}",
      report.downloaded.len(),
      attachments.len(),
      issue_key
    );
    Ok(report)
  }

  /// Upload a local file to an issue
  #[instrument(skip(self), level = "debug")]
  pub async fn upload_attachment(&self, issue_key: &str, file_path: &Path) -> Result<Vec<JiraAttachment>> {
    let file_name = file_path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .ok_or_else(|| anyhow::anyhow!("{} is not a file", file_path.display()))?;
    let bytes = fs::read(file_path)
      .await
      .with_context(|| format!("Failed to read {}", file_path.display()))?;

    let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));

    let client = self.fetcher.client();
    let uploaded: Vec<JiraAttachment> = client
      .send_json(
        client
          .request(Method::POST, &client.api_url(&format!("issue/{issue_key}/attachments")))
          .header("X-Atlassian-Token", "no-check")
          .multipart(form),
        &format!("Issue {issue_key}"),
      )
      .await?;
    info!("Uploaded {} to {}", file_name, issue_key);
    Ok(uploaded)
  }
}

/// Create `file_name` in `dir`, adding `-N` before the extension until the
/// name is free
async fn create_unique_file(dir: &Path, file_name: &Path) -> Result<(PathBuf, fs::File)> {
  let stem = file_name
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let extension = file_name.extension().map(|e| e.to_string_lossy().into_owned());

  for attempt in 0u32.. {
    let candidate = match (attempt, &extension) {
      (0, _) => dir.join(file_name),
      (n, Some(ext)) => dir.join(format!("{stem}-{n}.{ext}")),
      (n, None) => dir.join(format!("{stem}-{n}")),
    };
    match fs::OpenOptions::new().write(true).create_new(true).open(&candidate).await {
      Ok(file) => return Ok((candidate, file)),
      Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
      Err(e) => return Err(e).with_context(|| format!("Failed to create {}", candidate.display())),
    }
  }
  Err(anyhow::anyhow!("No free filename for {} in {}", file_name.display(), dir.display()))
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::TempDir;
  use wiremock::matchers::{header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::test_support::test_fetcher;

  async fn mount_attachments(mock_server: &MockServer) {
    let base = mock_server.uri();
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/PROJ-1"))
      .and(query_param("fields", "attachment"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "id": "1", "key": "PROJ-1",
          "fields": { "attachment": [
              { "id": "10", "filename": "notes.txt", "size": 5, "content": format!("{base}/files/10") },
              { "id": "11", "filename": "../escape.log", "size": 3, "content": format!("{base}/files/11") },
              { "id": "12", "filename": "gone.png", "size": 1, "content": format!("{base}/files/12") }
          ]}
      })))
      .mount(mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/files/10"))
      .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
      .mount(mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/files/11"))
      .respond_with(ResponseTemplate::new(200).set_body_string("log"))
      .mount(mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/files/12"))
      .respond_with(ResponseTemplate::new(404))
      .mount(mock_server)
      .await;
  }

  #[tokio::test]
  async fn test_get_attachments() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_attachments(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);

    let attachments = fetcher.attachments().get_attachments("PROJ-1").await?;
    assert_eq!(attachments.len(), 3);
    assert_eq!(attachments[0].size, 5);
    Ok(())
  }

  #[tokio::test]
  async fn test_download_all_reports_failures() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_attachments(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);
    let temp = TempDir::new()?;
    let target = temp.path().join("downloads");

    let report = fetcher.attachments().download_all("PROJ-1", &target).await?;

    assert_eq!(report.downloaded, vec![target.join("notes.txt"), target.join("escape.log")]);
    assert_eq!(std::fs::read_to_string(target.join("notes.txt"))?, "hello");
    assert!(!temp.path().join("escape.log").exists());

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "gone.png");
    assert_eq!(report.failed[0].1, "Attachment gone.png not found");
    Ok(())
  }

  #[tokio::test]
  async fn test_download_all_keeps_same_named_attachments() -> Result<()> {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/PROJ-2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "id": "2", "key": "PROJ-2",
          "fields": { "attachment": [
              { "id": "30", "filename": "image.png", "size": 5, "content": format!("{base}/files/30") },
              { "id": "31", "filename": "image.png", "size": 6, "content": format!("{base}/files/31") },
              { "id": "32", "filename": "README", "size": 1, "content": format!("{base}/files/32") },
              { "id": "33", "filename": "README", "size": 1, "content": format!("{base}/files/33") }
          ]}
      })))
      .mount(&mock_server)
      .await;
    for (id, body) in [("30", "first"), ("31", "second"), ("32", "a"), ("33", "b")] {
      Mock::given(method("GET"))
        .and(path(format!("/files/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;
    }
    let fetcher = test_fetcher(&mock_server);
    let temp = TempDir::new()?;

    let report = fetcher.attachments().download_all("PROJ-2", temp.path()).await?;

    assert_eq!(
      report.downloaded,
      vec![
        temp.path().join("image.png"),
        temp.path().join("image-1.png"),
        temp.path().join("README"),
        temp.path().join("README-1"),
      ]
    );
    assert_eq!(std::fs::read_to_string(temp.path().join("image.png"))?, "first");
    assert_eq!(std::fs::read_to_string(temp.path().join("image-1.png"))?, "second");
    assert_eq!(std::fs::read_to_string(temp.path().join("README-1"))?, "b");
    assert!(report.failed.is_empty());
    Ok(())
  }

  #[tokio::test]
  async fn test_download_removes_truncated_file() -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Promises 100 bytes, sends 5, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
      if let Ok((mut socket, _)) = listener.accept().await {
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        let _ = socket
          .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nhello")
          .await;
        let _ = socket.shutdown().await;
      }
    });

    let mock_server = MockServer::start().await;
    let fetcher = test_fetcher(&mock_server);
    let temp = TempDir::new()?;
    let attachment = JiraAttachment {
      id: "40".to_string(),
      filename: "partial.bin".to_string(),
      size: 100,
      mime_type: None,
      content: format!("http://{addr}/files/40"),
      created: None,
      author: None,
    };

    let result = fetcher.attachments().download_attachment(&attachment, temp.path()).await;

    assert!(result.is_err());
    assert!(!temp.path().join("partial.bin").exists());
    Ok(())
  }

  #[tokio::test]
  async fn test_upload_attachment() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/PROJ-1/attachments"))
      .and(header("X-Atlassian-Token", "no-check"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
          { "id": "20", "filename": "report.csv", "size": 7, "content": "https://jira/files/20" }
      ])))
      .expect(1)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);
    let temp = TempDir::new()?;
    let file = temp.path().join("report.csv");
    std::fs::write(&file, "a,b,c\n")?;

    let uploaded = fetcher.attachments().upload_attachment("PROJ-1", &file).await?;
    assert_eq!(uploaded[0].filename, "report.csv");
    Ok(())
  }

  #[tokio::test]
  async fn test_upload_missing_file() -> Result<()> {
    let mock_server = MockServer::start().await;
    let fetcher = test_fetcher(&mock_server);
    let temp = TempDir::new()?;

    let result = fetcher
      .attachments()
      .upload_attachment("PROJ-1", &temp.path().join("missing.txt"))
      .await;
    assert!(result.unwrap_err().to_string().starts_with("Failed to read"));
    Ok(())
  }
}
