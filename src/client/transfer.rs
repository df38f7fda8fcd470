//! Whole-project export/import, the seam the archive engine is written against.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use super::error::GatewayError;
use super::gateway::{GatewayClient, encode_segment};

/// Content type the gateway expects for project archives.
pub const PROJECT_ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Moves whole project archives between the gateway and local disk.
///
/// Implemented by [`GatewayClient`]; tests substitute an in-memory fake.
#[async_trait]
pub trait ProjectTransfer: Send + Sync {
    /// Downloads the project export to `dest`, returning the byte count.
    async fn export_project(&self, project: &str, dest: &Path) -> Result<u64, GatewayError>;

    /// Uploads `archive` as the new content of `project`.
    async fn import_project(
        &self,
        project: &str,
        archive: &Path,
        overwrite: bool,
    ) -> Result<(), GatewayError>;
}

#[async_trait]
impl ProjectTransfer for GatewayClient {
    #[instrument(skip(self, dest), fields(project = %project))]
    async fn export_project(&self, project: &str, dest: &Path) -> Result<u64, GatewayError> {
        let path = format!("/projects/export/{}", encode_segment(project));
        self.stream_to_file(&path, dest).await
    }

    #[instrument(skip(self, archive), fields(project = %project))]
    async fn import_project(
        &self,
        project: &str,
        archive: &Path,
        overwrite: bool,
    ) -> Result<(), GatewayError> {
        let path = format!("/projects/import/{}", encode_segment(project));
        let query = [("overwrite", overwrite.to_string())];
        self.stream_upload(
            Method::POST,
            &path,
            archive,
            &query,
            PROJECT_ARCHIVE_CONTENT_TYPE,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::client::RetryPolicy;
    use crate::config::ConnectionProfile;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn client_for(url: &str) -> GatewayClient {
        GatewayClient::new(&ConnectionProfile {
            name: "test".to_string(),
            url: url.to_string(),
            token: Some("k:s".to_string()),
            username: None,
            password: None,
            verify_ssl: true,
            timeout_secs: 5,
        })
        .unwrap()
        .with_retry_policy(RetryPolicy::no_retry())
    }

    #[tokio::test]
    async fn test_export_project_encodes_name() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/projects/export/My%20Project"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x05\x06".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out.zip");
        let bytes = client_for(&server.uri())
            .export_project("My Project", &dest)
            .await
            .unwrap();
        assert_eq!(bytes, 4);
    }

    #[tokio::test]
    async fn test_import_project_posts_zip_with_overwrite() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path("/data/api/v1/projects/import/demo"))
            .and(query_param("overwrite", "true"))
            .and(header("Content-Type", PROJECT_ARCHIVE_CONTENT_TYPE))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("in.zip");
        std::fs::write(&archive, b"PK\x05\x06").unwrap();

        client_for(&server.uri())
            .import_project("demo", &archive, true)
            .await
            .unwrap();
    }
}
