//! Upload client for the storefront API.
//!
//! Two strategies reach the same bucket:
//!
//! - **Proxy** (default): one multipart `POST /admin/upload/file` carrying
//!   the file and folder; the API writes to storage and answers
//!   `{ publicUrl, key }`.
//! - **Presigned**: `POST /admin/upload/presigned-url` returns a signed
//!   `uploadUrl`, the bytes are `PUT` there directly, and the `publicUrl`
//!   from the first step is returned.
//!
//! Every call needs a [`Session`] (bearer token + tenant). A missing token
//! fails with [`UploadError::AuthenticationRequired`] before any request is
//! built. Nothing is retried.
//!
//! Deletes are advisory: [`UploadClient::delete`] never returns an error,
//! only `false`, and failures are logged.

use crate::cdn::Storage;
use crate::media::MediaFile;
use crate::transport::{Body, FilePart, HttpReply, HttpRequest, Method, Transport, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const UPLOAD_PATH: &str = "/admin/upload/file";
const PRESIGN_PATH: &str = "/admin/upload/presigned-url";
const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Authentication required")]
    AuthenticationRequired,
    /// Non-2xx from the API; carries the server's message or a generic fallback.
    #[error("{0}")]
    Server(String),
    /// Non-2xx from the presigned storage `PUT`.
    #[error("Failed to upload file to storage ({0})")]
    StorageRejected(u16),
    #[error("Unexpected upload response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Credential and tenant for one admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub tenant_id: String,
}

impl Session {
    pub fn new(token: Option<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            token,
            tenant_id: tenant_id.into(),
        }
    }

    /// The bearer token, treating an empty string as absent.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Destination folder in the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFolder {
    Banners,
    Products,
    Logos,
    About,
    Categories,
}

impl UploadFolder {
    pub const ALL: [UploadFolder; 5] = [
        UploadFolder::Banners,
        UploadFolder::Products,
        UploadFolder::Logos,
        UploadFolder::About,
        UploadFolder::Categories,
    ];

    /// Storage prefix, also the wire value of the `folder` field.
    pub fn as_str(self) -> &'static str {
        match self {
            UploadFolder::Banners => "banners",
            UploadFolder::Products => "products",
            UploadFolder::Logos => "logos",
            UploadFolder::About => "about",
            UploadFolder::Categories => "categories",
        }
    }
}

impl fmt::Display for UploadFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadFolder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UploadFolder::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                format!("unknown folder '{s}' (expected banners, products, logos, about, or categories)")
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStrategy {
    #[default]
    Proxy,
    Presigned,
}

/// Folder plus an optional progress callback for batch uploads.
///
/// The callback receives the rounded percentage of files completed.
pub struct UploadOptions<'a> {
    pub folder: UploadFolder,
    pub on_progress: Option<Box<dyn FnMut(u32) + Send + 'a>>,
}

impl<'a> UploadOptions<'a> {
    pub fn new(folder: UploadFolder) -> Self {
        Self {
            folder,
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, callback: impl FnMut(u32) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    public_url: String,
    #[allow(dead_code)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignedUrlResponse {
    upload_url: String,
    public_url: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// The server's `message`, or `fallback` when the body has none.
fn server_message(reply: &HttpReply, fallback: &str) -> String {
    reply
        .json::<ErrorBody>()
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Rounded percentage of `done` out of `total`.
pub fn progress_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u32
}

/// Talks to the upload endpoints through a [`Transport`].
pub struct UploadClient<T> {
    transport: Arc<T>,
    base_url: String,
    strategy: UploadStrategy,
    storage: Storage,
}

impl<T> Clone for UploadClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            strategy: self.strategy,
            storage: self.storage.clone(),
        }
    }
}

impl<T: Transport> UploadClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, storage: Storage) -> Self {
        Self {
            transport: Arc::new(transport),
            base_url: base_url.into(),
            strategy: UploadStrategy::default(),
            storage,
        }
    }

    pub fn with_strategy(mut self, strategy: UploadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: HttpRequest, token: &str, session: &Session) -> HttpRequest {
        request
            .header("Authorization", format!("Bearer {token}"))
            .header(TENANT_HEADER, session.tenant_id.as_str())
    }

    /// Upload one file and return its public URL.
    pub async fn upload(
        &self,
        session: &Session,
        file: &MediaFile,
        folder: UploadFolder,
    ) -> Result<String, UploadError> {
        let token = session.bearer().ok_or(UploadError::AuthenticationRequired)?;
        let url = match self.strategy {
            UploadStrategy::Proxy => self.upload_proxied(token, session, file, folder).await?,
            UploadStrategy::Presigned => {
                self.upload_presigned(token, session, file, folder).await?
            }
        };
        info!(name = %file.name, %folder, url = %url, "uploaded file");
        Ok(url)
    }

    async fn upload_proxied(
        &self,
        token: &str,
        session: &Session,
        file: &MediaFile,
        folder: UploadFolder,
    ) -> Result<String, UploadError> {
        let request = self
            .authorized(HttpRequest::new(Method::Post, self.endpoint(UPLOAD_PATH)), token, session)
            .body(Body::Multipart {
                fields: vec![("folder".to_string(), folder.as_str().to_string())],
                file: FilePart {
                    field: "file".to_string(),
                    filename: file.name.clone(),
                    mime: file.mime.clone(),
                    bytes: file.bytes.clone(),
                },
            });

        let reply = self.transport.send(request).await?;
        if !reply.is_success() {
            return Err(UploadError::Server(server_message(
                &reply,
                "Failed to upload file",
            )));
        }
        let body: UploadResponse = reply
            .json()
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        Ok(body.public_url)
    }

    async fn upload_presigned(
        &self,
        token: &str,
        session: &Session,
        file: &MediaFile,
        folder: UploadFolder,
    ) -> Result<String, UploadError> {
        let request = self
            .authorized(HttpRequest::new(Method::Post, self.endpoint(PRESIGN_PATH)), token, session)
            .body(Body::Json(serde_json::json!({
                "folder": folder.as_str(),
                "filename": file.name,
                "contentType": file.mime,
            })));

        let reply = self.transport.send(request).await?;
        if !reply.is_success() {
            return Err(UploadError::Server(server_message(
                &reply,
                "Failed to get upload URL",
            )));
        }
        let presigned: PresignedUrlResponse = reply
            .json()
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

        let put = HttpRequest::new(Method::Put, presigned.upload_url).body(Body::Bytes {
            content_type: file.mime.clone(),
            data: file.bytes.clone(),
        });
        let stored = self.transport.send(put).await?;
        if !stored.is_success() {
            warn!(status = stored.status, name = %file.name, "storage rejected presigned upload");
            return Err(UploadError::StorageRejected(stored.status));
        }
        Ok(presigned.public_url)
    }

    /// Upload files one after another, in order.
    ///
    /// Returned URLs line up with `files`. The progress callback fires after
    /// each file. The first failure stops the batch.
    pub async fn upload_many(
        &self,
        session: &Session,
        files: &[MediaFile],
        mut options: UploadOptions<'_>,
    ) -> Result<Vec<String>, UploadError> {
        let mut urls = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            urls.push(self.upload(session, file, options.folder).await?);
            if let Some(callback) = options.on_progress.as_mut() {
                callback(progress_percent(i + 1, files.len()));
            }
        }
        Ok(urls)
    }

    /// Ask the API to delete a stored object. Never fails; returns whether
    /// the server confirmed the delete.
    ///
    /// URLs outside the bucket are ignored without a request.
    pub async fn delete(&self, session: &Session, url: &str) -> bool {
        if !self.storage.is_storage_url(url) {
            debug!(url, "not a storage URL, skipping delete");
            return false;
        }
        let Some(token) = session.bearer() else {
            warn!(url, "no credential, skipping delete");
            return false;
        };

        let request = self
            .authorized(HttpRequest::new(Method::Delete, self.endpoint(UPLOAD_PATH)), token, session)
            .body(Body::Json(serde_json::json!({ "url": url })));

        match self.transport.send(request).await {
            Ok(reply) if reply.is_success() => {
                let confirmed = reply.json::<DeleteResponse>().map(|r| r.success).unwrap_or(false);
                if !confirmed {
                    warn!(url, "delete not confirmed by server");
                }
                confirmed
            }
            Ok(reply) => {
                warn!(url, status = reply.status, "failed to delete file");
                false
            }
            Err(e) => {
                warn!(url, error = %e, "failed to delete file");
                false
            }
        }
    }
}

impl<T: Transport + 'static> UploadClient<T> {
    /// Fire-and-forget delete on the current tokio runtime.
    ///
    /// The caller does not wait; the handle is only useful for tests and
    /// shutdown. Outside a runtime the delete is skipped with a warning and
    /// `None` is returned, leaving the object orphaned in the bucket.
    pub fn delete_detached(&self, session: Session, url: String) -> Option<JoinHandle<bool>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(%url, "no async runtime, skipping storage delete");
            return None;
        };
        let client = self.clone();
        Some(runtime.spawn(async move { client.delete(&session, &url).await }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockTransport, bucket_url, session};

    const API: &str = "http://api.test";

    fn client(transport: MockTransport) -> UploadClient<MockTransport> {
        UploadClient::new(transport, API, Storage::default())
    }

    fn file(name: &str) -> MediaFile {
        MediaFile::new(name, "image/webp", vec![1, 2, 3])
    }

    fn ok_upload(url: &str) -> HttpReply {
        HttpReply::new(200, format!(r#"{{"publicUrl":"{url}","key":"k"}}"#))
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let client = client(MockTransport::new());
        let anon = Session::new(None, "default");

        let err = client
            .upload(&anon, &file("a.webp"), UploadFolder::Products)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::AuthenticationRequired));
        assert_eq!(err.to_string(), "Authentication required");
        assert_eq!(client.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_token_counts_as_missing() {
        let client = client(MockTransport::new());
        let blank = Session::new(Some(String::new()), "default");
        assert!(matches!(
            client.upload(&blank, &file("a.webp"), UploadFolder::Logos).await,
            Err(UploadError::AuthenticationRequired)
        ));
        assert_eq!(client.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn proxied_upload_sends_multipart_with_headers() {
        let transport = MockTransport::with_replies(vec![ok_upload(&bucket_url("products/a.webp"))]);
        let client = client(transport);

        let url = client
            .upload(&session(), &file("a.webp"), UploadFolder::Products)
            .await
            .unwrap();
        assert_eq!(url, bucket_url("products/a.webp"));

        let requests = client.transport.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://api.test/admin/upload/file");
        assert_eq!(req.header_value("Authorization"), Some("Bearer secret-token"));
        assert_eq!(req.header_value("x-tenant-id"), Some("gautam"));
        match &req.body {
            Body::Multipart { fields, file } => {
                assert_eq!(fields, &vec![("folder".to_string(), "products".to_string())]);
                assert_eq!(file.field, "file");
                assert_eq!(file.filename, "a.webp");
                assert_eq!(file.mime, "image/webp");
                assert_eq!(file.bytes, vec![1, 2, 3]);
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_message_is_surfaced() {
        let transport =
            MockTransport::with_replies(vec![HttpReply::new(413, r#"{"message":"File too big"}"#)]);
        let err = client(transport)
            .upload(&session(), &file("a.webp"), UploadFolder::Banners)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File too big");
    }

    #[tokio::test]
    async fn generic_message_without_server_message() {
        for body in ["", "<html>502</html>", r#"{"error":"x"}"#, r#"{"message":""}"#] {
            let transport = MockTransport::with_replies(vec![HttpReply::new(502, body)]);
            let err = client(transport)
                .upload(&session(), &file("a.webp"), UploadFolder::Banners)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Failed to upload file");
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let transport = MockTransport::with_replies(vec![HttpReply::new(200, r#"{"key":"k"}"#)]);
        let err = client(transport)
            .upload(&session(), &file("a.webp"), UploadFolder::About)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn network_failure_is_transport_error() {
        let transport = MockTransport::failing();
        let err = client(transport)
            .upload(&session(), &file("a.webp"), UploadFolder::About)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[tokio::test]
    async fn presigned_upload_puts_bytes_to_signed_url() {
        let transport = MockTransport::with_replies(vec![
            HttpReply::new(
                200,
                r#"{"uploadUrl":"https://signed.example/put?sig=1","publicUrl":"https://jewelstore.sgp1.digitaloceanspaces.com/logos/l.png","key":"logos/l.png"}"#,
            ),
            HttpReply::new(204, ""),
        ]);
        let client = client(transport).with_strategy(UploadStrategy::Presigned);
        let logo = MediaFile::new("l.png", "image/png", vec![9; 4]);

        let url = client.upload(&session(), &logo, UploadFolder::Logos).await.unwrap();
        assert_eq!(url, "https://jewelstore.sgp1.digitaloceanspaces.com/logos/l.png");

        let requests = client.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "http://api.test/admin/upload/presigned-url");
        assert_eq!(
            requests[0].body,
            Body::Json(serde_json::json!({
                "folder": "logos",
                "filename": "l.png",
                "contentType": "image/png",
            }))
        );
        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(requests[1].url, "https://signed.example/put?sig=1");
        assert_eq!(requests[1].header_value("Authorization"), None);
        assert_eq!(
            requests[1].body,
            Body::Bytes {
                content_type: "image/png".to_string(),
                data: vec![9; 4]
            }
        );
    }

    #[tokio::test]
    async fn presigned_errors() {
        let transport = MockTransport::with_replies(vec![HttpReply::new(500, "")]);
        let client1 = client(transport).with_strategy(UploadStrategy::Presigned);
        let err = client1
            .upload(&session(), &file("a.webp"), UploadFolder::Logos)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to get upload URL");

        let transport = MockTransport::with_replies(vec![
            HttpReply::new(200, r#"{"uploadUrl":"https://s/put","publicUrl":"https://p","key":"k"}"#),
            HttpReply::new(403, "AccessDenied"),
        ]);
        let client2 = client(transport).with_strategy(UploadStrategy::Presigned);
        let err = client2
            .upload(&session(), &file("a.webp"), UploadFolder::Logos)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload file to storage (403)");
    }

    #[tokio::test]
    async fn batch_reports_progress_in_order() {
        let transport = MockTransport::with_replies(vec![
            ok_upload("https://x.digitaloceanspaces.com/1"),
            ok_upload("https://x.digitaloceanspaces.com/2"),
            ok_upload("https://x.digitaloceanspaces.com/3"),
        ]);
        let client = client(transport);
        let files = vec![file("1.webp"), file("2.webp"), file("3.webp")];

        let mut seen = Vec::new();
        let urls = client
            .upload_many(
                &session(),
                &files,
                UploadOptions::new(UploadFolder::Products).on_progress(|p| seen.push(p)),
            )
            .await
            .unwrap();

        assert_eq!(seen, vec![33, 67, 100]);
        assert_eq!(
            urls,
            vec![
                "https://x.digitaloceanspaces.com/1",
                "https://x.digitaloceanspaces.com/2",
                "https://x.digitaloceanspaces.com/3",
            ]
        );
        let names: Vec<String> = client
            .transport
            .requests()
            .iter()
            .map(|r| match &r.body {
                Body::Multipart { file, .. } => file.filename.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(names, vec!["1.webp", "2.webp", "3.webp"]);
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure() {
        let transport = MockTransport::with_replies(vec![
            ok_upload("https://x.digitaloceanspaces.com/1"),
            HttpReply::new(500, r#"{"message":"disk full"}"#),
        ]);
        let client = client(transport);
        let files = vec![file("1.webp"), file("2.webp"), file("3.webp")];

        let mut seen = Vec::new();
        let err = client
            .upload_many(
                &session(),
                &files,
                UploadOptions::new(UploadFolder::Products).on_progress(|p| seen.push(p)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert_eq!(seen, vec![33]);
        assert_eq!(client.transport.call_count(), 2);
    }

    #[tokio::test]
    async fn delete_sends_json_body() {
        let transport = MockTransport::with_replies(vec![HttpReply::new(200, r#"{"success":true}"#)]);
        let client = client(transport);
        let url = bucket_url("products/old.webp");

        assert!(client.delete(&session(), &url).await);

        let requests = client.transport.requests();
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].url, "http://api.test/admin/upload/file");
        assert_eq!(requests[0].body, Body::Json(serde_json::json!({ "url": url })));
    }

    #[tokio::test]
    async fn delete_ignores_foreign_urls() {
        let client = client(MockTransport::new());
        assert!(!client.delete(&session(), "https://images.unsplash.com/a.jpg").await);
        assert_eq!(client.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn delete_swallows_failures() {
        let url = bucket_url("products/old.webp");

        let rejected = client(MockTransport::with_replies(vec![HttpReply::new(500, "")]));
        assert!(!rejected.delete(&session(), &url).await);

        let unconfirmed =
            client(MockTransport::with_replies(vec![HttpReply::new(200, r#"{"success":false}"#)]));
        assert!(!unconfirmed.delete(&session(), &url).await);

        let offline = client(MockTransport::failing());
        assert!(!offline.delete(&session(), &url).await);

        let anonymous = client(MockTransport::new());
        assert!(!anonymous.delete(&Session::new(None, "t"), &url).await);
        assert_eq!(anonymous.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn detached_delete_runs_in_background() {
        let transport = MockTransport::with_replies(vec![HttpReply::new(200, r#"{"success":true}"#)]);
        let client = client(transport);

        let handle = client
            .delete_detached(session(), bucket_url("banners/b.webp"))
            .expect("inside a runtime");
        assert!(handle.await.unwrap());
        assert_eq!(client.transport.call_count(), 1);
    }

    #[test]
    fn detached_delete_outside_runtime_is_skipped() {
        let client = client(MockTransport::new());

        assert!(client.delete_detached(session(), bucket_url("banners/b.webp")).is_none());
        assert_eq!(client.transport.call_count(), 0);
    }

    #[test]
    fn folder_round_trip() {
        for folder in UploadFolder::ALL {
            assert_eq!(folder.as_str().parse::<UploadFolder>(), Ok(folder));
        }
        assert!("videos".parse::<UploadFolder>().is_err());
        assert_eq!(
            serde_json::to_string(&UploadFolder::Categories).unwrap(),
            r#""categories""#
        );
    }

    #[test]
    fn progress_rounding() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(0, 0), 100);
    }
}
