//! HTTP storage client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use sitereport_protocol::Payload;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::key::{extract_object_path, object_key};
use crate::progress::progress_stream;
use crate::session::SessionProvider;
use crate::{PhotoStorage, ProgressFn, StorageFuture};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Storage REST client authenticated with the caller's session.
pub struct StorageClient {
    http: reqwest::Client,
    config: StorageConfig,
    session: Arc<dyn SessionProvider>,
}

impl StorageClient {
    /// Creates a client. Fails if the config cannot produce request URLs.
    pub fn new(
        config: StorageConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, StorageError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Streams `payload` to a fresh key under `namespace`.
    ///
    /// Resolves with the object's public URL.
    pub async fn upload_photo(
        &self,
        payload: Payload,
        namespace: &str,
        on_progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<String, StorageError> {
        let token = self
            .session
            .access_token()
            .ok_or(StorageError::Unauthenticated)?;
        if cancel.is_cancelled() {
            return Err(StorageError::Aborted);
        }

        let key = object_key(namespace, &payload.name);
        let size = payload.len();
        let body = reqwest::Body::wrap_stream(progress_stream(payload.data.clone(), on_progress));

        let mut request = self
            .http
            .post(self.config.upload_url(&key))
            .bearer_auth(&token)
            .header(CONTENT_TYPE, payload.content_type())
            .header(CONTENT_LENGTH, size)
            .header("x-upsert", "false")
            .header(
                CACHE_CONTROL,
                format!("max-age={}", self.config.cache_control_secs),
            )
            .body(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("apikey", api_key);
        }

        debug!(%key, bytes = size, "upload started");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%key, "upload cancelled");
                return Err(StorageError::Aborted);
            }
            result = request.send() => result?,
        };

        let status = response.status();
        if status.is_success() {
            info!(%key, bytes = size, "upload complete");
            return Ok(self.config.public_url(&key));
        }

        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Aborted),
            text = response.text() => text.unwrap_or_default(),
        };
        let err = StorageError::from_response(status.as_u16(), &text);
        warn!(%key, status = status.as_u16(), error = %err, "upload rejected");
        Err(err)
    }

    /// Removes the objects behind `urls` in one request.
    ///
    /// URLs outside this bucket are skipped. Returns how many object paths
    /// the removal covered.
    pub async fn delete_photos(&self, urls: &[String]) -> Result<usize, StorageError> {
        let paths: Vec<&str> = urls
            .iter()
            .filter_map(|url| {
                let path = extract_object_path(url, &self.config.bucket);
                if path.is_none() {
                    debug!(%url, "skipping url outside storage bucket");
                }
                path
            })
            .collect();
        if paths.is_empty() {
            return Ok(0);
        }

        let token = self
            .session
            .access_token()
            .ok_or(StorageError::Unauthenticated)?;

        let mut request = self
            .http
            .delete(self.config.delete_url())
            .bearer_auth(&token)
            .json(&serde_json::json!({ "prefixes": paths }));
        if let Some(api_key) = &self.config.api_key {
            request = request.header("apikey", api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StorageError::from_response(status.as_u16(), &text));
        }

        info!(count = paths.len(), "removed stored photos");
        Ok(paths.len())
    }
}

impl PhotoStorage for StorageClient {
    fn upload<'a>(
        &'a self,
        payload: Payload,
        namespace: &'a str,
        on_progress: ProgressFn,
        cancel: CancellationToken,
    ) -> StorageFuture<'a, String> {
        Box::pin(self.upload_photo(payload, namespace, on_progress, cancel))
    }

    fn delete<'a>(&'a self, urls: &'a [String]) -> StorageFuture<'a, usize> {
        Box::pin(self.delete_photos(urls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StaticSession;
    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, post};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct RecordedUpload {
        bucket: String,
        key: String,
        headers: HeaderMap,
        len: usize,
    }

    #[derive(Default)]
    struct Recorded {
        uploads: Vec<RecordedUpload>,
        deletes: Vec<serde_json::Value>,
    }

    #[derive(Clone)]
    struct Fake {
        recorded: Arc<Mutex<Recorded>>,
        status: StatusCode,
        body: &'static str,
        delay: Option<Duration>,
    }

    async fn put_object(
        State(fake): State<Fake>,
        Path((bucket, key)): Path<(String, String)>,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, &'static str) {
        fake.recorded.lock().unwrap().uploads.push(RecordedUpload {
            bucket,
            key,
            headers,
            len: body.len(),
        });
        if let Some(delay) = fake.delay {
            tokio::time::sleep(delay).await;
        }
        (fake.status, fake.body)
    }

    async fn remove_objects(
        State(fake): State<Fake>,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> (StatusCode, &'static str) {
        fake.recorded.lock().unwrap().deletes.push(body);
        (fake.status, fake.body)
    }

    async fn spawn_fake(
        status: StatusCode,
        body: &'static str,
        delay: Option<Duration>,
    ) -> (String, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let fake = Fake {
            recorded: Arc::clone(&recorded),
            status,
            body,
            delay,
        };
        let app = Router::new()
            .route("/storage/v1/object/{bucket}/{*key}", post(put_object))
            .route("/storage/v1/object/{bucket}", delete(remove_objects))
            .with_state(fake);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), recorded)
    }

    fn client(base: &str, session: StaticSession) -> StorageClient {
        StorageClient::new(StorageConfig::new(base), Arc::new(session)).unwrap()
    }

    fn noop_progress() -> ProgressFn {
        Arc::new(|_| {})
    }

    fn jpeg(len: usize) -> Payload {
        Payload::new("photo.jpg", "image/jpeg", vec![0xABu8; len])
    }

    #[tokio::test]
    async fn upload_sends_expected_request() {
        let (base, recorded) = spawn_fake(StatusCode::OK, "{}", None).await;
        let client = client(&base, StaticSession::new("tok-1"));

        let url = client
            .upload_photo(jpeg(1234), "user-1", noop_progress(), CancellationToken::new())
            .await
            .unwrap();

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.uploads.len(), 1);
        let up = &rec.uploads[0];
        assert_eq!(up.bucket, "photos");
        assert!(up.key.starts_with("user-1/"));
        assert!(up.key.ends_with(".jpg"));
        assert_eq!(up.len, 1234);
        assert_eq!(up.headers["authorization"], "Bearer tok-1");
        assert_eq!(up.headers["content-type"], "image/jpeg");
        assert_eq!(up.headers["x-upsert"], "false");
        assert_eq!(up.headers["cache-control"], "max-age=3600");

        assert_eq!(
            url,
            format!("{base}/storage/v1/object/public/photos/{}", up.key)
        );
    }

    #[tokio::test]
    async fn upload_reports_monotonic_progress() {
        let (base, _recorded) = spawn_fake(StatusCode::OK, "{}", None).await;
        let client = client(&base, StaticSession::new("tok"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        client
            .upload_photo(
                jpeg(300 * 1024),
                "u",
                Arc::new(move |p| s.lock().unwrap().push(p)),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(seen.last(), Some(&100));
    }

    #[tokio::test]
    async fn upload_without_session_is_unauthenticated() {
        let (base, recorded) = spawn_fake(StatusCode::OK, "{}", None).await;
        let client = client(&base, StaticSession::anonymous());

        let err = client
            .upload_photo(jpeg(10), "u", noop_progress(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unauthenticated));
        assert!(recorded.lock().unwrap().uploads.is_empty());
    }

    #[tokio::test]
    async fn upload_surfaces_server_message() {
        let (base, _recorded) = spawn_fake(
            StatusCode::BAD_REQUEST,
            r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#,
            None,
        )
        .await;
        let client = client(&base, StaticSession::new("tok"));

        let err = client
            .upload_photo(jpeg(10), "u", noop_progress(), CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            StorageError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "new row violates row-level security policy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_to_closed_port_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{addr}"), StaticSession::new("tok"));
        let err = client
            .upload_photo(jpeg(10), "u", noop_progress(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Network(_)), "{err:?}");
    }

    #[tokio::test]
    async fn upload_cancelled_mid_flight_is_aborted() {
        let (base, _recorded) =
            spawn_fake(StatusCode::OK, "{}", Some(Duration::from_secs(30))).await;
        let client = client(&base, StaticSession::new("tok"));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client
            .upload_photo(jpeg(10), "u", noop_progress(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Aborted));
    }

    #[tokio::test]
    async fn upload_already_cancelled_never_sends() {
        let (base, recorded) = spawn_fake(StatusCode::OK, "{}", None).await;
        let client = client(&base, StaticSession::new("tok"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .upload_photo(jpeg(10), "u", noop_progress(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Aborted));
        assert!(recorded.lock().unwrap().uploads.is_empty());
    }

    #[tokio::test]
    async fn delete_resolves_paths_and_skips_foreign_urls() {
        let (base, recorded) = spawn_fake(StatusCode::OK, "[]", None).await;
        let client = client(&base, StaticSession::new("tok"));

        let urls = vec![
            format!("{base}/storage/v1/object/public/photos/u1/1-a.jpg"),
            "https://elsewhere.example/image.png".to_string(),
            format!("{base}/storage/v1/object/public/photos/u1/2-b.jpg"),
        ];
        let removed = client.delete_photos(&urls).await.unwrap();
        assert_eq!(removed, 2);

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.deletes.len(), 1);
        assert_eq!(
            rec.deletes[0],
            serde_json::json!({ "prefixes": ["u1/1-a.jpg", "u1/2-b.jpg"] })
        );
    }

    #[tokio::test]
    async fn delete_with_nothing_resolvable_sends_nothing() {
        let (base, recorded) = spawn_fake(StatusCode::OK, "[]", None).await;
        let client = client(&base, StaticSession::anonymous());

        let removed = client
            .delete_photos(&["https://cdn.example/a.jpg".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert!(recorded.lock().unwrap().deletes.is_empty());
    }

    #[tokio::test]
    async fn delete_failure_is_reported() {
        let (base, _recorded) =
            spawn_fake(StatusCode::INTERNAL_SERVER_ERROR, "oops", None).await;
        let client = client(&base, StaticSession::new("tok"));

        let err = client
            .delete_photos(&[format!("{base}/storage/v1/object/public/photos/u/x.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Server { status: 500, .. }));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = StorageClient::new(StorageConfig::default(), Arc::new(StaticSession::anonymous()));
        assert!(matches!(result, Err(StorageError::Config(_))));
    }
}
