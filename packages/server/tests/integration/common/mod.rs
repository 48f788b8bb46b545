use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::config::{
    BlobBackend, BlobStoreConfig, MetadataBackend, MetadataStoreConfig, StorageConfig,
};
use common::processing::ProcessRequest;
use processor::ThumbnailProcessor;
use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;

use server::config::{AppConfig, CorsConfig, GalleryConfig, ProcessorConfig, ServerConfig};
use server::notifier::{LocalNotifier, NotifyError, ProcessorNotifier};
use server::service::GalleryService;
use server::state::AppState;

/// Upload limit used by test servers.
pub const MAX_UPLOAD_SIZE: u64 = 256 * 1024;

pub mod routes {
    pub const ROOT: &str = "/api";
    pub const HEALTH: &str = "/api/health";
    pub const IMAGES: &str = "/api/images";
    pub const UPLOAD: &str = "/api/images/upload";

    pub fn image(id: &str) -> String {
        format!("/api/images/{id}")
    }

    pub fn image_file(id: &str) -> String {
        format!("/api/images/{id}/file")
    }

    pub fn image_thumbnail(id: &str) -> String {
        format!("/api/images/{id}/thumbnail")
    }
}

/// Forwards processing requests to a channel instead of processing them.
struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ProcessRequest>,
}

#[async_trait]
impl ProcessorNotifier for ChannelNotifier {
    async fn notify(&self, request: ProcessRequest) -> Result<(), NotifyError> {
        let _ = self.tx.send(request);
        Ok(())
    }
}

/// A running test server backed by a filesystem blob store and a SQLite
/// metadata store in a temporary directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    /// Processing requests dispatched by uploads. Empty when the app runs the
    /// real processor.
    pub notified: mpsc::UnboundedReceiver<ProcessRequest>,
    dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res
            .bytes()
            .await
            .expect("Failed to read response body")
            .to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("Response has no id")
            .to_string()
    }
}

/// One multipart upload.
pub struct Upload<'a> {
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub data: Vec<u8>,
    pub uploader: Option<&'a str>,
    pub tags: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> Upload<'a> {
    pub fn image(uploader: &'a str) -> Self {
        Self {
            filename: "photo.png",
            content_type: Some("image/png"),
            data: b"\x89PNG not really".to_vec(),
            uploader: Some(uploader),
            tags: None,
            description: None,
        }
    }

    pub fn tags(mut self, tags: &'a str) -> Self {
        self.tags = Some(tags);
        self
    }
}

impl TestApp {
    /// Spawn a server whose uploads are recorded in [`TestApp::notified`].
    pub async fn spawn() -> Self {
        let (tx, notified) = mpsc::unbounded_channel();
        Self::spawn_with(notified, move |_, _| Arc::new(ChannelNotifier { tx })).await
    }

    /// Spawn a server that runs the thumbnail processor in-process.
    pub async fn spawn_with_processor() -> Self {
        let (_tx, notified) = mpsc::unbounded_channel();
        Self::spawn_with(notified, |blobs, metadata| {
            Arc::new(LocalNotifier::new(Arc::new(ThumbnailProcessor::new(
                blobs, metadata, 300,
            ))))
        })
        .await
    }

    async fn spawn_with(
        notified: mpsc::UnboundedReceiver<ProcessRequest>,
        notifier: impl FnOnce(
            Arc<dyn common::storage::BlobStore>,
            Arc<dyn common::metadata::MetadataStore>,
        ) -> Arc<dyn ProcessorNotifier>,
    ) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let storage = StorageConfig {
            max_upload_size: MAX_UPLOAD_SIZE,
            blob: BlobStoreConfig {
                backend: BlobBackend::Filesystem,
                path: dir.path().join("blobs"),
                ..Default::default()
            },
            metadata: MetadataStoreConfig {
                backend: MetadataBackend::Database,
                url: format!(
                    "sqlite://{}?mode=rwc",
                    dir.path().join("gallery.db").display()
                ),
                max_connections: 5,
            },
        };

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec!["*".to_string()],
                    max_age: 3600,
                },
            },
            storage,
            gallery: GalleryConfig::default(),
            processor: ProcessorConfig::default(),
        };

        let blobs = common::storage::from_config(
            &app_config.storage.blob,
            app_config.storage.max_upload_size,
        )
        .await
        .expect("Failed to open blob store");
        let metadata = common::metadata::from_config(&app_config.storage.metadata)
            .await
            .expect("Failed to open metadata store");

        let notifier = notifier(blobs.clone(), metadata.clone());
        let gallery = GalleryService::new(
            blobs,
            metadata,
            notifier,
            app_config.gallery.max_list_results,
        );

        let state = AppState {
            gallery: Arc::new(gallery),
            config: app_config,
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            notified,
            dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(name, value)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload(&self, upload: Upload<'_>) -> TestResponse {
        let mut part = reqwest::multipart::Part::bytes(upload.data)
            .file_name(upload.filename.to_string());
        if let Some(content_type) = upload.content_type {
            part = part
                .mime_str(content_type)
                .expect("Failed to set MIME type");
        }

        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(uploader) = upload.uploader {
            form = form.text("uploader", uploader.to_string());
        }
        if let Some(tags) = upload.tags {
            form = form.text("tags", tags.to_string());
        }
        if let Some(description) = upload.description {
            form = form.text("description", description.to_string());
        }

        self.post_form(routes::UPLOAD, form).await
    }

    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, content_type: &str, body: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("content-type", content_type)
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// Upload an image and return its id.
    pub async fn create_image(&self, upload: Upload<'_>) -> String {
        let res = self.upload(upload).await;
        assert_eq!(res.status, 201, "Upload failed: {}", res.body);
        res.id()
    }

    /// Number of original image blobs on disk.
    pub fn blob_count(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("blobs"))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Delete a blob file behind the server's back.
    pub fn remove_blob(&self, key: &str) {
        std::fs::remove_file(self.dir.path().join("blobs").join(key))
            .expect("Failed to remove blob");
    }

    /// Poll until the processor has patched the record.
    pub async fn wait_until_processed(&self, id: &str) -> Value {
        for _ in 0..100 {
            let res = self.get(&routes::image(id)).await;
            if res.body["processed"] == Value::Bool(true) {
                return res.body;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("Image {id} was not processed in time");
    }
}

/// Encode a solid PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}
