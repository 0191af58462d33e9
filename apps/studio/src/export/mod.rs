//! Export: live render targets → PNG thumbnail or paginated PDF.
//!
//! The primitives (`snapshot`, `color`, `layout`, `paint`, `paginate`,
//! `raster`, `pdf`) are pure or near-pure steps. `ExportSession` strings them
//! together for one open document, serializes the two export paths and owns
//! the cancellation token that is tripped when the user navigates away.

pub mod color;
pub mod font_metrics;
pub mod layout;
pub mod paginate;
pub mod paint;
pub mod pdf;
pub mod print;
pub mod raster;
pub mod snapshot;
pub mod thumbnail;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::StudioConfig;
use crate::editor::ResumeEditor;
use crate::gateway::{GatewayError, PersistenceGateway};
use crate::models::record::{NewResume, ResumePatch, StoredResume};
use crate::render::surface::{Surface, TargetKind};
use crate::render::{PAGE_HEIGHT, PAGE_WIDTH};

pub use pdf::PdfFile;
pub use raster::{Bitmap, RasterRequest, Rasterizer, ResvgRasterizer};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("render target '{0}' is not mounted")]
    RenderTargetMissing(TargetKind),

    #[error("rasterization produced an empty image ({bytes} bytes)")]
    EmptyRasterization { bytes: usize },

    #[error("fonts failed to load: {0}")]
    Fonts(String),

    #[error("rasterization failed: {0}")]
    Raster(String),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("could not encode document: {0}")]
    Encode(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("export cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    SaveThumbnail,
    DownloadPdf,
}

impl ExportError {
    /// The single notification shown for a failed export.
    pub fn user_message(&self, action: ExportAction) -> String {
        if let ExportError::Gateway(e) = self {
            if let Some(message) = e.user_message() {
                return message.to_string();
            }
        }
        if matches!(self, ExportError::Cancelled) {
            return "Export cancelled".to_string();
        }
        match action {
            ExportAction::SaveThumbnail => "Failed to upload images".to_string(),
            ExportAction::DownloadPdf => format!("Failed to generate PDF: {self}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub page_width: u32,
    pub page_height: u32,
    pub scale: f32,
    /// Encoded thumbnails smaller than this are treated as a failed rasterization.
    pub min_image_bytes: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            page_width: PAGE_WIDTH as u32,
            page_height: PAGE_HEIGHT as u32,
            scale: 2.0,
            min_image_bytes: 100,
        }
    }
}

impl ExportSettings {
    pub fn from_config(config: &StudioConfig) -> Self {
        Self {
            scale: config.export_scale,
            ..Self::default()
        }
    }
}

/// Export coordination for one open document.
pub struct ExportSession {
    surface: Surface,
    rasterizer: Arc<dyn Rasterizer>,
    gateway: Arc<dyn PersistenceGateway>,
    settings: ExportSettings,
    turn: Mutex<()>,
    cancel: CancellationToken,
}

impl ExportSession {
    pub fn new(
        config: &StudioConfig,
        surface: Surface,
        rasterizer: Arc<dyn Rasterizer>,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            surface,
            rasterizer,
            gateway,
            settings: ExportSettings::from_config(config),
            turn: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Stops any export in flight and every later one. Nothing is persisted afterwards.
    pub fn abandon(&self) {
        if !self.cancel.is_cancelled() {
            info!("export session abandoned");
        }
        self.cancel.cancel();
    }

    pub fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn ensure_live(&self) -> Result<(), ExportError> {
        if self.cancel.is_cancelled() {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn interruptible<T>(
        &self,
        work: impl Future<Output = Result<T, ExportError>>,
    ) -> Result<T, ExportError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ExportError::Cancelled),
            result = work => result,
        }
    }

    /// Renders the thumbnail, uploads it and saves the document with the new
    /// thumbnail reference. On success the editor records the reference.
    pub async fn save_with_thumbnail(
        &self,
        editor: &mut ResumeEditor,
    ) -> Result<StoredResume, ExportError> {
        let _turn = self.turn.lock().await;
        let result = self.save_locked(editor).await;
        if let Err(e) = &result {
            error!(error = %e, "saving with thumbnail failed");
        }
        result
    }

    async fn save_locked(&self, editor: &mut ResumeEditor) -> Result<StoredResume, ExportError> {
        self.ensure_live()?;
        let png = self.interruptible(self.thumbnail_png()).await?;

        self.ensure_live()?;
        let uploaded = self.gateway.upload_image(png).await?;

        self.ensure_live()?;
        let id = match editor.id() {
            Some(id) => id,
            None => {
                let created = self
                    .gateway
                    .create(NewResume {
                        title: editor.document().title.clone(),
                    })
                    .await?;
                editor.assign_id(created.id);
                created.id
            }
        };

        let mut document = editor.document().clone();
        document.thumbnail_ref = uploaded.url.clone();
        let patch = ResumePatch::from_document(&document)
            .map_err(|e| ExportError::Encode(e.to_string()))?
            .set("completion", editor.completion());

        self.ensure_live()?;
        let stored = self.gateway.update(id, patch).await?;
        editor.record_thumbnail(uploaded.url);
        info!(resume = %id, "saved resume with thumbnail");
        Ok(stored)
    }

    async fn thumbnail_png(&self) -> Result<Vec<u8>, ExportError> {
        self.rasterizer.fonts_ready().await?;
        let tree = self
            .surface
            .target(TargetKind::Thumbnail)
            .ok_or(ExportError::RenderTargetMissing(TargetKind::Thumbnail))?;

        let request =
            thumbnail::thumbnail_request(&tree, &self.surface.overrides(), &self.settings);
        let png = self.rasterizer.rasterize(request).await?.encode_png()?;
        if png.len() < self.settings.min_image_bytes {
            return Err(ExportError::EmptyRasterization { bytes: png.len() });
        }
        debug!(bytes = png.len(), "thumbnail encoded");
        Ok(png)
    }

    /// Renders the print target into a paginated PDF named after `title`.
    pub async fn download_pdf(&self, title: &str) -> Result<PdfFile, ExportError> {
        let _turn = self.turn.lock().await;
        let result = match self.ensure_live() {
            Ok(()) => self.interruptible(self.build_pdf(title)).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            error!(error = %e, "PDF download failed");
        }
        result
    }

    async fn build_pdf(&self, title: &str) -> Result<PdfFile, ExportError> {
        self.rasterizer.fonts_ready().await?;
        let tree = self
            .surface
            .target(TargetKind::Print)
            .ok_or(ExportError::RenderTargetMissing(TargetKind::Print))?;

        // Removed again when the guard drops, on every path out of here.
        let _contrast = self.surface.push_override(print::contrast_override());
        let pages = print::page_requests(&tree, &self.surface.overrides(), &self.settings);

        let mut bitmaps = Vec::with_capacity(pages.len());
        for page in pages {
            bitmaps.push(self.rasterizer.rasterize(page.request).await?);
        }

        let owned_title = title.to_string();
        let bytes = tokio::task::spawn_blocking(move || pdf::assemble(&owned_title, &bitmaps))
            .await
            .map_err(|e| ExportError::Pdf(format!("assembly task failed: {e}")))??;

        info!(bytes = bytes.len(), "generated PDF");
        Ok(PdfFile {
            file_name: pdf::file_name_for(title),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex as SyncMutex;
    use uuid::Uuid;

    use crate::editor::ProfileField;
    use crate::models::record::UploadedImage;

    /// Pseudo-random pixels so the PNG does not compress below the size floor.
    fn noisy(width: u32, height: u32) -> Bitmap {
        let mut state: u32 = 12345;
        let rgba = (0..width * height * 4)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (state >> 16) as u8
            })
            .collect();
        Bitmap { width, height, rgba }
    }

    #[derive(Default)]
    struct FakeRasterizer {
        tiny: bool,
        fail: bool,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
        /// When set, the override count of this surface is sampled on every call.
        watch: SyncMutex<Option<Surface>>,
        overrides_seen: SyncMutex<Vec<usize>>,
        requests: SyncMutex<Vec<RasterRequest>>,
    }

    #[async_trait]
    impl Rasterizer for FakeRasterizer {
        async fn fonts_ready(&self) -> Result<(), ExportError> {
            Ok(())
        }

        async fn rasterize(&self, request: RasterRequest) -> Result<Bitmap, ExportError> {
            if let Some(surface) = self.watch.lock().as_ref() {
                self.overrides_seen.lock().push(surface.overrides().len());
            }
            self.requests.lock().push(request);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExportError::Raster("boom".into()));
            }
            Ok(if self.tiny { Bitmap::solid(1, 1, [255; 4]) } else { noisy(32, 32) })
        }
    }

    #[derive(Default)]
    struct FakeGateway {
        calls: SyncMutex<Vec<String>>,
        patches: SyncMutex<Vec<ResumePatch>>,
        fail_upload: bool,
    }

    impl FakeGateway {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn stored(id: Uuid) -> StoredResume {
            StoredResume {
                id,
                document: crate::models::resume::Document::blank(),
                completion: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PersistenceGateway for FakeGateway {
        async fn create(&self, _request: NewResume) -> Result<StoredResume, GatewayError> {
            self.calls.lock().push("create".into());
            Ok(Self::stored(Uuid::new_v4()))
        }

        async fn list(&self) -> Result<Vec<StoredResume>, GatewayError> {
            Ok(Vec::new())
        }

        async fn get(&self, id: Uuid) -> Result<StoredResume, GatewayError> {
            Ok(Self::stored(id))
        }

        async fn update(&self, id: Uuid, patch: ResumePatch) -> Result<StoredResume, GatewayError> {
            self.calls.lock().push("update".into());
            self.patches.lock().push(patch);
            Ok(Self::stored(id))
        }

        async fn delete(&self, _id: Uuid) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn upload_image(&self, _png: Vec<u8>) -> Result<UploadedImage, GatewayError> {
            self.calls.lock().push("upload".into());
            if self.fail_upload {
                return Err(GatewayError::Api {
                    status: 500,
                    message: String::new(),
                });
            }
            Ok(UploadedImage {
                url: "https://media.example.com/thumb.png".into(),
            })
        }
    }

    fn editor() -> ResumeEditor {
        let mut editor = ResumeEditor::new();
        editor.assign_id(Uuid::new_v4());
        editor.set_title("My Resume");
        editor.set_profile_field(ProfileField::FullName, "Jane Doe");
        editor
    }

    fn session(
        editor: &ResumeEditor,
        rasterizer: Arc<FakeRasterizer>,
        gateway: Arc<FakeGateway>,
    ) -> ExportSession {
        session_with(&StudioConfig::default(), editor, rasterizer, gateway)
    }

    fn session_with(
        config: &StudioConfig,
        editor: &ResumeEditor,
        rasterizer: Arc<FakeRasterizer>,
        gateway: Arc<FakeGateway>,
    ) -> ExportSession {
        let surface = Surface::new();
        editor.project(&surface, 400.0).unwrap();
        *rasterizer.watch.lock() = Some(surface.clone());
        ExportSession::new(config, surface, rasterizer, gateway)
    }

    #[tokio::test]
    async fn test_save_uploads_then_updates_with_reference() {
        let mut editor = editor();
        let gateway = Arc::new(FakeGateway::default());
        let export = session(&editor, Arc::new(FakeRasterizer::default()), gateway.clone());

        export.save_with_thumbnail(&mut editor).await.unwrap();

        assert_eq!(gateway.calls(), vec!["upload", "update"]);
        let patch = gateway.patches.lock()[0].clone();
        assert_eq!(
            patch.get("thumbnailRef").and_then(|v| v.as_str()),
            Some("https://media.example.com/thumb.png")
        );
        assert!(patch.get("completion").is_some());
        assert_eq!(editor.document().thumbnail_ref, "https://media.example.com/thumb.png");
    }

    #[tokio::test]
    async fn test_save_creates_record_for_new_document() {
        let mut editor = ResumeEditor::new();
        let gateway = Arc::new(FakeGateway::default());
        let export = session(&editor, Arc::new(FakeRasterizer::default()), gateway.clone());

        export.save_with_thumbnail(&mut editor).await.unwrap();
        assert_eq!(gateway.calls(), vec!["upload", "create", "update"]);
        assert!(editor.id().is_some());
    }

    #[tokio::test]
    async fn test_missing_thumbnail_target_uploads_nothing() {
        let mut editor = editor();
        let gateway = Arc::new(FakeGateway::default());
        let export = session(&editor, Arc::new(FakeRasterizer::default()), gateway.clone());
        export.surface().unmount(TargetKind::Thumbnail);

        let err = export.save_with_thumbnail(&mut editor).await.unwrap_err();
        assert!(matches!(err, ExportError::RenderTargetMissing(TargetKind::Thumbnail)));
        assert!(gateway.calls().is_empty());
        assert_eq!(err.user_message(ExportAction::SaveThumbnail), "Failed to upload images");
    }

    #[tokio::test]
    async fn test_tiny_image_is_rejected_before_upload() {
        let mut editor = editor();
        let gateway = Arc::new(FakeGateway::default());
        let rasterizer = Arc::new(FakeRasterizer {
            tiny: true,
            ..Default::default()
        });
        let export = session(&editor, rasterizer, gateway.clone());

        let err = export.save_with_thumbnail(&mut editor).await.unwrap_err();
        assert!(matches!(err, ExportError::EmptyRasterization { bytes } if bytes < 100));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_skips_update() {
        let mut editor = editor();
        let gateway = Arc::new(FakeGateway {
            fail_upload: true,
            ..Default::default()
        });
        let export = session(&editor, Arc::new(FakeRasterizer::default()), gateway.clone());

        let err = export.save_with_thumbnail(&mut editor).await.unwrap_err();
        assert!(matches!(err, ExportError::Gateway(_)));
        assert_eq!(gateway.calls(), vec!["upload"]);
        assert_eq!(editor.document().thumbnail_ref, "");
    }

    #[tokio::test]
    async fn test_download_names_file_and_builds_pdf() {
        let editor = editor();
        let export = session(
            &editor,
            Arc::new(FakeRasterizer::default()),
            Arc::new(FakeGateway::default()),
        );

        let file = export.download_pdf("My Resume").await.unwrap();
        assert_eq!(file.file_name, "My_Resume.pdf");
        assert!(file.bytes.starts_with(b"%PDF"));
        assert!(export.surface().overrides().is_empty());
    }

    #[tokio::test]
    async fn test_contrast_override_applies_only_while_printing() {
        let mut editor = editor();
        let rasterizer = Arc::new(FakeRasterizer::default());
        let export = session(&editor, rasterizer.clone(), Arc::new(FakeGateway::default()));

        export.download_pdf("My Resume").await.unwrap();
        let printed = rasterizer.overrides_seen.lock().clone();
        assert!(!printed.is_empty());
        assert!(printed.iter().all(|&count| count == 1));
        assert!(rasterizer
            .requests
            .lock()
            .iter()
            .all(|r| r.svg.contains("#000") && !r.svg.contains("oklch(")));

        rasterizer.overrides_seen.lock().clear();
        export.save_with_thumbnail(&mut editor).await.unwrap();
        assert_eq!(*rasterizer.overrides_seen.lock(), vec![0]);
        assert!(export.surface().overrides().is_empty());
    }

    #[tokio::test]
    async fn test_configured_scale_reaches_rasterizer() {
        let mut editor = editor();
        let config = StudioConfig {
            export_scale: 1.5,
            ..StudioConfig::default()
        };
        let rasterizer = Arc::new(FakeRasterizer::default());
        let export = session_with(
            &config,
            &editor,
            rasterizer.clone(),
            Arc::new(FakeGateway::default()),
        );

        export.save_with_thumbnail(&mut editor).await.unwrap();
        export.download_pdf("My Resume").await.unwrap();
        let requests = rasterizer.requests.lock();
        assert!(requests.len() >= 2);
        assert!(requests.iter().all(|r| r.scale == 1.5));
    }

    #[tokio::test]
    async fn test_override_removed_when_rasterization_fails() {
        let editor = editor();
        let rasterizer = Arc::new(FakeRasterizer {
            fail: true,
            ..Default::default()
        });
        let export = session(&editor, rasterizer, Arc::new(FakeGateway::default()));

        let err = export.download_pdf("x").await.unwrap_err();
        assert!(err
            .user_message(ExportAction::DownloadPdf)
            .starts_with("Failed to generate PDF: "));
        assert!(export.surface().overrides().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_exports_are_serialized() {
        let mut editor = editor();
        let rasterizer = Arc::new(FakeRasterizer {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let export = session(&editor, rasterizer.clone(), Arc::new(FakeGateway::default()));

        let (saved, downloaded) = tokio::join!(
            export.save_with_thumbnail(&mut editor),
            export.download_pdf("My Resume"),
        );
        assert!(saved.is_ok());
        assert!(downloaded.is_ok());
        assert_eq!(rasterizer.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(rasterizer.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_mid_export_persists_nothing() {
        let mut editor = editor();
        let gateway = Arc::new(FakeGateway::default());
        let rasterizer = Arc::new(FakeRasterizer {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let export = session(&editor, rasterizer, gateway.clone());

        let (saved, ()) = tokio::join!(export.save_with_thumbnail(&mut editor), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            export.abandon();
        });

        assert!(matches!(saved, Err(ExportError::Cancelled)));
        assert!(gateway.calls().is_empty());
        assert_eq!(editor.document().thumbnail_ref, "");

        let later = export.download_pdf("x").await;
        assert!(matches!(later, Err(ExportError::Cancelled)));
    }

    #[test]
    fn test_auth_failure_message_wins() {
        let err = ExportError::Gateway(GatewayError::AuthExpired);
        assert_eq!(
            err.user_message(ExportAction::SaveThumbnail),
            "Your session has expired. Please sign in again."
        );
    }
}
