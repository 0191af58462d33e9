//! SVG → bitmap.
//!
//! The `Rasterizer` trait is the seam the export session talks to. The
//! production implementation parses with usvg and paints with resvg. Font
//! discovery walks the filesystem and parsing/painting are CPU-bound, so all
//! of it runs under `spawn_blocking`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use resvg::tiny_skia;
use resvg::usvg;
use resvg::usvg::fontdb;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::export::ExportError;

/// A page to rasterize: SVG markup with a logical size and an oversampling factor.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest {
    pub svg: String,
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

/// Opaque RGBA pixels, row-major, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Bitmap {
    /// A bitmap filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: rgba.iter().copied().cycle().take(pixels * 4).collect(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.rgba.get(i..i + 4).and_then(|p| p.try_into().ok())
    }

    /// RGB bytes with alpha dropped. Pixels are painted on white, so alpha is always opaque.
    pub fn to_rgb(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let size = tiny_skia::IntSize::from_wh(self.width, self.height)
            .ok_or_else(|| ExportError::Raster("bitmap has zero size".into()))?;
        let pixmap = tiny_skia::Pixmap::from_vec(self.rgba.clone(), size)
            .ok_or_else(|| ExportError::Raster("pixel buffer does not match size".into()))?;
        pixmap
            .encode_png()
            .map_err(|e| ExportError::Raster(format!("png encoding failed: {e}")))
    }
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Resolves once every font the pages may use is loaded.
    async fn fonts_ready(&self) -> Result<(), ExportError>;

    async fn rasterize(&self, request: RasterRequest) -> Result<Bitmap, ExportError>;
}

pub struct ResvgRasterizer {
    font_dir: Option<PathBuf>,
    fonts: OnceCell<Arc<fontdb::Database>>,
}

impl ResvgRasterizer {
    pub fn new(font_dir: Option<PathBuf>) -> Self {
        Self {
            font_dir,
            fonts: OnceCell::new(),
        }
    }

    async fn fonts(&self) -> Result<Arc<fontdb::Database>, ExportError> {
        let font_dir = self.font_dir.clone();
        self.fonts
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || load_fonts(font_dir))
                    .await
                    .map_err(|e| ExportError::Fonts(format!("font loading task failed: {e}")))
            })
            .await
            .cloned()
    }
}

fn load_fonts(font_dir: Option<PathBuf>) -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = font_dir {
        db.load_fonts_dir(&dir);
        debug!(dir = %dir.display(), "loaded extra font directory");
    }
    info!(faces = db.len(), "font database ready");
    Arc::new(db)
}

#[async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn fonts_ready(&self) -> Result<(), ExportError> {
        self.fonts().await.map(|_| ())
    }

    async fn rasterize(&self, request: RasterRequest) -> Result<Bitmap, ExportError> {
        let fonts = self.fonts().await?;
        tokio::task::spawn_blocking(move || render_svg(&request, fonts))
            .await
            .map_err(|e| ExportError::Raster(format!("raster task failed: {e}")))?
    }
}

fn render_svg(request: &RasterRequest, fonts: Arc<fontdb::Database>) -> Result<Bitmap, ExportError> {
    let mut options = usvg::Options::default();
    options.fontdb = fonts;

    let tree = usvg::Tree::from_str(&request.svg, &options)
        .map_err(|e| ExportError::Raster(format!("svg parse failed: {e}")))?;

    let width = ((request.width as f32) * request.scale).round() as u32;
    let height = ((request.height as f32) * request.scale).round() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Raster(format!("cannot allocate {width}x{height} canvas")))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    // Map the tree's own size onto the oversampled canvas.
    let size = tree.size();
    let sx = width as f32 / size.width();
    let sy = height as f32 / size.height();
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    debug!(width, height, "rasterized page");
    Ok(Bitmap {
        width,
        height,
        rgba: pixmap.take(),
    })
}
