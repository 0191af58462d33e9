//! The thumbnail path: one opaque first-page image of the `Thumbnail` target.

use crate::export::layout::layout;
use crate::export::paint::{paint, PageWindow};
use crate::export::raster::RasterRequest;
use crate::export::snapshot::capture;
use crate::export::ExportSettings;
use crate::render::tree::{RenderTree, Rule};

/// Builds the raster request for a thumbnail of `tree`.
///
/// The snapshot root is pinned to the logical page with a white background,
/// so the image is exactly one page regardless of how long the document is.
pub fn thumbnail_request(tree: &RenderTree, overrides: &[Rule], settings: &ExportSettings) -> RasterRequest {
    let width = settings.page_width as f32;
    let height = settings.page_height as f32;

    let mut snapshot = capture(tree, overrides);
    snapshot.normalize_colors();
    snapshot.set_root_style("width", &format!("{width}px"));
    snapshot.set_root_style("height", &format!("{height}px"));
    snapshot.set_root_style("background-color", "#ffffff");

    let page = layout(&snapshot, width);
    RasterRequest {
        svg: paint(&page, PageWindow { top: 0.0, height }, width, height),
        width: settings.page_width,
        height: settings.page_height,
        scale: settings.scale,
    }
}
