//! The print path: the `Print` target sliced into A4 pages.

use tracing::debug;

use crate::export::layout::layout;
use crate::export::paginate::{paginate, PageSlice};
use crate::export::paint::paint;
use crate::export::raster::RasterRequest;
use crate::export::snapshot::capture;
use crate::export::ExportSettings;
use crate::render::tree::{RenderTree, Rule, Selector};

/// Forces black text on white with black rules, for legible print output.
pub fn contrast_override() -> Rule {
    Rule::new(
        Selector::Universal,
        &[
            ("color", "#000"),
            ("background-color", "#fff"),
            ("border-color", "#000"),
        ],
    )
    .important()
}

#[derive(Debug, Clone)]
pub struct PrintPage {
    pub slice: PageSlice,
    pub request: RasterRequest,
}

/// Lays `tree` out at page width and returns one raster request per page.
pub fn page_requests(tree: &RenderTree, overrides: &[Rule], settings: &ExportSettings) -> Vec<PrintPage> {
    let width = settings.page_width as f32;
    let page_height = settings.page_height as f32;

    let mut snapshot = capture(tree, overrides);
    snapshot.normalize_colors();
    snapshot.set_root_style("width", &format!("{width}px"));

    let laid_out = layout(&snapshot, width);
    let slices = paginate(laid_out.height, page_height, &laid_out.root.avoid_ranges());
    debug!(
        content_height = laid_out.height,
        pages = slices.len(),
        "paginated print layout"
    );

    slices
        .into_iter()
        .map(|slice| PrintPage {
            request: RasterRequest {
                svg: paint(&laid_out, slice.window(), width, page_height),
                width: settings.page_width,
                height: settings.page_height,
                scale: settings.scale,
            },
            slice,
        })
        .collect()
}
