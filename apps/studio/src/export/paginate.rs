//! Page slicing for the print path.
//!
//! A page normally ends exactly one page height below where it started. When
//! that cut would run through a `break-inside: avoid` block, the page ends at
//! the top of the block instead and the block starts the next page. A block
//! taller than a whole page cannot be kept together, so it is cut uniformly.

use serde::Serialize;

use crate::export::paint::PageWindow;

/// Cuts closer than this to a block edge count as landing on the edge.
const EPSILON: f32 = 0.5;

/// How a page's bottom edge was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CutKind {
    /// Last page; everything left fit.
    End,
    /// Uniform cut that split no protected block.
    Clean,
    /// Moved up to the top of a block that would otherwise be split.
    BeforeBlock,
    /// A protected block taller than a page had to be split.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSlice {
    pub top: f32,
    pub height: f32,
    pub cut: CutKind,
}

impl PageSlice {
    pub fn window(&self) -> PageWindow {
        PageWindow {
            top: self.top,
            height: self.height,
        }
    }
}

/// Slices `content_height` pixels of content into pages of `page_height`,
/// keeping each range in `avoid` on one page where it fits.
pub fn paginate(content_height: f32, page_height: f32, avoid: &[(f32, f32)]) -> Vec<PageSlice> {
    if page_height <= 0.0 || content_height <= EPSILON {
        return vec![PageSlice {
            top: 0.0,
            height: content_height.max(0.0),
            cut: CutKind::End,
        }];
    }

    let mut slices = Vec::new();
    let mut top = 0.0_f32;

    while content_height - top > EPSILON {
        let uniform = top + page_height;
        if uniform >= content_height - EPSILON {
            slices.push(PageSlice {
                top,
                height: content_height - top,
                cut: CutKind::End,
            });
            break;
        }

        let (cut, kind) = choose_cut(top, uniform, page_height, avoid);
        slices.push(PageSlice {
            top,
            height: cut - top,
            cut: kind,
        });
        top = cut;
    }

    slices
}

fn straddles(range: &(f32, f32), cut: f32) -> bool {
    range.0 < cut - EPSILON && range.1 > cut + EPSILON
}

fn choose_cut(top: f32, uniform: f32, page_height: f32, avoid: &[(f32, f32)]) -> (f32, CutKind) {
    let mut cut = uniform;
    let mut moved = false;

    // Moving the cut up can make it land inside an enclosing block, so repeat
    // until no block that fits on a page straddles it.
    loop {
        let candidate = avoid
            .iter()
            .filter(|r| straddles(r, cut))
            .filter(|r| r.1 - r.0 <= page_height && r.0 > top + EPSILON)
            .map(|r| r.0)
            .fold(None, |best: Option<f32>, start| {
                Some(best.map_or(start, |b| b.min(start)))
            });

        match candidate {
            Some(start) => {
                cut = start;
                moved = true;
            }
            None => break,
        }
    }

    let forced = avoid.iter().any(|r| straddles(r, cut));
    let kind = if forced {
        CutKind::Forced
    } else if moved {
        CutKind::BeforeBlock
    } else {
        CutKind::Clean
    };
    (cut, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: f32 = 1123.0;

    #[test]
    fn test_short_content_is_one_page() {
        let slices = paginate(400.0, PAGE, &[]);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].cut, CutKind::End);
        assert_eq!(slices[0].height, 400.0);
    }

    #[test]
    fn test_empty_content_still_yields_a_page() {
        assert_eq!(paginate(0.0, PAGE, &[]).len(), 1);
    }

    #[test]
    fn test_uniform_cuts_without_blocks() {
        let slices = paginate(2500.0, PAGE, &[]);
        let tops: Vec<f32> = slices.iter().map(|s| s.top).collect();
        assert_eq!(tops, vec![0.0, 1123.0, 2246.0]);
        assert_eq!(slices[0].cut, CutKind::Clean);
        assert_eq!(slices[2].cut, CutKind::End);
    }

    #[test]
    fn test_block_across_cut_moves_to_next_page() {
        let slices = paginate(2000.0, PAGE, &[(100.0, 200.0), (1000.0, 1200.0)]);
        assert_eq!(slices[0].height, 1000.0);
        assert_eq!(slices[0].cut, CutKind::BeforeBlock);
        assert_eq!(slices[1].top, 1000.0);
    }

    #[test]
    fn test_nested_blocks_cut_before_outer() {
        // Outer block 900..1300 contains an inner block 1100..1150.
        let slices = paginate(2000.0, PAGE, &[(900.0, 1300.0), (1100.0, 1150.0)]);
        assert_eq!(slices[0].height, 900.0);
    }

    #[test]
    fn test_block_taller_than_page_is_forced() {
        let slices = paginate(3000.0, PAGE, &[(100.0, 1500.0)]);
        assert_eq!(slices[0].height, PAGE);
        assert_eq!(slices[0].cut, CutKind::Forced);
    }

    #[test]
    fn test_fitting_blocks_are_never_split() {
        let blocks: Vec<(f32, f32)> = (0..40)
            .map(|i| {
                let top = 20.0 + i as f32 * 95.0;
                (top, top + 80.0)
            })
            .collect();
        let content = 20.0 + 40.0 * 95.0;
        let slices = paginate(content, PAGE, &blocks);
        for slice in &slices {
            let bottom = slice.top + slice.height;
            for block in &blocks {
                assert!(!straddles(block, bottom), "block {block:?} split at {bottom}");
            }
        }
        let total: f32 = slices.iter().map(|s| s.height).sum();
        assert!((total - content).abs() < 1e-3);
    }

    #[test]
    fn test_block_at_page_top_does_not_loop() {
        // Block starts right at the page top and is too tall to move.
        let slices = paginate(2400.0, PAGE, &[(0.0, 1200.0)]);
        assert_eq!(slices[0].height, PAGE);
        assert!(slices.len() >= 2);
    }
}
