//! The host the render targets are mounted on.
//!
//! A `Surface` is cheap to clone; clones share the same targets and overrides.
//! Global style overrides are scoped with [`OverrideGuard`], so an override
//! can never outlive the export that pushed it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::render::tree::{RenderTree, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Scaled live preview.
    Preview,
    /// Off-screen page used for the dashboard image.
    Thumbnail,
    /// Off-screen page used for the PDF.
    Print,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetKind::Preview => "preview",
            TargetKind::Thumbnail => "thumbnail",
            TargetKind::Print => "print",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct SurfaceState {
    targets: BTreeMap<TargetKind, RenderTree>,
    overrides: BTreeMap<u64, Rule>,
    next_override: u64,
}

#[derive(Clone, Default)]
pub struct Surface {
    inner: Arc<RwLock<SurfaceState>>,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("Surface")
            .field("targets", &state.targets.keys().collect::<Vec<_>>())
            .field("overrides", &state.overrides.len())
            .finish()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `tree` on `kind`, replacing whatever was there.
    pub fn mount(&self, kind: TargetKind, tree: RenderTree) {
        self.inner.write().targets.insert(kind, tree);
    }

    pub fn unmount(&self, kind: TargetKind) -> Option<RenderTree> {
        self.inner.write().targets.remove(&kind)
    }

    /// A copy of the tree currently mounted on `kind`.
    pub fn target(&self, kind: TargetKind) -> Option<RenderTree> {
        self.inner.read().targets.get(&kind).cloned()
    }

    /// Installs a global override until the returned guard is dropped.
    #[must_use = "the override is removed as soon as the guard is dropped"]
    pub fn push_override(&self, rule: Rule) -> OverrideGuard {
        let mut state = self.inner.write();
        let id = state.next_override;
        state.next_override += 1;
        state.overrides.insert(id, rule);
        OverrideGuard {
            surface: self.clone(),
            id,
        }
    }

    /// Active overrides, oldest first.
    pub fn overrides(&self) -> Vec<Rule> {
        self.inner.read().overrides.values().cloned().collect()
    }
}

/// Removes its override from the surface when dropped.
pub struct OverrideGuard {
    surface: Surface,
    id: u64,
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        self.surface.inner.write().overrides.remove(&self.id);
    }
}
