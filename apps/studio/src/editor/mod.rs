//! The editing session for one document.
//!
//! `ResumeEditor` is the only mutation path for a document while it is open:
//! every edit goes through it so the completion score is recomputed on each
//! change and the wizard always sees the latest state.

pub mod completion;
pub mod validation;
pub mod wizard;

use uuid::Uuid;

use crate::models::record::StoredResume;
use crate::models::resume::{Document, EditError, FieldValue, Section};
use crate::render::surface::{Surface, TargetKind};
use crate::render::{render, RenderError};

pub use wizard::{AdvanceOutcome, RetreatOutcome, WizardState, WizardStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    Designation,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Email,
    Phone,
    Location,
    Website,
}

#[derive(Debug, Clone)]
pub struct ResumeEditor {
    id: Option<Uuid>,
    document: Document,
    wizard: WizardState,
    completion: u8,
}

impl Default for ResumeEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumeEditor {
    /// A fresh, unsaved blank document.
    pub fn new() -> Self {
        Self::with_document(None, Document::blank())
    }

    /// Opens a stored document. The wizard always starts at the first step.
    pub fn open(stored: StoredResume) -> Self {
        let mut document = stored.document;
        document.normalize();
        Self::with_document(Some(stored.id), document)
    }

    fn with_document(id: Option<Uuid>, document: Document) -> Self {
        let completion = completion::estimate(&document);
        Self {
            id,
            document,
            wizard: WizardState::new(),
            completion,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn wizard(&self) -> &WizardState {
        &self.wizard
    }

    pub fn completion(&self) -> u8 {
        self.completion
    }

    pub fn progress(&self) -> u8 {
        self.wizard.progress
    }

    pub fn current_step(&self) -> WizardStep {
        self.wizard.current_step
    }

    fn edit<R>(&mut self, apply: impl FnOnce(&mut Document) -> R) -> R {
        let result = apply(&mut self.document);
        self.completion = completion::estimate(&self.document);
        result
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.edit(|doc| doc.title = title);
    }

    /// Switches theme and drops the custom palette, which was picked for the old one.
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        let theme = theme.into();
        self.edit(|doc| {
            doc.template.theme = theme;
            doc.template.color_palette.clear();
        });
    }

    pub fn set_palette(&mut self, palette: Vec<String>) {
        self.edit(|doc| doc.template.color_palette = palette);
    }

    pub fn set_profile_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        self.edit(|doc| {
            let slot = match field {
                ProfileField::FullName => &mut doc.profile.full_name,
                ProfileField::Designation => &mut doc.profile.designation,
                ProfileField::Summary => &mut doc.profile.summary,
            };
            *slot = value;
        });
    }

    pub fn set_contact_field(&mut self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        self.edit(|doc| {
            let slot = match field {
                ContactField::Email => &mut doc.contact.email,
                ContactField::Phone => &mut doc.contact.phone,
                ContactField::Location => &mut doc.contact.location,
                ContactField::Website => &mut doc.contact.website,
            };
            *slot = value;
        });
    }

    pub fn set_social_link(&mut self, platform: impl Into<String>, url: impl Into<String>) {
        let (platform, url) = (platform.into(), url.into());
        self.edit(|doc| {
            doc.contact.social_links.insert(platform, url);
        });
    }

    pub fn remove_social_link(&mut self, platform: &str) -> Option<String> {
        self.edit(|doc| doc.contact.social_links.remove(platform))
    }

    pub fn push_row(&mut self, section: Section) {
        self.edit(|doc| doc.push_row(section));
    }

    pub fn insert_row(&mut self, section: Section, index: usize) -> Result<(), EditError> {
        self.edit(|doc| doc.insert_row(section, index))
    }

    pub fn remove_row(&mut self, section: Section, index: usize) -> Result<(), EditError> {
        self.edit(|doc| doc.remove_row(section, index))
    }

    pub fn set_row_field(
        &mut self,
        section: Section,
        index: usize,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), EditError> {
        let value = value.into();
        self.edit(|doc| doc.set_row_field(section, index, key, value))
    }

    /// Records the reference returned by a successful thumbnail upload.
    pub fn record_thumbnail(&mut self, url: impl Into<String>) {
        self.document.thumbnail_ref = url.into();
    }

    /// Adopts the id a freshly created record was assigned.
    pub fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        self.wizard.advance(&self.document)
    }

    pub fn retreat(&mut self) -> RetreatOutcome {
        self.wizard.retreat()
    }

    /// Renders the document onto the three targets of `surface`: the live
    /// preview at `preview_width`, and the thumbnail and print targets at
    /// intrinsic page size.
    pub fn project(&self, surface: &Surface, preview_width: f32) -> Result<(), RenderError> {
        let theme = self.document.template.theme.as_str();
        let preview = render(&self.document, theme, Some(preview_width))?;
        let page = render(&self.document, theme, None)?;

        surface.mount(TargetKind::Preview, preview);
        surface.mount(TargetKind::Thumbnail, page.clone());
        surface.mount(TargetKind::Print, page);
        Ok(())
    }
}
