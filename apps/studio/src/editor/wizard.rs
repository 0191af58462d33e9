use serde::{Deserialize, Serialize};

use crate::editor::validation::validate_step;
use crate::models::resume::Document;

/// Form steps, in the order the wizard walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    ProfileInfo,
    ContactInfo,
    WorkExperience,
    EducationInfo,
    Skills,
    Projects,
    Certifications,
    AdditionalInfo,
}

impl WizardStep {
    pub const ALL: [WizardStep; 8] = [
        WizardStep::ProfileInfo,
        WizardStep::ContactInfo,
        WizardStep::WorkExperience,
        WizardStep::EducationInfo,
        WizardStep::Skills,
        WizardStep::Projects,
        WizardStep::Certifications,
        WizardStep::AdditionalInfo,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn slug(self) -> &'static str {
        match self {
            WizardStep::ProfileInfo => "profile-info",
            WizardStep::ContactInfo => "contact-info",
            WizardStep::WorkExperience => "work-experience",
            WizardStep::EducationInfo => "education-info",
            WizardStep::Skills => "skills",
            WizardStep::Projects => "projects",
            WizardStep::Certifications => "certifications",
            WizardStep::AdditionalInfo => "additional-info",
        }
    }

    /// `round(100 * index / 7)`.
    pub fn progress(self) -> u8 {
        let last = (Self::ALL.len() - 1) as f64;
        (self.index() as f64 * 100.0 / last).round() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Moved(WizardStep),
    /// The last step validated; the caller should offer the export.
    ReadyToExport,
    Rejected(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatOutcome {
    Moved(WizardStep),
    /// Already on the first step; the caller leaves the editor.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: WizardStep,
    pub validation_errors: Vec<String>,
    pub progress: u8,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::ProfileInfo,
            validation_errors: Vec::new(),
            progress: 0,
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the current step against `document` and moves forward when
    /// it passes. A rejected advance keeps the step and records every failure.
    pub fn advance(&mut self, document: &Document) -> AdvanceOutcome {
        let errors = validate_step(self.current_step, document);
        if !errors.is_empty() {
            tracing::debug!(
                step = self.current_step.slug(),
                failures = errors.len(),
                "step validation failed"
            );
            self.validation_errors = errors.clone();
            return AdvanceOutcome::Rejected(errors);
        }

        self.validation_errors.clear();
        match self.current_step.next() {
            Some(next) => {
                self.move_to(next);
                AdvanceOutcome::Moved(next)
            }
            None => AdvanceOutcome::ReadyToExport,
        }
    }

    /// Steps back without validating.
    pub fn retreat(&mut self) -> RetreatOutcome {
        match self.current_step.previous() {
            Some(previous) => {
                self.move_to(previous);
                RetreatOutcome::Moved(previous)
            }
            None => RetreatOutcome::Exit,
        }
    }

    fn move_to(&mut self, step: WizardStep) {
        self.current_step = step;
        self.progress = step.progress();
    }
}
