//! The resume document shared by the editor, the renderer, and the store.
//!
//! Every repeating section always holds at least one row so the form has
//! something to edit; rows are positional and their order is the display order.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Theme a brand-new document starts with.
pub const DEFAULT_THEME: &str = "modern";

// ────────────────────────────────────────────────────────────────────────────
// Field values and edit errors
// ────────────────────────────────────────────────────────────────────────────

/// Proficiency level, always within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub const MAX: u8 = 100;

    /// Builds a level, clamping out-of-range input instead of rejecting it.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored levels may be floats or null; both collapse into the clamped range.
        let raw = Option::<f64>::deserialize(deserializer)?;
        Ok(match raw {
            Some(v) if v.is_finite() => Level::new(v.round() as i64),
            _ => Level::default(),
        })
    }
}

/// A value written into a single form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Level(i64),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Level(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown field '{field}' in {section}")]
    UnknownField {
        section: &'static str,
        field: String,
    },

    #[error("field '{field}' in {section} expects {expected}")]
    WrongKind {
        section: &'static str,
        field: String,
        expected: &'static str,
    },

    #[error("row {index} is out of range for {section} ({len} rows)")]
    RowOutOfRange {
        section: &'static str,
        index: usize,
        len: usize,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

/// A row of a repeating section.
///
/// `FIELDS` lists the keys the form can write; `filled_fields` counts how many
/// of them currently hold something (the completion estimator relies on it).
pub trait Entry: Clone + Default + PartialEq {
    const SECTION: &'static str;
    const FIELDS: &'static [&'static str];

    fn filled_fields(&self) -> usize;

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError>;

    fn is_blank(&self) -> bool {
        self.filled_fields() == 0
    }
}

/// 1 when the trimmed string has content, else 0.
pub(crate) fn filled(value: &str) -> usize {
    usize::from(!value.trim().is_empty())
}

fn text_value<E: Entry>(key: &str, value: FieldValue) -> Result<String, EditError> {
    match value {
        FieldValue::Text(text) => Ok(text),
        FieldValue::Level(_) => Err(EditError::WrongKind {
            section: E::SECTION,
            field: key.to_string(),
            expected: "text",
        }),
    }
}

fn level_value<E: Entry>(key: &str, value: FieldValue) -> Result<Level, EditError> {
    match value {
        FieldValue::Level(level) => Ok(Level::new(level)),
        FieldValue::Text(_) => Err(EditError::WrongKind {
            section: E::SECTION,
            field: key.to_string(),
            expected: "a level",
        }),
    }
}

fn unknown<E: Entry>(key: &str) -> EditError {
    EditError::UnknownField {
        section: E::SECTION,
        field: key.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl Entry for WorkExperience {
    const SECTION: &'static str = "workExperience";
    const FIELDS: &'static [&'static str] =
        &["role", "company", "startDate", "endDate", "description"];

    fn filled_fields(&self) -> usize {
        filled(&self.role)
            + filled(&self.company)
            + filled(&self.start_date)
            + filled(&self.end_date)
            + filled(&self.description)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        let slot = match key {
            "role" => &mut self.role,
            "company" => &mut self.company,
            "startDate" => &mut self.start_date,
            "endDate" => &mut self.end_date,
            "description" => &mut self.description,
            _ => return Err(unknown::<Self>(key)),
        };
        *slot = text_value::<Self>(key, value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub start_date: String,
    pub end_date: String,
}

impl Entry for Education {
    const SECTION: &'static str = "education";
    const FIELDS: &'static [&'static str] = &["degree", "institution", "startDate", "endDate"];

    fn filled_fields(&self) -> usize {
        filled(&self.degree)
            + filled(&self.institution)
            + filled(&self.start_date)
            + filled(&self.end_date)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        let slot = match key {
            "degree" => &mut self.degree,
            "institution" => &mut self.institution,
            "startDate" => &mut self.start_date,
            "endDate" => &mut self.end_date,
            _ => return Err(unknown::<Self>(key)),
        };
        *slot = text_value::<Self>(key, value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub name: String,
    pub level: Level,
}

impl Entry for Skill {
    const SECTION: &'static str = "skills";
    const FIELDS: &'static [&'static str] = &["name", "level"];

    fn filled_fields(&self) -> usize {
        filled(&self.name) + usize::from(self.level.get() > 0)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        match key {
            "name" => self.name = text_value::<Self>(key, value)?,
            "level" => self.level = level_value::<Self>(key, value)?,
            _ => return Err(unknown::<Self>(key)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub repo_link: String,
    pub demo_link: String,
}

impl Entry for Project {
    const SECTION: &'static str = "projects";
    const FIELDS: &'static [&'static str] = &["title", "description", "repoLink", "demoLink"];

    fn filled_fields(&self) -> usize {
        filled(&self.title)
            + filled(&self.description)
            + filled(&self.repo_link)
            + filled(&self.demo_link)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        let slot = match key {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "repoLink" => &mut self.repo_link,
            "demoLink" => &mut self.demo_link,
            _ => return Err(unknown::<Self>(key)),
        };
        *slot = text_value::<Self>(key, value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certification {
    pub title: String,
    pub issuer: String,
    pub year: String,
}

impl Entry for Certification {
    const SECTION: &'static str = "certifications";
    const FIELDS: &'static [&'static str] = &["title", "issuer", "year"];

    fn filled_fields(&self) -> usize {
        filled(&self.title) + filled(&self.issuer) + filled(&self.year)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        let slot = match key {
            "title" => &mut self.title,
            "issuer" => &mut self.issuer,
            "year" => &mut self.year,
            _ => return Err(unknown::<Self>(key)),
        };
        *slot = text_value::<Self>(key, value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub name: String,
    pub level: Level,
}

impl Entry for Language {
    const SECTION: &'static str = "languages";
    const FIELDS: &'static [&'static str] = &["name", "level"];

    fn filled_fields(&self) -> usize {
        filled(&self.name) + usize::from(self.level.get() > 0)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        match key {
            "name" => self.name = text_value::<Self>(key, value)?,
            "level" => self.level = level_value::<Self>(key, value)?,
            _ => return Err(unknown::<Self>(key)),
        }
        Ok(())
    }
}

/// Interests are bare strings; the form writes them under the `interest` key.
impl Entry for String {
    const SECTION: &'static str = "interests";
    const FIELDS: &'static [&'static str] = &["interest"];

    fn filled_fields(&self) -> usize {
        filled(self)
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), EditError> {
        if key != "interest" {
            return Err(unknown::<Self>(key));
        }
        *self = text_value::<Self>(key, value)?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateChoice {
    /// Raw theme identifier. Unknown identifiers are kept and rejected by the renderer.
    pub theme: String,
    pub color_palette: Vec<String>,
}

impl Default for TemplateChoice {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            color_palette: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub full_name: String,
    pub designation: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub social_links: BTreeMap<String, String>,
}

/// The repeating sections of a document, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    WorkExperience,
    Education,
    Skills,
    Projects,
    Certifications,
    Languages,
    Interests,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::WorkExperience,
        Section::Education,
        Section::Skills,
        Section::Projects,
        Section::Certifications,
        Section::Languages,
        Section::Interests,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub title: String,
    pub thumbnail_ref: String,
    pub template: TemplateChoice,
    pub profile: Profile,
    pub contact: Contact,
    #[serde(deserialize_with = "seeded")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(deserialize_with = "seeded")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "seeded")]
    pub skills: Vec<Skill>,
    #[serde(deserialize_with = "seeded")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "seeded")]
    pub certifications: Vec<Certification>,
    #[serde(deserialize_with = "seeded")]
    pub languages: Vec<Language>,
    #[serde(deserialize_with = "seeded")]
    pub interests: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::blank()
    }
}

/// Deserializes a section, seeding one blank row when it arrives empty or null.
fn seeded<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let mut rows = Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default();
    if rows.is_empty() {
        rows.push(T::default());
    }
    Ok(rows)
}

macro_rules! with_rows {
    ($doc:expr, $section:expr, $rows:ident => $body:expr) => {
        match $section {
            Section::WorkExperience => {
                let $rows = &mut $doc.work_experience;
                $body
            }
            Section::Education => {
                let $rows = &mut $doc.education;
                $body
            }
            Section::Skills => {
                let $rows = &mut $doc.skills;
                $body
            }
            Section::Projects => {
                let $rows = &mut $doc.projects;
                $body
            }
            Section::Certifications => {
                let $rows = &mut $doc.certifications;
                $body
            }
            Section::Languages => {
                let $rows = &mut $doc.languages;
                $body
            }
            Section::Interests => {
                let $rows = &mut $doc.interests;
                $body
            }
        }
    };
}

impl Document {
    /// An empty document: blank strings, zero levels, one blank row per section.
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            thumbnail_ref: String::new(),
            template: TemplateChoice::default(),
            profile: Profile::default(),
            contact: Contact::default(),
            work_experience: vec![WorkExperience::default()],
            education: vec![Education::default()],
            skills: vec![Skill::default()],
            projects: vec![Project::default()],
            certifications: vec![Certification::default()],
            languages: vec![Language::default()],
            interests: vec![String::new()],
        }
    }

    /// Restores the one-row-per-section invariant after a struct-literal build.
    pub fn normalize(&mut self) {
        for section in Section::ALL {
            with_rows!(self, section, rows => {
                if rows.is_empty() {
                    rows.push(Default::default());
                }
            });
        }
    }

    pub fn row_count(&self, section: Section) -> usize {
        match section {
            Section::WorkExperience => self.work_experience.len(),
            Section::Education => self.education.len(),
            Section::Skills => self.skills.len(),
            Section::Projects => self.projects.len(),
            Section::Certifications => self.certifications.len(),
            Section::Languages => self.languages.len(),
            Section::Interests => self.interests.len(),
        }
    }

    /// Appends a blank row at the end of the section.
    pub fn push_row(&mut self, section: Section) {
        with_rows!(self, section, rows => rows.push(Default::default()));
    }

    /// Inserts a blank row at `index` (`index == len` appends).
    pub fn insert_row(&mut self, section: Section, index: usize) -> Result<(), EditError> {
        with_rows!(self, section, rows => insert_blank(rows, index))
    }

    /// Removes the row at `index`. Removing the only row resets it to blank.
    pub fn remove_row(&mut self, section: Section, index: usize) -> Result<(), EditError> {
        with_rows!(self, section, rows => remove_at(rows, index))
    }

    pub fn set_row_field(
        &mut self,
        section: Section,
        index: usize,
        key: &str,
        value: FieldValue,
    ) -> Result<(), EditError> {
        with_rows!(self, section, rows => set_at(rows, index, key, value))
    }
}

fn out_of_range<T: Entry>(index: usize, len: usize) -> EditError {
    EditError::RowOutOfRange {
        section: T::SECTION,
        index,
        len,
    }
}

fn insert_blank<T: Entry>(rows: &mut Vec<T>, index: usize) -> Result<(), EditError> {
    if index > rows.len() {
        return Err(out_of_range::<T>(index, rows.len()));
    }
    rows.insert(index, T::default());
    Ok(())
}

fn remove_at<T: Entry>(rows: &mut Vec<T>, index: usize) -> Result<(), EditError> {
    if index >= rows.len() {
        return Err(out_of_range::<T>(index, rows.len()));
    }
    rows.remove(index);
    if rows.is_empty() {
        rows.push(T::default());
    }
    Ok(())
}

fn set_at<T: Entry>(
    rows: &mut [T],
    index: usize,
    key: &str,
    value: FieldValue,
) -> Result<(), EditError> {
    let len = rows.len();
    let row = rows
        .get_mut(index)
        .ok_or_else(|| out_of_range::<T>(index, len))?;
    row.set_field(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_document_seeds_every_section() {
        let doc = Document::blank();
        for section in Section::ALL {
            assert_eq!(doc.row_count(section), 1, "{section:?} should hold one row");
        }
        assert_eq!(doc.template.theme, DEFAULT_THEME);
        assert!(doc.skills[0].is_blank());
    }

    #[test]
    fn test_level_clamps_on_construction() {
        assert_eq!(Level::new(150).get(), 100);
        assert_eq!(Level::new(-3).get(), 0);
        assert_eq!(Level::new(42).get(), 42);
    }

    #[test]
    fn test_level_deserializes_floats_and_null() {
        let skill: Skill = serde_json::from_value(json!({"name": "Rust", "level": 72.6})).unwrap();
        assert_eq!(skill.level.get(), 73);
        let skill: Skill = serde_json::from_value(json!({"name": "Go", "level": 180})).unwrap();
        assert_eq!(skill.level.get(), 100);
        let skill: Skill = serde_json::from_value(json!({"name": "C", "level": null})).unwrap();
        assert_eq!(skill.level.get(), 0);
    }

    #[test]
    fn test_empty_sections_are_seeded_on_deserialize() {
        let doc: Document = serde_json::from_value(json!({
            "title": "CV",
            "skills": [],
            "interests": null
        }))
        .unwrap();
        assert_eq!(doc.skills.len(), 1);
        assert_eq!(doc.interests, vec![String::new()]);
        // Missing sections fall back to the blank document.
        assert_eq!(doc.work_experience.len(), 1);
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let mut doc = Document::blank();
        doc.profile.full_name = "Jane Doe".to_string();
        doc.thumbnail_ref = "https://media/x.png".to_string();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["profile"]["fullName"], "Jane Doe");
        assert_eq!(value["thumbnailRef"], "https://media/x.png");
        assert!(value["workExperience"].is_array());
        assert!(value["template"]["colorPalette"].is_array());
    }

    #[test]
    fn test_insert_row_is_positional() {
        let mut doc = Document::blank();
        doc.set_row_field(Section::Projects, 0, "title", "First".into())
            .unwrap();
        doc.push_row(Section::Projects);
        doc.set_row_field(Section::Projects, 1, "title", "Third".into())
            .unwrap();
        doc.insert_row(Section::Projects, 1).unwrap();
        doc.set_row_field(Section::Projects, 1, "title", "Second".into())
            .unwrap();

        let titles: Vec<_> = doc.projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_insert_row_past_end_is_rejected() {
        let mut doc = Document::blank();
        let err = doc.insert_row(Section::Education, 5).unwrap_err();
        assert_eq!(
            err,
            EditError::RowOutOfRange {
                section: "education",
                index: 5,
                len: 1
            }
        );
    }

    #[test]
    fn test_removing_last_row_resets_it() {
        let mut doc = Document::blank();
        doc.set_row_field(Section::Interests, 0, "interest", "Chess".into())
            .unwrap();
        doc.remove_row(Section::Interests, 0).unwrap();
        assert_eq!(doc.interests, vec![String::new()]);
    }

    #[test]
    fn test_remove_row_keeps_remaining_order() {
        let mut doc = Document::blank();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            if i > 0 {
                doc.push_row(Section::Skills);
            }
            doc.set_row_field(Section::Skills, i, "name", (*name).into())
                .unwrap();
        }
        doc.remove_row(Section::Skills, 1).unwrap();
        let names: Vec<_> = doc.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_set_field_rejects_unknown_key_and_wrong_kind() {
        let mut doc = Document::blank();
        let err = doc
            .set_row_field(Section::WorkExperience, 0, "salary", "lots".into())
            .unwrap_err();
        assert!(matches!(err, EditError::UnknownField { .. }));

        let err = doc
            .set_row_field(Section::Languages, 0, "level", "fluent".into())
            .unwrap_err();
        assert!(matches!(err, EditError::WrongKind { .. }));
    }

    #[test]
    fn test_level_field_clamps_through_edit_path() {
        let mut doc = Document::blank();
        doc.set_row_field(Section::Languages, 0, "level", FieldValue::Level(250))
            .unwrap();
        assert_eq!(doc.languages[0].level.get(), 100);
    }

    #[test]
    fn test_normalize_restores_invariant() {
        let mut doc = Document::blank();
        doc.certifications.clear();
        doc.interests.clear();
        doc.normalize();
        assert_eq!(doc.certifications.len(), 1);
        assert_eq!(doc.interests.len(), 1);
    }
}
