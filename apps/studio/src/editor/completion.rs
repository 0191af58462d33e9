//! Completion estimate: how much of a document has been filled in.
//!
//! The same function backs the live editor badge and the `completion` summary
//! the store persists, so the two can never drift apart.

use serde::{Deserialize, Serialize};

use crate::models::resume::{filled, Document, Entry};

/// Filled versus countable fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTally {
    pub filled: usize,
    pub total: usize,
}

impl CompletionTally {
    /// `round(100 * filled / total)`, or 0 when nothing is countable.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.filled.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }

    fn add(&mut self, other: CompletionTally) {
        self.filled += other.filled;
        self.total += other.total;
    }
}

/// Per-section breakdown, in form order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionCompletion {
    pub section: &'static str,
    pub tally: CompletionTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub percentage: u8,
    pub overall: CompletionTally,
    pub sections: Vec<SectionCompletion>,
}

/// Completion percentage of `document`, in `0..=100`.
pub fn estimate(document: &Document) -> u8 {
    report(document).percentage
}

pub fn report(document: &Document) -> CompletionReport {
    let profile = &document.profile;
    let contact = &document.contact;

    let sections = vec![
        SectionCompletion {
            section: "profile",
            tally: CompletionTally {
                filled: filled(&profile.full_name)
                    + filled(&profile.designation)
                    + filled(&profile.summary),
                total: 3,
            },
        },
        SectionCompletion {
            section: "contact",
            tally: CompletionTally {
                filled: filled(&contact.email) + filled(&contact.phone),
                total: 2,
            },
        },
        rows(&document.work_experience),
        rows(&document.education),
        rows(&document.skills),
        rows(&document.projects),
        rows(&document.certifications),
        rows(&document.languages),
        rows(&document.interests),
    ];

    let mut overall = CompletionTally::default();
    for section in &sections {
        overall.add(section.tally);
    }

    CompletionReport {
        percentage: overall.percentage(),
        overall,
        sections,
    }
}

fn rows<T: Entry>(rows: &[T]) -> SectionCompletion {
    SectionCompletion {
        section: T::SECTION,
        tally: CompletionTally {
            filled: rows.iter().map(Entry::filled_fields).sum(),
            total: rows.len() * T::FIELDS.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{FieldValue, Section};

    #[test]
    fn test_zero_total_is_zero_percent() {
        let tally = CompletionTally {
            filled: 0,
            total: 0,
        };
        assert_eq!(tally.percentage(), 0);
    }

    #[test]
    fn test_blank_document_is_zero() {
        assert_eq!(estimate(&Document::blank()), 0);
    }

    #[test]
    fn test_single_name_raises_score() {
        let mut doc = Document::blank();
        doc.profile.full_name = "Jane Doe".to_string();
        // 1 of 3+2+5+4+2+4+3+2+1 = 26 fields
        assert_eq!(report(&doc).overall.total, 26);
        assert_eq!(estimate(&doc), 4);
    }

    #[test]
    fn test_whitespace_does_not_count_as_filled() {
        let mut doc = Document::blank();
        doc.profile.summary = "   ".to_string();
        doc.interests[0] = "\t".to_string();
        assert_eq!(estimate(&doc), 0);
    }

    #[test]
    fn test_zero_level_is_not_filled() {
        let mut doc = Document::blank();
        doc.skills[0].name = "Rust".to_string();
        let before = report(&doc).overall.filled;
        doc.set_row_field(Section::Skills, 0, "level", FieldValue::Level(0))
            .unwrap();
        assert_eq!(report(&doc).overall.filled, before);
        doc.set_row_field(Section::Skills, 0, "level", FieldValue::Level(1))
            .unwrap();
        assert_eq!(report(&doc).overall.filled, before + 1);
    }

    #[test]
    fn test_extra_rows_grow_the_total() {
        let mut doc = Document::blank();
        doc.push_row(Section::WorkExperience);
        doc.push_row(Section::Interests);
        assert_eq!(report(&doc).overall.total, 26 + 5 + 1);
    }

    #[test]
    fn test_fully_filled_document_is_one_hundred() {
        let mut doc = Document::blank();
        doc.profile.full_name = "Jane".into();
        doc.profile.designation = "Engineer".into();
        doc.profile.summary = "Builds things".into();
        doc.contact.email = "jane@example.com".into();
        doc.contact.phone = "5551234567".into();
        for section in Section::ALL {
            let fields = match section {
                Section::WorkExperience => {
                    vec!["role", "company", "startDate", "endDate", "description"]
                }
                Section::Education => vec!["degree", "institution", "startDate", "endDate"],
                Section::Projects => vec!["title", "description", "repoLink", "demoLink"],
                Section::Certifications => vec!["title", "issuer", "year"],
                Section::Skills | Section::Languages => vec!["name"],
                Section::Interests => vec!["interest"],
            };
            for key in fields {
                doc.set_row_field(section, 0, key, "x".into()).unwrap();
            }
        }
        doc.skills[0].level = crate::models::Level::new(50);
        doc.languages[0].level = crate::models::Level::new(50);
        assert_eq!(estimate(&doc), 100);
    }

    #[test]
    fn test_score_never_decreases_while_filling() {
        let mut doc = Document::blank();
        let mut last = estimate(&doc);
        let mut steps: Vec<Box<dyn Fn(&mut Document)>> = vec![
            Box::new(|d| d.profile.full_name = "Jane".into()),
            Box::new(|d| d.contact.phone = "5551234567".into()),
            Box::new(|d| d.work_experience[0].company = "Acme".into()),
            Box::new(|d| d.skills[0].level = crate::models::Level::new(30)),
            Box::new(|d| d.projects[0].demo_link = "https://demo".into()),
            Box::new(|d| d.certifications[0].year = "2024".into()),
            Box::new(|d| d.interests[0] = "Climbing".into()),
        ];
        for step in steps.drain(..) {
            step(&mut doc);
            let now = estimate(&doc);
            assert!(now >= last, "score dropped from {last} to {now}");
            assert!(now <= 100);
            last = now;
        }
        assert!(last > 0);
    }
}
