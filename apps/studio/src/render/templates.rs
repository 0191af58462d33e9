//! Turns a document into the visual tree of one of the built-in themes.
//!
//! Rows whose fields are all blank are skipped, and a section left with no
//! rows is omitted entirely.

use chrono::NaiveDate;

use crate::models::resume::{
    Certification, Document, Education, Entry, Language, Project, Skill, WorkExperience,
};
use crate::render::theme::Theme;
use crate::render::tree::VisualNode;

pub fn build(theme: Theme, doc: &Document) -> VisualNode {
    let page = VisualNode::new("div")
        .class("page")
        .class(&format!("page-{}", theme.id()));

    match theme {
        Theme::Modern => {
            let sidebar = VisualNode::new("aside").class("sidebar").children(
                [
                    contact_section(doc),
                    skills_section("Skills", &doc.skills),
                    levels_section("Languages", &doc.languages),
                    interests_section(&doc.interests),
                ]
                .into_iter()
                .flatten(),
            );
            let main = VisualNode::new("main")
                .class("main")
                .child(header(doc, true))
                .children(
                    [
                        work_section(&doc.work_experience),
                        projects_section(&doc.projects),
                        education_section(&doc.education),
                        certifications_section(&doc.certifications),
                    ]
                    .into_iter()
                    .flatten(),
                );
            page.child(sidebar).child(main)
        }

        Theme::Classic => {
            let mut head = header(doc, false);
            if let Some(line) = contact_line(doc) {
                head = head.child(VisualNode::new("p").class("contact-line").text(line));
            }
            page.child(head).children(
                [
                    summary_section(doc),
                    work_section(&doc.work_experience),
                    education_section(&doc.education),
                    projects_section(&doc.projects),
                    skills_section("Skills", &doc.skills),
                    certifications_section(&doc.certifications),
                    levels_section("Languages", &doc.languages),
                    interests_section(&doc.interests),
                ]
                .into_iter()
                .flatten(),
            )
        }

        Theme::Compact => {
            let mut head = header(doc, false);
            let contacts = contact_items(doc);
            if !contacts.is_empty() {
                head = head.child(
                    VisualNode::new("div").class("tag-list").children(
                        contacts
                            .into_iter()
                            .map(|c| VisualNode::new("span").class("contact-item").text(c)),
                    ),
                );
            }
            let body = VisualNode::new("div").class("body").children(
                [
                    summary_section(doc),
                    work_section(&doc.work_experience),
                    projects_section(&doc.projects),
                    education_section(&doc.education),
                    skills_section("Skills", &doc.skills),
                    certifications_section(&doc.certifications),
                    levels_section("Languages", &doc.languages),
                    interests_section(&doc.interests),
                ]
                .into_iter()
                .flatten(),
            );
            page.child(head).child(body)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

/// `YYYY-MM` or `YYYY-MM-DD` as `Mon YYYY`; anything else is returned trimmed.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"));
    match parsed {
        Ok(date) => date.format("%b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn date_range(start: &str, end: &str) -> Option<String> {
    match (start.trim().is_empty(), end.trim().is_empty()) {
        (true, true) => None,
        (false, true) => Some(format!("{} - Present", format_date(start))),
        (true, false) => Some(format_date(end)),
        (false, false) => Some(format!("{} - {}", format_date(start), format_date(end))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Building blocks
// ────────────────────────────────────────────────────────────────────────────

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn text_node(tag: &str, class: &str, value: &str) -> Option<VisualNode> {
    non_blank(value).map(|v| VisualNode::new(tag).class(class).text(v))
}

fn section(title: &str, class: &str, rows: Vec<VisualNode>) -> Option<VisualNode> {
    if rows.is_empty() {
        return None;
    }
    Some(
        VisualNode::new("section")
            .class("section")
            .class(class)
            .child(VisualNode::new("h2").class("section-title").text(title))
            .children(rows),
    )
}

fn visible<T: Entry>(rows: &[T]) -> impl Iterator<Item = &T> {
    rows.iter().filter(|row| !row.is_blank())
}

fn header(doc: &Document, with_summary: bool) -> VisualNode {
    let profile = &doc.profile;
    let mut nodes = vec![
        text_node("h1", "name", &profile.full_name),
        text_node("p", "designation", &profile.designation),
    ];
    if with_summary {
        nodes.push(text_node("p", "summary", &profile.summary));
    }
    VisualNode::new("header")
        .class("header")
        .children(nodes.into_iter().flatten())
}

fn summary_section(doc: &Document) -> Option<VisualNode> {
    let summary = text_node("p", "summary", &doc.profile.summary)?;
    section("Summary", "summary-section", vec![summary])
}

fn contact_items(doc: &Document) -> Vec<String> {
    let contact = &doc.contact;
    let mut items: Vec<String> = [&contact.email, &contact.phone, &contact.location, &contact.website]
        .into_iter()
        .filter_map(|v| non_blank(v).map(str::to_string))
        .collect();
    for (platform, url) in &contact.social_links {
        if let Some(url) = non_blank(url) {
            items.push(format!("{platform}: {url}"));
        }
    }
    items
}

fn contact_line(doc: &Document) -> Option<String> {
    let items = contact_items(doc);
    (!items.is_empty()).then(|| items.join(" | "))
}

fn contact_section(doc: &Document) -> Option<VisualNode> {
    let rows = contact_items(doc)
        .into_iter()
        .map(|item| VisualNode::new("p").class("contact-item").text(item))
        .collect();
    section("Contact", "contact", rows)
}

fn entry_head(title: &str, dates: Option<String>) -> VisualNode {
    let mut head = VisualNode::new("div").class("entry-head");
    if let Some(title) = text_node("p", "entry-title", title) {
        head = head.child(title);
    }
    if let Some(dates) = dates {
        head = head.child(VisualNode::new("p").class("entry-dates").text(dates));
    }
    head
}

fn work_section(rows: &[WorkExperience]) -> Option<VisualNode> {
    let entries = visible(rows)
        .map(|job| {
            let title = non_blank(&job.role).unwrap_or(&job.company);
            let sub = if non_blank(&job.role).is_some() { job.company.as_str() } else { "" };
            VisualNode::new("div")
                .class("entry")
                .child(entry_head(title, date_range(&job.start_date, &job.end_date)))
                .children(
                    [
                        text_node("p", "entry-sub", sub),
                        text_node("p", "entry-body", &job.description),
                    ]
                    .into_iter()
                    .flatten(),
                )
        })
        .collect();
    section("Work Experience", "work-experience", entries)
}

fn education_section(rows: &[Education]) -> Option<VisualNode> {
    let entries = visible(rows)
        .map(|edu| {
            VisualNode::new("div")
                .class("entry")
                .child(entry_head(&edu.degree, date_range(&edu.start_date, &edu.end_date)))
                .children(text_node("p", "entry-sub", &edu.institution))
        })
        .collect();
    section("Education", "education", entries)
}

fn projects_section(rows: &[Project]) -> Option<VisualNode> {
    let entries = visible(rows)
        .map(|project| {
            let links: Vec<&str> = [&project.repo_link, &project.demo_link]
                .into_iter()
                .filter_map(|l| non_blank(l))
                .collect();
            VisualNode::new("div")
                .class("entry")
                .child(entry_head(&project.title, None))
                .children(
                    [
                        text_node("p", "entry-body", &project.description),
                        text_node("p", "entry-sub", &links.join(" | ")),
                    ]
                    .into_iter()
                    .flatten(),
                )
        })
        .collect();
    section("Projects", "projects", entries)
}

fn certifications_section(rows: &[Certification]) -> Option<VisualNode> {
    let entries = visible(rows)
        .map(|cert| {
            let year = non_blank(&cert.year).map(str::to_string);
            VisualNode::new("div")
                .class("entry")
                .child(entry_head(&cert.title, year))
                .children(text_node("p", "entry-sub", &cert.issuer))
        })
        .collect();
    section("Certifications", "certifications", entries)
}

fn level_row(name: &str, level: u8) -> VisualNode {
    VisualNode::new("div")
        .class("skill")
        .children(text_node("p", "skill-name", name))
        .child(
            VisualNode::new("div").class("skill-bar").child(
                VisualNode::new("div")
                    .class("skill-fill")
                    .style("width", format!("{level}%")),
            ),
        )
}

fn skills_section(title: &str, rows: &[Skill]) -> Option<VisualNode> {
    let entries = visible(rows)
        .map(|skill| level_row(&skill.name, skill.level.get()))
        .collect();
    section(title, "skills", entries)
}

fn levels_section(title: &str, rows: &[Language]) -> Option<VisualNode> {
    let entries = visible(rows)
        .map(|lang| level_row(&lang.name, lang.level.get()))
        .collect();
    section(title, "languages", entries)
}

fn interests_section(rows: &[String]) -> Option<VisualNode> {
    let tags: Vec<VisualNode> = visible(rows)
        .map(|interest| VisualNode::new("span").class("tag").text(interest.trim()))
        .collect();
    if tags.is_empty() {
        return None;
    }
    section(
        "Interests",
        "interests",
        vec![VisualNode::new("div").class("tag-list").children(tags)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Level;

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date("2020-01"), "Jan 2020");
        assert_eq!(format_date("2023-11-15"), "Nov 2023");
        assert_eq!(format_date("Summer 2019"), "Summer 2019");
        assert_eq!(format_date("2020-13"), "2020-13");
    }

    #[test]
    fn test_date_range_variants() {
        assert_eq!(date_range("", ""), None);
        assert_eq!(date_range("2020-01", "").as_deref(), Some("Jan 2020 - Present"));
        assert_eq!(
            date_range("2020-01", "2022-06").as_deref(),
            Some("Jan 2020 - Jun 2022")
        );
    }

    #[test]
    fn test_blank_rows_and_empty_sections_are_omitted() {
        let mut doc = Document::blank();
        doc.work_experience[0].company = "Acme".into();
        doc.work_experience.push(WorkExperience::default());

        let root = build(Theme::Classic, &doc);
        let work = root.find_class("work-experience").unwrap();
        // title + one entry
        assert_eq!(work.children.len(), 2);
        assert!(root.find_class("education").is_none());
        assert!(root.find_class("interests").is_none());
    }

    #[test]
    fn test_modern_has_sidebar_and_main() {
        let mut doc = Document::blank();
        doc.profile.full_name = "Jane Doe".into();
        doc.skills[0].name = "Rust".into();
        doc.skills[0].level = Level::new(80);

        let root = build(Theme::Modern, &doc);
        assert!(root.has_class("page-modern"));
        let sidebar = root.find_class("sidebar").unwrap();
        let fill = sidebar.find_class("skill-fill").unwrap();
        assert_eq!(fill.style.get("width").map(String::as_str), Some("80%"));
        let main = root.find_class("main").unwrap();
        assert_eq!(main.find_class("name").unwrap().text.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_work_entry_content_order() {
        let mut doc = Document::blank();
        let job = &mut doc.work_experience[0];
        job.role = "Engineer".into();
        job.company = "Acme".into();
        job.start_date = "2021-03".into();
        job.description = "Built the billing pipeline".into();

        let root = build(Theme::Compact, &doc);
        let entry = root.find_class("work-experience").unwrap().find_class("entry").unwrap();
        assert_eq!(
            entry.texts(),
            vec!["Engineer", "Mar 2021 - Present", "Acme", "Built the billing pipeline"]
        );
    }

    #[test]
    fn test_contact_line_includes_social_links() {
        let mut doc = Document::blank();
        doc.contact.email = "jane@example.com".into();
        doc.contact
            .social_links
            .insert("github".into(), "github.com/jane".into());
        let root = build(Theme::Classic, &doc);
        let line = root.find_class("contact-line").unwrap();
        assert_eq!(line.text.as_deref(), Some("jane@example.com | github: github.com/jane"));
    }
}
