//! Per-step form rules. Every rule of a step is checked, so the user sees the
//! whole list of problems at once rather than one per click.

use std::sync::LazyLock;

use regex::Regex;

use crate::editor::wizard::WizardStep;
use crate::models::resume::Document;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("phone pattern compiles"));

/// Returns every failure message for `step`, in rule order. Empty means valid.
pub fn validate_step(step: WizardStep, document: &Document) -> Vec<String> {
    let mut errors = Vec::new();

    match step {
        WizardStep::ProfileInfo => {
            let profile = &document.profile;
            require(&mut errors, &profile.full_name, "Full Name is required");
            require(&mut errors, &profile.designation, "Designation is required");
            require(&mut errors, &profile.summary, "Summary is required");
        }

        WizardStep::ContactInfo => {
            let email = document.contact.email.trim();
            if email.is_empty() || !EMAIL.is_match(email) {
                errors.push("Valid email is required".to_string());
            }
            let phone = document.contact.phone.trim();
            if phone.is_empty() || !PHONE.is_match(phone) {
                errors.push("Valid 10-digit phone number is required".to_string());
            }
        }

        WizardStep::WorkExperience => {
            for (i, job) in document.work_experience.iter().enumerate() {
                let n = i + 1;
                require(&mut errors, &job.company, &format!("Company is required in experience {n}"));
                require(&mut errors, &job.role, &format!("Role is required in experience {n}"));
                if blank(&job.start_date) || blank(&job.end_date) {
                    errors.push(format!("Start and End dates are required in experience {n}"));
                }
            }
        }

        WizardStep::EducationInfo => {
            for (i, edu) in document.education.iter().enumerate() {
                let n = i + 1;
                require(&mut errors, &edu.degree, &format!("Degree is required in education {n}"));
                require(
                    &mut errors,
                    &edu.institution,
                    &format!("Institution is required in education {n}"),
                );
                if blank(&edu.start_date) || blank(&edu.end_date) {
                    errors.push(format!("Start and End dates are required in education {n}"));
                }
            }
        }

        WizardStep::Skills => {
            for (i, skill) in document.skills.iter().enumerate() {
                let n = i + 1;
                require(&mut errors, &skill.name, &format!("Skill name is required in skill {n}"));
                if !(1..=100).contains(&skill.level.get()) {
                    errors.push(format!("Skill level must be between 1 and 100 in skill {n}"));
                }
            }
        }

        WizardStep::Projects => {
            for (i, project) in document.projects.iter().enumerate() {
                let n = i + 1;
                require(&mut errors, &project.title, &format!("Project title is required in project {n}"));
                require(
                    &mut errors,
                    &project.description,
                    &format!("Project description is required in project {n}"),
                );
            }
        }

        WizardStep::Certifications => {
            for (i, cert) in document.certifications.iter().enumerate() {
                let n = i + 1;
                require(
                    &mut errors,
                    &cert.title,
                    &format!("Certification title is required in certification {n}"),
                );
                require(&mut errors, &cert.issuer, &format!("Issuer is required in certification {n}"));
            }
        }

        WizardStep::AdditionalInfo => {
            if !document.languages.iter().any(|l| !blank(&l.name)) {
                errors.push("At least one language is required".to_string());
            }
            if !document.interests.iter().any(|i| !blank(i)) {
                errors.push("At least one interest is required".to_string());
            }
        }
    }

    errors
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(errors: &mut Vec<String>, value: &str, message: &str) {
    if blank(value) {
        errors.push(message.to_string());
    }
}
