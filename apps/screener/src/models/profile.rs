use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    /// "<start> - <end>" as written in the resume, e.g. "Jan 2020 - Present".
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub title: String,
    pub description: String,
}

/// Structured view of one resume, produced once by the parser and never mutated afterwards.
///
/// Every field is best-effort: a heuristic miss leaves the field empty or `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub raw_text: String,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    /// Lower-cased, deduplicated.
    pub skills: BTreeSet<String>,
    /// Explicit "N years of experience" mention, else the number of experience entries.
    pub experience_years: u32,
    pub experience_entries: Vec<ExperienceEntry>,
    pub education_entries: Vec<EducationEntry>,
    pub project_entries: Vec<ProjectEntry>,
    pub certifications: Vec<String>,
}
