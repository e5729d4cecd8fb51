//! Resume Field Parser: turns resume text into a `CandidateProfile`.
//!
//! Every extractor is heuristic. A miss produces an empty field, never an error; the only
//! failures are an unusable parser config and a document the extractor cannot open.

pub mod fields;
pub mod sections;
pub mod vocabulary;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::extraction::{self, DocumentFormat, ExtractError};
use crate::models::CandidateProfile;
use sections::{SectionKind, SectionLocator};
pub use vocabulary::{ParserConfig, SectionHeadings};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Invalid parser config: {0}")]
    InvalidConfig(String),
}

impl From<ExtractError> for ParseError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(msg) => ParseError::UnsupportedFormat(msg),
            ExtractError::CorruptDocument(msg) => ParseError::CorruptDocument(msg),
        }
    }
}

/// Compiled parser. Build once and share; parsing takes `&self` and keeps no state.
pub struct ResumeParser {
    vocabulary: Vec<String>,
    certification_keywords: Vec<String>,
    degree_re: Regex,
    sections: SectionLocator,
}

impl ResumeParser {
    pub fn new(config: ParserConfig) -> Result<Self, ParseError> {
        let vocabulary = config.normalized_vocabulary();
        if vocabulary.is_empty() {
            return Err(ParseError::InvalidConfig(
                "skills vocabulary is empty".to_string(),
            ));
        }

        let certification_keywords = config
            .certification_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(Self {
            vocabulary,
            certification_keywords,
            degree_re: fields::build_degree_regex(&config.degree_keywords)?,
            sections: SectionLocator::new(&config.section_headings)?,
        })
    }

    /// Extracts text from a document and parses it.
    pub fn parse_document(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
    ) -> Result<CandidateProfile, ParseError> {
        let text = extraction::extract(bytes, format)?;
        Ok(self.parse(&text))
    }

    pub fn parse(&self, text: &str) -> CandidateProfile {
        let sections = self.sections.split(text);
        let text_lower = text.to_lowercase();

        // The section scan is a precision aid; the whole-document scan decides membership.
        let mut skills: std::collections::BTreeSet<String> = sections
            .get(SectionKind::Skills)
            .map(|s| fields::find_vocabulary_terms(&s.to_lowercase(), &self.vocabulary))
            .unwrap_or_default()
            .into_iter()
            .collect();
        skills.extend(fields::find_vocabulary_terms(&text_lower, &self.vocabulary));

        let experience_entries = sections
            .get(SectionKind::Experience)
            .map(|s| fields::extract_experience_entries(&s))
            .unwrap_or_default();

        // Without a non-zero explicit mention, each listed position counts as roughly one year.
        let experience_years = fields::explicit_experience_years(text)
            .filter(|&years| years > 0)
            .unwrap_or(experience_entries.len() as u32);

        let education_entries = sections
            .get(SectionKind::Education)
            .map(|s| fields::extract_education_entries(&s, &self.degree_re))
            .unwrap_or_default();

        let project_entries = sections
            .get(SectionKind::Projects)
            .map(|s| fields::extract_projects(&s))
            .unwrap_or_default();

        let certifications = sections
            .get(SectionKind::Certifications)
            .map(|s| fields::extract_certifications(&s, &self.certification_keywords))
            .unwrap_or_default();

        let profile = CandidateProfile {
            raw_text: text.to_string(),
            candidate_name: fields::extract_name(text),
            candidate_email: fields::extract_email(text),
            skills,
            experience_years,
            experience_entries,
            education_entries,
            project_entries,
            certifications,
        };

        debug!(
            skills = profile.skills.len(),
            experience_years = profile.experience_years,
            education = profile.education_entries.len(),
            projects = profile.project_entries.len(),
            certifications = profile.certifications.len(),
            "Parsed resume"
        );

        profile
    }
}

impl Default for ResumeParser {
    fn default() -> Self {
        Self::new(ParserConfig::default()).expect("built-in parser config is valid")
    }
}
