use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ParseError;

const SKILLS: &[&str] = &[
    "python", "java", "javascript", "typescript", "react", "node.js", "angular", "vue",
    "html", "css", "sql", "mongodb", "postgresql", "redis", "elasticsearch", "aws", "azure",
    "gcp", "docker", "kubernetes", "git", "linux", "bash", "machine learning",
    "deep learning", "tensorflow", "pytorch", "scikit-learn", "pandas", "numpy", "flask",
    "fastapi", "django", "kafka", "spark", "hadoop", "tableau", "power bi", "rust", "c++",
    "terraform", "graphql",
];

/// Heading vocabulary for each resume section. Matched case-insensitively against whole lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionHeadings {
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub projects: Vec<String>,
    pub certifications: Vec<String>,
}

impl Default for SectionHeadings {
    fn default() -> Self {
        Self {
            skills: strings(&[
                "technical skills",
                "skills",
                "technologies",
                "tools",
                "expertise",
                "core competencies",
            ]),
            experience: strings(&[
                "professional experience",
                "work experience",
                "employment history",
                "work history",
                "employment",
                "experience",
            ]),
            education: strings(&[
                "education",
                "academic background",
                "academic",
                "qualifications",
                "qualification",
            ]),
            projects: strings(&[
                "project experience",
                "personal projects",
                "academic projects",
                "projects",
                "project",
            ]),
            certifications: strings(&[
                "certifications",
                "certification",
                "certificates",
                "certificate",
                "credentials",
            ]),
        }
    }
}

/// Lookup tables the parser runs on. Swappable so callers can screen with their own vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub skills_vocabulary: Vec<String>,
    pub section_headings: SectionHeadings,
    /// Dots are optional for abbreviations longer than two letters ("b.tech" also finds "btech").
    pub degree_keywords: Vec<String>,
    pub certification_keywords: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skills_vocabulary: strings(SKILLS),
            section_headings: SectionHeadings::default(),
            degree_keywords: strings(&[
                "bachelor", "master", "phd", "ph.d", "b.tech", "m.tech", "b.e", "m.e", "diploma",
            ]),
            certification_keywords: strings(&[
                "certified",
                "certification",
                "aws",
                "google",
                "microsoft",
            ]),
        }
    }
}

impl ParserConfig {
    /// Loads a config from a JSON file. Omitted fields fall back to the built-in tables.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ParseError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ParseError::InvalidConfig(format!("invalid parser config {}: {e}", path.display()))
        })
    }

    /// Lower-cased, trimmed, deduplicated vocabulary with blanks removed.
    pub(crate) fn normalized_vocabulary(&self) -> Vec<String> {
        let mut vocab: Vec<String> = self
            .skills_vocabulary
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        vocab.sort();
        vocab.dedup();
        vocab
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_vocabulary_has_no_duplicates() {
        let config = ParserConfig::default();
        assert_eq!(
            config.normalized_vocabulary().len(),
            config.skills_vocabulary.len()
        );
    }

    #[test]
    fn test_partial_json_keeps_default_headings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"skills_vocabulary": ["Rust", "rust", " Go "]}}"#).unwrap();

        let config = ParserConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.normalized_vocabulary(), vec!["go", "rust"]);
        assert_eq!(config.section_headings, SectionHeadings::default());
        assert!(config.degree_keywords.contains(&"phd".to_string()));
    }

    #[test]
    fn test_missing_file_is_invalid_config() {
        let err = ParserConfig::from_json_file("/nonexistent/parser.json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json_is_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ParserConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidConfig(_)));
    }
}
