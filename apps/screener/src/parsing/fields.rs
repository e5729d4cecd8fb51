//! Heuristic field extractors. Each one returns an empty value on a miss, never an error.

use std::sync::OnceLock;

use regex::Regex;

use super::ParseError;
use crate::models::{EducationEntry, ExperienceEntry, ProjectEntry};

const NAME_SCAN_LINES: usize = 5;
const EDUCATION_DETAILS_CHARS: usize = 200;
const PROJECT_DESCRIPTION_CHARS: usize = 300;
const MAX_PROJECTS: usize = 5;
const MIN_PROJECT_CHARS: usize = 20;
const MIN_CERTIFICATION_CHARS: usize = 5;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+").unwrap())
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap())
}

fn years_re() -> &'static [Regex; 2] {
    static RE: OnceLock<[Regex; 2]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            // "5+ years of experience", "3 yrs exp"
            Regex::new(r"(?i)\b(\d{1,2})\+?\s*(?:years?|yrs?)\s*(?:of\s*)?(?:experience|exp)")
                .unwrap(),
            // "Experience: 7 years"
            Regex::new(r"(?i)(?:experience|exp)[:;]?\s*(\d{1,2})\+?\s*(?:years?|yrs?)").unwrap(),
        ]
    })
}

fn job_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?P<title>.+?)\s*[-–—]\s*(?P<start>(?:[a-z]{3,9}\.?\s+)?\d{4})\s*[-–—]\s*(?P<end>present|current|now|(?:[a-z]{3,9}\.?\s+)?\d{4})",
        )
        .unwrap()
    })
}

fn numbered_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.").unwrap())
}

/// First of the opening lines that looks like "Firstname Lastname". Best-effort only.
pub fn extract_name(text: &str) -> Option<String> {
    text.lines()
        .take(NAME_SCAN_LINES)
        .map(str::trim)
        .find(|line| {
            let len = line.chars().count();
            (4..50).contains(&len) && name_re().is_match(line)
        })
        .map(str::to_string)
}

pub fn extract_email(text: &str) -> Option<String> {
    email_re().find(text).map(|m| m.as_str().to_string())
}

/// Vocabulary terms occurring anywhere in `text_lower`.
///
/// Plain substring matching: "reactjs" hits "react" and "postgresql" hits "sql", at the cost of
/// "javascript" also hitting "java".
pub fn find_vocabulary_terms(text_lower: &str, vocabulary: &[String]) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|term| text_lower.contains(term.as_str()))
        .cloned()
        .collect()
}

/// Largest explicit "N years of experience" / "experience: N years" mention.
pub fn explicit_experience_years(text: &str) -> Option<u32> {
    years_re()
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .max()
}

/// "<title> - <start> - <end|present>" lines of the experience section.
pub fn extract_experience_entries(section: &str) -> Vec<ExperienceEntry> {
    section
        .lines()
        .filter_map(|line| {
            let caps = job_line_re().captures(line)?;
            let title = caps["title"]
                .trim_start_matches(|c: char| c == '•' || c == '*' || c == '-' || c.is_whitespace())
                .trim()
                .to_string();
            if title.is_empty() {
                return None;
            }
            Some(ExperienceEntry {
                title,
                duration: format!("{} - {}", caps["start"].trim(), caps["end"].trim()),
            })
        })
        .collect()
}

/// Builds the degree matcher from keywords such as "bachelor", "b.tech", "phd".
pub fn build_degree_regex(keywords: &[String]) -> Result<Regex, ParseError> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .map(|kw| degree_pattern(&kw))
        .collect();
    if alternatives.is_empty() {
        return Err(ParseError::InvalidConfig(
            "degree keyword list is empty".to_string(),
        ));
    }
    let pattern = format!(r"(?i)\b(?:{})[^\n]*", alternatives.join("|"));
    Regex::new(&pattern)
        .map_err(|e| ParseError::InvalidConfig(format!("bad degree keyword pattern: {e}")))
}

fn degree_pattern(keyword: &str) -> String {
    let letters = keyword.chars().filter(|c| *c != '.').count();
    let mut pattern = regex::escape(keyword);
    if letters > 2 {
        pattern = pattern.replace(r"\.", r"\.?");
    }
    // Abbreviations must end on a word boundary; full words may be pluralised ("Masters").
    if keyword.contains('.') || letters <= 4 {
        pattern.push_str(r"\b");
    }
    pattern
}

/// One entry per degree mention; details carry the opening of the section for context.
pub fn extract_education_entries(section: &str, degree_re: &Regex) -> Vec<EducationEntry> {
    let details = take_chars(section, EDUCATION_DETAILS_CHARS);
    degree_re
        .find_iter(section)
        .map(|m| EducationEntry {
            degree: m.as_str().trim().to_string(),
            details: details.clone(),
        })
        .collect()
}

/// Splits the projects section on lines that start with a capital letter or "N.".
pub fn extract_projects(section: &str) -> Vec<ProjectEntry> {
    let mut chunks: Vec<Vec<&str>> = Vec::new();
    for line in section.lines() {
        let starts_entry = line.chars().next().is_some_and(|c| c.is_uppercase())
            || numbered_item_re().is_match(line);
        match chunks.last_mut() {
            Some(chunk) if !starts_entry => chunk.push(line),
            _ => chunks.push(vec![line]),
        }
    }

    chunks
        .into_iter()
        .take(MAX_PROJECTS)
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|entry| entry.chars().count() > MIN_PROJECT_CHARS)
        .map(|entry| ProjectEntry {
            title: entry.lines().next().unwrap_or_default().trim().to_string(),
            description: take_chars(&entry, PROJECT_DESCRIPTION_CHARS),
        })
        .collect()
}

pub fn extract_certifications(section: &str, keywords: &[String]) -> Vec<String> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_CERTIFICATION_CHARS)
        .filter(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|kw| lower.contains(kw.as_str()))
        })
        .map(str::to_string)
        .collect()
}

fn take_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    fn default_degree_re() -> Regex {
        build_degree_regex(&crate::parsing::ParserConfig::default().degree_keywords).unwrap()
    }

    #[test]
    fn test_name_from_first_lines() {
        let text = "\nJane Doe\nSoftware Engineer\njane@example.com";
        assert_eq!(extract_name(text).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_name_not_found_after_five_lines() {
        let text = "resume\n2024\nsummary\nfoo\nbar\nJane Doe";
        assert!(extract_name(text).is_none());
    }

    #[test]
    fn test_name_rejects_overlong_line() {
        let long = format!("Jane Doe {}", "x".repeat(60));
        assert!(extract_name(&long).is_none());
    }

    #[test]
    fn test_email_first_match() {
        let text = "Contact: jane.doe+jobs@mail.example.co.uk or jd@other.io";
        assert_eq!(
            extract_email(text).as_deref(),
            Some("jane.doe+jobs@mail.example.co.uk")
        );
        assert!(extract_email("no contact here @ all").is_none());
    }

    #[test]
    fn test_vocabulary_hits_are_substrings() {
        let terms = vocab(&["java", "javascript", "python", "node.js", "c++", "power bi"]);
        let found = find_vocabulary_terms(
            "javascript, python3, node.js and c++ with power bi dashboards",
            &terms,
        );
        // "java" is a known false positive inside "javascript".
        assert_eq!(
            found,
            vocab(&["java", "javascript", "python", "node.js", "c++", "power bi"])
        );
    }

    #[test]
    fn test_explicit_years_takes_maximum() {
        let text = "3+ years of experience in Python. Experience: 7 years overall. 2 yrs exp in Go";
        assert_eq!(explicit_experience_years(text), Some(7));
        assert_eq!(explicit_experience_years("no numbers here"), None);
    }

    #[test]
    fn test_experience_entries() {
        let section = "• Senior Engineer, Acme - Jan 2020 - Present\nBuilt things\nAnalyst - 2017 – 2019";
        let entries = extract_experience_entries(section);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Senior Engineer, Acme");
        assert_eq!(entries[0].duration, "Jan 2020 - Present");
        assert_eq!(entries[1].title, "Analyst");
        assert_eq!(entries[1].duration, "2017 - 2019");
    }

    #[test]
    fn test_education_entries_one_per_degree_line() {
        let section = "Master of Science in CS, MIT 2019\nB.Tech Computer Engineering, IIT 2017";
        let entries = extract_education_entries(section, &default_degree_re());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].degree, "Master of Science in CS, MIT 2019");
        assert_eq!(entries[1].degree, "B.Tech Computer Engineering, IIT 2017");
        assert_eq!(entries[0].details, section);
    }

    #[test]
    fn test_education_details_capped_at_200_chars() {
        let section = format!("PhD in Physics {}", "x".repeat(400));
        let entries = extract_education_entries(&section, &default_degree_re());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details.chars().count(), 200);
    }

    #[test]
    fn test_short_abbreviation_needs_dot() {
        let re = default_degree_re();
        assert!(re.is_match("B.E in Mechanical"));
        assert!(re.is_match("BTech in IT"));
        assert!(!re.is_match("be a good team player"));
    }

    #[test]
    fn test_empty_degree_keywords_rejected() {
        assert!(build_degree_regex(&[]).is_err());
    }

    #[test]
    fn test_projects_split_and_capped() {
        let section = (1..=7)
            .map(|i| format!("{i}. Project number {i}\n- implemented a service for item {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let projects = extract_projects(&section);
        assert_eq!(projects.len(), 5);
        assert_eq!(projects[0].title, "1. Project number 1");
        assert!(projects[0].description.contains("implemented a service"));
    }

    #[test]
    fn test_short_project_chunks_dropped() {
        let section = "Todo\nResume Screener - ranks resumes with embeddings";
        let projects = extract_projects(section);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "Resume Screener - ranks resumes with embeddings");
    }

    #[test]
    fn test_certifications_filtered_by_keyword() {
        let keywords = vocab(&["certified", "certification", "aws", "google", "microsoft"]);
        let section = "AWS Certified Solutions Architect\nCPR\nGoogle Data Analytics\nFirst aid course";
        assert_eq!(
            extract_certifications(section, &keywords),
            vocab(&["AWS Certified Solutions Architect", "Google Data Analytics"])
        );
    }
}
