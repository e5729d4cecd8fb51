//! Heading-based segmentation of resume text.
//!
//! A heading is a line consisting of a known heading phrase, optionally followed by `:` and
//! inline content ("Skills: Python, SQL"). A section body runs until the next heading of any
//! kind, an all-caps title line, or two consecutive blank lines. The skills section also stops
//! at a blank line followed by a capitalized line.

use regex::Regex;

use super::vocabulary::SectionHeadings;
use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Skills,
    Experience,
    Education,
    Projects,
    Certifications,
}

impl SectionKind {
    fn stops_at_paragraph_break(self) -> bool {
        matches!(self, SectionKind::Skills)
    }
}

pub(crate) struct SectionLocator {
    rules: Vec<(SectionKind, Regex)>,
}

/// Section bodies found in one document, in document order.
#[derive(Debug, Default)]
pub(crate) struct Sections {
    bodies: Vec<(SectionKind, String)>,
}

impl Sections {
    /// All bodies of one kind joined by newlines, `None` if the heading never appears.
    pub fn get(&self, kind: SectionKind) -> Option<String> {
        let parts: Vec<&str> = self
            .bodies
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, body)| body.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

impl SectionLocator {
    pub fn new(headings: &SectionHeadings) -> Result<Self, ParseError> {
        let groups = [
            (SectionKind::Skills, &headings.skills),
            (SectionKind::Experience, &headings.experience),
            (SectionKind::Education, &headings.education),
            (SectionKind::Projects, &headings.projects),
            (SectionKind::Certifications, &headings.certifications),
        ];

        let mut rules = Vec::with_capacity(groups.len());
        for (kind, phrases) in groups {
            let mut phrases: Vec<String> = phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            if phrases.is_empty() {
                // A kind with no headings simply never matches.
                continue;
            }
            // Longest first so "work experience" wins over "experience".
            phrases.sort_by(|a, b| b.len().cmp(&a.len()));
            let alternation = phrases
                .iter()
                .map(|p| regex::escape(p).replace(' ', r"\s+"))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)^\s*(?:{alternation})\s*(?:[:;]\s*(?P<rest>.*?))?\s*$");
            let re = Regex::new(&pattern).map_err(|e| {
                ParseError::InvalidConfig(format!("bad {kind:?} heading pattern: {e}"))
            })?;
            rules.push((kind, re));
        }

        Ok(Self { rules })
    }

    /// Returns the section a heading line opens, plus any inline content after the colon.
    fn classify<'a>(&self, line: &'a str) -> Option<(SectionKind, Option<&'a str>)> {
        self.rules.iter().find_map(|(kind, re)| {
            re.captures(line).map(|caps| {
                let rest = caps
                    .name("rest")
                    .map(|m| m.as_str())
                    .filter(|s| !s.is_empty());
                (*kind, rest)
            })
        })
    }

    pub fn split(&self, text: &str) -> Sections {
        let mut sections = Sections::default();
        let mut current: Option<(SectionKind, Vec<&str>)> = None;
        let mut blank_run = 0usize;

        for line in text.lines() {
            if let Some((kind, rest)) = self.classify(line) {
                close(&mut sections, current.take());
                current = Some((kind, rest.into_iter().collect()));
                blank_run = 0;
                continue;
            }

            let Some((kind, _)) = current.as_ref() else {
                continue;
            };
            let kind = *kind;

            if line.trim().is_empty() {
                blank_run += 1;
                if blank_run >= 2 {
                    close(&mut sections, current.take());
                } else if let Some((_, body)) = current.as_mut() {
                    body.push(line);
                }
                continue;
            }

            let after_blank = blank_run > 0;
            blank_run = 0;

            let ends_section = is_caps_title(line)
                || (kind.stops_at_paragraph_break() && after_blank && starts_capitalized(line));
            if ends_section {
                close(&mut sections, current.take());
                continue;
            }

            if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }
        close(&mut sections, current.take());

        sections
    }
}

fn close(sections: &mut Sections, section: Option<(SectionKind, Vec<&str>)>) {
    if let Some((kind, lines)) = section {
        let body = lines.join("\n").trim().to_string();
        if !body.is_empty() {
            sections.bodies.push((kind, body));
        }
    }
}

fn starts_capitalized(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_uppercase())
}

/// "WORK HISTORY", "LANGUAGES": short, all upper-case, no digits or list punctuation.
fn is_caps_title(line: &str) -> bool {
    let trimmed = line.trim().trim_end_matches(':');
    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 3
        && trimmed.split_whitespace().count() <= 5
        && !trimmed.chars().any(|c| c.is_lowercase() || c.is_ascii_digit() || c == ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> SectionLocator {
        SectionLocator::new(&SectionHeadings::default()).unwrap()
    }

    #[test]
    fn test_sections_split_on_headings() {
        let text = "Jane Doe\nSKILLS\nPython, SQL\nEXPERIENCE\nEngineer - 2020 - Present\nEDUCATION\nB.Tech CS";
        let sections = locator().split(text);
        assert_eq!(sections.get(SectionKind::Skills).unwrap(), "Python, SQL");
        assert_eq!(
            sections.get(SectionKind::Experience).unwrap(),
            "Engineer - 2020 - Present"
        );
        assert_eq!(sections.get(SectionKind::Education).unwrap(), "B.Tech CS");
        assert!(sections.get(SectionKind::Projects).is_none());
    }

    #[test]
    fn test_inline_heading_content_is_kept() {
        let sections = locator().split("Technical Skills: Rust, Docker\nKafka");
        assert_eq!(
            sections.get(SectionKind::Skills).unwrap(),
            "Rust, Docker\nKafka"
        );
    }

    #[test]
    fn test_longest_heading_wins() {
        let sections = locator().split("Work Experience\nDev - 2019 - 2021");
        assert_eq!(
            sections.get(SectionKind::Experience).unwrap(),
            "Dev - 2019 - 2021"
        );
    }

    #[test]
    fn test_two_blank_lines_end_section() {
        let sections = locator().split("Projects\nChat app built in Rust\n\n\nHobbies chess");
        assert_eq!(
            sections.get(SectionKind::Projects).unwrap(),
            "Chat app built in Rust"
        );
    }

    #[test]
    fn test_single_blank_line_keeps_experience_open() {
        let text = "Experience\nEngineer - 2020 - Present\n\nAnalyst - 2018 - 2020";
        let sections = locator().split(text);
        assert_eq!(
            sections.get(SectionKind::Experience).unwrap(),
            "Engineer - 2020 - Present\n\nAnalyst - 2018 - 2020"
        );
    }

    #[test]
    fn test_skills_end_at_blank_line_and_capitalized_line() {
        let sections = locator().split("Skills\npython, docker\n\nReferences available");
        assert_eq!(sections.get(SectionKind::Skills).unwrap(), "python, docker");
    }

    #[test]
    fn test_caps_title_ends_section() {
        let sections = locator().split("Education\nMaster of Science\nLANGUAGES\nFrench");
        assert_eq!(
            sections.get(SectionKind::Education).unwrap(),
            "Master of Science"
        );
    }

    #[test]
    fn test_repeated_headings_are_joined() {
        let text = "Experience\nA - 2020 - 2021\nSkills\nrust\nEmployment\nB - 2018 - 2019";
        let sections = locator().split(text);
        assert_eq!(
            sections.get(SectionKind::Experience).unwrap(),
            "A - 2020 - 2021\nB - 2018 - 2019"
        );
    }

    #[test]
    fn test_heading_word_inside_sentence_is_not_a_heading() {
        let sections = locator().split("I love learning new skills every day");
        assert!(sections.get(SectionKind::Skills).is_none());
    }

    #[test]
    fn test_caps_skill_list_is_not_a_title() {
        assert!(!is_caps_title("SQL, AWS, GCP"));
        assert!(is_caps_title("WORK HISTORY"));
        assert!(!is_caps_title("AI"));
    }
}
