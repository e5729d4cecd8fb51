//! Per-criterion calculators. Everything here is pure; embedding lookups happen in the engine
//! and arrive as plain similarities.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{
    EducationDetail, EducationEntry, ExperienceDetail, ProjectsDetail, RelevantProject,
    SemanticDetail, SkillsDetail,
};

pub const NEUTRAL_SKILLS_SCORE: f64 = 50.0;
pub const EDUCATION_MATCHED_SCORE: f64 = 100.0;
pub const EDUCATION_PARTIAL_SCORE: f64 = 60.0;
pub const EDUCATION_MISSING_SCORE: f64 = 30.0;
/// Cosine similarity above which a project counts as relevant.
pub const RELEVANCE_THRESHOLD: f64 = 0.3;
/// Combined title + description must be longer than this to be embedded.
pub const MIN_PROJECT_TEXT_CHARS: usize = 10;
const MAX_EXTRA_SKILLS: usize = 5;
const MAX_TOP_PROJECTS: usize = 3;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ────────────────────────────────────────────────────────────────────────────
// Semantic
// ────────────────────────────────────────────────────────────────────────────

pub fn semantic_score(similarity: f64) -> (f64, SemanticDetail) {
    let clamped = if similarity.is_finite() {
        similarity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let percent = round2(clamped * 100.0);
    (
        clamped * 100.0,
        SemanticDetail {
            similarity_percent: percent,
            explanation: format!("Semantic similarity: {percent}%"),
        },
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// Matches each required skill against the candidate's skills by substring in either
/// direction, so "java" is satisfied by "javascript".
pub fn skills_score(
    candidate: &BTreeSet<String>,
    required: &BTreeSet<String>,
) -> (f64, SkillsDetail) {
    let candidate: BTreeSet<String> = normalize(candidate);
    let required: BTreeSet<String> = normalize(required);

    if required.is_empty() {
        return (
            NEUTRAL_SKILLS_SCORE,
            SkillsDetail {
                matched: Vec::new(),
                missing: Vec::new(),
                extra: candidate.into_iter().take(MAX_EXTRA_SKILLS).collect(),
                match_ratio: "0/0".to_string(),
            },
        );
    }

    let (matched, missing): (Vec<String>, Vec<String>) = required.iter().cloned().partition(|req| {
        candidate
            .iter()
            .any(|have| have.contains(req.as_str()) || req.contains(have.as_str()))
    });

    let extra = candidate
        .iter()
        .filter(|skill| !matched.contains(skill))
        .take(MAX_EXTRA_SKILLS)
        .cloned()
        .collect();

    let score = matched.len() as f64 / required.len() as f64 * 100.0;
    let match_ratio = format!("{}/{}", matched.len(), required.len());
    (
        score,
        SkillsDetail {
            matched,
            missing,
            extra,
            match_ratio,
        },
    )
}

fn normalize(skills: &BTreeSet<String>) -> BTreeSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

pub fn experience_score(resume_years: u32, required_years: u32) -> (f64, ExperienceDetail) {
    if required_years == 0 {
        return (
            100.0,
            ExperienceDetail {
                resume_years,
                required_years,
                meets_requirement: true,
                message: Some("No experience requirement".to_string()),
            },
        );
    }

    let meets = resume_years >= required_years;
    let score = if meets {
        100.0
    } else {
        (resume_years as f64 / required_years as f64 * 100.0).min(100.0)
    };
    (
        score,
        ExperienceDetail {
            resume_years,
            required_years,
            meets_requirement: meets,
            message: None,
        },
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

/// Maps job-title keywords to the degree tokens that satisfy them. Rules are checked in
/// order and the first keyword found in the title wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationPolicy {
    pub rules: Vec<EducationRule>,
    pub default_levels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRule {
    pub title_keyword: String,
    pub levels: Vec<String>,
}

impl EducationRule {
    fn new(keyword: &str, levels: &[&str]) -> Self {
        Self {
            title_keyword: keyword.to_string(),
            levels: levels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl Default for EducationPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                EducationRule::new("engineer", &["bachelor", "b.tech", "b.e", "master", "m.tech"]),
                EducationRule::new("scientist", &["master", "m.tech", "phd", "ph.d"]),
                EducationRule::new("developer", &["bachelor", "b.tech", "diploma"]),
                EducationRule::new("data", &["bachelor", "master", "phd"]),
            ],
            default_levels: ["bachelor", "b.tech", "b.e"].iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl EducationPolicy {
    pub fn required_levels(&self, job_title: &str) -> &[String] {
        let title = job_title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| title.contains(&rule.title_keyword.to_lowercase()))
            .map(|rule| rule.levels.as_slice())
            .unwrap_or(&self.default_levels)
    }
}

pub fn education_score(
    entries: &[EducationEntry],
    job_title: &str,
    policy: &EducationPolicy,
) -> (f64, EducationDetail) {
    let required_levels = policy.required_levels(job_title).to_vec();

    if entries.is_empty() {
        return (
            EDUCATION_MISSING_SCORE,
            EducationDetail {
                found_education: Vec::new(),
                required_levels,
                meets_requirement: false,
                message: Some("No education information found".to_string()),
            },
        );
    }

    let meets = entries.iter().any(|entry| {
        let text = format!("{} {}", entry.degree, entry.details).to_lowercase();
        required_levels
            .iter()
            .any(|level| text.contains(&level.to_lowercase()))
    });
    let score = if meets {
        EDUCATION_MATCHED_SCORE
    } else {
        EDUCATION_PARTIAL_SCORE
    };
    (
        score,
        EducationDetail {
            found_education: entries.iter().map(|e| e.degree.clone()).collect(),
            required_levels,
            meets_requirement: meets,
            message: None,
        },
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

/// A project that passed the length filter, with its similarity to the job description.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSimilarity {
    pub title: String,
    pub similarity: f64,
}

pub fn projects_score(total_projects: usize, scored: &[ProjectSimilarity]) -> (f64, ProjectsDetail) {
    if total_projects == 0 || scored.is_empty() {
        let message = if total_projects == 0 {
            "No projects found"
        } else {
            "No valid projects found"
        };
        return (
            0.0,
            ProjectsDetail {
                total_projects,
                relevant_projects: 0,
                top_projects: Vec::new(),
                message: Some(message.to_string()),
            },
        );
    }

    let mut relevant: Vec<&ProjectSimilarity> = scored
        .iter()
        .filter(|p| p.similarity > RELEVANCE_THRESHOLD)
        .collect();
    relevant.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    let mean = scored.iter().map(|p| p.similarity).sum::<f64>() / scored.len() as f64;
    let score = (mean * 100.0).clamp(0.0, 100.0);

    (
        score,
        ProjectsDetail {
            total_projects,
            relevant_projects: relevant.len(),
            top_projects: relevant
                .iter()
                .take(MAX_TOP_PROJECTS)
                .map(|p| RelevantProject {
                    title: p.title.clone(),
                    relevance: round2(p.similarity * 100.0),
                })
                .collect(),
            message: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn edu(degree: &str, details: &str) -> EducationEntry {
        EducationEntry {
            degree: degree.to_string(),
            details: details.to_string(),
        }
    }

    #[test]
    fn test_semantic_clamps_negative_similarity() {
        let (score, detail) = semantic_score(-0.4);
        assert_eq!(score, 0.0);
        assert_eq!(detail.explanation, "Semantic similarity: 0%");
    }

    #[test]
    fn test_semantic_percent_rounded() {
        let (score, detail) = semantic_score(0.123456);
        assert!((score - 12.3456).abs() < 1e-9);
        assert_eq!(detail.similarity_percent, 12.35);
        assert_eq!(detail.explanation, "Semantic similarity: 12.35%");
    }

    #[test]
    fn test_skills_partial_match() {
        let (score, detail) = skills_score(&set(&["python", "react"]), &set(&["python", "react", "aws"]));
        assert_eq!(round2(score), 66.67);
        assert_eq!(detail.matched, vec!["python", "react"]);
        assert_eq!(detail.missing, vec!["aws"]);
        assert_eq!(detail.match_ratio, "2/3");
        assert!(detail.extra.is_empty());
    }

    #[test]
    fn test_skills_superset_is_full_score() {
        let (score, detail) = skills_score(
            &set(&["python", "react", "aws", "docker", "git"]),
            &set(&["python", "aws"]),
        );
        assert_eq!(score, 100.0);
        assert!(detail.missing.is_empty());
        assert_eq!(detail.extra, vec!["docker", "git", "react"]);
    }

    #[test]
    fn test_skills_no_requirements_is_neutral() {
        let (score, detail) = skills_score(&set(&["python"]), &BTreeSet::new());
        assert_eq!(score, NEUTRAL_SKILLS_SCORE);
        assert_eq!(detail.extra, vec!["python"]);
    }

    #[test]
    fn test_skills_match_is_case_insensitive() {
        let (score, _) = skills_score(&set(&["Python"]), &set(&["PYTHON "]));
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_skills_substring_matches_unrelated_language() {
        // Known weakness: "java" is satisfied by "javascript".
        let (score, detail) = skills_score(&set(&["javascript"]), &set(&["java"]));
        assert_eq!(score, 100.0);
        assert_eq!(detail.matched, vec!["java"]);
    }

    #[test]
    fn test_skills_extra_capped_at_five() {
        let (_, detail) = skills_score(
            &set(&["a1", "b1", "c1", "d1", "e1", "f1", "g1"]),
            &set(&["rust"]),
        );
        assert_eq!(detail.extra.len(), 5);
    }

    #[test]
    fn test_experience_no_requirement() {
        for years in [0, 3, 40] {
            let (score, detail) = experience_score(years, 0);
            assert_eq!(score, 100.0);
            assert!(detail.meets_requirement);
            assert_eq!(detail.message.as_deref(), Some("No experience requirement"));
        }
    }

    #[test]
    fn test_experience_partial_credit() {
        let (score, detail) = experience_score(2, 5);
        assert!((score - 40.0).abs() < 1e-9);
        assert!(!detail.meets_requirement);
    }

    #[test]
    fn test_experience_monotonic() {
        let mut previous = -1.0;
        for years in 0..12 {
            let (score, _) = experience_score(years, 6);
            assert!(score >= previous, "score dropped at {years} years");
            previous = score;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_education_missing_entries() {
        let policy = EducationPolicy::default();
        let (score, detail) = education_score(&[], "Data Scientist", &policy);
        assert_eq!(score, EDUCATION_MISSING_SCORE);
        assert_eq!(detail.required_levels, vec!["master", "m.tech", "phd", "ph.d"]);
        assert!(!detail.meets_requirement);
        assert_eq!(detail.message.as_deref(), Some("No education information found"));
    }

    #[test]
    fn test_education_matched_level() {
        let policy = EducationPolicy::default();
        let (score, detail) = education_score(
            &[edu("B.Tech", "B.Tech in Computer Science, 2018")],
            "Backend Developer",
            &policy,
        );
        assert_eq!(score, EDUCATION_MATCHED_SCORE);
        assert!(detail.meets_requirement);
        assert_eq!(detail.found_education, vec!["B.Tech"]);
    }

    #[test]
    fn test_education_partial_credit() {
        let policy = EducationPolicy::default();
        let (score, detail) = education_score(
            &[edu("Diploma", "Diploma in Design")],
            "Research Scientist",
            &policy,
        );
        assert_eq!(score, EDUCATION_PARTIAL_SCORE);
        assert!(!detail.meets_requirement);
    }

    #[test]
    fn test_education_default_levels() {
        let policy = EducationPolicy::default();
        assert_eq!(policy.required_levels("Product Manager"), ["bachelor", "b.tech", "b.e"]);
        // First matching rule wins.
        assert_eq!(policy.required_levels("Data Engineer")[0], "bachelor");
        assert_eq!(policy.required_levels("Data Engineer").len(), 5);
    }

    #[test]
    fn test_education_custom_policy() {
        let policy = EducationPolicy {
            rules: vec![EducationRule::new("nurse", &["bsn"])],
            default_levels: vec!["high school".to_string()],
        };
        let (score, _) = education_score(&[edu("BSN", "")], "Night Nurse", &policy);
        assert_eq!(score, EDUCATION_MATCHED_SCORE);
    }

    #[test]
    fn test_projects_none_found() {
        let (score, detail) = projects_score(0, &[]);
        assert_eq!(score, 0.0);
        assert_eq!(detail.message.as_deref(), Some("No projects found"));
    }

    #[test]
    fn test_projects_none_valid() {
        let (score, detail) = projects_score(2, &[]);
        assert_eq!(score, 0.0);
        assert_eq!(detail.total_projects, 2);
        assert_eq!(detail.message.as_deref(), Some("No valid projects found"));
    }

    #[test]
    fn test_projects_relevance_and_mean() {
        let scored = vec![
            ProjectSimilarity { title: "Low".into(), similarity: 0.1 },
            ProjectSimilarity { title: "Mid".into(), similarity: 0.5 },
            ProjectSimilarity { title: "High".into(), similarity: 0.9 },
            ProjectSimilarity { title: "Edge".into(), similarity: 0.3 },
        ];
        let (score, detail) = projects_score(5, &scored);
        assert!((score - 45.0).abs() < 1e-9);
        assert_eq!(detail.relevant_projects, 2);
        let titles: Vec<_> = detail.top_projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["High", "Mid"]);
        assert_eq!(detail.top_projects[0].relevance, 90.0);
    }

    #[test]
    fn test_projects_top_three_only() {
        let scored: Vec<_> = (0..5)
            .map(|i| ProjectSimilarity {
                title: format!("P{i}"),
                similarity: 0.4 + i as f64 * 0.1,
            })
            .collect();
        let (_, detail) = projects_score(5, &scored);
        assert_eq!(detail.relevant_projects, 5);
        assert_eq!(detail.top_projects.len(), 3);
        assert_eq!(detail.top_projects[0].title, "P4");
    }

    #[test]
    fn test_projects_negative_mean_clamped() {
        let scored = vec![ProjectSimilarity { title: "Off".into(), similarity: -0.2 }];
        let (score, _) = projects_score(1, &scored);
        assert_eq!(score, 0.0);
    }
}
