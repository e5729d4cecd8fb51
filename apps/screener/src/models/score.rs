use serde::{Deserialize, Serialize};

use crate::scoring::weights::ScoringWeights;

// ────────────────────────────────────────────────────────────────────────────
// Per-component detail objects
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticDetail {
    /// Clamped cosine similarity as a percentage, 2 decimals.
    pub similarity_percent: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsDetail {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// Up to 5 candidate skills that did not match any requirement.
    pub extra: Vec<String>,
    /// "matched/required", e.g. "2/3".
    pub match_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceDetail {
    pub resume_years: u32,
    pub required_years: u32,
    pub meets_requirement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationDetail {
    pub found_education: Vec<String>,
    pub required_levels: Vec<String>,
    pub meets_requirement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantProject {
    pub title: String,
    /// Similarity to the job description as a percentage, 2 decimals.
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectsDetail {
    pub total_projects: usize,
    pub relevant_projects: usize,
    /// At most 3, most similar first.
    pub top_projects: Vec<RelevantProject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Breakdown and result
// ────────────────────────────────────────────────────────────────────────────

/// One row of the explanation: how much a component scored and how much it moved the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown<D> {
    pub score: f64,
    pub weight: f64,
    /// score × weight, 2 decimals.
    pub contribution: f64,
    pub details: D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub semantic: ComponentBreakdown<SemanticDetail>,
    pub skills: ComponentBreakdown<SkillsDetail>,
    pub experience: ComponentBreakdown<ExperienceDetail>,
    pub education: ComponentBreakdown<EducationDetail>,
    pub projects: ComponentBreakdown<ProjectsDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    pub overall_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Outcome of scoring one profile against one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub overall_score: f64,
    pub semantic_score: f64,
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub projects_score: f64,
    pub weights: ScoringWeights,
    pub explanation: ScoreExplanation,
    pub recommendations: Vec<String>,
    pub is_shortlisted: bool,
}
