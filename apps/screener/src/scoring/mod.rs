//! Scoring Engine: weighted, explainable multi-factor score of a candidate against a role.

pub mod batch;
pub mod components;
pub mod recommendations;
pub mod weights;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::embedding::{Embedder, Embedding, EmbeddingError, EmbeddingProvider};
use crate::models::{
    CandidateProfile, ComponentBreakdown, EducationDetail, ExperienceDetail, JobRoleSpec,
    ProjectsDetail, ScoreBreakdown, ScoreExplanation, ScoreResult, SemanticDetail, SkillsDetail,
};

pub use batch::rank;
pub use components::{EducationPolicy, EducationRule};
pub use recommendations::SHORTLIST_THRESHOLD;
pub use weights::ScoringWeights;

use components::{round2, ProjectSimilarity, MIN_PROJECT_TEXT_CHARS};

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingError),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

/// A job role with its description embedded once, reusable across many candidates.
#[derive(Debug, Clone)]
pub struct PreparedRole {
    pub role: JobRoleSpec,
    description: Embedding,
}

/// Holds only read-only state; share it behind an `Arc` and score concurrently.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    provider: EmbeddingProvider,
    education: EducationPolicy,
}

impl ScoringEngine {
    /// Fails if the embedder cannot produce vectors, rather than on the first score.
    pub fn new(embedder: Arc<dyn Embedder>) -> Result<Self, ScoreError> {
        Ok(Self::with_provider(EmbeddingProvider::new(embedder)?))
    }

    pub fn with_provider(provider: EmbeddingProvider) -> Self {
        Self {
            provider,
            education: EducationPolicy::default(),
        }
    }

    pub fn with_education_policy(mut self, policy: EducationPolicy) -> Self {
        self.education = policy;
        self
    }

    pub fn provider(&self) -> &EmbeddingProvider {
        &self.provider
    }

    pub async fn prepare_role(&self, role: &JobRoleSpec) -> Result<PreparedRole, ScoreError> {
        let description = self.provider.embed(&role.description).await?;
        Ok(PreparedRole {
            role: role.clone(),
            description,
        })
    }

    /// Scores one profile. `weights` defaults to [`ScoringWeights::default`].
    pub async fn score(
        &self,
        profile: &CandidateProfile,
        role: &JobRoleSpec,
        weights: Option<&ScoringWeights>,
    ) -> Result<ScoreResult, ScoreError> {
        let weights = resolve_weights(weights)?;
        let prepared = self.prepare_role(role).await?;
        self.score_with(profile, &prepared, weights).await
    }

    /// Like [`score`](Self::score) but reuses an already embedded job description.
    pub async fn score_prepared(
        &self,
        profile: &CandidateProfile,
        prepared: &PreparedRole,
        weights: Option<&ScoringWeights>,
    ) -> Result<ScoreResult, ScoreError> {
        let weights = resolve_weights(weights)?;
        self.score_with(profile, prepared, weights).await
    }

    async fn score_with(
        &self,
        profile: &CandidateProfile,
        prepared: &PreparedRole,
        weights: ScoringWeights,
    ) -> Result<ScoreResult, ScoreError> {
        let role = &prepared.role;

        let resume = self.provider.embed(&profile.raw_text).await?;
        let semantic = components::semantic_score(resume.cosine(&prepared.description));

        let skills = components::skills_score(&profile.skills, &role.normalized_skills());
        let experience =
            components::experience_score(profile.experience_years, role.required_experience_years);
        let education = components::education_score(
            &profile.education_entries,
            &role.title,
            &self.education,
        );

        let mut similarities = Vec::new();
        for project in &profile.project_entries {
            let text = format!("{} {}", project.title, project.description);
            if text.trim().chars().count() <= MIN_PROJECT_TEXT_CHARS {
                continue;
            }
            let embedding = self.provider.embed(&text).await?;
            similarities.push(ProjectSimilarity {
                title: project.title.clone(),
                similarity: embedding.cosine(&prepared.description),
            });
        }
        let projects = components::projects_score(profile.project_entries.len(), &similarities);

        let result = assemble(
            ComponentScores {
                semantic,
                skills,
                experience,
                education,
                projects,
            },
            weights,
        );
        debug!(
            candidate = profile.candidate_name.as_deref().unwrap_or("unknown"),
            role = %role.title,
            overall = result.overall_score,
            shortlisted = result.is_shortlisted,
            "Scored candidate"
        );
        Ok(result)
    }
}

fn resolve_weights(weights: Option<&ScoringWeights>) -> Result<ScoringWeights, ScoreError> {
    match weights {
        Some(w) => {
            w.validate()?;
            Ok(*w)
        }
        None => Ok(ScoringWeights::default()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

/// Raw (unrounded) component scores with their detail objects.
pub(crate) struct ComponentScores {
    pub semantic: (f64, SemanticDetail),
    pub skills: (f64, SkillsDetail),
    pub experience: (f64, ExperienceDetail),
    pub education: (f64, EducationDetail),
    pub projects: (f64, ProjectsDetail),
}

fn breakdown<D>(raw: f64, weight: f64, details: D) -> ComponentBreakdown<D> {
    ComponentBreakdown {
        score: round2(raw),
        weight,
        contribution: round2(weight * raw),
        details,
    }
}

pub(crate) fn assemble(scores: ComponentScores, weights: ScoringWeights) -> ScoreResult {
    let ComponentScores {
        semantic: (semantic, semantic_detail),
        skills: (skills, skills_detail),
        experience: (experience, experience_detail),
        education: (education, education_detail),
        projects: (projects, projects_detail),
    } = scores;

    let weighted = weights.semantic * semantic
        + weights.skills * skills
        + weights.experience * experience
        + weights.education * education
        + weights.projects * projects;
    let overall = round2(weighted).clamp(0.0, 100.0);

    let recommendations = recommendations::build_recommendations(
        overall,
        &skills_detail,
        &experience_detail,
        &education_detail,
    );

    ScoreResult {
        overall_score: overall,
        semantic_score: round2(semantic),
        skills_score: round2(skills),
        experience_score: round2(experience),
        education_score: round2(education),
        projects_score: round2(projects),
        weights,
        explanation: ScoreExplanation {
            overall_score: overall,
            breakdown: ScoreBreakdown {
                semantic: breakdown(semantic, weights.semantic, semantic_detail),
                skills: breakdown(skills, weights.skills, skills_detail),
                experience: breakdown(experience, weights.experience, experience_detail),
                education: breakdown(education, weights.education, education_detail),
                projects: breakdown(projects, weights.projects, projects_detail),
            },
        },
        recommendations,
        is_shortlisted: recommendations::is_shortlisted(overall),
    }
}
