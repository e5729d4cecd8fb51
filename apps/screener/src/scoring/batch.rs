use futures::stream::{self, StreamExt};
use tracing::info;

use super::{resolve_weights, ScoreError, ScoringEngine, ScoringWeights};
use crate::models::{CandidateProfile, JobRoleSpec, ScoreResult};

impl ScoringEngine {
    /// Scores many profiles against one role, embedding the job description once.
    ///
    /// At most `max_concurrency` profiles are in flight at a time. Results come back in input
    /// order. The outer error covers the shared work (weights, job description); per-profile
    /// failures are returned in place.
    pub async fn score_batch(
        &self,
        profiles: &[CandidateProfile],
        role: &JobRoleSpec,
        weights: Option<&ScoringWeights>,
        max_concurrency: usize,
    ) -> Result<Vec<Result<ScoreResult, ScoreError>>, ScoreError> {
        let weights = resolve_weights(weights)?;
        let prepared = self.prepare_role(role).await?;

        let results: Vec<_> = stream::iter(profiles)
            .map(|profile| self.score_with(profile, &prepared, weights))
            .buffered(max_concurrency.max(1))
            .collect()
            .await;

        info!(
            "Scored {} profiles against '{}' ({} failed)",
            results.len(),
            role.title,
            results.iter().filter(|r| r.is_err()).count()
        );
        Ok(results)
    }
}

/// Sorts items by overall score, highest first. Ties keep their input order.
pub fn rank<T>(items: &mut [T], score: impl Fn(&T) -> &ScoreResult) {
    items.sort_by(|a, b| score(b).overall_score.total_cmp(&score(a).overall_score));
}
