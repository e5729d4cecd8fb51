use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ScoreError;

pub const COMPONENTS: [&str; 5] = ["semantic", "skills", "experience", "education", "projects"];

/// Relative importance of each component in the overall score.
///
/// Caller-supplied weights are used as given. Nothing renormalizes them, so keeping the sum at
/// 1.0 is the caller's job; an overall score pushed outside 0..=100 is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub projects: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.40,
            skills: 0.30,
            experience: 0.15,
            education: 0.10,
            projects: 0.05,
        }
    }
}

impl ScoringWeights {
    /// Builds weights from a component→weight mapping. Every component must be present and
    /// no other key is allowed.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, ScoreError> {
        if let Some(unknown) = map.keys().find(|k| !COMPONENTS.contains(&k.as_str())) {
            return Err(ScoreError::InvalidWeights(format!(
                "unknown component '{unknown}'"
            )));
        }
        let get = |key: &str| {
            map.get(key)
                .copied()
                .ok_or_else(|| ScoreError::InvalidWeights(format!("missing weight for '{key}'")))
        };
        let weights = Self {
            semantic: get("semantic")?,
            skills: get("skills")?,
            experience: get("experience")?,
            education: get("education")?,
            projects: get("projects")?,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Rejects non-finite or non-positive weights. A sum other than 1.0 is allowed but logged.
    pub fn validate(&self) -> Result<(), ScoreError> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoreError::InvalidWeights(format!(
                    "weight for '{name}' must be a positive number, got {value}"
                )));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > 1e-6 {
            warn!("Scoring weights sum to {total:.4}, not 1.0; overall score will be clamped to 0..=100");
        }
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }

    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("semantic", self.semantic),
            ("skills", self.skills),
            ("experience", self.experience),
            ("education", self.education),
            ("projects", self.projects),
        ]
    }
}
