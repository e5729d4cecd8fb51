use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A job role to screen against. Supplied by the caller, never modified by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRoleSpec {
    pub title: String,
    pub description: String,
    pub required_skills: BTreeSet<String>,
    #[serde(alias = "required_experience")]
    pub required_experience_years: u32,
}

impl JobRoleSpec {
    /// Required skills lower-cased and trimmed, blanks dropped.
    pub fn normalized_skills(&self) -> BTreeSet<String> {
        self.required_skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
