use crate::models::{EducationDetail, ExperienceDetail, SkillsDetail};

/// Overall score at or above which a candidate is shortlisted.
pub const SHORTLIST_THRESHOLD: f64 = 70.0;

const MAX_MISSING_SKILLS_LISTED: usize = 3;

pub fn is_shortlisted(overall: f64) -> bool {
    overall >= SHORTLIST_THRESHOLD
}

/// Improvement hints in fixed order: skills, experience, education. A shortlisted candidate
/// gets a single positive line instead.
pub fn build_recommendations(
    overall: f64,
    skills: &SkillsDetail,
    experience: &ExperienceDetail,
    education: &EducationDetail,
) -> Vec<String> {
    if is_shortlisted(overall) {
        return vec!["Strong candidate! Well-matched for the role.".to_string()];
    }

    let mut lines = Vec::new();
    if !skills.missing.is_empty() {
        let top: Vec<&str> = skills
            .missing
            .iter()
            .take(MAX_MISSING_SKILLS_LISTED)
            .map(String::as_str)
            .collect();
        lines.push(format!("Missing key skills: {}", top.join(", ")));
    }
    if !experience.meets_requirement {
        lines.push(format!(
            "Need more experience: {} years required",
            experience.required_years
        ));
    }
    if !education.meets_requirement {
        lines.push("Consider highlighting relevant education credentials".to_string());
    }
    lines
}
