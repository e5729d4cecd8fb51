pub mod job_role;
pub mod profile;
pub mod score;

pub use job_role::JobRoleSpec;
pub use profile::{CandidateProfile, EducationEntry, ExperienceEntry, ProjectEntry};
pub use score::{
    ComponentBreakdown, EducationDetail, ExperienceDetail, ProjectsDetail, RelevantProject,
    ScoreBreakdown, ScoreExplanation, ScoreResult, SemanticDetail, SkillsDetail,
};
