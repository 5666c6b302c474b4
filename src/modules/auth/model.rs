use serde::Serialize;
use utoipa::ToSchema;

use attendly_models::{GroupId, StudentId, SubjectId, TeacherId, User};

use crate::policy::Profile;

pub use attendly_models::auth::*;

/// The authenticated identity and what it is linked to.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
    pub student_id: Option<StudentId>,
    pub group_id: Option<GroupId>,
    pub teacher_id: Option<TeacherId>,
    /// Subjects a teacher owns or instructs
    pub subject_ids: Vec<SubjectId>,
    /// Children linked to a parent
    pub children: Vec<StudentId>,
}

impl MeResponse {
    pub fn new(user: User, profile: &Profile) -> Self {
        let (group_id, subject_ids) = match profile {
            Profile::Student { group_id, .. } => (*group_id, Vec::new()),
            Profile::Teacher { subject_ids, .. } => (None, subject_ids.clone()),
            _ => (None, Vec::new()),
        };

        Self {
            user,
            student_id: profile.student_id(),
            group_id,
            teacher_id: profile.teacher_id(),
            subject_ids,
            children: profile.child_ids(),
        }
    }
}
