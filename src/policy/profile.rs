use attendly_core::AppError;
use attendly_models::{GroupId, Role, StudentId, SubjectId, TeacherId, UserId};
use sqlx::PgPool;
use tracing::instrument;

/// A child linked to a parent identity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LinkedChild {
    pub student_id: StudentId,
    pub group_id: Option<GroupId>,
    pub full_name: String,
}

/// What an authenticated identity is, resolved once per request.
///
/// A role without its linked profile row (a `student` with no student record,
/// a `teacher` with no teacher record) resolves to [`Profile::Unassigned`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Unassigned {
        user_id: UserId,
    },
    Student {
        user_id: UserId,
        student_id: StudentId,
        group_id: Option<GroupId>,
    },
    Teacher {
        user_id: UserId,
        teacher_id: TeacherId,
        /// Subjects the teacher owns or instructs in an active slot
        subject_ids: Vec<SubjectId>,
    },
    Parent {
        user_id: UserId,
        children: Vec<LinkedChild>,
    },
    AdminOrManager {
        user_id: UserId,
        role: Role,
    },
}

impl Profile {
    pub fn user_id(&self) -> UserId {
        match self {
            Profile::Unassigned { user_id }
            | Profile::Student { user_id, .. }
            | Profile::Teacher { user_id, .. }
            | Profile::Parent { user_id, .. }
            | Profile::AdminOrManager { user_id, .. } => *user_id,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Profile::Unassigned { .. } => None,
            Profile::Student { .. } => Some(Role::Student),
            Profile::Teacher { .. } => Some(Role::Teacher),
            Profile::Parent { .. } => Some(Role::Parent),
            Profile::AdminOrManager { role, .. } => Some(*role),
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Profile::AdminOrManager { .. })
    }

    pub fn student_id(&self) -> Option<StudentId> {
        match self {
            Profile::Student { student_id, .. } => Some(*student_id),
            _ => None,
        }
    }

    pub fn teacher_id(&self) -> Option<TeacherId> {
        match self {
            Profile::Teacher { teacher_id, .. } => Some(*teacher_id),
            _ => None,
        }
    }

    pub fn child_ids(&self) -> Vec<StudentId> {
        match self {
            Profile::Parent { children, .. } => children.iter().map(|c| c.student_id).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this identity may act on lessons of `subject_id` taught by
    /// `slot_teacher`. Staff always may; a teacher may when they own the
    /// subject or instruct the slot.
    pub fn may_teach(&self, subject_id: SubjectId, slot_teacher: Option<TeacherId>) -> bool {
        match self {
            Profile::AdminOrManager { .. } => true,
            Profile::Teacher {
                teacher_id,
                subject_ids,
                ..
            } => slot_teacher == Some(*teacher_id) || subject_ids.contains(&subject_id),
            _ => false,
        }
    }
}

#[instrument(skip(db))]
pub async fn resolve_profile(db: &PgPool, user_id: UserId) -> Result<Profile, AppError> {
    let role = sqlx::query_scalar::<_, Option<Role>>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .flatten();

    let profile = match role {
        None => Profile::Unassigned { user_id },
        Some(role @ (Role::Admin | Role::Manager)) => Profile::AdminOrManager { user_id, role },
        Some(Role::Student) => {
            let row = sqlx::query_as::<_, (StudentId, Option<GroupId>)>(
                "SELECT id, group_id FROM students WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_optional(db)
            .await?;

            match row {
                Some((student_id, group_id)) => Profile::Student {
                    user_id,
                    student_id,
                    group_id,
                },
                None => Profile::Unassigned { user_id },
            }
        }
        Some(Role::Teacher) => {
            let teacher_id =
                sqlx::query_scalar::<_, TeacherId>("SELECT id FROM teachers WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(db)
                    .await?;

            match teacher_id {
                Some(teacher_id) => {
                    let subject_ids = sqlx::query_scalar::<_, SubjectId>(
                        r#"
                        SELECT id FROM subjects WHERE teacher_id = $1
                        UNION
                        SELECT subject_id FROM schedule_slots WHERE teacher_id = $1 AND is_active
                        "#,
                    )
                    .bind(teacher_id)
                    .fetch_all(db)
                    .await?;

                    Profile::Teacher {
                        user_id,
                        teacher_id,
                        subject_ids,
                    }
                }
                None => Profile::Unassigned { user_id },
            }
        }
        Some(Role::Parent) => {
            let children = sqlx::query_as::<_, LinkedChild>(
                r#"
                SELECT s.id AS student_id, s.group_id, s.full_name
                FROM student_parents sp
                JOIN students s ON s.id = sp.student_id
                WHERE sp.parent_user_id = $1
                ORDER BY s.full_name
                "#,
            )
            .bind(user_id)
            .fetch_all(db)
            .await?;

            Profile::Parent { user_id, children }
        }
    };

    Ok(profile)
}
