//! Identities and their role tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use attendly_core::pagination::{PaginationMeta, PaginationParams};
use attendly_core::serde::deserialize_optional_bool;

use crate::ids::{CourseId, GroupId, StudentId, UserId};

/// The single role tag carried by an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Teacher,
        Role::Student,
        Role::Parent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// Admins and managers see and manage everything.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Row used by login: carries the password hash, never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Sets the role of an identity. The first non-null role wins: repeating the
/// same role is accepted, changing an assigned role is a conflict.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignRoleDto {
    pub role: Role,
    /// Group for a new student profile (defaults to the first group)
    pub group_id: Option<GroupId>,
    /// Course for a new student profile (defaults to the group's course)
    pub course_id: Option<CourseId>,
    /// Children to link when assigning the parent role
    #[serde(default)]
    #[validate(length(max = 20, message = "A parent can be linked to at most 20 children"))]
    pub children: Vec<StudentId>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleAssignmentResponse {
    pub user: User,
    /// `false` when the identity already carried this role
    pub changed: bool,
    /// Student or teacher profile created by this assignment
    pub created_profile: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    pub role: Option<Role>,
    /// Only identities that have no role yet
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub unassigned: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

/// The caller's own account, including contact details.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update. Absent fields are left alone; an empty contact
/// field clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 150))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone_number: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 150))]
    pub emergency_contact_name: Option<String>,
    #[validate(length(max = 30))]
    pub emergency_contact_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    #[serde(alias = "old_password")]
    pub current_password: String,
    #[validate(length(min = 8))]
    #[schema(example = "newPassword123")]
    pub new_password: String,
}

/// Renames the caller's account. The password confirms the change.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangeUsernameDto {
    #[validate(length(min = 3, max = 150))]
    pub new_username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" parent ".parse::<Role>(), Ok(Role::Parent));
        assert!("system_admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::Teacher.is_staff());
        assert!(!Role::Parent.is_staff());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = User {
            id: UserId::new(),
            username: "jdoe".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            role: None,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "jdoe");
    }

    #[test]
    fn test_update_profile_rejects_blank_name_and_bad_email() {
        let dto = UpdateProfileDto {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateProfileDto {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateProfileDto {
            phone_number: Some(String::new()),
            address: Some("12 Campus Road".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_change_password_accepts_old_password_alias() {
        let dto: ChangePasswordDto = serde_json::from_value(serde_json::json!({
            "old_password": "secret",
            "new_password": "longenough1"
        }))
        .unwrap();
        assert_eq!(dto.current_password, "secret");
        assert!(dto.validate().is_ok());

        let short = ChangePasswordDto {
            current_password: "secret".to_string(),
            new_password: "short".to_string(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_change_username_needs_three_characters() {
        let dto = ChangeUsernameDto {
            new_username: "ab".to_string(),
            password: "secret".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
