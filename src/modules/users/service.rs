use attendly_core::AppError;
use attendly_core::pagination::PaginationMeta;
use attendly_core::password::{hash_password, verify_password};
use attendly_models::{CourseId, GroupId, StudentId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{info, instrument, warn};

use crate::metrics;
use crate::modules::users::model::{
    AssignRoleDto, ChangePasswordDto, ChangeUsernameDto, PaginatedUsersResponse, Role,
    RoleAssignmentResponse, UpdateProfileDto, User, UserFilterParams, UserProfile,
};

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, role, created_at";
const PROFILE_COLUMNS: &str = "id, username, first_name, last_name, email, role, phone_number, \
     address, emergency_contact_name, emergency_contact_phone, created_at";
const USERNAME_KEY: &str = "users_username_key";

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            qb.push(" WHERE TRUE");
            if filters.unassigned == Some(true) {
                qb.push(" AND role IS NULL");
            } else if let Some(role) = filters.role {
                qb.push(" AND role = ").push_bind(role);
            }
        };

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_filters(&mut qb);
        qb.push(" ORDER BY username LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let users = qb.build_query_as::<User>().fetch_all(db).await?;

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Sets the identity's role. Only a null role may change; repeating the
    /// current role is a no-op that still ensures the linked profile exists.
    #[instrument(skip(db, dto), fields(role = %dto.role))]
    pub async fn assign_role(
        db: &PgPool,
        id: UserId,
        dto: AssignRoleDto,
    ) -> Result<RoleAssignmentResponse, AppError> {
        let mut tx = db.begin().await?;

        let current = sqlx::query_scalar::<_, Option<Role>>(
            "SELECT role FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if let Some(existing) = current
            && existing != dto.role
        {
            return Err(AppError::conflict(anyhow::anyhow!(
                "User already has role {existing}"
            )));
        }

        let changed = current.is_none();
        if changed {
            sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(dto.role)
                .execute(&mut *tx)
                .await?;
        }

        let created_profile = match dto.role {
            Role::Student => {
                Self::ensure_student_profile(&mut tx, id, dto.group_id, dto.course_id)
                    .await?
                    .map(StudentId::into_inner)
            }
            Role::Teacher => Self::ensure_teacher_profile(&mut tx, id).await?,
            Role::Parent => {
                Self::link_children(&mut tx, id, &dto.children).await?;
                None
            }
            Role::Admin | Role::Manager => None,
        };

        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if changed {
            metrics::track_role_assigned(dto.role.as_str());
            info!(user = %id, role = %dto.role, "Role assigned");
        }

        Ok(RoleAssignmentResponse {
            user,
            changed,
            created_profile,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, id: UserId) -> Result<UserProfile, AppError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Applies the fields present in `dto`. Blank contact fields become NULL.
    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        id: UserId,
        dto: UpdateProfileDto,
    ) -> Result<UserProfile, AppError> {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string());
        let first_name = trimmed(dto.first_name);
        let last_name = trimmed(dto.last_name);
        if first_name.as_deref() == Some("") || last_name.as_deref() == Some("") {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Names cannot be blank"
            )));
        }

        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone_number = CASE WHEN $5::text IS NULL THEN phone_number ELSE NULLIF($5, '') END,
                address = CASE WHEN $6::text IS NULL THEN address ELSE NULLIF($6, '') END,
                emergency_contact_name = CASE WHEN $7::text IS NULL THEN emergency_contact_name
                    ELSE NULLIF($7, '') END,
                emergency_contact_phone = CASE WHEN $8::text IS NULL THEN emergency_contact_phone
                    ELSE NULLIF($8, '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(trimmed(dto.email))
        .bind(trimmed(dto.phone_number))
        .bind(trimmed(dto.address))
        .bind(trimmed(dto.emergency_contact_name))
        .bind(trimmed(dto.emergency_contact_phone))
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Verifies the current password before storing the new hash.
    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        id: UserId,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let stored = Self::password_hash(db, id).await?;
        if !verify_password(&dto.current_password, &stored)? {
            warn!(user = %id, "Password change refused: wrong current password");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        let hashed = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hashed)
            .execute(db)
            .await?;

        info!(user = %id, "Password changed");
        Ok(())
    }

    /// Renames the account after confirming its password. Issued tokens keep
    /// working since they carry the user id.
    #[instrument(skip(db, dto))]
    pub async fn change_username(
        db: &PgPool,
        id: UserId,
        dto: ChangeUsernameDto,
    ) -> Result<UserProfile, AppError> {
        let new_username = dto.new_username.trim().to_string();
        if new_username.chars().count() < 3 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Username must be at least 3 characters"
            )));
        }

        let stored = Self::password_hash(db, id).await?;
        if !verify_password(&dto.password, &stored)? {
            warn!(user = %id, "Username change refused: wrong password");
            return Err(AppError::bad_request(anyhow::anyhow!("Password is incorrect")));
        }

        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE users SET username = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(&new_username)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some(USERNAME_KEY)
            {
                return AppError::conflict(anyhow::anyhow!("Username is already taken"));
            }
            AppError::from(e)
        })?;

        info!(user = %id, username = %new_username, "Username changed");
        Ok(profile)
    }

    async fn password_hash(db: &PgPool, id: UserId) -> Result<String, AppError> {
        sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    async fn ensure_student_profile(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        group_id: Option<GroupId>,
        course_id: Option<CourseId>,
    ) -> Result<Option<StudentId>, AppError> {
        let group = match group_id {
            Some(group_id) => Some(
                sqlx::query_as::<_, (GroupId, CourseId)>(
                    "SELECT id, course_id FROM groups WHERE id = $1",
                )
                .bind(group_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Group not found")))?,
            ),
            None => {
                sqlx::query_as::<_, (GroupId, CourseId)>(
                    "SELECT id, course_id FROM groups ORDER BY name, id LIMIT 1",
                )
                .fetch_optional(&mut **tx)
                .await?
            }
        };

        let course_id = course_id.or(group.map(|(_, course)| course));

        let student_id = sqlx::query_scalar::<_, StudentId>(
            r#"
            INSERT INTO students (user_id, full_name, course_id, group_id)
            SELECT id, COALESCE(NULLIF(TRIM(first_name || ' ' || last_name), ''), username), $2, $3
            FROM users WHERE id = $1
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(group.map(|(group, _)| group))
        .fetch_optional(&mut **tx)
        .await?;

        Ok(student_id)
    }

    async fn ensure_teacher_profile(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
    ) -> Result<Option<uuid::Uuid>, AppError> {
        let teacher_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO teachers (user_id, full_name)
            SELECT id, COALESCE(NULLIF(TRIM(first_name || ' ' || last_name), ''), username)
            FROM users WHERE id = $1
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(teacher_id)
    }

    async fn link_children(
        tx: &mut Transaction<'_, Postgres>,
        parent: UserId,
        children: &[StudentId],
    ) -> Result<(), AppError> {
        if children.is_empty() {
            return Ok(());
        }

        let mut unique = children.to_vec();
        unique.sort();
        unique.dedup();

        let found: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE id = ANY($1)")
                .bind(&unique)
                .fetch_one(&mut **tx)
                .await?;
        if found != unique.len() as i64 {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        sqlx::query(
            r#"
            INSERT INTO student_parents (student_id, parent_user_id)
            SELECT UNNEST($1::uuid[]), $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&unique)
        .bind(parent)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
