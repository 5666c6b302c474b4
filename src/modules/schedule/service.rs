use attendly_core::AppError;
use attendly_models::{ScheduleSlotId, SubjectId, TeacherId, Weekday};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};

use crate::metrics;
use crate::modules::schedule::model::{
    LessonInfo, RosterEntry, RosterResponse, ScheduleFilterParams, ScheduleSlot,
    ScheduleSlotDetail, SlotActivationResponse, UpsertScheduleSlotDto,
};
use crate::modules::schedule::planning::{SlotKey, find_conflict, parallel_section, sort_roster};
use crate::policy::{Profile, ResourceKind, ScopeColumns, ScopeTarget, visible_scope};

const SLOT_DETAIL_SELECT: &str = r#"
    SELECT ss.id, ss.subject_id, sub.name AS subject_name,
           ss.teacher_id, t.full_name AS teacher_name,
           ss.group_id, g.name AS group_name, g.course_id,
           ss.day_of_week, ss.time_slot_id, ts.name AS time_slot_name, ts.sequence,
           ts.start_time, ts.end_time, ss.room, ss.is_active, ss.updated_at
    FROM schedule_slots ss
    JOIN subjects sub ON sub.id = ss.subject_id
    JOIN teachers t ON t.id = ss.teacher_id
    JOIN groups g ON g.id = ss.group_id
    JOIN time_slots ts ON ts.id = ss.time_slot_id
"#;

const SLOT_SELECT: &str = "SELECT id, subject_id, teacher_id, group_id, day_of_week, \
     time_slot_id, room, is_active FROM schedule_slots";

pub const SLOT_SCOPE: ScopeColumns = ScopeColumns {
    student: None,
    group: Some("ss.group_id"),
    subject: Some("ss.subject_id"),
    teacher: Some("ss.teacher_id"),
};

const UNIQUE_ACTIVE_SLOT: &str = "uniq_active_schedule_slot";

pub struct ScheduleService;

impl ScheduleService {
    /// Slots visible to the caller, ordered by weekday then period.
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        profile: &Profile,
        filters: &ScheduleFilterParams,
    ) -> Result<Vec<ScheduleSlotDetail>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(SLOT_DETAIL_SELECT);
        qb.push(" WHERE TRUE");

        if filters.active_only() {
            qb.push(" AND ss.is_active");
        }
        if let Some(day) = filters.day {
            qb.push(" AND ss.day_of_week = ").push_bind(day);
        }
        if let Some(group) = filters.group {
            qb.push(" AND ss.group_id = ").push_bind(group);
        }
        if let Some(teacher) = filters.teacher {
            qb.push(" AND ss.teacher_id = ").push_bind(teacher);
        }
        if let Some(course) = filters.course {
            qb.push(" AND g.course_id = ").push_bind(course);
        }

        visible_scope(profile, ResourceKind::Schedules).push_sql(&mut qb, &SLOT_SCOPE);
        qb.push(" ORDER BY ss.day_of_week, ts.sequence, g.name");

        let slots = qb.build_query_as::<ScheduleSlotDetail>().fetch_all(db).await?;
        Ok(slots)
    }

    /// The caller's own timetable: a teacher's lessons are the slots they
    /// instruct, everyone else sees their visible schedule.
    #[instrument(skip(db))]
    pub async fn mine(
        db: &PgPool,
        profile: &Profile,
        day: Option<Weekday>,
    ) -> Result<Vec<ScheduleSlotDetail>, AppError> {
        let filters = ScheduleFilterParams {
            day,
            teacher: profile.teacher_id().map(TeacherId::into_inner),
            ..Default::default()
        };
        Self::list(db, profile, &filters).await
    }

    #[instrument(skip(db))]
    pub async fn find_detail(
        db: &PgPool,
        id: ScheduleSlotId,
    ) -> Result<ScheduleSlotDetail, AppError> {
        sqlx::query_as::<_, ScheduleSlotDetail>(&format!("{SLOT_DETAIL_SELECT} WHERE ss.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Schedule slot not found")))
    }

    /// A slot, reported missing when outside the caller's scope.
    #[instrument(skip(db))]
    pub async fn get_visible(
        db: &PgPool,
        profile: &Profile,
        id: ScheduleSlotId,
    ) -> Result<ScheduleSlotDetail, AppError> {
        let slot = Self::find_detail(db, id).await?;
        let target = ScopeTarget {
            group_id: Some(slot.group_id),
            subject_id: Some(slot.subject_id),
            teacher_id: Some(slot.teacher_id),
            ..Default::default()
        };
        if !visible_scope(profile, ResourceKind::Schedules).admits(&target) {
            return Err(AppError::not_found(anyhow::anyhow!("Schedule slot not found")));
        }
        Ok(slot)
    }

    pub async fn find_slot(db: &PgPool, id: ScheduleSlotId) -> Result<ScheduleSlot, AppError> {
        sqlx::query_as::<_, ScheduleSlot>(&format!("{SLOT_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Schedule slot not found")))
    }

    async fn active_slots_at(db: &PgPool, key: &SlotKey) -> Result<Vec<ScheduleSlot>, AppError> {
        let slots = sqlx::query_as::<_, ScheduleSlot>(&format!(
            "{SLOT_SELECT} WHERE group_id = $1 AND day_of_week = $2 AND time_slot_id = $3 AND is_active"
        ))
        .bind(key.group_id)
        .bind(key.day_of_week)
        .bind(key.time_slot_id)
        .fetch_all(db)
        .await?;
        Ok(slots)
    }

    /// The error reported when `key` is already taken, naming the group.
    async fn conflict_error(db: &PgPool, key: &SlotKey) -> AppError {
        metrics::track_schedule_conflict();

        let names = sqlx::query_as::<_, (String, String)>(
            "SELECT g.name, ts.name FROM groups g, time_slots ts WHERE g.id = $1 AND ts.id = $2",
        )
        .bind(key.group_id)
        .bind(key.time_slot_id)
        .fetch_optional(db)
        .await;

        let (group, period) = match names {
            Ok(Some(names)) => names,
            _ => (key.group_id.to_string(), key.time_slot_id.to_string()),
        };

        warn!(group = %group, day = key.day_of_week.name(), period = %period, "Schedule conflict");
        AppError::conflict(anyhow::anyhow!(
            "Group {} already has an active lesson on {} in period {}",
            group,
            key.day_of_week.name(),
            period
        ))
    }

    fn is_slot_collision(e: &sqlx::Error) -> bool {
        if let sqlx::Error::Database(db_err) = e
            && db_err.is_unique_violation()
        {
            return db_err.constraint() == Some(UNIQUE_ACTIVE_SLOT);
        }
        false
    }

    /// Creates a slot (`id = None`) or rewrites an existing one.
    ///
    /// The teacher defaults to the subject's teacher. The only conflict rule is
    /// one active slot per group, weekday and period.
    #[instrument(skip(db, dto))]
    pub async fn upsert(
        db: &PgPool,
        id: Option<ScheduleSlotId>,
        dto: UpsertScheduleSlotDto,
    ) -> Result<ScheduleSlotDetail, AppError> {
        let subject_teacher = sqlx::query_scalar::<_, Option<TeacherId>>(
            "SELECT teacher_id FROM subjects WHERE id = $1",
        )
        .bind(dto.subject_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))?;

        let teacher_id = dto.teacher_id.or(subject_teacher).ok_or_else(|| {
            AppError::unprocessable(anyhow::anyhow!(
                "Subject has no teacher, teacher_id is required"
            ))
        })?;

        Self::ensure_exists(
            db,
            "SELECT EXISTS(SELECT 1 FROM teachers WHERE id = $1)",
            teacher_id.into_inner(),
            "Teacher not found",
        )
        .await?;
        Self::ensure_exists(
            db,
            "SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1)",
            dto.group_id.into_inner(),
            "Group not found",
        )
        .await?;
        Self::ensure_exists(
            db,
            "SELECT EXISTS(SELECT 1 FROM time_slots WHERE id = $1 AND is_active)",
            dto.time_slot_id.into_inner(),
            "Time slot not found",
        )
        .await?;

        if let Some(id) = id {
            Self::find_slot(db, id).await?;
        }

        let key = SlotKey {
            group_id: dto.group_id,
            day_of_week: dto.day_of_week,
            time_slot_id: dto.time_slot_id,
        };
        let occupied = Self::active_slots_at(db, &key).await?;
        if find_conflict(&key, &occupied, id).is_some() {
            return Err(Self::conflict_error(db, &key).await);
        }

        let room = dto.room.as_deref().map(str::trim).filter(|r| !r.is_empty());

        let saved = match id {
            None => {
                sqlx::query_scalar::<_, ScheduleSlotId>(
                    r#"INSERT INTO schedule_slots
                           (subject_id, teacher_id, group_id, day_of_week, time_slot_id, room)
                       VALUES ($1, $2, $3, $4, $5, $6)
                       RETURNING id"#,
                )
                .bind(dto.subject_id)
                .bind(teacher_id)
                .bind(dto.group_id)
                .bind(dto.day_of_week)
                .bind(dto.time_slot_id)
                .bind(room)
                .fetch_one(db)
                .await
            }
            Some(id) => {
                sqlx::query_scalar::<_, ScheduleSlotId>(
                    r#"UPDATE schedule_slots
                       SET subject_id = $2, teacher_id = $3, group_id = $4, day_of_week = $5,
                           time_slot_id = $6, room = $7, updated_at = NOW()
                       WHERE id = $1
                       RETURNING id"#,
                )
                .bind(id)
                .bind(dto.subject_id)
                .bind(teacher_id)
                .bind(dto.group_id)
                .bind(dto.day_of_week)
                .bind(dto.time_slot_id)
                .bind(room)
                .fetch_one(db)
                .await
            }
        };

        let slot_id = match saved {
            Ok(slot_id) => slot_id,
            Err(e) if Self::is_slot_collision(&e) => {
                return Err(Self::conflict_error(db, &key).await);
            }
            Err(e) => return Err(AppError::database(e)),
        };

        info!(schedule_slot = %slot_id, created = id.is_none(), "Schedule slot saved");
        Self::find_detail(db, slot_id).await
    }

    async fn ensure_exists(
        db: &PgPool,
        sql: &str,
        id: uuid::Uuid,
        message: &'static str,
    ) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>(sql).bind(id).fetch_one(db).await?;
        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!(message)));
        }
        Ok(())
    }

    async fn attendance_count(db: &PgPool, id: ScheduleSlotId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance_records WHERE schedule_slot_id = $1",
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    /// Soft-deletes a slot. Attendance keeps pointing at it.
    #[instrument(skip(db))]
    pub async fn retire(db: &PgPool, id: ScheduleSlotId) -> Result<SlotActivationResponse, AppError> {
        sqlx::query_scalar::<_, ScheduleSlotId>(
            "UPDATE schedule_slots SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Schedule slot not found")))?;

        Ok(SlotActivationResponse {
            slot: Self::find_detail(db, id).await?,
            attendance_preserved: Self::attendance_count(db, id).await?,
        })
    }

    /// Restores a retired slot unless another active slot took its place.
    #[instrument(skip(db))]
    pub async fn reactivate(
        db: &PgPool,
        id: ScheduleSlotId,
    ) -> Result<SlotActivationResponse, AppError> {
        let slot = Self::find_slot(db, id).await?;

        if !slot.is_active {
            let key = SlotKey::of(&slot);
            let occupied = Self::active_slots_at(db, &key).await?;
            if find_conflict(&key, &occupied, Some(id)).is_some() {
                return Err(Self::conflict_error(db, &key).await);
            }

            let result = sqlx::query(
                "UPDATE schedule_slots SET is_active = TRUE, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .execute(db)
            .await;

            match result {
                Ok(_) => {}
                Err(e) if Self::is_slot_collision(&e) => {
                    return Err(Self::conflict_error(db, &key).await);
                }
                Err(e) => return Err(AppError::database(e)),
            }
        }

        Ok(SlotActivationResponse {
            slot: Self::find_detail(db, id).await?,
            attendance_preserved: Self::attendance_count(db, id).await?,
        })
    }

    /// Every slot taught together with `anchor` (same teacher, weekday and
    /// period), one per group, the anchor first.
    #[instrument(skip(db, anchor), fields(anchor = %anchor.id))]
    pub async fn parallel_section(
        db: &PgPool,
        anchor: &ScheduleSlot,
    ) -> Result<Vec<ScheduleSlot>, AppError> {
        let candidates = sqlx::query_as::<_, ScheduleSlot>(&format!(
            "{SLOT_SELECT} WHERE teacher_id = $1 AND day_of_week = $2 AND time_slot_id = $3 \
             AND is_active ORDER BY created_at, id"
        ))
        .bind(anchor.teacher_id)
        .bind(anchor.day_of_week)
        .bind(anchor.time_slot_id)
        .fetch_all(db)
        .await?;

        Ok(parallel_section(anchor, &candidates)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Loads a slot together with its parallel section.
    pub async fn section_of(
        db: &PgPool,
        id: ScheduleSlotId,
    ) -> Result<(ScheduleSlot, Vec<ScheduleSlot>), AppError> {
        let anchor = Self::find_slot(db, id).await?;
        let section = Self::parallel_section(db, &anchor).await?;
        Ok((anchor, section))
    }

    /// The combined roster of a lecture: students of every group in the
    /// parallel section, each with their mark for `date` in the slot's subject.
    #[instrument(skip(db))]
    pub async fn roster(
        db: &PgPool,
        profile: &Profile,
        id: ScheduleSlotId,
        date: NaiveDate,
    ) -> Result<RosterResponse, AppError> {
        let detail = Self::find_detail(db, id).await?;
        if !profile.may_teach(detail.subject_id, Some(detail.teacher_id)) {
            warn!(user = %profile.user_id(), schedule_slot = %id, "Roster access denied");
            return Err(AppError::forbidden(
                "Only administrators, managers and the lesson's teacher can view the roster"
                    .to_string(),
            ));
        }

        let (_, section) = Self::section_of(db, id).await?;
        let section_ids: Vec<ScheduleSlotId> = section.iter().map(|s| s.id).collect();

        let mut students = Self::roster_entries(db, &section_ids, detail.subject_id, date).await?;
        sort_roster(&mut students);

        let mut groups: Vec<String> = Vec::new();
        for entry in &students {
            if !groups.contains(&entry.group_name) {
                groups.push(entry.group_name.clone());
            }
        }
        if groups.is_empty() {
            groups.push(detail.group_name.clone());
        }

        let marked_count = students.iter().filter(|s| s.is_marked).count();
        let lesson_info = LessonInfo {
            subject_name: detail.subject_name,
            teacher_name: detail.teacher_name,
            room: detail.room,
            day_of_week: detail.day_of_week,
            time_slot_name: detail.time_slot_name,
            groups,
            total_students: students.len(),
            marked_count,
        };

        Ok(RosterResponse {
            schedule_slot_id: id,
            date,
            lesson_info,
            students,
        })
    }

    async fn roster_entries(
        db: &PgPool,
        section_ids: &[ScheduleSlotId],
        subject_id: SubjectId,
        date: NaiveDate,
    ) -> Result<Vec<RosterEntry>, AppError> {
        let entries = sqlx::query_as::<_, RosterEntry>(
            r#"SELECT st.id AS student_id, st.full_name, g.id AS group_id, g.name AS group_name,
                      sec.id AS schedule_slot_id,
                      (a.id IS NOT NULL) AS is_marked, a.status AS current_status,
                      a.id AS attendance_id, a.marked_at, a.marked_by
               FROM schedule_slots sec
               JOIN groups g ON g.id = sec.group_id
               JOIN students st ON st.group_id = sec.group_id
               LEFT JOIN attendance_records a
                      ON a.student_id = st.id AND a.subject_id = $2 AND a.date = $3
               WHERE sec.id = ANY($1)"#,
        )
        .bind(section_ids.to_vec())
        .bind(subject_id)
        .bind(date)
        .fetch_all(db)
        .await?;
        Ok(entries)
    }
}
