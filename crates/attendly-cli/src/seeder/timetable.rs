//! Weekly timetable generation.

use std::time::Instant;

use attendly_models::{GroupId, SubjectId, TeacherId, TimeSlotId, Weekday};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::SeededCourse;

const TEACHING_DAYS: [Weekday; 5] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonSeed {
    pub group_id: GroupId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub day_of_week: Weekday,
    pub time_slot_id: TimeSlotId,
}

/// Lays out Monday to Friday for every group. The first period of each day
/// is shared by all groups of a course, so it forms a parallel section with
/// one teacher.
pub fn plan_timetable(
    courses: &[SeededCourse],
    time_slots: &[TimeSlotId],
    lessons_per_day: usize,
) -> Vec<LessonSeed> {
    let periods = lessons_per_day.min(time_slots.len());
    let mut lessons = Vec::new();

    for course in courses.iter().filter(|c| !c.subjects.is_empty()) {
        let subject_count = course.subjects.len();
        for (group_idx, &group_id) in course.groups.iter().enumerate() {
            for (day_idx, &day) in TEACHING_DAYS.iter().enumerate() {
                for (period, &time_slot_id) in time_slots.iter().take(periods).enumerate() {
                    let offset = if period == 0 { 0 } else { group_idx };
                    let (subject_id, teacher_id) =
                        course.subjects[(day_idx * periods + period + offset) % subject_count];
                    lessons.push(LessonSeed {
                        group_id,
                        subject_id,
                        teacher_id,
                        day_of_week: day,
                        time_slot_id,
                    });
                }
            }
        }
    }

    lessons
}

pub async fn seed_timetable(
    db: &PgPool,
    courses: &[SeededCourse],
    time_slots: &[TimeSlotId],
    lessons_per_day: usize,
) -> anyhow::Result<u64> {
    let start_time = Instant::now();
    let lessons = plan_timetable(courses, time_slots, lessons_per_day);
    if lessons.is_empty() {
        return Ok(0);
    }
    println!("🗓️  Seeding {} weekly lessons...", lessons.len());

    let mut inserted = 0;
    for chunk in lessons.chunks(1000) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO schedule_slots (group_id, subject_id, teacher_id, day_of_week, time_slot_id) ",
        );
        qb.push_values(chunk, |mut row, lesson| {
            row.push_bind(lesson.group_id)
                .push_bind(lesson.subject_id)
                .push_bind(lesson.teacher_id)
                .push_bind(lesson.day_of_week)
                .push_bind(lesson.time_slot_id);
        });
        qb.push(" ON CONFLICT DO NOTHING");
        inserted += qb.build().execute(db).await?.rows_affected();
    }

    println!("   ✓ Inserted {inserted} lessons in {:?}", start_time.elapsed());
    Ok(inserted)
}
