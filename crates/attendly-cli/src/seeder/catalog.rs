//! Courses, groups, periods and subjects.

use std::time::Instant;

use attendly_models::{CourseId, GroupId, SubjectId, TeacherId, TimeSlotId};
use chrono::NaiveTime;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{SeededCourse, SubjectSeed, TimeSlotSeed};

const SUBJECT_NAMES: [&str; 10] = [
    "Mathematics",
    "Physics",
    "Programming",
    "Databases",
    "History",
    "English",
    "Economics",
    "Networks",
    "Statistics",
    "Philosophy",
];

/// Six 80-minute periods starting at 08:00 with 10-minute breaks.
pub fn standard_time_slots() -> Vec<TimeSlotSeed> {
    (0..6)
        .filter_map(|idx: u32| {
            let start_minutes = 8 * 60 + idx * 90;
            let end_minutes = start_minutes + 80;
            Some(TimeSlotSeed {
                name: format!("Period {}", idx + 1),
                start_time: NaiveTime::from_hms_opt(start_minutes / 60, start_minutes % 60, 0)?,
                end_time: NaiveTime::from_hms_opt(end_minutes / 60, end_minutes % 60, 0)?,
                sequence: idx as i16 + 1,
            })
        })
        .collect()
}

/// Subjects for a course, handing teachers out round-robin.
pub fn generate_subjects(
    course_idx: usize,
    course_id: CourseId,
    count: usize,
    teachers: &[TeacherId],
) -> Vec<SubjectSeed> {
    if teachers.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|idx| {
            let name = SUBJECT_NAMES[idx % SUBJECT_NAMES.len()];
            SubjectSeed {
                name: format!("{name} {}", course_idx + 1),
                code: format!("{}{}{:02}", &name[..3].to_uppercase(), course_idx + 1, idx + 1),
                course_id,
                teacher_id: teachers[(course_idx * count + idx) % teachers.len()],
            }
        })
        .collect()
}

pub async fn seed_time_slots(db: &PgPool) -> anyhow::Result<Vec<TimeSlotId>> {
    let slots = standard_time_slots();

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO time_slots (name, start_time, end_time, sequence) ");
    qb.push_values(&slots, |mut row, slot| {
        row.push_bind(&slot.name)
            .push_bind(slot.start_time)
            .push_bind(slot.end_time)
            .push_bind(slot.sequence);
    });
    qb.push(" RETURNING id");

    let ids: Vec<TimeSlotId> = qb.build_query_scalar().fetch_all(db).await?;
    println!("   ✓ Inserted {} time slots", ids.len());
    Ok(ids)
}

/// Creates courses with their groups and subjects.
pub async fn seed_courses(
    db: &PgPool,
    courses: usize,
    groups_per_course: usize,
    subjects_per_course: usize,
    teachers: &[TeacherId],
) -> anyhow::Result<Vec<SeededCourse>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {courses} courses with {groups_per_course} groups each...");

    let mut tx = db.begin().await?;
    let mut seeded = Vec::with_capacity(courses);

    for course_idx in 0..courses {
        let year = (course_idx % 4) as i16 + 1;
        let course_id: CourseId = sqlx::query_scalar(
            "INSERT INTO courses (name, year) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET year = EXCLUDED.year
             RETURNING id",
        )
        .bind(format!("Course {}", course_idx + 1))
        .bind(year)
        .fetch_one(&mut *tx)
        .await?;

        let mut groups = Vec::with_capacity(groups_per_course);
        for group_idx in 0..groups_per_course {
            let group_id: GroupId = sqlx::query_scalar(
                "INSERT INTO groups (name, course_id) VALUES ($1, $2)
                 ON CONFLICT (course_id, name) DO UPDATE SET name = EXCLUDED.name
                 RETURNING id",
            )
            .bind(format!("{}{:02}", course_idx + 1, group_idx + 1))
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;
            groups.push(group_id);
        }

        let mut subjects = Vec::with_capacity(subjects_per_course);
        for seed in generate_subjects(course_idx, course_id, subjects_per_course, teachers) {
            let subject_id: SubjectId = sqlx::query_scalar(
                "INSERT INTO subjects (name, code, course_id, teacher_id)
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(&seed.name)
            .bind(&seed.code)
            .bind(seed.course_id)
            .bind(seed.teacher_id)
            .fetch_one(&mut *tx)
            .await?;
            subjects.push((subject_id, seed.teacher_id));
        }

        seeded.push(SeededCourse {
            id: course_id,
            groups,
            subjects,
        });
    }

    tx.commit().await?;
    println!("   ✓ Seeded courses in {:?}", start_time.elapsed());
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_time_slots_do_not_overlap() {
        let slots = standard_time_slots();
        assert_eq!(slots.len(), 6);
        for pair in slots.windows(2) {
            assert!(pair[0].end_time < pair[1].start_time);
            assert_eq!(pair[0].sequence + 1, pair[1].sequence);
        }
        assert_eq!(slots[0].start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn test_subjects_rotate_teachers() {
        let teachers = vec![TeacherId::new(), TeacherId::new()];
        let subjects = generate_subjects(0, CourseId::new(), 3, &teachers);
        assert_eq!(subjects[0].teacher_id, teachers[0]);
        assert_eq!(subjects[1].teacher_id, teachers[1]);
        assert_eq!(subjects[2].teacher_id, teachers[0]);
        assert_eq!(subjects[0].code, "MAT101");
    }

    #[test]
    fn test_no_subjects_without_teachers() {
        assert!(generate_subjects(0, CourseId::new(), 3, &[]).is_empty());
    }
}
