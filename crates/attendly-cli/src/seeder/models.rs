//! Seed records and the knobs that size a seeded institution.

use attendly_models::{CourseId, GroupId, SubjectId, TeacherId, TimeSlotId};
use chrono::NaiveTime;

/// Seeded accounts use this mail domain so `clear` can find them again.
pub const SEED_EMAIL_DOMAIN: &str = "seed.attendly.local";

/// Password given to every seeded account.
pub const DEFAULT_SEED_PASSWORD: &str = "password123";

/// Seed data for a login identity with an optional profile row.
pub struct PersonSeed {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl PersonSeed {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub struct StudentSeed {
    pub person: PersonSeed,
    pub course_id: CourseId,
    pub group_id: GroupId,
}

pub struct SubjectSeed {
    pub name: String,
    pub code: String,
    pub course_id: CourseId,
    pub teacher_id: TeacherId,
}

pub struct TimeSlotSeed {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub sequence: i16,
}

/// A course with the groups and subjects created for it.
#[derive(Clone, Debug)]
pub struct SeededCourse {
    pub id: CourseId,
    pub groups: Vec<GroupId>,
    pub subjects: Vec<(SubjectId, TeacherId)>,
}

#[derive(Clone, Debug)]
pub struct SeededCatalog {
    pub courses: Vec<SeededCourse>,
    pub time_slots: Vec<TimeSlotId>,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub courses: usize,
    pub groups_per_course: usize,
    pub students_per_group: usize,
    pub teachers: usize,
    pub subjects_per_course: usize,
    /// Lessons per group per weekday
    pub lessons_per_day: usize,
    pub password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            courses: 3,
            groups_per_course: 2,
            students_per_group: 20,
            teachers: 8,
            subjects_per_course: 5,
            lessons_per_day: 3,
            password: DEFAULT_SEED_PASSWORD.to_string(),
        }
    }
}

impl SeedConfig {
    pub fn new(courses: usize) -> Self {
        Self {
            courses,
            ..Default::default()
        }
    }

    pub fn with_groups_per_course(mut self, groups: usize) -> Self {
        self.groups_per_course = groups;
        self
    }

    pub fn with_students_per_group(mut self, students: usize) -> Self {
        self.students_per_group = students;
        self
    }

    pub fn with_teachers(mut self, teachers: usize) -> Self {
        self.teachers = teachers.max(1);
        self
    }

    pub fn with_subjects_per_course(mut self, subjects: usize) -> Self {
        self.subjects_per_course = subjects;
        self
    }

    pub fn with_lessons_per_day(mut self, lessons: usize) -> Self {
        self.lessons_per_day = lessons;
        self
    }

    pub fn total_students(&self) -> usize {
        self.courses * self.groups_per_course * self.students_per_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_students() {
        let config = SeedConfig::new(2)
            .with_groups_per_course(3)
            .with_students_per_group(10);
        assert_eq!(config.total_students(), 60);
    }

    #[test]
    fn test_teachers_never_zero() {
        assert_eq!(SeedConfig::default().with_teachers(0).teachers, 1);
    }
}
