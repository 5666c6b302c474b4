//! Accounts and profiles: teachers and students.

use std::time::Instant;

use attendly_models::{Role, StudentId, TeacherId, UserId};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::models::{PersonSeed, SEED_EMAIL_DOMAIN, SeededCourse, StudentSeed};

// 6 binds per user row
const USER_BATCH_SIZE: usize = 1000;

fn generate_person(prefix: &str, index: usize) -> PersonSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let username = format!("{prefix}{}", index + 1);
    let email = format!(
        "{}.{}+{}@{}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        username,
        SEED_EMAIL_DOMAIN
    );

    PersonSeed {
        username,
        first_name,
        last_name,
        email,
    }
}

pub fn generate_teachers(count: usize) -> Vec<PersonSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| generate_person("teacher", idx))
        .collect()
}

/// Students for every group of every course, numbered across the whole run.
pub fn generate_students(courses: &[SeededCourse], per_group: usize) -> Vec<StudentSeed> {
    let groups: Vec<_> = courses
        .iter()
        .flat_map(|c| c.groups.iter().map(move |g| (c.id, *g)))
        .collect();

    groups
        .par_iter()
        .enumerate()
        .flat_map(|(group_idx, &(course_id, group_id))| {
            (0..per_group)
                .map(|student_idx| StudentSeed {
                    person: generate_person("student", group_idx * per_group + student_idx),
                    course_id,
                    group_id,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

async fn insert_users(
    tx: &mut Transaction<'_, Postgres>,
    people: &[&PersonSeed],
    role: Role,
    password_hash: &str,
) -> Result<Vec<UserId>, sqlx::Error> {
    let mut ids = Vec::with_capacity(people.len());

    for chunk in people.chunks(USER_BATCH_SIZE) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (username, first_name, last_name, email, password, role) ",
        );
        qb.push_values(chunk, |mut row, person| {
            row.push_bind(&person.username)
                .push_bind(&person.first_name)
                .push_bind(&person.last_name)
                .push_bind(&person.email)
                .push_bind(password_hash)
                .push_bind(role);
        });
        qb.push(" RETURNING id");

        let chunk_ids: Vec<UserId> = qb.build_query_scalar().fetch_all(&mut **tx).await?;
        ids.extend(chunk_ids);
    }

    Ok(ids)
}

pub async fn seed_teachers(
    db: &PgPool,
    count: usize,
    password_hash: &str,
) -> anyhow::Result<Vec<TeacherId>> {
    let start_time = Instant::now();
    println!("👩‍🏫 Seeding {count} teachers...");

    let people = generate_teachers(count);
    let refs: Vec<&PersonSeed> = people.iter().collect();

    let mut tx = db.begin().await?;
    let user_ids = insert_users(&mut tx, &refs, Role::Teacher, password_hash).await?;

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO teachers (user_id, full_name) ");
    qb.push_values(user_ids.iter().zip(people.iter()), |mut row, (user_id, person)| {
        row.push_bind(*user_id).push_bind(person.full_name());
    });
    qb.push(" RETURNING id");
    let teacher_ids: Vec<TeacherId> = qb.build_query_scalar().fetch_all(&mut *tx).await?;

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} teachers in {:?}",
        teacher_ids.len(),
        start_time.elapsed()
    );
    Ok(teacher_ids)
}

pub async fn seed_students(
    db: &PgPool,
    courses: &[SeededCourse],
    per_group: usize,
    password_hash: &str,
) -> anyhow::Result<Vec<StudentId>> {
    let start_time = Instant::now();
    let seeds = generate_students(courses, per_group);
    println!("🎓 Seeding {} students ({per_group} per group)...", seeds.len());

    let mut tx = db.begin().await?;
    let refs: Vec<&PersonSeed> = seeds.iter().map(|s| &s.person).collect();
    let user_ids = insert_users(&mut tx, &refs, Role::Student, password_hash).await?;

    let mut student_ids = Vec::with_capacity(seeds.len());
    let rows: Vec<_> = user_ids.iter().zip(seeds.iter()).collect();
    for chunk in rows.chunks(USER_BATCH_SIZE) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO students (user_id, full_name, course_id, group_id) ");
        qb.push_values(chunk, |mut row, (user_id, seed)| {
            row.push_bind(**user_id)
                .push_bind(seed.person.full_name())
                .push_bind(seed.course_id)
                .push_bind(seed.group_id);
        });
        qb.push(" RETURNING id");
        let ids: Vec<StudentId> = qb.build_query_scalar().fetch_all(&mut *tx).await?;
        student_ids.extend(ids);
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} students in {:?}",
        student_ids.len(),
        start_time.elapsed()
    );
    Ok(student_ids)
}

/// Deletes seeded accounts. Hand-made admins are kept.
pub async fn clear_users(db: &PgPool) -> anyhow::Result<u64> {
    let deleted = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(format!("%@{SEED_EMAIL_DOMAIN}"))
        .execute(db)
        .await?
        .rows_affected();
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendly_models::{CourseId, GroupId};

    #[test]
    fn test_generated_usernames_are_unique() {
        let courses = vec![SeededCourse {
            id: CourseId::new(),
            groups: vec![GroupId::new(), GroupId::new()],
            subjects: Vec::new(),
        }];
        let students = generate_students(&courses, 5);
        assert_eq!(students.len(), 10);

        let mut names: Vec<_> = students.iter().map(|s| s.person.username.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_seed_emails_use_seed_domain() {
        for teacher in generate_teachers(3) {
            assert!(teacher.email.ends_with(SEED_EMAIL_DOMAIN));
        }
    }
}
