//! Development data seeding.
//!
//! [`seed_all`] builds a small institution: periods, teachers, courses with
//! groups and subjects, students and a Monday to Friday timetable. Every
//! seeded account shares one password and a mail domain that [`clear_all`]
//! uses to remove them again.

pub mod catalog;
pub mod models;
pub mod people;
pub mod timetable;

use std::time::Instant;

use sqlx::PgPool;

pub use models::{DEFAULT_SEED_PASSWORD, SEED_EMAIL_DOMAIN, SeedConfig, SeededCatalog};

/// Seeds everything described by `config` and returns the catalog it built.
pub async fn seed_all(db: &PgPool, config: &SeedConfig) -> anyhow::Result<SeededCatalog> {
    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    let password_hash = attendly_core::hash_password(&config.password)
        .map_err(|e| anyhow::anyhow!("Failed to hash seed password: {}", e.error))?;

    let time_slots = catalog::seed_time_slots(db).await?;
    let teachers = people::seed_teachers(db, config.teachers, &password_hash).await?;
    let courses = catalog::seed_courses(
        db,
        config.courses,
        config.groups_per_course,
        config.subjects_per_course,
        &teachers,
    )
    .await?;
    people::seed_students(db, &courses, config.students_per_group, &password_hash).await?;
    timetable::seed_timetable(db, &courses, &time_slots, config.lessons_per_day).await?;

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   All seeded accounts use the password: {}", config.password);

    Ok(SeededCatalog {
        courses,
        time_slots,
    })
}

/// Removes all attendance data, the catalog and seeded accounts.
///
/// Accounts outside the seed mail domain survive, with their role intact.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;
    for table in [
        "notifications",
        "attendance_audit_log",
        "attendance_records",
        "leave_requests",
        "schedule_slots",
        "student_parents",
        "students",
        "subjects",
        "teachers",
        "groups",
        "courses",
        "time_slots",
    ] {
        let deleted = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        println!("   ✓ {table}: {deleted} rows");
    }
    tx.commit().await?;

    let users = people::clear_users(db).await?;
    println!("   ✓ users: {users} rows");
    println!("\n✅ Cleared in {:?}", start_time.elapsed());
    Ok(())
}
