use attendly_cli::seeder::{self, DEFAULT_SEED_PASSWORD, SeedConfig};
use attendly_config::DatabaseConfig;
use attendly_models::{Role, UserId};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "attendly-cli")]
#[command(about = "Attendly CLI - Administrative tools for Attendly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StaffRole {
    Admin,
    Manager,
}

impl From<StaffRole> for Role {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Admin => Role::Admin,
            StaffRole::Manager => Role::Manager,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator or manager account
    CreateAdmin {
        /// Login name
        #[arg(short = 'u', long)]
        username: Option<String>,

        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        #[arg(short = 'r', long, value_enum, default_value = "admin")]
        role: StaffRole,
    },
    /// Apply pending schema migrations
    Migrate,
    /// Seed courses, groups, teachers, subjects, students and a timetable
    Seed {
        #[arg(short = 'c', long, default_value = "3")]
        courses: usize,

        #[arg(long, default_value = "2")]
        groups: usize,

        /// Students per group
        #[arg(long, default_value = "20")]
        students: usize,

        #[arg(long, default_value = "8")]
        teachers: usize,

        /// Subjects per course
        #[arg(long, default_value = "5")]
        subjects: usize,

        /// Lessons per group per weekday
        #[arg(long, default_value = "3")]
        lessons: usize,

        /// Password for every seeded account
        #[arg(long, default_value = DEFAULT_SEED_PASSWORD)]
        password: String,
    },
    /// Clear attendance data, the catalog and seeded accounts
    Clear,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config =
        DatabaseConfig::from_env().ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = attendly_db::init_db_pool(&config).await?;

    match cli.command {
        Commands::CreateAdmin {
            username,
            first_name,
            last_name,
            password,
            role,
        } => handle_create_admin(&pool, username, first_name, last_name, password, role).await,
        Commands::Migrate => {
            attendly_db::run_migrations(&pool).await?;
            println!("✅ Migrations applied");
            Ok(())
        }
        Commands::Seed {
            courses,
            groups,
            students,
            teachers,
            subjects,
            lessons,
            password,
        } => {
            let config = SeedConfig {
                password,
                ..SeedConfig::new(courses)
                    .with_groups_per_course(groups)
                    .with_students_per_group(students)
                    .with_teachers(teachers)
                    .with_subjects_per_course(subjects)
                    .with_lessons_per_day(lessons)
            };
            seeder::seed_all(&pool, &config).await?;
            Ok(())
        }
        Commands::Clear => seeder::clear_all(&pool).await,
    }
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    role: StaffRole,
) -> anyhow::Result<()> {
    let username = prompt_if_missing(username, "Username")?;
    let first_name = prompt_if_missing(first_name, "First name")?;
    let last_name = prompt_if_missing(last_name, "Last name")?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let role = Role::from(role);
    create_staff_account(pool, &username, &first_name, &last_name, &password, role).await?;

    println!("\n✅ {role} account created successfully!");
    println!("   Username: {username}");
    println!("   Name: {first_name} {last_name}");
    Ok(())
}

async fn create_staff_account(
    db: &PgPool,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<UserId> {
    let hashed_password = attendly_core::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e.error))?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (username, first_name, last_name, password, role)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (username) DO NOTHING
         RETURNING id",
    )
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(&hashed_password)
    .bind(role)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| anyhow::anyhow!("A user named '{username}' already exists"))
}
