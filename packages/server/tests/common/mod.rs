//! Test harness with testcontainers for integration testing.
//!
//! A single Postgres container is shared across all tests: it is started and
//! migrated once on first use, and each test connects with its own pool.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use server_core::domains::users::{
    Address, Identification, Preferences, User, UserProfile,
};

struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Fresh pool against the shared, migrated database.
pub async fn test_pool() -> PgPool {
    let infra = SharedTestInfra::get().await;
    PgPool::connect(&infra.db_url)
        .await
        .expect("Failed to connect to test database")
}

/// Minimal user fixture. Emails are randomized so tests sharing the database
/// never collide on the unique constraint.
pub fn sample_user(role: &str) -> User {
    let tag = Uuid::new_v4().simple().to_string();
    User {
        id: Uuid::nil(),
        name: format!("Test User {}", &tag[..6]),
        email: format!("user-{tag}@example.org"),
        password_hash: "not-a-real-hash".to_string(),
        role: role.to_string(),
        phone: "+251911000000".to_string(),
        alternative_phone: None,
        date_of_birth: None,
        gender: None,
        address: Json(Address::default()),
        identification: Json(Identification::default()),
        profile: Json(UserProfile::default()),
        preferences: Json(Preferences::default()),
        membership_status: "none".to_string(),
        membership_expiry: None,
        volunteer_status: "active".to_string(),
        total_hours: 0.0,
        activities_completed: 0,
        donations_made: 0,
        trainings_completed: 0,
        recognitions_received: 0,
        verified: false,
        verified_at: None,
        last_login_at: None,
        hub_affiliation: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
