//! `PostgreSQL` store for the marketplace.
//!
//! [`PostgresStore`] implements every store trait from `marketplace-core` on
//! a `sqlx` connection pool. Queries are checked at runtime, so building the
//! crate needs no database.
//!
//! Job transitions and verification writes are a single conditional
//! statement guarded by the expected status, which makes the compare-and-set
//! atomic without explicit locking. Rating refreshes take a per-professional
//! advisory lock so the last refresh always sees every committed review.
//!
//! # Example
//!
//! ```ignore
//! use marketplace_postgres::PostgresStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresStore::connect("postgres://localhost/marketplace", 10, 5).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;

use chrono::{DateTime, Utc};
use marketplace_core::store::{
    JobStore, JobTransition, MarketplaceStore, ProfileStore, ReviewStore, SessionStore,
    StoreError, StoreFuture, UserStore, VerificationUpdate,
};
use marketplace_core::types::{
    Job, JobId, JobStatus, ProfessionalProfile, ProfileDetails, ProfileQuery, RatingSort, Review,
    Session, User, UserId, VerificationStatus,
};
use rows::{JobRow, ProfileRow, ReviewRow, SessionRow, UserRow, convert_all, corrupt};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

const JOB_COLUMNS: &str = "id, title, description, category, budget, client_id, \
                           professional_id, status, created_at, updated_at";
const PROFILE_COLUMNS: &str = "user_id, headline, bio, categories, avg_rating, total_reviews, \
                               verification_status, document_urls, updated_at";
const REVIEW_COLUMNS: &str = "id, job_id, client_id, professional_id, rating, comment, created_at";
const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, role, password_hash, created_at";

/// Map a driver error to a store error, counting it by operation.
///
/// Unique violations become [`StoreError::Duplicate`] on the field named by
/// the violated constraint. Everything else is [`StoreError::Unavailable`].
fn map_err(operation: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |err| {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some("users_username_key") => "username",
                    Some("users_email_key") => "email",
                    Some("reviews_job_id_key") => "review for job",
                    _ => "record",
                };
                return StoreError::Duplicate { field };
            }
        }

        tracing::error!(operation, error = %err, "Postgres query failed");
        metrics::counter!("marketplace_store_errors_total", "operation" => operation).increment(1);
        StoreError::Unavailable(format!("{operation}: {err}"))
    }
}

/// Store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if no connection can be opened
    /// within `connect_timeout_secs`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(map_err("connect"))?;

        tracing::info!(max_connections, "Postgres pool connected");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))?;
        tracing::info!("Postgres migrations applied");
        Ok(())
    }

    async fn fetch_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err("find_job"))?
            .map(Job::try_from)
            .transpose()
    }

    /// Stored verification status. A missing profile has not submitted.
    async fn fetch_verification_status(
        &self,
        user_id: UserId,
    ) -> Result<VerificationStatus, StoreError> {
        let status: Option<(String,)> = sqlx::query_as(
            "SELECT verification_status FROM professional_profiles WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err("find_profile"))?;

        status.map_or(Ok(VerificationStatus::NotSubmitted), |(status,)| {
            status
                .parse()
                .map_err(|e| corrupt("professional_profiles", e))
        })
    }

    async fn jobs_with_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_err("list_jobs_by_status"))?;
        convert_all(rows)
    }

    async fn jobs_for_user(
        &self,
        operation: &'static str,
        column: &str,
        user_id: UserId,
    ) -> Result<Vec<Job>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE {column} = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(operation))?;
        convert_all(rows)
    }
}

impl UserStore for PostgresStore {
    fn insert_user(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO users
                    (id, username, email, first_name, last_name, role, password_hash, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role.as_str())
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_err("insert_user"))?;
            Ok(user)
        })
    }

    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("find_user"))?
                .map(User::try_from)
                .transpose()
        })
    }

    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("find_user_by_username"))?
                .map(User::try_from)
                .transpose()
        })
    }

    fn count_users(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await
                .map_err(map_err("count_users"))?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
    }
}

impl SessionStore for PostgresStore {
    fn insert_session(&self, session: Session) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&session.token_hash)
            .bind(session.user_id.as_uuid())
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_err("insert_session"))?;
            Ok(())
        })
    }

    fn find_session<'a>(&'a self, token_hash: &'a str) -> StoreFuture<'a, Option<Session>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, SessionRow>(
                "SELECT token_hash, user_id, created_at, expires_at \
                 FROM sessions WHERE token_hash = $1",
            )
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err("find_session"))?;
            Ok(row.map(Session::from))
        })
    }
}

impl ProfileStore for PostgresStore {
    fn upsert_profile_details(
        &self,
        user_id: UserId,
        details: ProfileDetails,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            let sql = format!(
                r"
                INSERT INTO professional_profiles (user_id, headline, bio, categories, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (user_id) DO UPDATE
                SET headline = EXCLUDED.headline,
                    bio = EXCLUDED.bio,
                    categories = EXCLUDED.categories,
                    updated_at = EXCLUDED.updated_at
                RETURNING {PROFILE_COLUMNS}
                "
            );
            let row = sqlx::query_as::<_, ProfileRow>(&sql)
                .bind(user_id.as_uuid())
                .bind(&details.headline)
                .bind(&details.bio)
                .bind(&details.categories)
                .bind(at)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err("upsert_profile_details"))?;
            ProfessionalProfile::try_from(row)
        })
    }

    fn find_profile(&self, user_id: UserId) -> StoreFuture<'_, Option<ProfessionalProfile>> {
        Box::pin(async move {
            let sql = format!("SELECT {PROFILE_COLUMNS} FROM professional_profiles WHERE user_id = $1");
            sqlx::query_as::<_, ProfileRow>(&sql)
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("find_profile"))?
                .map(ProfessionalProfile::try_from)
                .transpose()
        })
    }

    fn list_profiles(&self, query: ProfileQuery) -> StoreFuture<'_, Vec<ProfessionalProfile>> {
        Box::pin(async move {
            let order = match query.sort {
                Some(RatingSort::RatingDesc) => "avg_rating DESC, user_id ASC",
                Some(RatingSort::RatingAsc) => "avg_rating ASC, user_id ASC",
                None => "updated_at DESC, user_id ASC",
            };
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM professional_profiles \
                 WHERE $1::TEXT IS NULL OR $1 = ANY(categories) \
                 ORDER BY {order} LIMIT $2"
            );
            let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
            let rows = sqlx::query_as::<_, ProfileRow>(&sql)
                .bind(query.category.as_deref())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err("list_profiles"))?;
            convert_all(rows)
        })
    }

    fn save_verification(
        &self,
        update: VerificationUpdate,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            // Only a first submission may create the row.
            let sql = if update.expected == VerificationStatus::NotSubmitted {
                format!(
                    r"
                    INSERT INTO professional_profiles
                        (user_id, verification_status, document_urls, updated_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (user_id) DO UPDATE
                    SET verification_status = EXCLUDED.verification_status,
                        document_urls = EXCLUDED.document_urls,
                        updated_at = EXCLUDED.updated_at
                    WHERE professional_profiles.verification_status = $5
                    RETURNING {PROFILE_COLUMNS}
                    "
                )
            } else {
                format!(
                    r"
                    UPDATE professional_profiles
                    SET verification_status = $2,
                        document_urls = $3,
                        updated_at = $4
                    WHERE user_id = $1 AND verification_status = $5
                    RETURNING {PROFILE_COLUMNS}
                    "
                )
            };
            let updated = sqlx::query_as::<_, ProfileRow>(&sql)
                .bind(update.user_id.as_uuid())
                .bind(update.status.as_str())
                .bind(&update.document_urls)
                .bind(update.at)
                .bind(update.expected.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("save_verification"))?;

            if let Some(row) = updated {
                return ProfessionalProfile::try_from(row);
            }

            Err(StoreError::VerificationMismatch {
                user_id: update.user_id,
                expected: update.expected,
                current: self.fetch_verification_status(update.user_id).await?,
            })
        })
    }

    fn refresh_rating(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(map_err("refresh_rating"))?;

            // Released on commit. Each statement after it reads a fresh
            // snapshot, so a waiting refresh sees reviews committed meanwhile.
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT, 0))")
                .bind(user_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(map_err("refresh_rating"))?;

            let sql = format!(
                r"
                INSERT INTO professional_profiles (user_id, avg_rating, total_reviews, updated_at)
                SELECT $1,
                       COALESCE(ROUND(AVG(rating)::NUMERIC, 2), 0)::DOUBLE PRECISION,
                       COUNT(*),
                       $2
                FROM reviews
                WHERE professional_id = $1
                ON CONFLICT (user_id) DO UPDATE
                SET avg_rating = EXCLUDED.avg_rating,
                    total_reviews = EXCLUDED.total_reviews,
                    updated_at = EXCLUDED.updated_at
                RETURNING {PROFILE_COLUMNS}
                "
            );
            let row = sqlx::query_as::<_, ProfileRow>(&sql)
                .bind(user_id.as_uuid())
                .bind(at)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_err("refresh_rating"))?;

            tx.commit().await.map_err(map_err("refresh_rating"))?;
            ProfessionalProfile::try_from(row)
        })
    }

    fn profile_categories(&self) -> StoreFuture<'_, Vec<Vec<String>>> {
        Box::pin(async move {
            let rows: Vec<(Vec<String>,)> =
                sqlx::query_as("SELECT categories FROM professional_profiles")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_err("profile_categories"))?;
            Ok(rows.into_iter().map(|(categories,)| categories).collect())
        })
    }
}

impl JobStore for PostgresStore {
    fn insert_job(&self, job: Job) -> StoreFuture<'_, Job> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO jobs
                    (id, title, description, category, budget, client_id,
                     professional_id, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ",
            )
            .bind(job.id.as_uuid())
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.category)
            .bind(job.budget)
            .bind(job.client_id.as_uuid())
            .bind(job.professional_id.map(|id| *id.as_uuid()))
            .bind(job.status.as_str())
            .bind(job.created_at)
            .bind(job.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_err("insert_job"))?;
            Ok(job)
        })
    }

    fn find_job(&self, id: JobId) -> StoreFuture<'_, Option<Job>> {
        Box::pin(self.fetch_job(id))
    }

    fn list_jobs_by_client(&self, client_id: UserId) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(self.jobs_for_user("list_jobs_by_client", "client_id", client_id))
    }

    fn list_jobs_by_professional(&self, professional_id: UserId) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(self.jobs_for_user(
            "list_jobs_by_professional",
            "professional_id",
            professional_id,
        ))
    }

    fn list_jobs_by_status(&self, status: JobStatus) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(self.jobs_with_status(status))
    }

    fn transition_job(&self, transition: JobTransition) -> StoreFuture<'_, Job> {
        Box::pin(async move {
            let sql = format!(
                r"
                UPDATE jobs
                SET status = $3,
                    professional_id = COALESCE(professional_id, $4),
                    updated_at = $5
                WHERE id = $1 AND status = $2
                RETURNING {JOB_COLUMNS}
                "
            );
            let updated = sqlx::query_as::<_, JobRow>(&sql)
                .bind(transition.job_id.as_uuid())
                .bind(transition.expected.as_str())
                .bind(transition.next.as_str())
                .bind(transition.professional_id.map(|id| *id.as_uuid()))
                .bind(transition.at)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("transition_job"))?;

            if let Some(row) = updated {
                return Job::try_from(row);
            }

            // No row matched: either the job is gone or its status moved on.
            match self.fetch_job(transition.job_id).await? {
                Some(current) => Err(StoreError::StatusMismatch {
                    job_id: transition.job_id,
                    expected: transition.expected,
                    current: current.status,
                }),
                None => Err(StoreError::NotFound {
                    entity: "job",
                    id: transition.job_id.to_string(),
                }),
            }
        })
    }

    fn job_status_counts(&self) -> StoreFuture<'_, Vec<(JobStatus, u64)>> {
        Box::pin(async move {
            let rows: Vec<(String, i64)> =
                sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_err("job_status_counts"))?;

            rows.into_iter()
                .map(|(status, count)| {
                    let status = status
                        .parse::<JobStatus>()
                        .map_err(|e| StoreError::Unavailable(format!("corrupt jobs row: {e}")))?;
                    Ok((status, u64::try_from(count).unwrap_or(0)))
                })
                .collect()
        })
    }
}

impl ReviewStore for PostgresStore {
    fn insert_review(&self, review: Review) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO reviews
                    (id, job_id, client_id, professional_id, rating, comment, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(review.id.as_uuid())
            .bind(review.job_id.as_uuid())
            .bind(review.client_id.as_uuid())
            .bind(review.professional_id.as_uuid())
            .bind(i16::from(review.rating))
            .bind(&review.comment)
            .bind(review.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_err("insert_review"))?;
            Ok(review)
        })
    }

    fn find_review_by_job(&self, job_id: JobId) -> StoreFuture<'_, Option<Review>> {
        Box::pin(async move {
            let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE job_id = $1");
            sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(job_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("find_review_by_job"))?
                .map(Review::try_from)
                .transpose()
        })
    }

    fn list_reviews_for_professional(
        &self,
        professional_id: UserId,
    ) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews WHERE professional_id = $1 \
                 ORDER BY created_at DESC, id DESC"
            );
            let rows = sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(professional_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(map_err("list_reviews_for_professional"))?;
            convert_all(rows)
        })
    }
}

impl MarketplaceStore for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(map_err("ping"))?;
            Ok(())
        })
    }
}
