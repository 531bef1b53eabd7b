//! Row types and their conversion into domain records.

use chrono::{DateTime, Utc};
use marketplace_core::store::StoreError;
use marketplace_core::types::{
    Job, JobId, ProfessionalProfile, Review, ReviewId, Session, User, UserId,
};
use uuid::Uuid;

pub(crate) fn corrupt(table: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("corrupt {table} row: {detail}"))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse().map_err(|e| corrupt("users", e))?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SessionRow {
    token_hash: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            token_hash: row.token_hash,
            user_id: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    user_id: Uuid,
    headline: String,
    bio: String,
    categories: Vec<String>,
    avg_rating: f64,
    total_reviews: i64,
    verification_status: String,
    document_urls: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for ProfessionalProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            headline: row.headline,
            bio: row.bio,
            categories: row.categories,
            avg_rating: row.avg_rating,
            total_reviews: u64::try_from(row.total_reviews)
                .map_err(|e| corrupt("professional_profiles", e))?,
            verification_status: row
                .verification_status
                .parse()
                .map_err(|e| corrupt("professional_profiles", e))?,
            document_urls: row.document_urls,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    budget: f64,
    client_id: Uuid,
    professional_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: JobId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            category: row.category,
            budget: row.budget,
            client_id: UserId::from_uuid(row.client_id),
            professional_id: row.professional_id.map(UserId::from_uuid),
            status: row.status.parse().map_err(|e| corrupt("jobs", e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewRow {
    id: Uuid,
    job_id: Uuid,
    client_id: Uuid,
    professional_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReviewId::from_uuid(row.id),
            job_id: JobId::from_uuid(row.job_id),
            client_id: UserId::from_uuid(row.client_id),
            professional_id: UserId::from_uuid(row.professional_id),
            rating: u8::try_from(row.rating).map_err(|e| corrupt("reviews", e))?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
