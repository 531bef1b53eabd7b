//! Domain types for the marketplace.
//!
//! Identifiers are UUID newtypes so a job id can never be passed where a
//! user id is expected. Status enums serialize as `snake_case` strings, which
//! is also how they are stored in Postgres.

use crate::error::MarketplaceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an identifier from its textual form.
            ///
            /// # Errors
            ///
            /// Returns [`MarketplaceError::InvalidArgument`] when `raw` is not a UUID.
            pub fn parse(raw: &str) -> Result<Self, MarketplaceError> {
                Uuid::parse_str(raw.trim()).map(Self).map_err(|_| {
                    MarketplaceError::InvalidArgument(format!(
                        "'{raw}' is not a valid {} id",
                        $entity
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of a user account.
    UserId,
    "user"
);
uuid_id!(
    /// Unique identifier of a job.
    JobId,
    "job"
);
uuid_id!(
    /// Unique identifier of a review.
    ReviewId,
    "review"
);

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// Account role. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Posts jobs and reviews completed work.
    Client,
    /// Accepts and performs jobs.
    Professional,
    /// Platform operator.
    Admin,
}

impl Role {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Professional => "professional",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "professional" => Ok(Self::Professional),
            "admin" => Ok(Self::Admin),
            other => Err(MarketplaceError::InvalidArgument(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Account id.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique, lowercased email address.
    pub email: String,
    /// Given name.
    #[serde(rename = "firstName")]
    pub first_name: String,
    /// Family name.
    #[serde(rename = "lastName")]
    pub last_name: String,
    /// Account role.
    pub role: Role,
    /// Encoded salted password hash. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Resolved user id.
    pub id: UserId,
    /// Resolved role.
    pub role: Role,
}

impl Caller {
    /// Build a caller from its parts.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

/// A bearer session. Only the SHA-256 digest of the token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Base64url SHA-256 digest of the bearer token.
    pub token_hash: String,
    /// Owner of the session.
    pub user_id: UserId,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still usable at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password. Hashed before storage.
    pub password: String,
    /// Given name.
    #[serde(rename = "firstName", alias = "first_name", default)]
    pub first_name: String,
    /// Family name.
    #[serde(rename = "lastName", alias = "last_name", default)]
    pub last_name: String,
    /// Requested role.
    pub role: Role,
}

// ═══════════════════════════════════════════════════════════════════════
// Professional profiles
// ═══════════════════════════════════════════════════════════════════════

/// Document verification state of a professional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No documents yet.
    #[default]
    NotSubmitted,
    /// Documents submitted, awaiting an admin decision.
    Pending,
    /// Approved by an admin.
    Verified,
    /// Declined by an admin. Documents may be resubmitted.
    Rejected,
}

impl VerificationStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotSubmitted => "not_submitted",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Whether new documents may be submitted from this state.
    #[must_use]
    pub const fn accepts_documents(self) -> bool {
        !matches!(self, Self::Verified)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_submitted" => Ok(Self::NotSubmitted),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(MarketplaceError::InvalidArgument(format!(
                "unknown verification status '{other}'"
            ))),
        }
    }
}

/// Outcome of an admin review of submitted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    /// Approve.
    Verified,
    /// Decline.
    Rejected,
}

impl From<VerificationDecision> for VerificationStatus {
    fn from(decision: VerificationDecision) -> Self {
        match decision {
            VerificationDecision::Verified => Self::Verified,
            VerificationDecision::Rejected => Self::Rejected,
        }
    }
}

/// Business-facing record of a professional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalProfile {
    /// Owning user. Also the profile key.
    pub user_id: UserId,
    /// Short tagline.
    pub headline: String,
    /// Longer description.
    pub bio: String,
    /// Normalized category tags.
    pub categories: Vec<String>,
    /// Mean review rating, rounded to two decimals.
    pub avg_rating: f64,
    /// Number of reviews behind `avg_rating`.
    pub total_reviews: u64,
    /// Document verification state.
    pub verification_status: VerificationStatus,
    /// Reference URLs of submitted documents.
    pub document_urls: Vec<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ProfessionalProfile {
    /// An empty profile with default aggregate and verification fields.
    #[must_use]
    pub const fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            headline: String::new(),
            bio: String::new(),
            categories: Vec::new(),
            avg_rating: 0.0,
            total_reviews: 0,
            verification_status: VerificationStatus::NotSubmitted,
            document_urls: Vec::new(),
            updated_at: now,
        }
    }
}

/// The caller-editable part of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProfileDetails {
    /// Short tagline.
    #[serde(default)]
    pub headline: String,
    /// Longer description.
    #[serde(default)]
    pub bio: String,
    /// Category tags. Normalized before storage.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Ordering for professional listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSort {
    /// Highest rated first.
    RatingDesc,
    /// Lowest rated first.
    RatingAsc,
}

impl FromStr for RatingSort {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating_desc" => Ok(Self::RatingDesc),
            "rating_asc" => Ok(Self::RatingAsc),
            other => Err(MarketplaceError::InvalidArgument(format!(
                "unknown sort '{other}', expected rating_desc or rating_asc"
            ))),
        }
    }
}

/// Filter and ordering for professional listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileQuery {
    /// Lowercased category tag the profile must carry.
    pub category: Option<String>,
    /// Optional rating order. Without it, most recently updated first.
    pub sort: Option<RatingSort>,
    /// Maximum number of results.
    pub limit: usize,
}

impl ProfileQuery {
    /// Listing cap for public queries.
    pub const MAX_LIMIT: usize = 100;

    /// Build a query, normalizing the category.
    #[must_use]
    pub fn new(category: Option<&str>, sort: Option<RatingSort>) -> Self {
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        Self {
            category,
            sort,
            limit: Self::MAX_LIMIT,
        }
    }

    /// Whether `profile` passes the category filter.
    #[must_use]
    pub fn matches(&self, profile: &ProfessionalProfile) -> bool {
        self.category
            .as_ref()
            .is_none_or(|c| profile.categories.iter().any(|tag| tag == c))
    }

    /// Filter, order and truncate `profiles` in place.
    pub fn apply(&self, profiles: &mut Vec<ProfessionalProfile>) {
        profiles.retain(|p| self.matches(p));
        match self.sort {
            Some(RatingSort::RatingDesc) => profiles.sort_by(|a, b| {
                b.avg_rating
                    .total_cmp(&a.avg_rating)
                    .then_with(|| a.user_id.cmp(&b.user_id))
            }),
            Some(RatingSort::RatingAsc) => profiles.sort_by(|a, b| {
                a.avg_rating
                    .total_cmp(&b.avg_rating)
                    .then_with(|| a.user_id.cmp(&b.user_id))
            }),
            None => profiles.sort_by(|a, b| {
                b.updated_at
                    .cmp(&a.updated_at)
                    .then_with(|| a.user_id.cmp(&b.user_id))
            }),
        }
        profiles.truncate(self.limit);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Jobs
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle state of a job.
///
/// The only transitions are `posted → accepted → in_progress → completed`.
/// `Cancelled` is terminal and no operation currently produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Open for professionals to accept.
    Posted,
    /// Assigned to a professional.
    Accepted,
    /// Work underway.
    InProgress,
    /// Work finished, reviewable.
    Completed,
    /// Withdrawn.
    Cancelled,
}

impl JobStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Posted,
        Self::Accepted,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posted => "posted",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| MarketplaceError::InvalidArgument(format!("unknown job status '{s}'")))
    }
}

/// One unit of requested work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// Job id.
    pub id: JobId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Category the job belongs to.
    pub category: String,
    /// Offered budget, never negative.
    pub budget: f64,
    /// Client who posted the job.
    pub client_id: UserId,
    /// Professional assigned on acceptance. Never changes once set.
    pub professional_id: Option<UserId>,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Posting time.
    pub created_at: DateTime<Utc>,
    /// Time of the last transition.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly posted job owned by `client_id`.
    #[must_use]
    pub fn post(new_job: NewJob, client_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            title: new_job.title,
            description: new_job.description,
            category: new_job.category,
            budget: new_job.budget,
            client_id,
            professional_id: None,
            status: JobStatus::Posted,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job creation request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewJob {
    /// Short title, 5 to 100 characters.
    pub title: String,
    /// Description, at most 2000 characters.
    #[serde(default)]
    pub description: String,
    /// Category.
    pub category: String,
    /// Non-negative budget.
    pub budget: f64,
}

// ═══════════════════════════════════════════════════════════════════════
// Reviews
// ═══════════════════════════════════════════════════════════════════════

/// Client feedback on one completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    /// Review id.
    pub id: ReviewId,
    /// Reviewed job. At most one review per job.
    pub job_id: JobId,
    /// Author, always the job's client.
    pub client_id: UserId,
    /// Reviewed professional, copied from the job.
    pub professional_id: UserId,
    /// Rating between 1 and 5.
    pub rating: u8,
    /// Free-form comment.
    pub comment: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Review submission request.
///
/// `rating` is wide on purpose so out-of-range values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReview {
    /// Rating between 1 and 5.
    pub rating: i64,
    /// Comment, at most 1000 characters.
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(rating: f64, categories: &[&str], minute: u32) -> ProfessionalProfile {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap();
        ProfessionalProfile {
            avg_rating: rating,
            categories: categories.iter().map(ToString::to_string).collect(),
            ..ProfessionalProfile::empty(UserId::new(), now)
        }
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        let err = JobId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidArgument(_)));

        let id = JobId::new();
        assert_eq!(JobId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_job_status_round_trips_through_str() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: UserId::new(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            role: Role::Client,
            password_hash: "sha256$salt$hash".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["firstName"], "Alice");
        assert_eq!(json["role"], "client");
    }

    #[test]
    fn test_registration_accepts_snake_case_names() {
        let reg: Registration = serde_json::from_str(
            r#"{"username":"bob","email":"b@x.io","password":"secret123","first_name":"Bob","role":"professional"}"#,
        )
        .unwrap();
        assert_eq!(reg.first_name, "Bob");
        assert_eq!(reg.last_name, "");
        assert_eq!(reg.role, Role::Professional);
    }

    #[test]
    fn test_profile_query_filters_by_tag_and_sorts() {
        let mut profiles = vec![
            profile(3.5, &["plumbing"], 1),
            profile(4.8, &["plumbing", "tiling"], 2),
            profile(5.0, &["electrical"], 3),
        ];

        let query = ProfileQuery::new(Some(" Plumbing "), Some(RatingSort::RatingDesc));
        query.apply(&mut profiles);

        let ratings: Vec<f64> = profiles.iter().map(|p| p.avg_rating).collect();
        assert_eq!(ratings, vec![4.8, 3.5]);
    }

    #[test]
    fn test_profile_query_without_sort_uses_recency() {
        let mut profiles = vec![profile(1.0, &[], 1), profile(2.0, &[], 5)];
        ProfileQuery::new(None, None).apply(&mut profiles);
        assert!((profiles[0].avg_rating - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_verification_status_accepts_documents() {
        assert!(VerificationStatus::NotSubmitted.accepts_documents());
        assert!(VerificationStatus::Rejected.accepts_documents());
        assert!(!VerificationStatus::Verified.accepts_documents());
    }
}
