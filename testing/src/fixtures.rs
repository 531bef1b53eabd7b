//! Sample records and requests for tests.

use chrono::{DateTime, Utc};
use marketplace_core::types::{
    NewJob, NewReview, ProfileDetails, Registration, Role, User, UserId,
};

/// Password used by every fixture registration.
pub const PASSWORD: &str = "correct-horse-battery";

/// A user record with a placeholder password hash and
/// `{username}@example.com` as email.
#[must_use]
pub fn user(username: &str, role: Role, now: DateTime<Utc>) -> User {
    User {
        id: UserId::new(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        role,
        password_hash: "$argon2id$unusable".to_string(),
        created_at: now,
    }
}

/// A registration request using [`PASSWORD`].
#[must_use]
pub fn registration(username: &str, role: Role) -> Registration {
    Registration {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: PASSWORD.to_string(),
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        role,
    }
}

/// A valid job request.
#[must_use]
pub fn new_job() -> NewJob {
    NewJob {
        title: "Fix leaking kitchen tap".to_string(),
        description: "Tap drips constantly, needs a new washer.".to_string(),
        category: "plumbing".to_string(),
        budget: 150.0,
    }
}

/// A valid job request with a specific budget.
#[must_use]
pub fn new_job_with_budget(budget: f64) -> NewJob {
    NewJob {
        budget,
        ..new_job()
    }
}

/// A review request.
#[must_use]
pub fn review(rating: i64) -> NewReview {
    NewReview {
        rating,
        comment: format!("{rating} stars"),
    }
}

/// Profile details carrying `categories`.
#[must_use]
pub fn profile_details(categories: &[&str]) -> ProfileDetails {
    ProfileDetails {
        headline: "Reliable and tidy".to_string(),
        bio: "Ten years of experience.".to_string(),
        categories: categories.iter().map(ToString::to_string).collect(),
    }
}
