//! Field validation for incoming requests.
//!
//! Each function checks limits and returns a normalized copy. Failures are
//! [`MarketplaceError::InvalidArgument`] naming the offending field.

use crate::error::MarketplaceError;
use crate::types::{NewJob, NewReview, ProfileDetails, Registration};

/// Job title length bounds, in characters.
pub const TITLE_LEN: (usize, usize) = (5, 100);
/// Maximum job description length.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum profile headline length.
pub const MAX_HEADLINE_LEN: usize = 100;
/// Maximum profile bio length.
pub const MAX_BIO_LEN: usize = 1000;
/// Maximum review comment length.
pub const MAX_COMMENT_LEN: usize = 1000;
/// Username length bounds.
pub const USERNAME_LEN: (usize, usize) = (3, 50);
/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Maximum first/last name length.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum email length.
pub const MAX_EMAIL_LEN: usize = 254;
/// Maximum number of documents in one submission.
pub const MAX_DOCUMENTS: usize = 10;

fn invalid(message: impl Into<String>) -> MarketplaceError {
    MarketplaceError::InvalidArgument(message.into())
}

fn check_max(field: &str, value: &str, max: usize) -> Result<(), MarketplaceError> {
    let len = value.chars().count();
    if len > max {
        return Err(invalid(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate and normalize a job creation request.
///
/// # Errors
///
/// Returns `InvalidArgument` on a bad title, description, category or budget.
pub fn validate_new_job(job: NewJob) -> Result<NewJob, MarketplaceError> {
    let title = job.title.trim().to_string();
    let title_len = title.chars().count();
    if title_len < TITLE_LEN.0 || title_len > TITLE_LEN.1 {
        return Err(invalid(format!(
            "title must be between {} and {} characters",
            TITLE_LEN.0, TITLE_LEN.1
        )));
    }

    check_max("description", &job.description, MAX_DESCRIPTION_LEN)?;

    let category = job.category.trim().to_lowercase();
    if category.is_empty() {
        return Err(invalid("category must not be empty"));
    }

    if !job.budget.is_finite() || job.budget < 0.0 {
        return Err(invalid("budget must be a non-negative number"));
    }

    Ok(NewJob {
        title,
        description: job.description,
        category,
        budget: job.budget,
    })
}

/// Validate a review submission, returning the rating as a `u8`.
///
/// # Errors
///
/// Returns `InvalidArgument` when the rating is outside `1..=5` or the
/// comment is too long.
pub fn validate_review(review: NewReview) -> Result<(u8, String), MarketplaceError> {
    let rating = u8::try_from(review.rating)
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| invalid(format!("rating must be between 1 and 5 (got {})", review.rating)))?;

    check_max("comment", &review.comment, MAX_COMMENT_LEN)?;

    Ok((rating, review.comment))
}

/// Normalize category tags: trim, lowercase, drop empties and duplicates.
#[must_use]
pub fn normalize_categories(categories: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(categories.len());
    for tag in categories {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Validate and normalize profile details.
///
/// # Errors
///
/// Returns `InvalidArgument` on an oversized headline or bio.
pub fn validate_profile_details(details: ProfileDetails) -> Result<ProfileDetails, MarketplaceError> {
    let headline = details.headline.trim().to_string();
    check_max("headline", &headline, MAX_HEADLINE_LEN)?;
    check_max("bio", &details.bio, MAX_BIO_LEN)?;

    Ok(ProfileDetails {
        headline,
        bio: details.bio,
        categories: normalize_categories(details.categories),
    })
}

/// Check an email address has a plausible `local@domain.tld` shape and
/// return it lowercased.
///
/// # Errors
///
/// Returns `InvalidArgument` for malformed addresses.
pub fn validate_email(email: &str) -> Result<String, MarketplaceError> {
    let email = email.trim().to_lowercase();
    let malformed = || invalid(format!("'{email}' is not a valid email address"));

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(malformed());
    }

    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.contains('@') {
        return Err(malformed());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(malformed());
    }

    Ok(email)
}

/// Validate a username.
///
/// # Errors
///
/// Returns `InvalidArgument` on bad length or characters.
pub fn validate_username(username: &str) -> Result<String, MarketplaceError> {
    let username = username.trim();
    let len = username.chars().count();
    if len < USERNAME_LEN.0 || len > USERNAME_LEN.1 {
        return Err(invalid(format!(
            "username must be between {} and {} characters",
            USERNAME_LEN.0, USERNAME_LEN.1
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(invalid(
            "username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(username.to_string())
}

/// Validate a plaintext password.
///
/// # Errors
///
/// Returns `InvalidArgument` when the password is too short.
pub fn validate_password(password: &str) -> Result<(), MarketplaceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a registration request and normalize its text fields.
///
/// # Errors
///
/// Returns `InvalidArgument` for any malformed field.
pub fn validate_registration(reg: Registration) -> Result<Registration, MarketplaceError> {
    let username = validate_username(&reg.username)?;
    let email = validate_email(&reg.email)?;
    validate_password(&reg.password)?;

    let first_name = reg.first_name.trim().to_string();
    let last_name = reg.last_name.trim().to_string();
    check_max("firstName", &first_name, MAX_NAME_LEN)?;
    check_max("lastName", &last_name, MAX_NAME_LEN)?;

    Ok(Registration {
        username,
        email,
        password: reg.password,
        first_name,
        last_name,
        role: reg.role,
    })
}

/// Validate document file names for a simulated upload.
///
/// # Errors
///
/// Returns `InvalidArgument` on an empty list, too many files, or a name
/// that is empty or tries to escape its directory.
pub fn validate_filenames(filenames: &[String]) -> Result<(), MarketplaceError> {
    if filenames.is_empty() {
        return Err(invalid("at least one document is required"));
    }
    if filenames.len() > MAX_DOCUMENTS {
        return Err(invalid(format!(
            "at most {MAX_DOCUMENTS} documents per submission"
        )));
    }
    for name in filenames {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains('/') || trimmed.contains("..") {
            return Err(invalid(format!("'{name}' is not a valid document name")));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn job(title: &str, budget: f64) -> NewJob {
        NewJob {
            title: title.into(),
            description: "desc".into(),
            category: " Plumbing ".into(),
            budget,
        }
    }

    #[test]
    fn test_job_title_bounds() {
        assert!(validate_new_job(job("Fix", 10.0)).is_err());
        assert!(validate_new_job(job(&"x".repeat(101), 10.0)).is_err());
        let ok = validate_new_job(job("Fix sink", 10.0)).unwrap();
        assert_eq!(ok.category, "plumbing");
    }

    #[test]
    fn test_job_budget_must_be_non_negative_and_finite() {
        assert!(validate_new_job(job("Fix sink", -1.0)).is_err());
        assert!(validate_new_job(job("Fix sink", f64::NAN)).is_err());
        assert!(validate_new_job(job("Fix sink", 0.0)).is_ok());
    }

    #[test]
    fn test_review_rating_range() {
        for rating in [0, 6, -3, 256] {
            let review = NewReview {
                rating,
                comment: String::new(),
            };
            assert!(validate_review(review).is_err(), "rating {rating} accepted");
        }
        let (rating, _) = validate_review(NewReview {
            rating: 5,
            comment: "great".into(),
        })
        .unwrap();
        assert_eq!(rating, 5);
    }

    #[test]
    fn test_review_comment_length() {
        let review = NewReview {
            rating: 4,
            comment: "a".repeat(MAX_COMMENT_LEN + 1),
        };
        assert!(validate_review(review).is_err());
    }

    #[test]
    fn test_categories_are_normalized() {
        let tags = normalize_categories(vec![
            " Plumbing".into(),
            "plumbing".into(),
            String::new(),
            "Tiling ".into(),
        ]);
        assert_eq!(tags, vec!["plumbing".to_string(), "tiling".to_string()]);
    }

    #[test]
    fn test_email_shapes() {
        assert_eq!(validate_email(" Alice@Example.COM ").unwrap(), "alice@example.com");
        for bad in ["", "alice", "alice@", "@example.com", "a@b", "a@b..com", "a b@c.io"] {
            assert!(validate_email(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_registration_validation() {
        let reg = Registration {
            username: "al".into(),
            email: "al@example.com".into(),
            password: "longenough".into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Client,
        };
        assert!(validate_registration(reg.clone()).is_err());

        let short_password = Registration {
            username: "alice".into(),
            password: "short".into(),
            ..reg
        };
        assert!(validate_registration(short_password).is_err());
    }

    #[test]
    fn test_filenames() {
        assert!(validate_filenames(&[]).is_err());
        assert!(validate_filenames(&["../etc/passwd".into()]).is_err());
        assert!(validate_filenames(&["license.pdf".into()]).is_ok());
    }
}
