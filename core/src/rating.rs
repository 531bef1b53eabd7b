//! Rating aggregation.
//!
//! The aggregate is always recomputed from the full review set of a
//! professional, so it stays exactly consistent with the stored reviews.

use serde::Serialize;

/// `(avg_rating, total_reviews)` derived from a set of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RatingAggregate {
    /// Arithmetic mean rounded to two decimals. `0.0` without reviews.
    pub avg_rating: f64,
    /// Number of reviews.
    pub total_reviews: u64,
}

impl RatingAggregate {
    /// Compute the aggregate of `ratings`.
    #[must_use]
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_u64, 0_u64), |(sum, count), r| (sum + u64::from(r), count + 1));

        if count == 0 {
            return Self::default();
        }

        #[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
        let mean = sum as f64 / count as f64;

        Self {
            avg_rating: round_to_hundredths(mean),
            total_reviews: count,
        }
    }
}

/// Round half away from zero to two decimal places.
#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_review_set_is_zero() {
        let agg = RatingAggregate::from_ratings(std::iter::empty());
        assert_eq!(agg, RatingAggregate::default());
        assert!(agg.avg_rating.abs() < f64::EPSILON);
    }

    #[test]
    fn test_five_then_three_averages_to_four() {
        let first = RatingAggregate::from_ratings([5]);
        assert!((first.avg_rating - 5.0).abs() < f64::EPSILON);
        assert_eq!(first.total_reviews, 1);

        let second = RatingAggregate::from_ratings([5, 3]);
        assert!((second.avg_rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(second.total_reviews, 2);
    }

    #[test]
    fn test_mean_rounds_to_two_decimals() {
        let agg = RatingAggregate::from_ratings([5, 4, 4]);
        assert!((agg.avg_rating - 4.33).abs() < f64::EPSILON);

        let agg = RatingAggregate::from_ratings([5, 5, 4]);
        assert!((agg.avg_rating - 4.67).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_mean_stays_within_rating_bounds(ratings in prop::collection::vec(1_u8..=5, 1..200)) {
            let agg = RatingAggregate::from_ratings(ratings.iter().copied());
            prop_assert!(agg.avg_rating >= 1.0 && agg.avg_rating <= 5.0);
            prop_assert_eq!(agg.total_reviews, ratings.len() as u64);
        }

        #[test]
        fn prop_mean_has_at_most_two_decimals(ratings in prop::collection::vec(1_u8..=5, 1..200)) {
            let agg = RatingAggregate::from_ratings(ratings);
            let scaled = agg.avg_rating * 100.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-6);
        }

        #[test]
        fn prop_order_does_not_matter(mut ratings in prop::collection::vec(1_u8..=5, 0..100)) {
            let forward = RatingAggregate::from_ratings(ratings.iter().copied());
            ratings.reverse();
            let backward = RatingAggregate::from_ratings(ratings);
            prop_assert_eq!(forward, backward);
        }
    }
}
