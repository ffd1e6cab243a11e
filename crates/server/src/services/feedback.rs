//! Order feedback: one rating per completed order.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use localmart_core::{OrderId, OrderStatus, Rating, UserId};

use super::MarketError;
use super::error::conflict_or_repository;
use crate::db::feedback::FeedbackRepository;
use crate::db::orders::OrderRepository;
use crate::db::shops::ShopRepository;
use crate::models::{CurrentUser, Feedback, FeedbackDetails, Order};

/// Maximum comment length, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2_000;

/// Feedback form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    pub order_id: Option<OrderId>,
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A validated feedback submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub order_id: OrderId,
    pub rating: Rating,
    pub comment: String,
}

/// Feedback list as seen by the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FeedbackListing {
    /// A shopkeeper sees everything left for their shop with the average.
    #[serde(rename_all = "camelCase")]
    Shop {
        feedbacks: Vec<FeedbackDetails>,
        average_rating: String,
        total_feedbacks: usize,
    },
    /// A customer sees what they wrote.
    Customer { feedbacks: Vec<FeedbackDetails> },
}

/// Check the form fields.
///
/// # Errors
///
/// Returns `MarketError::InvalidRequest` if the order id is missing, the
/// rating is missing or outside 1..=5, or the comment is too long.
pub fn validate_submission(input: FeedbackInput) -> Result<Submission, MarketError> {
    let order_id = input
        .order_id
        .ok_or_else(|| MarketError::InvalidRequest("orderId is required".to_owned()))?;
    let rating = input
        .rating
        .ok_or_else(|| MarketError::InvalidRequest("rating is required".to_owned()))
        .and_then(|r| Rating::new(r).map_err(|e| MarketError::InvalidRequest(e.to_string())))?;

    let comment = input.comment.unwrap_or_default().trim().to_owned();
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(MarketError::InvalidRequest(format!(
            "comment must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }

    Ok(Submission {
        order_id,
        rating,
        comment,
    })
}

/// Only the buyer may rate, and only once the order is completed.
///
/// # Errors
///
/// Returns `Forbidden` for anyone but the buyer and `InvalidState` for an
/// order that is not completed.
pub fn check_order_rateable(order: &Order, user_id: UserId) -> Result<(), MarketError> {
    if order.user_id != user_id {
        return Err(MarketError::Forbidden(
            "you can only rate your own orders".to_owned(),
        ));
    }
    if order.status != OrderStatus::Completed {
        return Err(MarketError::InvalidState(
            "feedback can only be submitted for completed orders".to_owned(),
        ));
    }
    Ok(())
}

/// Mean rating rounded to one decimal, `"0.0"` when there is none.
#[must_use]
pub fn average_rating(feedbacks: &[FeedbackDetails]) -> String {
    if feedbacks.is_empty() {
        return "0.0".to_owned();
    }
    let sum: u32 = feedbacks
        .iter()
        .map(|f| u32::from(f.feedback.rating.get()))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = f64::from(sum) / feedbacks.len() as f64;
    format!("{mean:.1}")
}

/// Feedback service.
pub struct FeedbackService<'a> {
    feedback: FeedbackRepository<'a>,
    orders: OrderRepository<'a>,
    shops: ShopRepository<'a>,
}

impl<'a> FeedbackService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            feedback: FeedbackRepository::new(pool),
            orders: OrderRepository::new(pool),
            shops: ShopRepository::new(pool),
        }
    }

    /// Rate a completed order.
    ///
    /// The shop is taken from the order, never from the request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest`, `NotFound`, `Forbidden`, `InvalidState`, or
    /// `Conflict` when the order already has feedback.
    #[instrument(skip(self, input), fields(user_id = %user.id))]
    pub async fn submit(&self, user: &CurrentUser, input: FeedbackInput) -> Result<Feedback, MarketError> {
        let submission = validate_submission(input)?;

        let details = self
            .orders
            .get(submission.order_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("order".to_owned()))?;
        check_order_rateable(&details.order, user.id)?;

        let feedback = self
            .feedback
            .create(
                user.id,
                details.order.shop_id,
                submission.order_id,
                submission.rating,
                &submission.comment,
            )
            .await
            .map_err(conflict_or_repository)?;

        tracing::info!(
            feedback_id = %feedback.id,
            order_id = %feedback.order_id,
            rating = feedback.rating.get(),
            "Feedback submitted"
        );
        Ok(feedback)
    }

    /// Shopkeepers get their shop's feedback, customers their own.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if a query fails.
    pub async fn list(&self, user: &CurrentUser) -> Result<FeedbackListing, MarketError> {
        if user.is_shopkeeper() {
            let feedbacks = match self.shops.get_by_owner(user.id).await? {
                Some(shop) => self.feedback.list_for_shop(shop.id).await?,
                None => Vec::new(),
            };
            return Ok(FeedbackListing::Shop {
                average_rating: average_rating(&feedbacks),
                total_feedbacks: feedbacks.len(),
                feedbacks,
            });
        }

        Ok(FeedbackListing::Customer {
            feedbacks: self.feedback.list_for_user(user.id).await?,
        })
    }

    /// Feedback already left for an order, if any.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Forbidden` if the feedback was written by
    /// someone else.
    pub async fn for_order(
        &self,
        user: &CurrentUser,
        order_id: OrderId,
    ) -> Result<Option<Feedback>, MarketError> {
        let Some(feedback) = self.feedback.get_by_order(order_id).await? else {
            return Ok(None);
        };
        if feedback.user_id != user.id {
            return Err(MarketError::Forbidden(
                "this feedback belongs to another customer".to_owned(),
            ));
        }
        Ok(Some(feedback))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use localmart_core::{Email, FeedbackId, ShopId};

    use super::*;

    fn order(user_id: i32, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(user_id),
            shop_id: ShopId::new(1),
            items: Vec::new(),
            total: Decimal::TEN,
            status,
            reward_points_earned: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn details(rating: i64) -> FeedbackDetails {
        FeedbackDetails {
            feedback: Feedback {
                id: FeedbackId::new(1),
                user_id: UserId::new(1),
                shop_id: ShopId::new(1),
                order_id: OrderId::new(1),
                rating: Rating::new(rating).unwrap(),
                comment: String::new(),
                created_at: Utc::now(),
            },
            customer_name: "Ada".to_owned(),
            customer_email: Email::parse("ada@example.com").unwrap(),
            shop_name: "Corner Store".to_owned(),
            order_total: Decimal::TEN,
            order_created_at: Utc::now(),
        }
    }

    #[test]
    fn test_submission_requires_order_and_rating() {
        let missing_order = FeedbackInput {
            rating: Some(4),
            ..FeedbackInput::default()
        };
        assert!(matches!(
            validate_submission(missing_order),
            Err(MarketError::InvalidRequest(_))
        ));

        let out_of_range = FeedbackInput {
            order_id: Some(OrderId::new(1)),
            rating: Some(6),
            comment: None,
        };
        assert!(matches!(
            validate_submission(out_of_range),
            Err(MarketError::InvalidRequest(_))
        ));

        let ok = validate_submission(FeedbackInput {
            order_id: Some(OrderId::new(3)),
            rating: Some(5),
            comment: Some("  lovely  ".to_owned()),
        })
        .unwrap();
        assert_eq!(ok.comment, "lovely");
        assert_eq!(ok.rating.get(), 5);
    }

    #[test]
    fn test_only_buyer_rates_completed_orders() {
        assert!(check_order_rateable(&order(1, OrderStatus::Completed), UserId::new(1)).is_ok());
        assert!(matches!(
            check_order_rateable(&order(1, OrderStatus::Completed), UserId::new(2)),
            Err(MarketError::Forbidden(_))
        ));
        assert!(matches!(
            check_order_rateable(&order(1, OrderStatus::Pending), UserId::new(1)),
            Err(MarketError::InvalidState(_))
        ));
        assert!(matches!(
            check_order_rateable(&order(1, OrderStatus::Packed), UserId::new(1)),
            Err(MarketError::InvalidState(_))
        ));
    }

    #[test]
    fn test_average_rating_one_decimal() {
        assert_eq!(average_rating(&[]), "0.0");
        assert_eq!(average_rating(&[details(4), details(5), details(5)]), "4.7");
        assert_eq!(average_rating(&[details(3)]), "3.0");
    }

    #[test]
    fn test_listing_shapes() {
        let shop = serde_json::to_value(FeedbackListing::Shop {
            feedbacks: Vec::new(),
            average_rating: "0.0".to_owned(),
            total_feedbacks: 0,
        })
        .unwrap();
        assert_eq!(shop["averageRating"], "0.0");
        assert_eq!(shop["totalFeedbacks"], 0);

        let customer = serde_json::to_value(FeedbackListing::Customer {
            feedbacks: Vec::new(),
        })
        .unwrap();
        assert!(customer.get("averageRating").is_none());
    }
}
