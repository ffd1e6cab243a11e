//! Order feedback.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use localmart_core::{Email, FeedbackId, OrderId, Rating, ShopId, UserId};

/// Exactly one per completed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: FeedbackId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub order_id: OrderId,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Feedback joined with the customer, shop and order it refers to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetails {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub customer_name: String,
    pub customer_email: Email,
    pub shop_name: String,
    pub order_total: Decimal,
    pub order_created_at: DateTime<Utc>,
}
