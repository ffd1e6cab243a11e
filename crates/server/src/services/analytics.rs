//! Shop analytics roll-up.
//!
//! Everything numeric is computed by [`build_report`] from the shop's
//! products, orders and feedback, with no I/O. The service then asks the
//! insights client for two narratives, each falling back to placeholder
//! text so the numbers are always returned.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use localmart_core::{OrderStatus, ProductId};

use super::MarketError;
use super::catalog::require_shopkeeper;
use super::feedback::average_rating;
use crate::db::feedback::FeedbackRepository;
use crate::db::orders::{OrderRepository, OrderScope};
use crate::db::products::ProductRepository;
use crate::db::shops::ShopRepository;
use crate::insights::{
    FEEDBACK_SUMMARY_PLACEHOLDER, INSIGHTS_PLACEHOLDER, InsightKind, InsightsClient,
};
use crate::models::{CurrentUser, FeedbackDetails, OrderDetails, Product, Shop};

/// Stock below this counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Turnover reported for a sold-out product that has sales.
pub const SOLD_OUT_TURNOVER: f64 = 999.0;

/// Length of the "top" and alert lists.
const TOP_N: usize = 5;

/// Days in the daily trend.
const TREND_DAYS: i64 = 7;

/// Orders listed in the insights prompt.
const PROMPT_RECENT_ORDERS: usize = 5;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    #[must_use]
    pub const fn for_stock(stock: i32) -> Self {
        if stock <= 0 {
            Self::OutOfStock
        } else if stock < LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

/// Headline revenue and order counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Completed orders only.
    pub total_revenue: Decimal,
    /// Orders in any status.
    pub total_orders: usize,
    pub average_order_value: Decimal,
    pub revenue_7_days: Decimal,
    pub revenue_30_days: Decimal,
    pub orders_7_days: usize,
    pub orders_30_days: usize,
}

/// Sales figures for one product, across orders in every status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub sales: i64,
    pub revenue: Decimal,
    pub stock: i32,
    pub stock_status: StockStatus,
    pub turnover_rate: f64,
    pub average_price: Decimal,
    /// Distinct orders containing the product.
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub category: String,
    pub sales: i64,
    pub revenue: Decimal,
}

/// One UTC day of completed sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales: i64,
    pub revenue: Decimal,
}

/// Compact product entry for the top and alert lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHighlight {
    pub name: String,
    pub sales: i64,
    pub revenue: Decimal,
    pub stock: i32,
    pub stock_status: StockStatus,
}

impl From<&ProductPerformance> for ProductHighlight {
    fn from(p: &ProductPerformance) -> Self {
        Self {
            name: p.name.clone(),
            sales: p.sales,
            revenue: p.revenue,
            stock: p.stock,
            stock_status: p.stock_status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSection {
    pub feedbacks: Vec<FeedbackDetails>,
    pub average_rating: String,
    pub total_feedbacks: usize,
    pub ai_summary: String,
}

/// The full analytics response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub summary: Summary,
    pub product_performance: Vec<ProductPerformance>,
    pub category_performance: Vec<CategoryPerformance>,
    pub daily_sales_trend: Vec<DailySales>,
    pub top_selling_products: Vec<ProductHighlight>,
    pub top_revenue_products: Vec<ProductHighlight>,
    pub low_stock_products: Vec<ProductHighlight>,
    pub slow_moving_products: Vec<ProductHighlight>,
    /// Present only when the shop has feedback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackSection>,
    pub ai_insights: String,
}

/// Roll up the numbers. `orders` are all of the shop's orders, newest first.
///
/// Narrative fields are left empty for the caller to fill.
#[must_use]
pub fn build_report(
    products: &[Product],
    orders: &[OrderDetails],
    feedbacks: Vec<FeedbackDetails>,
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let summary = summarize(orders, now);
    let product_performance = product_performance(products, orders);
    let category_performance = category_performance(&product_performance);
    let daily_sales_trend = daily_trend(orders, now);

    let mut by_sales: Vec<&ProductPerformance> = product_performance.iter().collect();
    by_sales.sort_by(|a, b| b.sales.cmp(&a.sales));

    let mut by_revenue: Vec<&ProductPerformance> = product_performance.iter().collect();
    by_revenue.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    let mut low_stock: Vec<&ProductPerformance> = product_performance
        .iter()
        .filter(|p| p.stock_status != StockStatus::InStock)
        .collect();
    low_stock.sort_by_key(|p| p.stock);

    let highlights = |list: &[&ProductPerformance]| -> Vec<ProductHighlight> {
        list.iter().take(TOP_N).map(|p| ProductHighlight::from(*p)).collect()
    };

    let slow_moving_products = product_performance
        .iter()
        .filter(|p| p.sales == 0 && p.stock > 0)
        .take(TOP_N)
        .map(ProductHighlight::from)
        .collect();

    let feedback = (!feedbacks.is_empty()).then(|| FeedbackSection {
        average_rating: average_rating(&feedbacks),
        total_feedbacks: feedbacks.len(),
        feedbacks,
        ai_summary: String::new(),
    });

    AnalyticsReport {
        top_selling_products: highlights(&by_sales),
        top_revenue_products: highlights(&by_revenue),
        low_stock_products: highlights(&low_stock),
        slow_moving_products,
        summary,
        product_performance,
        category_performance,
        daily_sales_trend,
        feedback,
        ai_insights: String::new(),
    }
}

fn summarize(orders: &[OrderDetails], now: DateTime<Utc>) -> Summary {
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    let mut summary = Summary {
        total_orders: orders.len(),
        ..Summary::default()
    };

    for details in orders {
        let order = &details.order;
        if order.status != OrderStatus::Completed {
            continue;
        }
        summary.total_revenue += order.total;
        if order.created_at >= month_ago {
            summary.revenue_30_days += order.total;
            summary.orders_30_days += 1;
        }
        if order.created_at >= week_ago {
            summary.revenue_7_days += order.total;
            summary.orders_7_days += 1;
        }
    }

    if summary.total_orders > 0 {
        summary.average_order_value =
            (summary.total_revenue / Decimal::from(summary.total_orders)).round_dp(2);
    }
    summary
}

fn product_performance(products: &[Product], orders: &[OrderDetails]) -> Vec<ProductPerformance> {
    #[derive(Default)]
    struct Tally {
        sales: i64,
        revenue: Decimal,
        order_count: i64,
    }

    let mut tallies: HashMap<ProductId, Tally> = HashMap::new();
    for details in orders {
        let mut seen: Vec<ProductId> = Vec::new();
        for line in &details.order.items {
            let tally = tallies.entry(line.product_id).or_default();
            tally.sales += i64::from(line.quantity);
            tally.revenue += line.subtotal();
            if !seen.contains(&line.product_id) {
                seen.push(line.product_id);
                tally.order_count += 1;
            }
        }
    }

    products
        .iter()
        .map(|product| {
            let tally = tallies.remove(&product.id).unwrap_or_default();
            let category = if product.category.trim().is_empty() {
                UNCATEGORIZED.to_owned()
            } else {
                product.category.clone()
            };
            let average_price = if tally.sales > 0 {
                (tally.revenue / Decimal::from(tally.sales)).round_dp(2)
            } else {
                Decimal::ZERO
            };

            ProductPerformance {
                id: product.id,
                name: product.name.clone(),
                category,
                sales: tally.sales,
                revenue: tally.revenue,
                stock: product.stock,
                stock_status: StockStatus::for_stock(product.stock),
                turnover_rate: turnover_rate(tally.sales, product.stock),
                average_price,
                order_count: tally.order_count,
            }
        })
        .collect()
}

/// Units sold per unit in stock.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn turnover_rate(sales: i64, stock: i32) -> f64 {
    if stock > 0 {
        sales as f64 / f64::from(stock)
    } else if sales > 0 {
        SOLD_OUT_TURNOVER
    } else {
        0.0
    }
}

/// Categories in order of first appearance.
fn category_performance(products: &[ProductPerformance]) -> Vec<CategoryPerformance> {
    let mut categories: Vec<CategoryPerformance> = Vec::new();
    for p in products {
        if let Some(existing) = categories.iter_mut().find(|c| c.category == p.category) {
            existing.sales += p.sales;
            existing.revenue += p.revenue;
        } else {
            categories.push(CategoryPerformance {
                category: p.category.clone(),
                sales: p.sales,
                revenue: p.revenue,
            });
        }
    }
    categories
}

/// Completed sales bucketed by UTC day, oldest day first, ending today.
fn daily_trend(orders: &[OrderDetails], now: DateTime<Utc>) -> Vec<DailySales> {
    let today = now.date_naive();
    let mut days: Vec<DailySales> = (0..TREND_DAYS)
        .rev()
        .map(|back| DailySales {
            date: today - Duration::days(back),
            sales: 0,
            revenue: Decimal::ZERO,
        })
        .collect();

    let window_start = now - Duration::days(TREND_DAYS);
    for details in orders {
        let order = &details.order;
        if order.status != OrderStatus::Completed || order.created_at < window_start {
            continue;
        }
        let date = order.created_at.date_naive();
        if let Some(day) = days.iter_mut().find(|d| d.date == date) {
            for line in &order.items {
                day.sales += i64::from(line.quantity);
                day.revenue += line.subtotal();
            }
        }
    }
    days
}

/// Prompt asking for sales recommendations.
#[must_use]
pub fn insights_prompt(shop: &Shop, report: &AnalyticsReport, orders: &[OrderDetails]) -> String {
    let summary = &report.summary;
    let rate_percent = (shop.reward_rate.as_decimal() * Decimal::ONE_HUNDRED).normalize();

    let mut prompt = String::from(
        "You are a helpful business analyst providing actionable insights for local shopkeepers.\n\n",
    );
    let _ = writeln!(prompt, "Shop: {}", shop.name);
    let _ = writeln!(prompt, "Total Orders: {}", summary.total_orders);
    let _ = writeln!(prompt, "Total Revenue: ${:.2}", summary.total_revenue);
    let _ = writeln!(prompt, "Average Order Value: ${:.2}", summary.average_order_value);
    let _ = writeln!(prompt, "Reward Rate: {rate_percent}% of purchase amount");

    prompt.push_str("\nProduct Performance:\n");
    for p in &report.product_performance {
        let _ = writeln!(prompt, "- {}: {} sales, ${:.2} revenue", p.name, p.sales, p.revenue);
    }

    let recent = orders.len().min(PROMPT_RECENT_ORDERS);
    let _ = writeln!(prompt, "\nRecent Orders: {recent} most recent");
    for details in orders.iter().take(PROMPT_RECENT_ORDERS) {
        let _ = writeln!(
            prompt,
            "- Order #{}: ${:.2}, Status: {}, Customer: {}",
            details.order.id, details.order.total, details.order.status, details.customer_email
        );
    }

    prompt.push_str(
        "\nProvide 3-5 actionable insights and recommendations for improving business performance. Focus on:\n\
         1. Product performance trends\n\
         2. Customer behavior patterns\n\
         3. Inventory management suggestions\n\
         4. Marketing opportunities\n\
         5. Revenue optimization strategies\n\n\
         Format as clear, concise bullet points.",
    );
    prompt
}

/// Prompt asking for a summary of customer feedback.
#[must_use]
pub fn feedback_prompt(shop: &Shop, section: &FeedbackSection) -> String {
    let mut prompt = String::from(
        "You are a customer feedback analyst. Analyze the following customer feedbacks and provide a comprehensive summary:\n\n",
    );
    let _ = writeln!(prompt, "Shop: {}", shop.name);
    let _ = writeln!(prompt, "Total Feedbacks: {}", section.total_feedbacks);
    let _ = writeln!(prompt, "Average Rating: {}/5.0", section.average_rating);
    prompt.push_str("\nCustomer Feedbacks:\n");

    for (idx, f) in section.feedbacks.iter().enumerate() {
        let name = if f.customer_name.trim().is_empty() {
            f.customer_email.as_str()
        } else {
            f.customer_name.as_str()
        };
        let comment = if f.feedback.comment.is_empty() {
            "No comment provided"
        } else {
            f.feedback.comment.as_str()
        };
        let _ = write!(
            prompt,
            "{}. Rating: {}/5 - {name}\n   Comment: {comment}\n\n",
            idx + 1,
            f.feedback.rating.get()
        );
    }

    prompt.push_str(
        "Provide a comprehensive summary that includes:\n\
         1. Overall customer satisfaction trends\n\
         2. Common themes and patterns in feedback\n\
         3. Key strengths mentioned by customers\n\
         4. Areas for improvement based on feedback\n\
         5. Actionable recommendations\n\n\
         Format as clear, well-structured paragraphs with bullet points for recommendations.",
    );
    prompt
}

/// Analytics service.
pub struct AnalyticsService<'a> {
    shops: ShopRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    feedback: FeedbackRepository<'a>,
    insights: &'a InsightsClient,
}

impl<'a> AnalyticsService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, insights: &'a InsightsClient) -> Self {
        Self {
            shops: ShopRepository::new(pool),
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            feedback: FeedbackRepository::new(pool),
            insights,
        }
    }

    /// Build the caller's shop report with narratives.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for customers and `NotFound` if the caller has no
    /// shop. Narrative failures never surface here.
    #[instrument(skip(self), fields(user_id = %user.id))]
    pub async fn report(&self, user: &CurrentUser) -> Result<AnalyticsReport, MarketError> {
        require_shopkeeper(user)?;
        let shop = self
            .shops
            .get_by_owner(user.id)
            .await?
            .ok_or_else(|| MarketError::NotFound("shop".to_owned()))?;

        let (products, orders, feedbacks) = tokio::try_join!(
            self.products.list_for_shop(shop.id),
            self.orders.list(OrderScope::Shop(shop.id), None),
            self.feedback.list_for_shop(shop.id),
        )?;

        let mut report = build_report(&products, &orders, feedbacks, Utc::now());

        let sales_prompt = insights_prompt(&shop, &report, &orders);
        let summary_prompt = report.feedback.as_ref().map(|f| feedback_prompt(&shop, f));

        let (ai_insights, ai_summary) = tokio::join!(
            self.insights
                .generate_or(InsightKind::Sales, &sales_prompt, INSIGHTS_PLACEHOLDER),
            async {
                match &summary_prompt {
                    Some(prompt) => Some(
                        self.insights
                            .generate_or(InsightKind::Feedback, prompt, FEEDBACK_SUMMARY_PLACEHOLDER)
                            .await,
                    ),
                    None => None,
                }
            },
        );

        report.ai_insights = ai_insights;
        if let (Some(section), Some(summary)) = (report.feedback.as_mut(), ai_summary) {
            section.ai_summary = summary;
        }

        tracing::info!(
            shop_id = %shop.id,
            products = report.product_performance.len(),
            orders = report.summary.total_orders,
            "Analytics report built"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use localmart_core::{Email, GeoPoint, OrderId, RewardRate, ShopId, UserId};

    use super::*;
    use crate::models::{Order, OrderLine};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn product(id: i32, stock: i32, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            shop_id: ShopId::new(1),
            name: format!("P{id}"),
            description: String::new(),
            price: Decimal::ONE,
            stock,
            category: category.to_owned(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn order(
        id: i32,
        status: OrderStatus,
        days_ago: i64,
        lines: &[(i32, i32, i64)],
    ) -> OrderDetails {
        let items: Vec<OrderLine> = lines
            .iter()
            .map(|&(product_id, quantity, cents)| OrderLine {
                product_id: ProductId::new(product_id),
                product_name: None,
                quantity,
                price: Decimal::new(cents, 2),
            })
            .collect();
        let total = items.iter().map(OrderLine::subtotal).sum();
        OrderDetails {
            order: Order {
                id: OrderId::new(id),
                user_id: UserId::new(9),
                shop_id: ShopId::new(1),
                items,
                total,
                status,
                reward_points_earned: 0,
                created_at: now() - Duration::days(days_ago),
                updated_at: now(),
            },
            shop_name: "Corner Store".to_owned(),
            customer_email: Email::parse("buyer@example.com").unwrap(),
        }
    }

    fn sample() -> (Vec<Product>, Vec<OrderDetails>) {
        let products = vec![
            product(1, 20, "Tea"),
            product(2, 0, "Tea"),
            product(3, 5, ""),
            product(4, 12, "Snacks"),
        ];
        let orders = vec![
            order(3, OrderStatus::Pending, 0, &[(1, 1, 500)]),
            order(2, OrderStatus::Completed, 2, &[(1, 2, 500), (2, 1, 300), (1, 1, 500)]),
            order(1, OrderStatus::Completed, 20, &[(3, 4, 250)]),
        ];
        (products, orders)
    }

    #[test]
    fn test_summary_counts_completed_revenue() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());
        let s = &report.summary;

        // order 2: 10.00 + 3.00 + 5.00, order 1: 10.00
        assert_eq!(s.total_revenue, Decimal::new(2800, 2));
        assert_eq!(s.total_orders, 3);
        assert_eq!(s.average_order_value, Decimal::new(933, 2));
        assert_eq!(s.revenue_7_days, Decimal::new(1800, 2));
        assert_eq!(s.orders_7_days, 1);
        assert_eq!(s.revenue_30_days, Decimal::new(2800, 2));
        assert_eq!(s.orders_30_days, 2);
    }

    #[test]
    fn test_product_performance_spans_all_statuses() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());
        let p1 = &report.product_performance[0];

        assert_eq!(p1.sales, 4);
        assert_eq!(p1.revenue, Decimal::new(2000, 2));
        assert_eq!(p1.order_count, 2);
        assert_eq!(p1.average_price, Decimal::new(500, 2));
        assert_eq!(p1.stock_status, StockStatus::InStock);
        assert!((p1.turnover_rate - 0.2).abs() < f64::EPSILON);

        let p2 = &report.product_performance[1];
        assert_eq!(p2.stock_status, StockStatus::OutOfStock);
        assert!((p2.turnover_rate - SOLD_OUT_TURNOVER).abs() < f64::EPSILON);

        let p3 = &report.product_performance[2];
        assert_eq!(p3.category, "Uncategorized");
        assert_eq!(p3.stock_status, StockStatus::LowStock);

        let p4 = &report.product_performance[3];
        assert_eq!(p4.sales, 0);
        assert!(p4.turnover_rate.abs() < f64::EPSILON);
        assert_eq!(p4.average_price, Decimal::ZERO);
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());
        let names: Vec<&str> = report
            .category_performance
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, vec!["Tea", "Uncategorized", "Snacks"]);
        assert_eq!(report.category_performance[0].sales, 5);
        assert_eq!(report.category_performance[0].revenue, Decimal::new(2300, 2));
    }

    #[test]
    fn test_daily_trend_has_seven_days_oldest_first() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());
        let trend = &report.daily_sales_trend;

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(trend[6].date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        // Only the completed order from 2 days ago lands in the window.
        assert_eq!(trend[4].sales, 4);
        assert_eq!(trend[4].revenue, Decimal::new(1800, 2));
        assert_eq!(trend[6].sales, 0);
    }

    #[test]
    fn test_top_and_alert_lists() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());

        assert_eq!(report.top_selling_products[0].name, "P1");
        assert_eq!(report.top_revenue_products[0].name, "P1");

        let low: Vec<&str> = report.low_stock_products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(low, vec!["P2", "P3"]);

        let slow: Vec<&str> = report.slow_moving_products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(slow, vec!["P4"]);
        assert!(report.feedback.is_none());
    }

    #[test]
    fn test_stock_status_thresholds() {
        assert_eq!(StockStatus::for_stock(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::for_stock(9), StockStatus::LowStock);
        assert_eq!(StockStatus::for_stock(10), StockStatus::InStock);
    }

    #[test]
    fn test_report_json_field_names() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["summary"].get("revenue7Days").is_some());
        assert!(json["summary"].get("orders30Days").is_some());
        assert_eq!(json["productPerformance"][1]["stockStatus"], "out_of_stock");
        assert_eq!(json["dailySalesTrend"][0]["date"], "2025-03-09");
        assert!(json.get("feedback").is_none());
    }

    #[test]
    fn test_insights_prompt_lists_recent_orders() {
        let (products, orders) = sample();
        let report = build_report(&products, &orders, Vec::new(), now());
        let shop = Shop {
            id: ShopId::new(1),
            owner_id: UserId::new(2),
            name: "Corner Store".to_owned(),
            address: "1 Main St".to_owned(),
            location: GeoPoint::new(0.0, 0.0).unwrap(),
            reward_rate: RewardRate::default(),
            created_at: now(),
            updated_at: now(),
        };

        let prompt = insights_prompt(&shop, &report, &orders);
        assert!(prompt.contains("Shop: Corner Store"));
        assert!(prompt.contains("Total Revenue: $28.00"));
        assert!(prompt.contains("Reward Rate: 10% of purchase amount"));
        assert!(prompt.contains("- P1: 4 sales, $20.00 revenue"));
        assert!(prompt.contains("Recent Orders: 3 most recent"));
        assert!(prompt.contains("Customer: buyer@example.com"));
    }
}
