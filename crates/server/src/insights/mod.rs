//! Generative-text insights for shopkeeper analytics.
//!
//! Wraps the Gemini `generateContent` endpoint. Calls are best-effort:
//! analytics always render, with placeholder text standing in when the
//! client is disabled or a call fails.
//!
//! Responses are cached in memory per model and prompt for 10 minutes
//! using `moka`.

mod client;
mod error;

pub use client::{InsightKind, InsightsClient};
pub use error::InsightsError;

/// Shown instead of sales insights when generation fails.
pub const INSIGHTS_PLACEHOLDER: &str = "Unable to generate insights at this time.";

/// Shown instead of a feedback summary when generation fails.
pub const FEEDBACK_SUMMARY_PLACEHOLDER: &str = "Unable to generate feedback summary at this time.";
