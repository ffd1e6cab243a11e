//! Order fulfillment status and its transition rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The string is not one of `pending`, `packed`, `completed`.
    #[error("unknown order status: {0}")]
    Unknown(String),

    /// The move goes backwards or skips a step.
    #[error("cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}

/// Fulfillment status of an order.
///
/// Orders move strictly forward one step at a time:
/// `pending -> packed -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Packed,
    Completed,
}

impl OrderStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Packed, Self::Completed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Packed => "packed",
            Self::Completed => "completed",
        }
    }

    /// The status that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Packed),
            Self::Packed => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Check a requested move from `self` to `target`.
    ///
    /// Returns `Ok(false)` when `target` equals the current status (nothing
    /// to write), `Ok(true)` when `target` is the next step.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::IllegalTransition` for backward or skipping moves.
    pub fn check_transition(self, target: Self) -> Result<bool, StatusError> {
        if self == target {
            return Ok(false);
        }
        if self.next() == Some(target) {
            return Ok(true);
        }
        Err(StatusError::IllegalTransition {
            from: self,
            to: target,
        })
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "packed" => Ok(Self::Packed),
            "completed" => Ok(Self::Completed),
            other => Err(StatusError::Unknown(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_single_steps_allowed() {
        assert_eq!(OrderStatus::Pending.check_transition(OrderStatus::Packed), Ok(true));
        assert_eq!(OrderStatus::Packed.check_transition(OrderStatus::Completed), Ok(true));
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in OrderStatus::ALL {
            assert_eq!(status.check_transition(status), Ok(false));
        }
    }

    #[test]
    fn test_backward_moves_rejected() {
        assert!(OrderStatus::Completed.check_transition(OrderStatus::Pending).is_err());
        assert!(OrderStatus::Completed.check_transition(OrderStatus::Packed).is_err());
        assert!(OrderStatus::Packed.check_transition(OrderStatus::Pending).is_err());
    }

    #[test]
    fn test_skipping_rejected() {
        let err = OrderStatus::Pending
            .check_transition(OrderStatus::Completed)
            .unwrap_err();
        assert_eq!(
            err,
            StatusError::IllegalTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Completed,
            }
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(
            "shipped".parse::<OrderStatus>(),
            Err(StatusError::Unknown(s)) if s == "shipped"
        ));
        assert_eq!("packed".parse::<OrderStatus>().unwrap(), OrderStatus::Packed);
    }

    #[test]
    fn test_only_completed_has_no_next_step() {
        assert_eq!(OrderStatus::Completed.next(), None);
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Packed));
        assert_eq!(serde_json::to_string(&OrderStatus::Packed).unwrap(), "\"packed\"");
    }
}
