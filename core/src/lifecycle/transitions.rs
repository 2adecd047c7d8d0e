// storefront/src/lifecycle/transitions.rs

//! Which status changes an administrator may make.

use crate::model::OrderStatus;
use std::fmt;
use std::str::FromStr;

/// Rule set applied to administrative status updates.
///
/// `Delivered` and `Cancelled` are terminal under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
  /// Orders move forward along an explicit transition table.
  #[default]
  Strict,
  /// Any status may be chosen while the order is not in a terminal state.
  Permissive,
}

const FROM_PAYMENT_PENDING: &[OrderStatus] = &[
  OrderStatus::Pending,
  OrderStatus::Processing,
  OrderStatus::Cancelled,
];
const FROM_PENDING: &[OrderStatus] = &[OrderStatus::Processing, OrderStatus::Cancelled];
const FROM_PROCESSING: &[OrderStatus] = &[OrderStatus::Delivered, OrderStatus::Cancelled];

impl StatusPolicy {
  pub fn allowed_targets(&self, from: OrderStatus) -> Vec<OrderStatus> {
    if from.is_terminal() {
      return Vec::new();
    }
    match self {
      StatusPolicy::Strict => match from {
        OrderStatus::PaymentPending => FROM_PAYMENT_PENDING.to_vec(),
        OrderStatus::Pending => FROM_PENDING.to_vec(),
        OrderStatus::Processing => FROM_PROCESSING.to_vec(),
        OrderStatus::Delivered | OrderStatus::Cancelled => Vec::new(),
      },
      StatusPolicy::Permissive => OrderStatus::ALL.to_vec(),
    }
  }

  pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
    self.allowed_targets(from).contains(&to)
  }
}

impl fmt::Display for StatusPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StatusPolicy::Strict => f.write_str("strict"),
      StatusPolicy::Permissive => f.write_str("permissive"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a status policy (expected 'strict' or 'permissive')")]
pub struct UnknownStatusPolicy(pub String);

impl FromStr for StatusPolicy {
  type Err = UnknownStatusPolicy;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "strict" => Ok(StatusPolicy::Strict),
      "permissive" => Ok(StatusPolicy::Permissive),
      _ => Err(UnknownStatusPolicy(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use OrderStatus::*;

  #[test]
  fn strict_policy_only_moves_forward() {
    let policy = StatusPolicy::Strict;
    assert!(policy.allows(PaymentPending, Pending));
    assert!(policy.allows(Pending, Processing));
    assert!(policy.allows(Processing, Delivered));
    assert!(!policy.allows(Processing, Pending));
    assert!(!policy.allows(Pending, Pending));
    assert!(!policy.allows(Pending, Delivered));
  }

  #[test]
  fn terminal_states_are_closed_under_every_policy() {
    for policy in [StatusPolicy::Strict, StatusPolicy::Permissive] {
      for target in OrderStatus::ALL {
        assert!(!policy.allows(Delivered, target), "{policy}: Delivered -> {target}");
        assert!(!policy.allows(Cancelled, target), "{policy}: Cancelled -> {target}");
      }
    }
  }

  #[test]
  fn permissive_policy_accepts_any_member_from_open_states() {
    let policy = StatusPolicy::Permissive;
    assert!(policy.allows(Processing, PaymentPending));
    assert!(policy.allows(Pending, Delivered));
  }

  #[test]
  fn parses_from_config_strings() {
    assert_eq!("Strict".parse::<StatusPolicy>(), Ok(StatusPolicy::Strict));
    assert_eq!("permissive".parse::<StatusPolicy>(), Ok(StatusPolicy::Permissive));
    assert!("graph".parse::<StatusPolicy>().is_err());
  }
}
