// storefront/src/policy.rs

//! Access policy gate: a pure decision over (principal, action, owner).

use crate::model::Principal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  CreateOrder,
  /// Listing or reading orders owned by a specific user.
  ReadOrders,
  ListAllOrders,
  UpdateStatus,
  CancelOrder,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Action::CreateOrder => "create_order",
      Action::ReadOrders => "read_orders",
      Action::ListAllOrders => "list_all_orders",
      Action::UpdateStatus => "update_status",
      Action::CancelOrder => "cancel_order",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
  Unauthenticated,
  NotOwner,
  AdminOnly,
  /// An owner-scoped action was asked for without naming the owner.
  MissingOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny(DenyReason),
}

impl Decision {
  pub fn is_allowed(&self) -> bool {
    matches!(self, Decision::Allow)
  }
}

/// Decides whether `principal` may perform `action` on a resource owned by
/// `resource_owner_id`.
///
/// - unauthenticated callers are denied everything;
/// - any principal may create orders (always for themselves);
/// - reading is limited to the owner, unless the principal is an admin;
/// - listing everything and changing status are admin only;
/// - cancelling through the owner path is limited to the owner, admins included.
pub fn authorize(principal: Option<&Principal>, action: Action, resource_owner_id: Option<&str>) -> Decision {
  let Some(principal) = principal else {
    return Decision::Deny(DenyReason::Unauthenticated);
  };

  match action {
    Action::CreateOrder => Decision::Allow,
    Action::ListAllOrders | Action::UpdateStatus => {
      if principal.is_admin() {
        Decision::Allow
      } else {
        Decision::Deny(DenyReason::AdminOnly)
      }
    }
    Action::ReadOrders => match resource_owner_id {
      _ if principal.is_admin() => Decision::Allow,
      Some(owner) if owner == principal.id => Decision::Allow,
      Some(_) => Decision::Deny(DenyReason::NotOwner),
      None => Decision::Deny(DenyReason::MissingOwner),
    },
    Action::CancelOrder => match resource_owner_id {
      Some(owner) if owner == principal.id => Decision::Allow,
      Some(_) => Decision::Deny(DenyReason::NotOwner),
      None => Decision::Deny(DenyReason::MissingOwner),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unauthenticated_is_denied_everything() {
    for action in [
      Action::CreateOrder,
      Action::ReadOrders,
      Action::ListAllOrders,
      Action::UpdateStatus,
      Action::CancelOrder,
    ] {
      assert_eq!(
        authorize(None, action, Some("u1")),
        Decision::Deny(DenyReason::Unauthenticated)
      );
    }
  }

  #[test]
  fn users_read_only_their_own_orders() {
    let alice = Principal::user("alice");
    assert!(authorize(Some(&alice), Action::ReadOrders, Some("alice")).is_allowed());
    assert_eq!(
      authorize(Some(&alice), Action::ReadOrders, Some("bob")),
      Decision::Deny(DenyReason::NotOwner)
    );
  }

  #[test]
  fn admin_reads_anyone_and_mutates_status() {
    let admin = Principal::admin("root");
    assert!(authorize(Some(&admin), Action::ReadOrders, Some("bob")).is_allowed());
    assert!(authorize(Some(&admin), Action::ListAllOrders, None).is_allowed());
    assert!(authorize(Some(&admin), Action::UpdateStatus, Some("bob")).is_allowed());
  }

  #[test]
  fn users_cannot_list_all_or_change_status() {
    let alice = Principal::user("alice");
    assert_eq!(
      authorize(Some(&alice), Action::ListAllOrders, None),
      Decision::Deny(DenyReason::AdminOnly)
    );
    assert_eq!(
      authorize(Some(&alice), Action::UpdateStatus, Some("alice")),
      Decision::Deny(DenyReason::AdminOnly)
    );
  }

  #[test]
  fn cancel_is_owner_only_even_for_admins() {
    let admin = Principal::admin("root");
    assert_eq!(
      authorize(Some(&admin), Action::CancelOrder, Some("bob")),
      Decision::Deny(DenyReason::NotOwner)
    );
    assert!(authorize(Some(&Principal::user("bob")), Action::CancelOrder, Some("bob")).is_allowed());
  }
}
