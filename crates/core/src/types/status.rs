//! Role and lifecycle enums.
//!
//! Both are persisted as plain booleans (`users.is_admin`,
//! `alerts.acknowledged`); these enums give those flags names and carry the
//! transition rules.

use serde::{Deserialize, Serialize};

/// Operator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May manage operator accounts in addition to everything an operator can do.
    Admin,
    /// May review and acknowledge alerts.
    #[default]
    Operator,
}

impl Role {
    /// Map the persisted `is_admin` flag to a role.
    #[must_use]
    pub const fn from_is_admin(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Operator }
    }

    /// Returns `true` for [`Role::Admin`].
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Operator => write!(f, "operator"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "operator" | "user" => Ok(Self::Operator),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Alert lifecycle state.
///
/// ```text
/// Raised ──acknowledge──▶ Acknowledged ──acknowledge──▶ Acknowledged (no-op)
/// ```
///
/// There is no transition back to `Raised`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// Initial state, awaiting a human.
    #[default]
    Raised,
    /// Terminal state.
    Acknowledged,
}

/// Outcome of applying an acknowledgment to an [`AlertState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    /// The alert moved `Raised -> Acknowledged`.
    Transitioned,
    /// The alert was already acknowledged; nothing changed.
    AlreadyAcknowledged,
}

impl AlertState {
    /// Map the persisted `acknowledged` flag to a state.
    #[must_use]
    pub const fn from_acknowledged(acknowledged: bool) -> Self {
        if acknowledged {
            Self::Acknowledged
        } else {
            Self::Raised
        }
    }

    /// The persisted `acknowledged` flag for this state.
    #[must_use]
    pub const fn is_acknowledged(self) -> bool {
        matches!(self, Self::Acknowledged)
    }

    /// Apply an acknowledgment. Returns the next state and whether it changed.
    #[must_use]
    pub const fn acknowledge(self) -> (Self, Acknowledgment) {
        match self {
            Self::Raised => (Self::Acknowledged, Acknowledgment::Transitioned),
            Self::Acknowledged => (Self::Acknowledged, Acknowledgment::AlreadyAcknowledged),
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raised => write!(f, "raised"),
            Self::Acknowledged => write!(f, "acknowledged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_flag() {
        assert_eq!(Role::from_is_admin(true), Role::Admin);
        assert_eq!(Role::from_is_admin(false), Role::Operator);
        assert!(Role::Admin.is_admin());
        assert!(!Role::Operator.is_admin());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Admin, Role::Operator] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_acknowledge_transitions_once() {
        let (next, outcome) = AlertState::Raised.acknowledge();
        assert_eq!(next, AlertState::Acknowledged);
        assert_eq!(outcome, Acknowledgment::Transitioned);

        let (again, outcome) = next.acknowledge();
        assert_eq!(again, AlertState::Acknowledged);
        assert_eq!(outcome, Acknowledgment::AlreadyAcknowledged);
    }

    #[test]
    fn test_acknowledged_never_reverts() {
        let mut state = AlertState::Raised;
        for _ in 0..5 {
            state = state.acknowledge().0;
            assert!(state.is_acknowledged());
        }
    }

    #[test]
    fn test_state_flag_mapping() {
        assert_eq!(AlertState::from_acknowledged(false), AlertState::Raised);
        assert_eq!(AlertState::from_acknowledged(true), AlertState::Acknowledged);
        assert!(!AlertState::default().is_acknowledged());
    }
}
