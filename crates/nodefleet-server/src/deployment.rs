//! Deployment status state machine.
//!
//! ```text
//! PENDING -> IN_PROGRESS -> COMPLETED | FAILED
//! ```
//!
//! `PENDING` and `IN_PROGRESS` are active; `COMPLETED` and `FAILED` are
//! terminal. New deployments always start `PENDING`. Status updates accept any
//! of the four states without checking the arrow above, so operators can
//! correct a deployment that was reported wrongly.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Failed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Active deployments are candidates for a node's check-in response.
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn active() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|status| status.is_active())
    }

    /// `finished_time` to persist alongside this status when it is applied
    /// at `now`.
    pub const fn finished_time_at(self, now: i64) -> Option<i64> {
        if self.is_terminal() { Some(now) } else { None }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("unknown deployment status {0:?}")]
    Unknown(String),

    #[error("deployments cannot be created with status {0}")]
    NotAllowedOnCreate(DeploymentStatus),
}

impl FromStr for DeploymentStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for DeploymentStatus {
    type Error = StatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Resolve the status a new deployment is created with.
///
/// Absent or empty means `PENDING`. `PENDING` itself is accepted; any other
/// value is refused so clients cannot create deployments that claim to be
/// under way or finished already.
pub fn status_for_create(requested: Option<&str>) -> Result<DeploymentStatus, StatusError> {
    match requested {
        None | Some("") => Ok(DeploymentStatus::Pending),
        Some(s) => match s.parse()? {
            DeploymentStatus::Pending => Ok(DeploymentStatus::Pending),
            other => Err(StatusError::NotAllowedOnCreate(other)),
        },
    }
}

/// Parse the target status of a status update. Any known status is accepted.
pub fn status_for_update(requested: &str) -> Result<DeploymentStatus, StatusError> {
    requested.parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_status_by_wire_name() {
        for status in DeploymentStatus::ALL {
            assert_eq!(status.as_str().parse::<DeploymentStatus>().unwrap(), status);
        }
        assert!("pending".parse::<DeploymentStatus>().is_err());
        assert!("CANCELLED".parse::<DeploymentStatus>().is_err());
    }

    #[test]
    fn create_defaults_to_pending() {
        assert_eq!(status_for_create(None).unwrap(), DeploymentStatus::Pending);
        assert_eq!(status_for_create(Some("")).unwrap(), DeploymentStatus::Pending);
        assert_eq!(
            status_for_create(Some("PENDING")).unwrap(),
            DeploymentStatus::Pending
        );
    }

    #[test]
    fn create_rejects_non_pending() {
        for s in ["IN_PROGRESS", "COMPLETED", "FAILED"] {
            assert!(matches!(
                status_for_create(Some(s)),
                Err(StatusError::NotAllowedOnCreate(_))
            ));
        }
        assert!(matches!(
            status_for_create(Some("BOGUS")),
            Err(StatusError::Unknown(_))
        ));
    }

    #[test]
    fn update_accepts_any_known_status() {
        for status in DeploymentStatus::ALL {
            assert_eq!(status_for_update(status.as_str()).unwrap(), status);
        }
        assert!(status_for_update("").is_err());
    }

    #[test]
    fn finished_time_only_for_terminal_states() {
        assert_eq!(DeploymentStatus::Pending.finished_time_at(10), None);
        assert_eq!(DeploymentStatus::InProgress.finished_time_at(10), None);
        assert_eq!(DeploymentStatus::Completed.finished_time_at(10), Some(10));
        assert_eq!(DeploymentStatus::Failed.finished_time_at(10), Some(10));
        assert!(DeploymentStatus::InProgress.is_active());
        assert!(!DeploymentStatus::Failed.is_active());
    }

    #[test]
    fn active_set_is_pending_and_in_progress() {
        let active: Vec<_> = DeploymentStatus::active().collect();
        assert_eq!(
            active,
            vec![DeploymentStatus::Pending, DeploymentStatus::InProgress]
        );
    }

    #[test]
    fn serializes_as_wire_name() {
        let json = serde_json::to_string(&DeploymentStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
