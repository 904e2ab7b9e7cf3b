//! License cards and their lifecycle.
//!
//! A card moves `NotActivated -> Active -> Expired`; `frozen` overlays any
//! of those states. `expire_at` is always derived from `activated_at` and
//! `duration_seconds` and must be recomputed whenever either changes.

use serde::{Deserialize, Serialize};

/// Capacity value meaning "no limit" for `max_hwid` / `max_ip`.
pub const UNLIMITED: i64 = -1;

/// Largest accepted duration, TTL or cooldown: 100 years in seconds.
pub const MAX_DURATION_SECONDS: i64 = 100 * 365 * 86_400;

/// Observable state of a card at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    NotActivated,
    Active,
    Expired,
    Frozen,
}

/// A license key and its binding state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub card_key: String,
    pub project_id: i64,
    pub activated: bool,
    pub activated_at: Option<i64>,
    /// Validity after activation, in seconds. `0` never expires.
    pub duration_seconds: i64,
    pub expire_at: Option<i64>,
    pub frozen: bool,
    pub hwid_list: Vec<String>,
    pub ip_list: Vec<String>,
    pub max_hwid: i64,
    pub max_ip: i64,
    pub note: String,
    pub card_type: String,
    /// Free-form blob owned by the client.
    pub custom_data: String,
    pub created_at: i64,
}

impl Card {
    /// Recomputes `expire_at` from `activated_at` and `duration_seconds`.
    /// The sum saturates at `i64::MAX`.
    pub fn recompute_expiry(&mut self) {
        self.expire_at = match self.activated_at {
            Some(at) if self.activated && self.duration_seconds > 0 => {
                Some(at.saturating_add(self.duration_seconds))
            }
            _ => None,
        };
    }

    /// Returns true if the card is activated, time-limited and past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        if !self.activated || self.duration_seconds == 0 {
            return false;
        }
        matches!(self.expire_at, Some(exp) if now > exp)
    }

    /// Returns the card's state, with `Frozen` taking precedence.
    #[must_use]
    pub fn status(&self, now: i64) -> CardStatus {
        if self.frozen {
            CardStatus::Frozen
        } else if !self.activated {
            CardStatus::NotActivated
        } else if self.is_expired(now) {
            CardStatus::Expired
        } else {
            CardStatus::Active
        }
    }

    /// Returns true if another distinct HWID may be bound.
    #[must_use]
    pub fn can_bind_hwid(&self) -> bool {
        has_capacity(self.hwid_list.len(), self.max_hwid)
    }

    /// Returns true if another distinct IP may be bound.
    #[must_use]
    pub fn can_bind_ip(&self) -> bool {
        has_capacity(self.ip_list.len(), self.max_ip)
    }
}

fn has_capacity(len: usize, max: i64) -> bool {
    if max < 0 {
        return true;
    }
    i64::try_from(len).map_or(false, |len| len < max)
}

/// Fields required to insert a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub card_key: String,
    pub project_id: i64,
    pub duration_seconds: i64,
    pub max_hwid: i64,
    pub max_ip: i64,
    pub note: String,
    pub card_type: String,
}

/// History entry written whenever a device is unbound from a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbindRecord {
    pub id: i64,
    pub card_id: i64,
    pub hwid: String,
    pub unbind_at: i64,
    pub deducted_seconds: i64,
}
