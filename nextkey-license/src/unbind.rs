//! Client-initiated device unbinding.

use crate::error::{LicenseError, LicenseResult};
use crate::service::LicenseService;
use nextkey_types::{Card, Project, UnbindRecord};
use serde::{Deserialize, Serialize};

const UNBIND_ATTEMPTS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbindRequest {
    #[serde(default)]
    pub project_uuid: String,
    pub card_key: String,
    #[serde(default)]
    pub hwid: String,
}

impl LicenseService {
    /// Removes a device from a card under the project's unbind policy and
    /// returns the updated card.
    pub fn unbind_hwid(&self, project: &Project, request: &UnbindRequest) -> LicenseResult<Card> {
        if !project.is_active() {
            return Err(LicenseError::AuthenticationFailed);
        }
        if !project.enable_unbind {
            return Err(LicenseError::UnbindDisabled);
        }

        let mut card = self
            .cards
            .find_card(project.id, &request.card_key)?
            .ok_or(LicenseError::AuthenticationFailed)?;
        if card.frozen {
            return Err(LicenseError::CardFrozen);
        }
        if request.hwid.is_empty() {
            return Err(LicenseError::InvalidInput("hwid is required".into()));
        }

        let now = self.now();
        if let Some(last) = self.cards.last_unbind(card.id)? {
            let ready_at = last.unbind_at.saturating_add(project.unbind_cooldown_seconds);
            if now < ready_at {
                return Err(LicenseError::UnbindCooldown(ready_at - now));
            }
        }

        for _ in 0..UNBIND_ATTEMPTS {
            let bound = card.hwid_list.iter().any(|h| *h == request.hwid);
            if project.unbind_verify_hwid && !bound {
                return Err(LicenseError::HwidNotBound);
            }

            let remaining: Vec<String> = card
                .hwid_list
                .iter()
                .filter(|h| **h != request.hwid)
                .cloned()
                .collect();
            let expire_at = deduct(card.expire_at, project.unbind_deduct_seconds, now);
            let record = UnbindRecord {
                id: 0,
                card_id: card.id,
                hwid: request.hwid.clone(),
                unbind_at: now,
                deducted_seconds: project.unbind_deduct_seconds,
            };

            if self
                .cards
                .unbind_hwid(card.id, &card.hwid_list, &remaining, expire_at, &record)?
            {
                tracing::info!(
                    card_id = card.id,
                    project_id = project.id,
                    deducted = project.unbind_deduct_seconds,
                    "hwid unbound"
                );
                card.hwid_list = remaining;
                card.expire_at = expire_at;
                return Ok(card);
            }
            card = self.load_card(card.id)?;
        }
        Err(LicenseError::Contention)
    }
}

/// Shortens an expiry by `seconds`. A result already in the past becomes
/// `now`, so the card expires rather than turning permanent.
fn deduct(expire_at: Option<i64>, seconds: i64, now: i64) -> Option<i64> {
    match expire_at {
        Some(exp) if seconds > 0 => Some(exp.saturating_sub(seconds).max(now)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduct_leaves_permanent_cards_alone() {
        assert_eq!(deduct(None, 600, 100), None);
    }

    #[test]
    fn deduct_without_penalty_is_identity() {
        assert_eq!(deduct(Some(5_000), 0, 100), Some(5_000));
    }

    #[test]
    fn deduct_clamps_to_now() {
        assert_eq!(deduct(Some(5_000), 600, 100), Some(4_400));
        assert_eq!(deduct(Some(500), 600, 100), Some(100));
    }
}
