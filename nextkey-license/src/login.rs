//! Card login, device binding and session upkeep.

use crate::error::{LicenseError, LicenseResult};
use crate::service::{LicenseService, offset};
use nextkey_types::{Card, Project, ProjectMode, SessionToken};
use serde::{Deserialize, Serialize};

// Attempts at appending to a device or address list before giving up.
const BIND_ATTEMPTS: usize = 8;

/// Inner payload of a client login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub project_uuid: String,
    pub card_key: String,
    #[serde(default)]
    pub hwid: String,
    #[serde(default)]
    pub ip: String,
}

/// A freshly issued client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub token: String,
    pub expire_at: i64,
    /// The card the session is bound to; absent for free projects.
    pub card: Option<Card>,
}

#[derive(Debug, Clone, Copy)]
enum Binding {
    Hwid,
    Ip,
}

impl Binding {
    fn list(self, card: &Card) -> &Vec<String> {
        match self {
            Self::Hwid => &card.hwid_list,
            Self::Ip => &card.ip_list,
        }
    }

    fn list_mut(self, card: &mut Card) -> &mut Vec<String> {
        match self {
            Self::Hwid => &mut card.hwid_list,
            Self::Ip => &mut card.ip_list,
        }
    }

    fn has_capacity(self, card: &Card) -> bool {
        match self {
            Self::Hwid => card.can_bind_hwid(),
            Self::Ip => card.can_bind_ip(),
        }
    }

    fn limit_error(self) -> LicenseError {
        match self {
            Self::Hwid => LicenseError::HWIDLimitExceeded,
            Self::Ip => LicenseError::IPLimitExceeded,
        }
    }
}

impl LicenseService {
    /// Validates a card against `project`, activating and binding it as
    /// needed, and issues a session.
    ///
    /// `peer_ip` is the transport address; a non-empty `ip` in the request
    /// takes precedence for binding.
    pub fn login(
        &self,
        project: &Project,
        request: &LoginRequest,
        peer_ip: &str,
    ) -> LicenseResult<SessionGrant> {
        let ip = if request.ip.is_empty() {
            peer_ip
        } else {
            request.ip.as_str()
        };
        self.validate_and_bind(project, &request.card_key, &request.hwid, ip)
    }

    /// Runs the card state machine for one login attempt.
    pub fn validate_and_bind(
        &self,
        project: &Project,
        card_key: &str,
        hwid: &str,
        ip: &str,
    ) -> LicenseResult<SessionGrant> {
        if !project.is_active() {
            return Err(LicenseError::AuthenticationFailed);
        }

        let mut card = self
            .cards
            .find_card(project.id, card_key)?
            .ok_or(LicenseError::AuthenticationFailed)?;

        if project.mode == ProjectMode::Free {
            return self.issue_session(project, None);
        }

        let now = self.now();
        if !card.activated {
            card = self.activate(card, now)?;
        }

        if card.is_expired(now) {
            return Err(LicenseError::CardExpired);
        }
        if card.frozen {
            return Err(LicenseError::CardFrozen);
        }

        if project.enable_hwid {
            if hwid.is_empty() {
                return Err(LicenseError::InvalidInput("hwid is required".into()));
            }
            self.bind(&mut card, Binding::Hwid, hwid)?;
        }

        if project.enable_ip {
            if ip.is_empty() {
                return Err(LicenseError::InvalidInput("ip is required".into()));
            }
            self.bind(&mut card, Binding::Ip, ip)?;
        }

        self.issue_session(project, Some(card))
    }

    fn activate(&self, mut card: Card, now: i64) -> LicenseResult<Card> {
        let expire_at = if card.duration_seconds > 0 {
            Some(offset(now, card.duration_seconds, "card duration")?)
        } else {
            None
        };
        if self.cards.activate_card(card.id, now, expire_at)? {
            tracing::info!(card_id = card.id, project_id = card.project_id, "card activated");
            card.activated = true;
            card.activated_at = Some(now);
            card.expire_at = expire_at;
            Ok(card)
        } else {
            // Another login activated it first.
            self.load_card(card.id)
        }
    }

    fn bind(&self, card: &mut Card, binding: Binding, value: &str) -> LicenseResult<()> {
        for _ in 0..BIND_ATTEMPTS {
            let current = binding.list(card);
            if current.iter().any(|v| v == value) {
                return Ok(());
            }
            if !binding.has_capacity(card) {
                tracing::debug!(card_id = card.id, ?binding, "binding limit reached");
                return Err(binding.limit_error());
            }

            let mut next = current.clone();
            next.push(value.to_string());
            let swapped = match binding {
                Binding::Hwid => self.cards.replace_hwid_list(card.id, current, &next)?,
                Binding::Ip => self.cards.replace_ip_list(card.id, current, &next)?,
            };
            if swapped {
                tracing::debug!(card_id = card.id, ?binding, "bound new value");
                *binding.list_mut(card) = next;
                return Ok(());
            }
            *card = self.load_card(card.id)?;
        }
        tracing::warn!(card_id = card.id, ?binding, "binding lost every compare-and-swap");
        Err(LicenseError::Contention)
    }

    fn issue_session(&self, project: &Project, card: Option<Card>) -> LicenseResult<SessionGrant> {
        let now = self.now();
        let expire_at = offset(now, project.token_ttl_seconds, "token ttl")?;
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.create_session(
            project.id,
            card.as_ref().map(|c| c.id),
            &token,
            expire_at,
            now,
        )?;
        tracing::debug!(
            project_id = project.id,
            card_id = card.as_ref().map(|c| c.id),
            "session issued"
        );
        Ok(SessionGrant {
            token,
            expire_at,
            card,
        })
    }

    /// Resolves a bearer token to a live session.
    pub fn authorize_session(&self, token: Option<&str>) -> LicenseResult<SessionToken> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(LicenseError::TokenNotFound)?;
        let session = self
            .sessions
            .find_session(token)?
            .ok_or(LicenseError::TokenNotFound)?;
        if session.is_expired(self.now()) {
            return Err(LicenseError::AuthenticationFailed);
        }
        Ok(session)
    }

    /// Extends the caller's most recent session for its card. Returns the
    /// new expiry.
    pub fn heartbeat(&self, session: &SessionToken) -> LicenseResult<i64> {
        let Some(card_id) = session.card_id else {
            return Ok(session.expire_at);
        };

        let project = self.active_project(session.project_id)?;
        let latest = self
            .sessions
            .latest_session(session.project_id, card_id)?
            .ok_or(LicenseError::TokenNotFound)?;

        let expire_at = offset(self.now(), project.token_ttl_seconds, "token ttl")?;
        if !self.sessions.extend_session(latest.id, expire_at)? {
            return Err(LicenseError::TokenNotFound);
        }
        Ok(expire_at)
    }
}
