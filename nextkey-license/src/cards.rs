//! Card administration: creation, edits, freezing and client-side data.

use crate::error::{LicenseError, LicenseResult};
use crate::service::{LicenseService, check_seconds};
use nextkey_crypto::{Charset, generate_card_key};
use nextkey_store::CardFilter;
use nextkey_types::{Card, NewCard, SessionToken, UNLIMITED};
use serde::{Deserialize, Serialize};

/// Card key body length used when a request does not set one.
pub const DEFAULT_KEY_LENGTH: usize = 16;

/// Upper bound on cards created by one request.
pub const MAX_BATCH: usize = 10_000;

/// Page size used when a listing does not set one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: i64 = 500;

fn first_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_count() -> usize {
    1
}

fn default_limit() -> i64 {
    UNLIMITED
}

/// Admin request to create one or more cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardsRequest {
    pub project_id: i64,
    /// Explicit key; honored only when `count` is 1.
    #[serde(default)]
    pub card_key: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default = "default_count")]
    pub count: usize,
    /// Validity after first use; 0 never expires.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub card_type: String,
    #[serde(default = "default_limit")]
    pub max_hwid: i64,
    #[serde(default = "default_limit")]
    pub max_ip: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub charset: Charset,
}

/// Card listing query. Text filters match substrings, except `card_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardQuery {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub custom_data: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub activated: Option<bool>,
    #[serde(default)]
    pub frozen: Option<bool>,
    /// Inclusive creation window, unix seconds.
    #[serde(default)]
    pub created_from: Option<i64>,
    #[serde(default)]
    pub created_to: Option<i64>,
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Default for CardQuery {
    fn default() -> Self {
        Self {
            project_id: None,
            keyword: None,
            card_type: None,
            note: None,
            custom_data: None,
            hwid: None,
            ip: None,
            activated: None,
            frozen: None,
            created_from: None,
            created_to: None,
            page: first_page(),
            page_size: default_page_size(),
        }
    }
}

impl CardQuery {
    fn to_filter(&self) -> LicenseResult<CardFilter> {
        if self.page < 1 {
            return Err(LicenseError::InvalidInput("page starts at 1".into()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(LicenseError::InvalidInput(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        // Empty strings come from blank form fields and mean "any".
        let text = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        Ok(CardFilter {
            project_id: self.project_id,
            keyword: text(&self.keyword),
            card_type: text(&self.card_type),
            note: text(&self.note),
            custom_data: text(&self.custom_data),
            hwid: text(&self.hwid),
            ip: text(&self.ip),
            activated: self.activated,
            frozen: self.frozen,
            created_from: self.created_from,
            created_to: self.created_to,
            limit: Some(self.page_size),
            offset: (self.page - 1).saturating_mul(self.page_size),
        })
    }
}

/// One page of a card listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPage {
    pub list: Vec<Card>,
    /// Matches across all pages.
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Partial card edit. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardUpdate {
    pub duration: Option<i64>,
    pub note: Option<String>,
    pub card_type: Option<String>,
    pub max_hwid: Option<i64>,
    pub max_ip: Option<i64>,
    pub custom_data: Option<String>,
    pub hwid_list: Option<Vec<String>>,
    pub ip_list: Option<Vec<String>>,
}

impl CardUpdate {
    fn validate(&self) -> LicenseResult<()> {
        if let Some(duration) = self.duration {
            check_seconds("duration", duration)?;
        }
        for limit in [self.max_hwid, self.max_ip].into_iter().flatten() {
            if limit < UNLIMITED {
                return Err(LicenseError::InvalidInput(format!("invalid limit {limit}")));
            }
        }
        Ok(())
    }

    /// Applies the edit, keeping `expire_at` consistent with the duration.
    pub fn apply(&self, card: &mut Card) {
        if let Some(duration) = self.duration {
            card.duration_seconds = duration;
            card.recompute_expiry();
        }
        if let Some(note) = &self.note {
            card.note.clone_from(note);
        }
        if let Some(card_type) = &self.card_type {
            card.card_type.clone_from(card_type);
        }
        if let Some(max) = self.max_hwid {
            card.max_hwid = max;
        }
        if let Some(max) = self.max_ip {
            card.max_ip = max;
        }
        if let Some(data) = &self.custom_data {
            card.custom_data.clone_from(data);
        }
        if let Some(list) = &self.hwid_list {
            card.hwid_list.clone_from(list);
        }
        if let Some(list) = &self.ip_list {
            card.ip_list.clone_from(list);
        }
    }
}

/// The same edit applied to many cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCardUpdate {
    pub ids: Vec<i64>,
    #[serde(flatten)]
    pub update: CardUpdate,
}

impl LicenseService {
    /// Creates cards in one transaction.
    pub fn create_cards(&self, request: &CreateCardsRequest) -> LicenseResult<Vec<Card>> {
        if request.count == 0 || request.count > MAX_BATCH {
            return Err(LicenseError::InvalidInput(format!(
                "count must be between 1 and {MAX_BATCH}"
            )));
        }
        check_seconds("duration", request.duration)?;
        if request.max_hwid < UNLIMITED || request.max_ip < UNLIMITED {
            return Err(LicenseError::InvalidInput("invalid binding limit".into()));
        }
        self.active_project(request.project_id)?;

        let length = request.length.unwrap_or(DEFAULT_KEY_LENGTH);
        let cards: Vec<NewCard> = (0..request.count)
            .map(|_| {
                let card_key = if request.count == 1 && !request.card_key.is_empty() {
                    request.card_key.clone()
                } else {
                    generate_card_key(&request.prefix, &request.suffix, length, request.charset)
                };
                NewCard {
                    card_key,
                    project_id: request.project_id,
                    duration_seconds: request.duration,
                    max_hwid: request.max_hwid,
                    max_ip: request.max_ip,
                    note: request.note.clone(),
                    card_type: request.card_type.clone(),
                }
            })
            .collect();

        let created = self.cards.create_cards(&cards, self.now())?;
        tracing::info!(
            project_id = request.project_id,
            count = created.len(),
            "cards created"
        );
        Ok(created)
    }

    pub fn list_cards(&self, query: &CardQuery) -> LicenseResult<CardPage> {
        let filter = query.to_filter()?;
        let (list, total) = self.cards.list_cards(&filter)?;
        Ok(CardPage {
            list,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    pub fn delete_card(&self, id: i64) -> LicenseResult<()> {
        self.delete_cards(&[id]).map(|_| ())
    }

    /// Deletes cards together with their sessions and unbind history, in
    /// one transaction; a missing id aborts the whole batch.
    pub fn delete_cards(&self, ids: &[i64]) -> LicenseResult<usize> {
        if ids.is_empty() {
            return Err(LicenseError::InvalidInput("no card ids given".into()));
        }
        let deleted = self.cards.delete_cards(ids)?;
        tracing::info!(count = deleted, "cards deleted");
        Ok(deleted)
    }

    pub fn update_card(&self, id: i64, update: &CardUpdate) -> LicenseResult<Card> {
        let mut updated = self.update_cards(&[id], update)?;
        updated.pop().ok_or_else(|| LicenseError::card(id))
    }

    /// Applies `update` to every card in one transaction; a missing id
    /// aborts the whole batch.
    pub fn update_cards(&self, ids: &[i64], update: &CardUpdate) -> LicenseResult<Vec<Card>> {
        if ids.is_empty() {
            return Err(LicenseError::InvalidInput("no card ids given".into()));
        }
        update.validate()?;
        let updated = self.cards.update_cards(ids, &|card| update.apply(card))?;
        tracing::info!(count = updated.len(), "cards updated");
        Ok(updated)
    }

    pub fn freeze_card(&self, id: i64) -> LicenseResult<()> {
        self.set_frozen(id, true)
    }

    pub fn unfreeze_card(&self, id: i64) -> LicenseResult<()> {
        self.set_frozen(id, false)
    }

    fn set_frozen(&self, id: i64, frozen: bool) -> LicenseResult<()> {
        if self.cards.set_card_frozen(id, frozen)? {
            tracing::info!(card_id = id, frozen, "card freeze state changed");
            return Ok(());
        }
        // Nothing changed: either the card is missing or already in that state.
        self.load_card(id)?;
        Err(if frozen {
            LicenseError::AlreadyFrozen
        } else {
            LicenseError::NotFrozen
        })
    }

    /// Freezes every card in one transaction. Cards already frozen are fine.
    pub fn freeze_cards(&self, ids: &[i64]) -> LicenseResult<usize> {
        self.set_many_frozen(ids, true)
    }

    pub fn unfreeze_cards(&self, ids: &[i64]) -> LicenseResult<usize> {
        self.set_many_frozen(ids, false)
    }

    fn set_many_frozen(&self, ids: &[i64], frozen: bool) -> LicenseResult<usize> {
        if ids.is_empty() {
            return Err(LicenseError::InvalidInput("no card ids given".into()));
        }
        let changed = self.cards.set_cards_frozen(ids, frozen)?;
        tracing::info!(count = changed, frozen, "batch freeze state changed");
        Ok(changed)
    }

    /// Replaces the calling card's free-form data.
    pub fn update_custom_data(&self, session: &SessionToken, data: &str) -> LicenseResult<()> {
        let card_id = session.card_id.ok_or(LicenseError::FreeModeUnsupported)?;
        if !self.cards.set_card_custom_data(card_id, data)? {
            return Err(LicenseError::card(card_id));
        }
        tracing::debug!(card_id, "custom data updated");
        Ok(())
    }
}
