//! Persistence interfaces, one per concern.
//!
//! Every method that guards a concurrency invariant is a single atomic
//! statement or runs inside one transaction; callers never need an
//! in-process lock on top.

use crate::error::StorageResult;
use nextkey_types::{
    Admin, AdminRefreshSession, Card, CloudVar, NewCard, NewProject, Project, SessionToken,
    UnbindRecord,
};

/// Card listing criteria. Text fields match substrings; unset fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub project_id: Option<i64>,
    /// Substring of the card key.
    pub keyword: Option<String>,
    /// Exact card type.
    pub card_type: Option<String>,
    pub note: Option<String>,
    pub custom_data: Option<String>,
    /// Substring of any bound device id.
    pub hwid: Option<String>,
    /// Substring of any bound address.
    pub ip: Option<String>,
    pub activated: Option<bool>,
    pub frozen: Option<bool>,
    /// Inclusive bounds on `created_at`.
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Single-use envelope nonces.
pub trait NonceStore: Send + Sync {
    /// Records `nonce`. Returns `false` if it was already present.
    fn insert_nonce(&self, nonce: &str, now: i64) -> StorageResult<bool>;

    /// Deletes nonces created before `before`. Returns the number removed.
    fn prune_nonces(&self, before: i64) -> StorageResult<usize>;
}

pub trait ProjectStore: Send + Sync {
    /// Inserts a project. A duplicate uuid is a `Conflict`.
    fn create_project(&self, project: &NewProject, now: i64) -> StorageResult<Project>;

    /// Looks up a project by id, including soft-deleted ones.
    fn get_project(&self, id: i64) -> StorageResult<Option<Project>>;

    /// Looks up an active project by uuid.
    fn find_project_by_uuid(&self, uuid: &str) -> StorageResult<Option<Project>>;

    /// Lists projects that have not been soft-deleted, oldest first.
    fn list_active_projects(&self) -> StorageResult<Vec<Project>>;

    /// Replaces the cipher scheme and key. Returns `false` if no active project matched.
    fn update_project_cipher(&self, id: i64, scheme: &str, key: &str) -> StorageResult<bool>;

    /// Overwrites the editable settings of an active project. The uuid,
    /// cipher and timestamps are left alone. Returns `false` if no active
    /// project matched.
    fn update_project(&self, project: &Project) -> StorageResult<bool>;

    /// Marks a project deleted. Returns `false` if it was missing or already deleted.
    fn soft_delete_project(&self, id: i64, now: i64) -> StorageResult<bool>;
}

pub trait CardStore: Send + Sync {
    /// Inserts every card in one transaction; any duplicate key aborts all.
    fn create_cards(&self, cards: &[NewCard], now: i64) -> StorageResult<Vec<Card>>;

    fn get_card(&self, id: i64) -> StorageResult<Option<Card>>;

    fn find_card(&self, project_id: i64, card_key: &str) -> StorageResult<Option<Card>>;

    /// Lists the page of cards matching `filter`, newest first, together
    /// with the total number of matches.
    fn list_cards(&self, filter: &CardFilter) -> StorageResult<(Vec<Card>, i64)>;

    /// Deletes cards with their sessions and unbind history in one
    /// transaction. Any missing id aborts all.
    fn delete_cards(&self, ids: &[i64]) -> StorageResult<usize>;

    /// Activates a card only if it is not yet activated.
    fn activate_card(&self, id: i64, activated_at: i64, expire_at: Option<i64>)
    -> StorageResult<bool>;

    /// Replaces the HWID list only if it still equals `expected`.
    fn replace_hwid_list(&self, id: i64, expected: &[String], new: &[String])
    -> StorageResult<bool>;

    /// Replaces the IP list only if it still equals `expected`.
    fn replace_ip_list(&self, id: i64, expected: &[String], new: &[String]) -> StorageResult<bool>;

    /// Sets `frozen` only if it currently has the opposite value.
    fn set_card_frozen(&self, id: i64, frozen: bool) -> StorageResult<bool>;

    /// Sets `frozen` on every card in one transaction. Any missing id aborts all.
    fn set_cards_frozen(&self, ids: &[i64], frozen: bool) -> StorageResult<usize>;

    /// Loads, mutates and saves every card in one transaction.
    /// Any missing id aborts all.
    fn update_cards(&self, ids: &[i64], apply: &dyn Fn(&mut Card)) -> StorageResult<Vec<Card>>;

    fn set_card_custom_data(&self, id: i64, data: &str) -> StorageResult<bool>;

    /// Removes a device from a card and records the unbind, atomically.
    /// Returns `false` without writing if the HWID list no longer equals `expected`.
    fn unbind_hwid(
        &self,
        id: i64,
        expected: &[String],
        new: &[String],
        expire_at: Option<i64>,
        record: &UnbindRecord,
    ) -> StorageResult<bool>;

    fn last_unbind(&self, card_id: i64) -> StorageResult<Option<UnbindRecord>>;
}

/// Client session tokens.
pub trait SessionStore: Send + Sync {
    fn create_session(
        &self,
        project_id: i64,
        card_id: Option<i64>,
        token: &str,
        expire_at: i64,
        now: i64,
    ) -> StorageResult<SessionToken>;

    fn find_session(&self, token: &str) -> StorageResult<Option<SessionToken>>;

    /// Most recently issued token for a card within a project.
    fn latest_session(&self, project_id: i64, card_id: i64) -> StorageResult<Option<SessionToken>>;

    fn extend_session(&self, id: i64, expire_at: i64) -> StorageResult<bool>;

    /// Number of unexpired tokens for a project.
    fn count_active_sessions(&self, project_id: i64, now: i64) -> StorageResult<i64>;

    /// Deletes tokens that expired before `now`. Returns the number removed.
    fn prune_expired_sessions(&self, now: i64) -> StorageResult<usize>;
}

pub trait CloudVarStore: Send + Sync {
    /// Inserts or overwrites `key` within a project.
    fn set_cloud_var(&self, project_id: i64, key: &str, value: &str, now: i64)
    -> StorageResult<CloudVar>;

    fn get_cloud_var(&self, project_id: i64, key: &str) -> StorageResult<Option<CloudVar>>;

    fn list_cloud_vars(&self, project_id: Option<i64>) -> StorageResult<Vec<CloudVar>>;

    fn delete_cloud_var(&self, id: i64) -> StorageResult<bool>;
}

/// Administrators, refresh sessions and revoked access tokens.
pub trait AdminStore: Send + Sync {
    /// Inserts an administrator. A duplicate username is a `Conflict`.
    fn create_admin(&self, username: &str, password_hash: &str) -> StorageResult<Admin>;

    fn get_admin(&self, id: i64) -> StorageResult<Option<Admin>>;

    fn find_admin_by_username(&self, username: &str) -> StorageResult<Option<Admin>>;

    fn set_admin_password(&self, id: i64, password_hash: &str) -> StorageResult<bool>;

    fn insert_refresh_session(
        &self,
        admin_id: i64,
        refresh_token: &str,
        jti: &str,
        expire_at: i64,
    ) -> StorageResult<AdminRefreshSession>;

    fn find_refresh_session(&self, refresh_token: &str)
    -> StorageResult<Option<AdminRefreshSession>>;

    fn delete_refresh_session(&self, refresh_token: &str) -> StorageResult<bool>;

    /// Consumes `old_token` and inserts its replacement in one transaction.
    /// Returns `None` if `old_token` was already consumed.
    fn rotate_refresh_session(
        &self,
        old_token: &str,
        admin_id: i64,
        new_token: &str,
        jti: &str,
        expire_at: i64,
    ) -> StorageResult<Option<AdminRefreshSession>>;

    /// Deletes every refresh session of `admin_id` and revokes `jti` until
    /// `expire_at`, in one transaction. Returns the number of sessions removed.
    fn logout_admin(&self, admin_id: i64, jti: &str, expire_at: i64) -> StorageResult<usize>;

    fn is_access_token_revoked(&self, jti: &str) -> StorageResult<bool>;

    fn prune_refresh_sessions(&self, now: i64) -> StorageResult<usize>;

    fn prune_revoked_tokens(&self, now: i64) -> StorageResult<usize>;
}
