//! Licensing for NextKey.
//!
//! [`LicenseService`] owns the card state machine:
//! - login: look up, activate on first use, check expiry and freeze, bind
//!   the device and address within the card's limits, issue a session
//! - heartbeat: extend the card's latest session
//! - unbind: release a device under the project's cooldown and penalty
//!
//! It also carries the administrative operations on projects, cards and
//! cloud variables. Concurrency invariants (activation once, bounded
//! binding lists) rest on the store's compare-and-swap primitives.

mod cards;
mod cloud_vars;
mod error;
mod login;
mod projects;
mod service;
mod unbind;

pub use cards::{
    BatchCardUpdate, CardPage, CardQuery, CardUpdate, CreateCardsRequest, DEFAULT_KEY_LENGTH,
    DEFAULT_PAGE_SIZE, MAX_BATCH, MAX_PAGE_SIZE,
};
pub use cloud_vars::SetCloudVarRequest;
pub use error::{LicenseError, LicenseResult};
pub use login::{LoginRequest, SessionGrant};
pub use projects::{CreateProjectRequest, ProjectInfo, RotateCipherRequest, UpdateProjectRequest};
pub use service::{LicenseConfig, LicenseService};
pub use unbind::UnbindRequest;
