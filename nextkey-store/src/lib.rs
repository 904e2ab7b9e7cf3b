//! SQLite persistence for NextKey.
//!
//! Each concern has its own trait ([`NonceStore`], [`ProjectStore`],
//! [`CardStore`], [`SessionStore`], [`CloudVarStore`], [`AdminStore`]) so
//! that services depend only on what they use. [`SqliteStore`] implements
//! all of them over one connection.
//!
//! # Atomicity
//!
//! Invariants that must survive concurrent requests are enforced here:
//! - nonce uniqueness via `INSERT OR IGNORE` on a primary key
//! - first activation via `UPDATE ... WHERE activated = 0`
//! - device/IP list growth via compare-and-swap on the stored list
//! - refresh-token single use via delete-then-insert in one transaction
//!
//! Multi-row operations run in a transaction that is rolled back explicitly
//! on the first failed step.

mod error;
mod sqlite;
mod traits;

pub use error::{StorageError, StorageResult};
pub use sqlite::SqliteStore;
pub use traits::{AdminStore, CardFilter, CardStore, CloudVarStore, NonceStore, ProjectStore, SessionStore};
