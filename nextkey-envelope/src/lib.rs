//! Replay-protected encrypted envelopes.
//!
//! Every client request is `{timestamp, nonce, data}` where `data` is the
//! project cipher's encryption of `{nonce, timestamp, data}`. Opening a
//! request runs, in order:
//!
//! 1. freshness: `|now - timestamp| <= replay_window`
//! 2. replay: one atomic insert of the nonce; a duplicate is rejected
//! 3. cipher resolution: by bearer session, else by trial decryption over
//!    active projects (secure schemes first) matching `data.project_uuid`
//! 4. decryption and inner JSON parsing
//! 5. inner `nonce`/`timestamp` must equal the outer values
//!
//! Responses are `{nonce, data}` with the request nonce echoed both outside
//! and inside the ciphertext.

mod client;
mod codec;
mod error;
mod wire;

pub use client::ClientCipher;
pub use codec::{DEFAULT_REPLAY_WINDOW_SECS, EnvelopeCodec, Opened, ProjectCipher, Resolved};
pub use error::{EnvelopeError, EnvelopeResult};
pub use wire::{ApiResponse, EnvelopeRequest, EnvelopeResponse, InnerPayload};
