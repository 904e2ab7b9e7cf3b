//! Opening and sealing envelopes.

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::wire::{EnvelopeRequest, EnvelopeResponse, InnerPayload};
use nextkey_crypto::{CipherRegistry, CipherScheme, SecurityLevel};
use nextkey_store::{NonceStore, ProjectStore, SessionStore};
use nextkey_types::{Clock, Project, SessionToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Default maximum clock skew accepted on an envelope, in seconds.
pub const DEFAULT_REPLAY_WINDOW_SECS: i64 = 300;

/// A project's current scheme bound to its key.
#[derive(Clone)]
pub struct ProjectCipher {
    project: Project,
    scheme: Arc<dyn CipherScheme>,
}

impl ProjectCipher {
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn scheme_id(&self) -> &str {
        self.scheme.id()
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> EnvelopeResult<String> {
        Ok(self.scheme.encrypt(&self.project.cipher_key, plaintext)?)
    }

    pub fn decrypt(&self, ciphertext: &str) -> EnvelopeResult<Vec<u8>> {
        Ok(self.scheme.decrypt(&self.project.cipher_key, ciphertext)?)
    }
}

impl std::fmt::Debug for ProjectCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectCipher")
            .field("project_id", &self.project.id)
            .field("scheme", &self.scheme.id())
            .finish()
    }
}

/// Outcome of the freshness, replay and cipher-resolution steps.
///
/// Holding one of these means later failures can be reported inside an
/// encrypted envelope.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub cipher: ProjectCipher,
    /// The bearer session used for resolution, if any.
    pub session: Option<SessionToken>,
    /// The request nonce, to echo in the response.
    pub nonce: String,
    // Plaintext already recovered while scanning projects.
    prefetched: Option<Vec<u8>>,
}

/// A fully verified request.
#[derive(Debug, Clone)]
pub struct Opened {
    /// The inner `data` value.
    pub data: Value,
    pub nonce: String,
    pub timestamp: i64,
}

impl Opened {
    /// Deserializes the inner payload into `T`.
    pub fn parse<T: for<'de> Deserialize<'de>>(&self) -> EnvelopeResult<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))
    }
}

#[derive(Deserialize)]
struct ProjectHint {
    data: ProjectHintData,
}

#[derive(Deserialize)]
struct ProjectHintData {
    project_uuid: String,
}

/// Verifies and decrypts inbound envelopes; encrypts outbound ones.
pub struct EnvelopeCodec {
    registry: Arc<CipherRegistry>,
    nonces: Arc<dyn NonceStore>,
    projects: Arc<dyn ProjectStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    replay_window: i64,
}

impl EnvelopeCodec {
    pub fn new<S>(
        store: Arc<S>,
        registry: Arc<CipherRegistry>,
        clock: Arc<dyn Clock>,
        replay_window: i64,
    ) -> Self
    where
        S: NonceStore + ProjectStore + SessionStore + 'static,
    {
        Self {
            registry,
            nonces: store.clone(),
            projects: store.clone(),
            sessions: store,
            clock,
            replay_window,
        }
    }

    pub fn replay_window(&self) -> i64 {
        self.replay_window
    }

    /// Opens a request: [`EnvelopeCodec::resolve`] then [`EnvelopeCodec::verify`].
    pub fn open(
        &self,
        request: &EnvelopeRequest,
        bearer: Option<&str>,
    ) -> EnvelopeResult<(Resolved, Opened)> {
        let resolved = self.resolve(request, bearer)?;
        let opened = self.verify(&resolved, request)?;
        Ok((resolved, opened))
    }

    /// Checks freshness, consumes the nonce and finds the caller's cipher.
    pub fn resolve(
        &self,
        request: &EnvelopeRequest,
        bearer: Option<&str>,
    ) -> EnvelopeResult<Resolved> {
        let now = self.clock.now();
        if now.abs_diff(request.timestamp) > self.replay_window.unsigned_abs() {
            tracing::debug!(skew = now.saturating_sub(request.timestamp), "stale envelope");
            return Err(EnvelopeError::EnvelopeExpired);
        }

        if !self.nonces.insert_nonce(&request.nonce, now)? {
            tracing::warn!("replayed envelope nonce");
            return Err(EnvelopeError::ReplayDetected);
        }

        if let Some(token) = bearer {
            if let Some(resolved) = self.resolve_by_session(token, &request.nonce)? {
                return Ok(resolved);
            }
        }

        self.resolve_by_scan(request)
    }

    fn resolve_by_session(&self, token: &str, nonce: &str) -> EnvelopeResult<Option<Resolved>> {
        let Some(session) = self.sessions.find_session(token)? else {
            return Ok(None);
        };
        let Some(project) = self.projects.get_project(session.project_id)? else {
            return Ok(None);
        };
        if !project.is_active() {
            return Ok(None);
        }
        let scheme = self.registry.get(&project.cipher_scheme)?;
        Ok(Some(Resolved {
            cipher: ProjectCipher { project, scheme },
            session: Some(session),
            nonce: nonce.to_string(),
            prefetched: None,
        }))
    }

    // Trial decryption against every active project, secure schemes first.
    // Cost grows with the number of projects.
    fn resolve_by_scan(&self, request: &EnvelopeRequest) -> EnvelopeResult<Resolved> {
        let mut candidates: Vec<(SecurityLevel, ProjectCipher)> = self
            .projects
            .list_active_projects()?
            .into_iter()
            .filter_map(|project| {
                let scheme = self.registry.get(&project.cipher_scheme).ok()?;
                let level = scheme.meta().security_level;
                Some((level, ProjectCipher { project, scheme }))
            })
            .collect();
        candidates.sort_by_key(|(level, cipher)| (*level, cipher.project.id));

        for (_, cipher) in candidates {
            let Ok(plaintext) = cipher.decrypt(&request.data) else {
                continue;
            };
            let Ok(hint) = serde_json::from_slice::<ProjectHint>(&plaintext) else {
                continue;
            };
            if hint.data.project_uuid == cipher.project.uuid {
                tracing::debug!(
                    project_id = cipher.project.id,
                    scheme = cipher.scheme_id(),
                    "resolved project by trial decryption"
                );
                return Ok(Resolved {
                    cipher,
                    session: None,
                    nonce: request.nonce.clone(),
                    prefetched: Some(plaintext),
                });
            }
        }

        tracing::debug!("no project cipher matched envelope");
        Err(EnvelopeError::AuthenticationFailed)
    }

    /// Decrypts the body with the resolved cipher and checks it against the
    /// outer envelope.
    pub fn verify(&self, resolved: &Resolved, request: &EnvelopeRequest) -> EnvelopeResult<Opened> {
        let plaintext = match &resolved.prefetched {
            Some(plaintext) => plaintext.clone(),
            None => resolved.cipher.decrypt(&request.data)?,
        };

        let inner: InnerPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))?;

        if inner.nonce != request.nonce {
            tracing::warn!(project_id = resolved.cipher.project.id, "envelope nonce mismatch");
            return Err(EnvelopeError::TamperDetected("nonce"));
        }
        if inner.timestamp != request.timestamp {
            tracing::warn!(project_id = resolved.cipher.project.id, "envelope timestamp mismatch");
            return Err(EnvelopeError::TamperDetected("timestamp"));
        }

        Ok(Opened {
            data: inner.data,
            nonce: inner.nonce,
            timestamp: inner.timestamp,
        })
    }

    /// Wraps `payload` for the response to the request carrying `nonce`.
    pub fn seal<T: Serialize>(
        &self,
        cipher: &ProjectCipher,
        nonce: &str,
        payload: &T,
    ) -> EnvelopeResult<EnvelopeResponse> {
        let inner = InnerPayload {
            nonce: nonce.to_string(),
            timestamp: self.clock.now(),
            data: serde_json::to_value(payload)
                .map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?,
        };
        let plaintext = serde_json::to_vec(&inner)
            .map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?;
        Ok(EnvelopeResponse {
            nonce: nonce.to_string(),
            data: cipher.encrypt(&plaintext)?,
        })
    }
}
