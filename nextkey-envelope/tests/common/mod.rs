#![allow(dead_code)]

use nextkey_crypto::CipherRegistry;
use nextkey_envelope::{ClientCipher, EnvelopeCodec, EnvelopeRequest};
use nextkey_store::{ProjectStore, SqliteStore};
use nextkey_types::{ManualClock, NewProject, Project, ProjectMode};
use serde_json::{Value, json};
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000;

pub struct Harness {
    pub store: Arc<SqliteStore>,
    pub registry: Arc<CipherRegistry>,
    pub clock: Arc<ManualClock>,
    pub codec: EnvelopeCodec,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let registry = Arc::new(CipherRegistry::with_defaults());
        let clock = Arc::new(ManualClock::new(NOW));
        let codec = EnvelopeCodec::new(store.clone(), registry.clone(), clock.clone(), 300);
        Self {
            store,
            registry,
            clock,
            codec,
        }
    }

    pub fn project(&self, uuid: &str, scheme: &str) -> Project {
        let key = self.registry.generate_key(scheme).unwrap();
        self.store
            .create_project(
                &NewProject {
                    uuid: uuid.to_string(),
                    name: uuid.to_string(),
                    mode: ProjectMode::Paid,
                    enable_hwid: false,
                    enable_ip: false,
                    token_ttl_seconds: 3600,
                    cipher_scheme: scheme.to_string(),
                    cipher_key: key,
                    version: String::new(),
                    update_url: String::new(),
                    description: String::new(),
                    enable_unbind: false,
                    unbind_verify_hwid: true,
                    unbind_deduct_seconds: 0,
                    unbind_cooldown_seconds: 0,
                },
                NOW,
            )
            .unwrap()
    }

    pub fn client<'a>(&'a self, project: &'a Project) -> ClientCipher<'a> {
        ClientCipher {
            registry: &self.registry,
            scheme: &project.cipher_scheme,
            key: &project.cipher_key,
        }
    }

    /// A login-style request naming its project.
    pub fn login_request(&self, project: &Project, nonce: &str, timestamp: i64) -> EnvelopeRequest {
        self.client(project)
            .request(nonce, timestamp, login_body(&project.uuid))
            .unwrap()
    }
}

pub fn login_body(project_uuid: &str) -> Value {
    json!({ "project_uuid": project_uuid, "card_key": "ABC-123", "hwid": "H1" })
}

pub fn nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}
