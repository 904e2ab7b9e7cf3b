#![allow(dead_code)]

use nextkey_crypto::{Charset, CipherRegistry};
use nextkey_license::{CreateCardsRequest, CreateProjectRequest, LicenseConfig, LicenseService};
use nextkey_store::SqliteStore;
use nextkey_types::{Card, ManualClock, Project, ProjectMode, UNLIMITED};
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000;

pub struct Harness {
    pub store: Arc<SqliteStore>,
    pub clock: Arc<ManualClock>,
    pub service: LicenseService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(NOW));
        let service = LicenseService::new(
            store.clone(),
            Arc::new(CipherRegistry::with_defaults()),
            clock.clone(),
            LicenseConfig::default(),
        );
        Self {
            store,
            clock,
            service,
        }
    }

    /// A paid project with device binding on.
    pub fn paid_project(&self) -> Project {
        let mut request = CreateProjectRequest::named("paid");
        request.mode = ProjectMode::Paid;
        request.enable_hwid = true;
        request.token_ttl_seconds = Some(600);
        self.service.create_project(&request).unwrap()
    }

    pub fn project_with(&self, configure: impl FnOnce(&mut CreateProjectRequest)) -> Project {
        let mut request = CreateProjectRequest::named("custom");
        request.mode = ProjectMode::Paid;
        configure(&mut request);
        self.service.create_project(&request).unwrap()
    }

    /// One card with an explicit key.
    pub fn card(&self, project: &Project, key: &str, duration: i64, max_hwid: i64) -> Card {
        let mut request = card_request(project.id, 1);
        request.card_key = key.to_string();
        request.duration = duration;
        request.max_hwid = max_hwid;
        self.service.create_cards(&request).unwrap().remove(0)
    }
}

pub fn card_request(project_id: i64, count: usize) -> CreateCardsRequest {
    CreateCardsRequest {
        project_id,
        card_key: String::new(),
        prefix: String::new(),
        suffix: String::new(),
        count,
        duration: 3600,
        card_type: "month".to_string(),
        max_hwid: UNLIMITED,
        max_ip: UNLIMITED,
        note: String::new(),
        length: None,
        charset: Charset::Alphanumeric,
    }
}
