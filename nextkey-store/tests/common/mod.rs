#![allow(dead_code)]

use nextkey_store::{CardStore, ProjectStore, SqliteStore};
use nextkey_types::{Card, NewCard, NewProject, Project, ProjectMode, UNLIMITED};

pub const NOW: i64 = 1_700_000_000;

pub fn store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

pub fn new_project(uuid: &str) -> NewProject {
    NewProject {
        uuid: uuid.to_string(),
        name: format!("project {uuid}"),
        mode: ProjectMode::Paid,
        enable_hwid: true,
        enable_ip: false,
        token_ttl_seconds: 3600,
        cipher_scheme: "aes-256-gcm".to_string(),
        cipher_key: "k".repeat(64),
        version: "1.0.0".to_string(),
        update_url: String::new(),
        description: String::new(),
        enable_unbind: false,
        unbind_verify_hwid: true,
        unbind_deduct_seconds: 0,
        unbind_cooldown_seconds: 0,
    }
}

pub fn new_card(project_id: i64, key: &str) -> NewCard {
    NewCard {
        card_key: key.to_string(),
        project_id,
        duration_seconds: 3600,
        max_hwid: 1,
        max_ip: UNLIMITED,
        note: String::new(),
        card_type: "custom".to_string(),
    }
}

pub fn project(store: &SqliteStore, uuid: &str) -> Project {
    store.create_project(&new_project(uuid), NOW).unwrap()
}

pub fn card(store: &SqliteStore, project_id: i64, key: &str) -> Card {
    store
        .create_cards(&[new_card(project_id, key)], NOW)
        .unwrap()
        .remove(0)
}
