mod common;

use common::{NOW, new_project, project, store};
use nextkey_store::{ProjectStore, StorageError};
use nextkey_types::ProjectMode;
use pretty_assertions::assert_eq;

#[test]
fn create_and_fetch() {
    let store = store();
    let created = project(&store, "p-1");
    assert_eq!(created.mode, ProjectMode::Paid);
    assert_eq!(created.created_at, NOW);
    assert!(created.is_active());

    assert_eq!(store.get_project(created.id).unwrap(), Some(created.clone()));
    assert_eq!(store.find_project_by_uuid("p-1").unwrap(), Some(created));
    assert_eq!(store.get_project(999).unwrap(), None);
}

#[test]
fn duplicate_uuid_conflicts() {
    let store = store();
    project(&store, "dup");
    let err = store.create_project(&new_project("dup"), NOW).unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[test]
fn cipher_update() {
    let store = store();
    let p = project(&store, "p");
    assert!(store.update_project_cipher(p.id, "chacha20-poly1305", "new-key").unwrap());
    let p = store.get_project(p.id).unwrap().unwrap();
    assert_eq!(p.cipher_scheme, "chacha20-poly1305");
    assert_eq!(p.cipher_key, "new-key");
}

#[test]
fn settings_update_keeps_cipher() {
    let store = store();
    let mut p = project(&store, "p");
    p.name = "renamed".to_string();
    p.mode = ProjectMode::Free;
    p.token_ttl_seconds = 60;
    p.enable_unbind = true;
    p.unbind_cooldown_seconds = 30;
    p.cipher_key = "ignored".to_string();
    assert!(store.update_project(&p).unwrap());

    let stored = store.get_project(p.id).unwrap().unwrap();
    assert_eq!(stored.name, "renamed");
    assert_eq!(stored.mode, ProjectMode::Free);
    assert_eq!(stored.token_ttl_seconds, 60);
    assert!(stored.enable_unbind);
    assert_eq!(stored.unbind_cooldown_seconds, 30);
    assert_eq!(stored.cipher_key, "k".repeat(64));

    store.soft_delete_project(p.id, NOW).unwrap();
    assert!(!store.update_project(&p).unwrap());
}

#[test]
fn soft_delete_hides_project() {
    let store = store();
    let a = project(&store, "a");
    let b = project(&store, "b");

    assert!(store.soft_delete_project(a.id, NOW + 1).unwrap());
    assert!(!store.soft_delete_project(a.id, NOW + 2).unwrap());

    let active: Vec<i64> = store
        .list_active_projects()
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(active, vec![b.id]);
    assert_eq!(store.find_project_by_uuid("a").unwrap(), None);

    let deleted = store.get_project(a.id).unwrap().unwrap();
    assert_eq!(deleted.deleted_at, Some(NOW + 1));
    assert!(!store.update_project_cipher(a.id, "xor", "k").unwrap());
}
