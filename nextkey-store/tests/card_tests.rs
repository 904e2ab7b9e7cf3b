mod common;

use common::{NOW, card, new_card, project, store};
use nextkey_store::{CardFilter, CardStore, SessionStore, StorageError};
use nextkey_types::UnbindRecord;
use pretty_assertions::assert_eq;

fn by_project(project_id: i64) -> CardFilter {
    CardFilter {
        project_id: Some(project_id),
        ..CardFilter::default()
    }
}

fn keys(store: &nextkey_store::SqliteStore, filter: &CardFilter) -> Vec<String> {
    let (cards, _) = store.list_cards(filter).unwrap();
    cards.into_iter().map(|c| c.card_key).collect()
}

// ── Creation ─────────────────────────────────────────────────────

#[test]
fn batch_create_is_all_or_nothing() {
    let store = store();
    let p = project(&store, "p");
    card(&store, p.id, "TAKEN");

    let err = store
        .create_cards(
            &[new_card(p.id, "FRESH-1"), new_card(p.id, "TAKEN"), new_card(p.id, "FRESH-2")],
            NOW,
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
    assert_eq!(store.find_card(p.id, "FRESH-1").unwrap(), None);
    assert_eq!(store.list_cards(&by_project(p.id)).unwrap().1, 1);
}

#[test]
fn new_cards_start_unactivated() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "ABC-123");
    assert!(!c.activated);
    assert_eq!(c.activated_at, None);
    assert_eq!(c.expire_at, None);
    assert!(c.hwid_list.is_empty());
    assert_eq!(c.created_at, NOW);
}

#[test]
fn find_is_scoped_to_project() {
    let store = store();
    let a = project(&store, "a");
    let b = project(&store, "b");
    card(&store, a.id, "KEY");
    assert!(store.find_card(a.id, "KEY").unwrap().is_some());
    assert!(store.find_card(b.id, "KEY").unwrap().is_none());
}

#[test]
fn list_filters_by_project() {
    let store = store();
    let a = project(&store, "a");
    let b = project(&store, "b");
    card(&store, a.id, "A1");
    card(&store, a.id, "A2");
    card(&store, b.id, "B1");
    assert_eq!(keys(&store, &by_project(a.id)), vec!["A2", "A1"]);
    assert_eq!(store.list_cards(&CardFilter::default()).unwrap().1, 3);
}

#[test]
fn list_pages_newest_first_with_total() {
    let store = store();
    let p = project(&store, "p");
    for key in ["K1", "K2", "K3", "K4", "K5"] {
        card(&store, p.id, key);
    }
    let filter = CardFilter {
        limit: Some(2),
        offset: 2,
        ..by_project(p.id)
    };
    let (cards, total) = store.list_cards(&filter).unwrap();
    assert_eq!(total, 5);
    let keys: Vec<&str> = cards.iter().map(|c| c.card_key.as_str()).collect();
    assert_eq!(keys, vec!["K3", "K2"]);
}

#[test]
fn list_filters_by_state_and_bindings() {
    let store = store();
    let p = project(&store, "p");
    let a = card(&store, p.id, "ALPHA-1");
    let b = card(&store, p.id, "BETA-1");
    card(&store, p.id, "ALPHA-2");
    store.activate_card(a.id, NOW, None).unwrap();
    store.replace_hwid_list(a.id, &[], &["PC-42".to_string()]).unwrap();
    store.replace_ip_list(b.id, &[], &["10.0.0.7".to_string()]).unwrap();
    store.set_card_frozen(b.id, true).unwrap();

    let activated = CardFilter { activated: Some(true), ..by_project(p.id) };
    assert_eq!(keys(&store, &activated), vec!["ALPHA-1"]);
    let frozen = CardFilter { frozen: Some(true), ..by_project(p.id) };
    assert_eq!(keys(&store, &frozen), vec!["BETA-1"]);
    let hwid = CardFilter { hwid: Some("C-4".into()), ..by_project(p.id) };
    assert_eq!(keys(&store, &hwid), vec!["ALPHA-1"]);
    let ip = CardFilter { ip: Some("0.0.7".into()), ..by_project(p.id) };
    assert_eq!(keys(&store, &ip), vec!["BETA-1"]);
    let keyword = CardFilter { keyword: Some("ALPHA".into()), ..by_project(p.id) };
    assert_eq!(keys(&store, &keyword), vec!["ALPHA-2", "ALPHA-1"]);
}

#[test]
fn like_wildcards_in_filters_match_literally() {
    let store = store();
    let p = project(&store, "p");
    card(&store, p.id, "A_1");
    card(&store, p.id, "AB1");
    card(&store, p.id, "100%");

    let underscore = CardFilter { keyword: Some("A_".into()), ..by_project(p.id) };
    assert_eq!(keys(&store, &underscore), vec!["A_1"]);
    let percent = CardFilter { keyword: Some("%".into()), ..by_project(p.id) };
    assert_eq!(keys(&store, &percent), vec!["100%"]);
}

#[test]
fn list_filters_by_creation_window() {
    let store = store();
    let p = project(&store, "p");
    store.create_cards(&[new_card(p.id, "OLD")], NOW - 1000).unwrap();
    card(&store, p.id, "NEW");

    let recent = CardFilter { created_from: Some(NOW - 10), ..by_project(p.id) };
    assert_eq!(keys(&store, &recent), vec!["NEW"]);
    let old = CardFilter { created_to: Some(NOW - 10), ..by_project(p.id) };
    assert_eq!(keys(&store, &old), vec!["OLD"]);
}

// ── Deletion ─────────────────────────────────────────────────────

#[test]
fn delete_removes_sessions_and_unbind_history() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");
    store.create_session(p.id, Some(c.id), "tok", NOW + 60, NOW).unwrap();
    store.replace_hwid_list(c.id, &[], &["H1".to_string()]).unwrap();
    let record = UnbindRecord {
        id: 0,
        card_id: c.id,
        hwid: "H1".to_string(),
        unbind_at: NOW,
        deducted_seconds: 0,
    };
    store.unbind_hwid(c.id, &["H1".to_string()], &[], None, &record).unwrap();

    assert_eq!(store.delete_cards(&[c.id]).unwrap(), 1);
    assert_eq!(store.get_card(c.id).unwrap(), None);
    assert_eq!(store.find_session("tok").unwrap(), None);
    assert_eq!(store.last_unbind(c.id).unwrap(), None);
}

#[test]
fn batch_delete_rolls_back_on_missing_card() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");

    let err = store.delete_cards(&[c.id, 404]).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    assert!(store.get_card(c.id).unwrap().is_some());
}

// ── Compare-and-swap updates ─────────────────────────────────────

#[test]
fn activation_happens_once() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");

    assert!(store.activate_card(c.id, NOW, Some(NOW + 3600)).unwrap());
    assert!(!store.activate_card(c.id, NOW + 10, Some(NOW + 3610)).unwrap());

    let c = store.get_card(c.id).unwrap().unwrap();
    assert!(c.activated);
    assert_eq!(c.activated_at, Some(NOW));
    assert_eq!(c.expire_at, Some(NOW + 3600));
}

#[test]
fn hwid_list_swap_requires_expected_value() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");

    let h1 = vec!["H1".to_string()];
    assert!(store.replace_hwid_list(c.id, &[], &h1).unwrap());
    assert!(!store.replace_hwid_list(c.id, &[], &["H2".to_string()]).unwrap());

    let c = store.get_card(c.id).unwrap().unwrap();
    assert_eq!(c.hwid_list, h1);
}

#[test]
fn ip_list_swap() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");
    let ips = vec!["10.0.0.1".to_string()];
    assert!(store.replace_ip_list(c.id, &[], &ips).unwrap());
    assert_eq!(store.get_card(c.id).unwrap().unwrap().ip_list, ips);
}

#[test]
fn freeze_only_flips_state() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");
    assert!(store.set_card_frozen(c.id, true).unwrap());
    assert!(!store.set_card_frozen(c.id, true).unwrap());
    assert!(store.set_card_frozen(c.id, false).unwrap());
    assert!(!store.set_card_frozen(c.id, false).unwrap());
}

// ── Transactions ─────────────────────────────────────────────────

#[test]
fn batch_freeze_rolls_back_on_missing_card() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");

    let err = store.set_cards_frozen(&[c.id, 404], true).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    assert!(!store.get_card(c.id).unwrap().unwrap().frozen);

    assert_eq!(store.set_cards_frozen(&[c.id], true).unwrap(), 1);
    assert!(store.get_card(c.id).unwrap().unwrap().frozen);
}

#[test]
fn update_cards_applies_closure() {
    let store = store();
    let p = project(&store, "p");
    let a = card(&store, p.id, "A");
    let b = card(&store, p.id, "B");

    let updated = store
        .update_cards(&[a.id, b.id], &|c| {
            c.note = "bulk".to_string();
            c.max_hwid = 5;
        })
        .unwrap();
    assert_eq!(updated.len(), 2);

    let a = store.get_card(a.id).unwrap().unwrap();
    assert_eq!(a.note, "bulk");
    assert_eq!(a.max_hwid, 5);
}

#[test]
fn update_cards_rolls_back_on_missing_card() {
    let store = store();
    let p = project(&store, "p");
    let a = card(&store, p.id, "A");

    let err = store
        .update_cards(&[a.id, 404], &|c| c.note = "changed".to_string())
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    assert_eq!(store.get_card(a.id).unwrap().unwrap().note, "");
}

#[test]
fn unbind_updates_card_and_records_history() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");
    let before = vec!["H1".to_string(), "H2".to_string()];
    store.replace_hwid_list(c.id, &[], &before).unwrap();

    let record = UnbindRecord {
        id: 0,
        card_id: c.id,
        hwid: "H1".to_string(),
        unbind_at: NOW + 100,
        deducted_seconds: 60,
    };
    let after = vec!["H2".to_string()];
    assert!(store.unbind_hwid(c.id, &before, &after, Some(NOW + 50), &record).unwrap());

    let c = store.get_card(c.id).unwrap().unwrap();
    assert_eq!(c.hwid_list, after);
    assert_eq!(c.expire_at, Some(NOW + 50));

    let last = store.last_unbind(c.id).unwrap().unwrap();
    assert_eq!(last.hwid, "H1");
    assert_eq!(last.unbind_at, NOW + 100);

    // Stale expectation writes nothing.
    assert!(!store.unbind_hwid(c.id, &before, &[], None, &record).unwrap());
    assert_eq!(store.get_card(c.id).unwrap().unwrap().hwid_list, after);
}

#[test]
fn custom_data_update() {
    let store = store();
    let p = project(&store, "p");
    let c = card(&store, p.id, "K");
    assert!(store.set_card_custom_data(c.id, "{\"level\":3}").unwrap());
    assert_eq!(store.get_card(c.id).unwrap().unwrap().custom_data, "{\"level\":3}");
    assert!(!store.set_card_custom_data(404, "x").unwrap());
}
