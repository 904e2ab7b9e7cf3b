mod common;

use common::{Harness, NOW, creds};
use nextkey_admin::AdminError;
use nextkey_crypto::{PasswordCheck, legacy_hash, verify_password};
use nextkey_store::AdminStore;
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;

// ── Login ────────────────────────────────────────────────────────

#[test]
fn login_issues_working_pair() {
    let h = Harness::new();
    let pair = h.manager.login(&creds("root", "hunter2")).unwrap();
    assert_eq!(pair.expires_in, 900);

    let who = h.manager.authenticate(&pair.access_token).unwrap();
    assert_eq!(who.username, "root");
    assert_eq!(who.exp, NOW + 900);

    let session = h
        .admins
        .find_refresh_session(&pair.refresh_token)
        .unwrap()
        .unwrap();
    assert_eq!(session.jti, who.jti);
    assert_eq!(session.expire_at, NOW + 7 * 86_400);
}

#[test]
fn wrong_password_and_unknown_user_fail_alike() {
    let h = Harness::new();
    for request in [creds("root", "nope"), creds("ghost", "hunter2"), creds("ghost", "")] {
        let err = h.manager.login(&request).unwrap_err();
        assert!(matches!(err, AdminError::AuthenticationFailed));
        assert_eq!(err.code(), 401);
    }
}

#[test]
fn legacy_hash_is_upgraded_on_login() {
    let h = Harness::new();
    let admin = h.admins.create_admin("old", &legacy_hash("pw")).unwrap();

    h.manager.login(&creds("old", "pw")).unwrap();

    let stored = h.admins.get_admin(admin.id).unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));
    assert_eq!(verify_password(&stored.password_hash, "pw"), PasswordCheck::Valid);
}

#[test]
fn ensure_admin_leaves_existing_account() {
    let h = Harness::new();
    assert!(!h.manager.ensure_admin("root", "changed").unwrap());
    assert!(h.manager.login(&creds("root", "hunter2")).is_ok());
}

// ── Refresh ──────────────────────────────────────────────────────

#[test]
fn refresh_rotates_and_is_single_use() {
    let h = Harness::new();
    let first = h.manager.login(&creds("root", "hunter2")).unwrap();

    let second = h.manager.refresh(&first.refresh_token).unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    let a = h.manager.authenticate(&first.access_token).unwrap();
    let b = h.manager.authenticate(&second.access_token).unwrap();
    assert_ne!(a.jti, b.jti);

    assert!(matches!(
        h.manager.refresh(&first.refresh_token),
        Err(AdminError::RefreshTokenInvalid)
    ));
    assert!(h.manager.refresh(&second.refresh_token).is_ok());
}

#[test]
fn expired_refresh_is_deleted() {
    let h = Harness::new();
    let pair = h.manager.login(&creds("root", "hunter2")).unwrap();

    h.clock.advance(7 * 86_400 + 1);
    assert!(matches!(
        h.manager.refresh(&pair.refresh_token),
        Err(AdminError::RefreshTokenExpired)
    ));
    assert_eq!(h.admins.find_refresh_session(&pair.refresh_token).unwrap(), None);
    assert!(matches!(
        h.manager.refresh(&pair.refresh_token),
        Err(AdminError::RefreshTokenInvalid)
    ));
}

#[test]
fn refresh_for_deleted_admin_fails() {
    let h = Harness::new();
    let pair = h.manager.login(&creds("root", "hunter2")).unwrap();
    h.admins.vanished.store(true, Ordering::SeqCst);

    assert!(matches!(
        h.manager.refresh(&pair.refresh_token),
        Err(AdminError::AdminNotFound)
    ));
    assert_eq!(h.admins.find_refresh_session(&pair.refresh_token).unwrap(), None);
}

#[test]
fn unknown_refresh_token_is_invalid() {
    let h = Harness::new();
    assert!(matches!(
        h.manager.refresh("never-issued"),
        Err(AdminError::RefreshTokenInvalid)
    ));
}

// ── Authentication and logout ────────────────────────────────────

#[test]
fn access_token_expires() {
    let h = Harness::new();
    let pair = h.manager.login(&creds("root", "hunter2")).unwrap();
    h.clock.advance(900);
    assert!(h.manager.authenticate(&pair.access_token).is_ok());
    h.clock.advance(1);
    assert!(matches!(
        h.manager.authenticate(&pair.access_token),
        Err(AdminError::InvalidToken(_))
    ));
}

#[test]
fn garbage_token_is_invalid() {
    let h = Harness::new();
    assert!(matches!(
        h.manager.authenticate("not.a.jwt"),
        Err(AdminError::InvalidToken(_))
    ));
}

#[test]
fn logout_revokes_current_token_and_all_refreshes() {
    let h = Harness::new();
    let laptop = h.manager.login(&creds("root", "hunter2")).unwrap();
    let phone = h.manager.login(&creds("root", "hunter2")).unwrap();

    let who = h.manager.authenticate(&laptop.access_token).unwrap();
    h.manager.logout(&who).unwrap();

    assert!(matches!(
        h.manager.authenticate(&laptop.access_token),
        Err(AdminError::TokenRevoked)
    ));
    // Other access tokens stay valid until they expire.
    assert!(h.manager.authenticate(&phone.access_token).is_ok());
    for token in [&laptop.refresh_token, &phone.refresh_token] {
        assert!(matches!(
            h.manager.refresh(token),
            Err(AdminError::RefreshTokenInvalid)
        ));
    }
}

#[test]
fn deleted_admin_token_is_rejected() {
    let h = Harness::new();
    let pair = h.manager.login(&creds("root", "hunter2")).unwrap();
    h.admins.vanished.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.manager.authenticate(&pair.access_token),
        Err(AdminError::AdminNotFound)
    ));
}
