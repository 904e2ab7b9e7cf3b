use nextkey_crypto::{
    Charset, MAX_KEY_LENGTH, MIN_KEY_LENGTH, PasswordCheck, decoy_hash, generate_card_key,
    hash_password, legacy_hash, random_string, verify_password,
};

// ── Password hashing ─────────────────────────────────────────────

#[test]
fn argon2_hash_verifies() {
    let hash = hash_password("hunter2").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert_eq!(verify_password(&hash, "hunter2"), PasswordCheck::Valid);
    assert_eq!(verify_password(&hash, "hunter3"), PasswordCheck::Invalid);
}

#[test]
fn hashes_are_salted() {
    assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
}

#[test]
fn decoy_hash_is_a_real_argon2_hash() {
    let decoy = decoy_hash();
    assert!(decoy.starts_with("$argon2id$"), "{decoy}");
    assert!(std::ptr::eq(decoy, decoy_hash()));
    assert_eq!(verify_password(decoy, "hunter2"), PasswordCheck::Invalid);
}

#[test]
fn legacy_hash_verifies_and_requests_upgrade() {
    let hash = legacy_hash("admin123");
    assert_eq!(hash.len(), 64);
    assert_eq!(verify_password(&hash, "admin123"), PasswordCheck::ValidLegacy);
    assert_eq!(verify_password(&hash, "admin124"), PasswordCheck::Invalid);
}

#[test]
fn known_legacy_digest() {
    assert_eq!(
        legacy_hash("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn garbage_hash_never_verifies() {
    assert_eq!(verify_password("not a hash", "x"), PasswordCheck::Invalid);
    assert_eq!(verify_password("", ""), PasswordCheck::Invalid);
    assert!(!PasswordCheck::Invalid.is_valid());
    assert!(PasswordCheck::ValidLegacy.is_valid());
}

// ── Card keys ────────────────────────────────────────────────────

#[test]
fn random_string_respects_charset() {
    let s = random_string(200, Charset::Letters);
    assert_eq!(s.len(), 200);
    assert!(s.chars().all(|c| c.is_ascii_alphabetic()));

    let s = random_string(200, Charset::Alphanumeric);
    assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn card_key_length_is_clamped() {
    let short = generate_card_key("P-", "-S", 1, Charset::Alphanumeric);
    assert_eq!(short.len(), 2 + MIN_KEY_LENGTH + 2);
    assert!(short.starts_with("P-") && short.ends_with("-S"));

    let long = generate_card_key("", "", 500, Charset::Alphanumeric);
    assert_eq!(long.len(), MAX_KEY_LENGTH);
}

#[test]
fn card_keys_differ() {
    let a = generate_card_key("", "", 16, Charset::Alphanumeric);
    let b = generate_card_key("", "", 16, Charset::Alphanumeric);
    assert_ne!(a, b);
}
