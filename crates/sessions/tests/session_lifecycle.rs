use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use lv_domain::config::{Config, EncryptionMode, SessionConfig, StorageConfig};
use lv_sessions::storage::StaticKeyProvider;
use lv_sessions::{
    open_store, ManualClock, NewSession, OpenedStore, SessionState, SessionStore, StorageTier,
};

const DAY_MS: i64 = 86_400_000;

fn t0() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 5, 10, 20, 30, 0).unwrap(),
    ))
}

fn memory_store(clock: Arc<ManualClock>) -> SessionStore {
    SessionStore::new(OpenedStore::memory(), &SessionConfig::default(), clock)
}

fn ayse() -> NewSession {
    NewSession::new("101", "Ayşe Yılmaz", "ayse@example.com")
}

#[test]
fn fresh_save_is_logged_in_with_equal_timestamps() {
    let store = memory_store(t0());
    store.save_session(&ayse());

    let info = store.session_info();
    assert_eq!(info.login_time, info.last_activity);
    assert!(store.is_logged_in());
}

#[test]
fn initial_state_is_logged_out() {
    let store = memory_store(t0());
    assert!(!store.is_logged_in());
    assert!(!store.can_auto_login());
    assert_eq!(store.user_info(), None);
    assert_eq!(store.user_name(), "Kullanıcı");
    assert_eq!(store.user_email(), "");
    assert_eq!(store.profile_photo_url(), None);
}

#[test]
fn absolute_lifetime_expires_even_with_remember_me() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse().with_remember_me(true).with_auto_login_token("abc"));

    for _ in 0..6 {
        clock.advance(Duration::days(5));
        assert!(store.is_logged_in());
    }
    clock.advance(Duration::milliseconds(1));
    assert!(!store.is_logged_in());
    assert_eq!(store.user_info(), None);
    assert_eq!(store.user_id(), "");
}

#[test]
fn lifetime_boundary_is_still_valid() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse().with_remember_me(true));

    clock.advance(Duration::days(30));
    assert!(store.is_logged_in());
}

#[test]
fn inactivity_expires_without_remember_me() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse());

    clock.advance(Duration::days(7) + Duration::milliseconds(1));
    assert!(!store.is_logged_in());
    assert_eq!(store.user_info(), None);
}

#[test]
fn remember_me_bypasses_inactivity() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse().with_remember_me(true));

    clock.advance(Duration::days(20));
    assert!(store.is_logged_in());
}

#[test]
fn empty_token_never_auto_logs_in() {
    let store = memory_store(t0());
    store.save_session(&ayse().with_remember_me(true));
    assert!(!store.can_auto_login());

    store.save_session(&ayse().with_remember_me(true).with_auto_login_token(""));
    assert!(!store.can_auto_login());
    assert_eq!(store.auto_login_token(), None);

    store.save_session(&ayse().with_remember_me(false).with_auto_login_token("abc"));
    assert!(!store.can_auto_login());
    assert!(store.is_logged_in());
}

#[test]
fn disable_remember_me_keeps_session() {
    let store = memory_store(t0());
    store.save_session(&ayse().with_remember_me(true).with_auto_login_token("abc"));
    assert!(store.can_auto_login());

    store.disable_remember_me();
    assert!(store.is_logged_in());
    assert!(!store.can_auto_login());
    assert!(!store.is_remember_me_enabled());
    assert_eq!(store.auto_login_token(), None);
    assert_eq!(store.user_id(), "101");
}

#[test]
fn disabled_remember_me_falls_back_to_inactivity_rule() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse().with_remember_me(true).with_auto_login_token("abc"));
    store.disable_remember_me();

    clock.advance(Duration::days(8));
    assert!(!store.is_logged_in());
}

#[test]
fn clear_session_is_idempotent() {
    let store = memory_store(t0());
    store.save_session(&ayse());

    store.clear_session();
    assert_eq!(store.state(), SessionState::LoggedOut);
    assert!(!store.is_logged_in());

    store.clear_session();
    assert_eq!(store.state(), SessionState::LoggedOut);
    assert!(!store.is_logged_in());
    assert_eq!(store.user_id(), "");
}

#[test]
fn check_after_one_day_moves_the_inactivity_window() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse());
    let login = store.session_info().login_time;

    clock.advance(Duration::days(1));
    assert!(store.is_logged_in());
    assert_eq!(store.session_info().last_activity, login + DAY_MS);

    // T0+8d is exactly seven idle days after the check: still valid.
    clock.advance(Duration::days(7));
    assert!(store.is_logged_in());

    clock.advance(Duration::days(7) + Duration::milliseconds(1));
    assert!(!store.is_logged_in());
    assert_eq!(store.user_info(), None);
}

#[test]
fn eight_idle_days_expire() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse());

    clock.advance(Duration::days(8));
    assert!(!store.is_logged_in());
    assert_eq!(store.user_info(), None);
}

#[test]
fn auto_login_after_ten_idle_days() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse().with_remember_me(true).with_auto_login_token("abc"));

    clock.advance(Duration::days(10));
    assert!(store.can_auto_login());
}

#[test]
fn second_save_replaces_first() {
    let store = memory_store(t0());
    store.save_session(
        &NewSession::new("1", "First", "first@example.com")
            .with_photo_url("https://cdn.lovent.app/p/1.jpg")
            .with_remember_me(true)
            .with_auto_login_token("first-token"),
    );
    store.save_session(&NewSession::new("2", "Second", "second@example.com"));

    assert_eq!(store.user_id(), "2");
    assert_eq!(store.user_name(), "Second");
    assert_eq!(store.profile_photo_url(), None);
    assert_eq!(store.auto_login_token(), None);
    assert!(!store.is_remember_me_enabled());

    let info = store.user_info().unwrap();
    assert_eq!(info.id, "2");
    assert_eq!(info.email, "second@example.com");
    assert_eq!(info.photo_url, None);
}

#[test]
fn raw_reads_do_not_evaluate_expiry() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse());

    clock.advance(Duration::days(9));
    assert_eq!(store.user_name(), "Ayşe Yılmaz");
    assert_eq!(store.user_id(), "101");
    let info = store.session_info();
    assert_eq!(info.remaining_activity_time, 0);
    assert_eq!(info.remaining_session_time, 21 * DAY_MS);

    // The gated check prunes.
    assert_eq!(store.user_info(), None);
    assert_eq!(store.user_name(), "Kullanıcı");
}

#[test]
fn refresh_extends_inactivity_window() {
    let clock = t0();
    let store = memory_store(clock.clone());
    store.save_session(&ayse());

    for _ in 0..4 {
        clock.advance(Duration::days(6));
        store.refresh_session();
    }
    assert!(store.is_logged_in());
    let info = store.session_info();
    assert_eq!(info.remaining_session_time, 6 * DAY_MS);
    assert_eq!(info.remaining_activity_time, 7 * DAY_MS);
}

#[test]
fn refresh_on_logged_out_store_writes_nothing() {
    let store = memory_store(t0());
    store.refresh_session();
    let info = store.session_info();
    assert_eq!(info.login_time, 0);
    assert_eq!(info.last_activity, 0);
}

#[test]
fn session_persists_across_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        data_dir: tmp.path().to_path_buf(),
        ..StorageConfig::default()
    };
    let keys = StaticKeyProvider::new([0x42; 32]);
    let clock = t0();

    {
        let opened = open_store(&storage, &keys).unwrap();
        assert_eq!(opened.tier, StorageTier::Encrypted);
        let store = SessionStore::new(opened, &SessionConfig::default(), clock.clone());
        store.save_session(&ayse().with_remember_me(true).with_auto_login_token("abc"));
    }

    clock.advance(Duration::days(3));
    let opened = open_store(&storage, &keys).unwrap();
    let store = SessionStore::new(opened, &SessionConfig::default(), clock);
    assert!(store.can_auto_login());
    assert_eq!(store.user_email(), "ayse@example.com");
}

#[test]
fn plaintext_tier_behaves_the_same() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config {
        storage: StorageConfig {
            data_dir: tmp.path().to_path_buf(),
            encryption: EncryptionMode::Disabled,
            ..StorageConfig::default()
        },
        ..Config::default()
    };
    let clock = t0();
    let opened = open_store(&config.storage, &StaticKeyProvider::new([0; 32])).unwrap();
    assert_eq!(opened.tier, StorageTier::Plaintext);
    let store = SessionStore::new(opened, &config.session, clock.clone());

    store.save_session(&ayse());
    assert!(store.is_logged_in());
    clock.advance(Duration::days(8));
    assert!(!store.is_logged_in());
}

#[test]
fn shorter_configured_windows_apply() {
    let config = SessionConfig {
        session_ttl_days: 2,
        activity_ttl_days: 1,
        ..SessionConfig::default()
    };
    let clock = t0();
    let store = SessionStore::new(OpenedStore::memory(), &config, clock.clone());
    store.save_session(&ayse());

    clock.advance(Duration::hours(25));
    assert!(!store.is_logged_in());
}

#[test]
fn concurrent_checks_and_saves_never_mix_records() {
    let clock = t0();
    let store = memory_store(clock);
    store.save_session(&NewSession::new("a", "A", "a@example.com"));

    std::thread::scope(|s| {
        for i in 0..4 {
            let store = &store;
            s.spawn(move || {
                for _ in 0..50 {
                    if i % 2 == 0 {
                        store.save_session(&NewSession::new("a", "A", "a@example.com"));
                    } else {
                        store.save_session(&NewSession::new("b", "B", "b@example.com"));
                    }
                    if let Some(info) = store.user_info() {
                        let expected = if info.id == "a" { "A" } else { "B" };
                        assert_eq!(info.name, expected);
                    }
                }
            });
        }
    });
    assert!(store.is_logged_in());
}
