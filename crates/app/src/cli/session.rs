//! Session subcommands: `login`, `start`, `whoami`, `status`, `resume`,
//! `logout`, `forget-me`.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};

use lv_sessions::{AuthPayload, NewSession, SessionStore};

use super::LoginArgs;
use crate::startup::{decide_startup_route, StartupRoute};
use crate::state::AppState;

/// Save a session from flags or an Authenticator payload, then confirm it
/// reads back as logged in.
pub fn login(state: &AppState, mut args: LoginArgs) -> anyhow::Result<()> {
    let session = match args.payload.take() {
        Some(path) => read_payload(&path)?.into_new_session(args.remember_me),
        None => new_session_from_flags(args)?,
    };

    state.sessions.save_session(&session);
    if !state.sessions.is_logged_in() {
        anyhow::bail!("session was not saved (see log output)");
    }

    println!(
        "Logged in as {} <{}> ({} storage)",
        session.name,
        session.email,
        state.sessions.tier()
    );
    Ok(())
}

fn new_session_from_flags(args: LoginArgs) -> anyhow::Result<NewSession> {
    let (Some(user_id), Some(name), Some(email)) = (args.user_id, args.name, args.email) else {
        anyhow::bail!("--user-id, --name and --email are required without --payload");
    };

    let mut session = NewSession::new(user_id, name, email).with_remember_me(args.remember_me);
    if let Some(url) = args.photo_url.filter(|s| !s.is_empty()) {
        session = session.with_photo_url(url);
    }
    if let Some(token) = args.token.filter(|s| !s.is_empty()) {
        session = session.with_auto_login_token(token);
    }
    Ok(session)
}

/// Read the user object from an Authenticator response.  Accepts either
/// the bare user object or the full response with a `user` field.
pub fn read_payload(path: &Path) -> anyhow::Result<AuthPayload> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_payload(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn parse_payload(raw: &str) -> anyhow::Result<AuthPayload> {
    let mut value: serde_json::Value = serde_json::from_str(raw)?;
    let user = value.get_mut("user").map(serde_json::Value::take);
    if let Some(user) = user {
        value = user;
    }
    Ok(serde_json::from_value(value)?)
}

pub fn start(state: &AppState) -> StartupRoute {
    let route = decide_startup_route(&state.sessions);
    println!("{route}");
    route
}

/// Returns `false` when nobody is logged in.
pub fn whoami(state: &AppState, json: bool) -> anyhow::Result<bool> {
    let Some(user) = state.sessions.user_info() else {
        if json {
            println!("null");
        } else {
            println!("Not logged in");
        }
        return Ok(false);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{} <{}>", user.name, user.email);
        println!("  id:    {}", user.id);
        if let Some(photo) = &user.photo_url {
            println!("  photo: {photo}");
        }
    }
    Ok(true)
}

pub fn status(state: &AppState, json: bool) -> anyhow::Result<()> {
    let sessions: &SessionStore = &state.sessions;
    let info = sessions.session_info();

    if json {
        let out = serde_json::json!({
            "tier": sessions.tier(),
            "session": info,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Storage:            {}", sessions.tier());
    if info.login_time == 0 {
        println!("Session:            none");
        return Ok(());
    }
    println!("Logged in at:       {}", format_millis(info.login_time));
    println!("Last activity:      {}", format_millis(info.last_activity));
    println!(
        "Session expires in: {}",
        format_remaining(info.remaining_session_time)
    );
    if info.remember_me_enabled {
        println!("Inactivity limit:   waived (remember me)");
    } else {
        println!(
            "Inactivity limit:   {}",
            format_remaining(info.remaining_activity_time)
        );
    }
    Ok(())
}

pub fn resume(state: &AppState) {
    state.sessions.refresh_session();
    if state.sessions.is_logged_in() {
        println!("Session active");
    } else {
        println!("Not logged in");
    }
}

pub fn logout(state: &AppState) {
    state.sessions.clear_session();
    println!("Logged out");
}

pub fn forget_me(state: &AppState) {
    state.sessions.disable_remember_me();
    println!("Auto-login disabled");
}

fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn format_remaining(ms: i64) -> String {
    if ms == 0 {
        return "expired".into();
    }
    let hours = ms / 3_600_000;
    format!("{}d {}h", hours / 24, hours % 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_inside_response() {
        let payload = parse_payload(
            r#"{"success": true, "message": "ok", "user": {"id": 8, "name": "Ece", "email": "ece@example.com", "token": "t"}}"#,
        )
        .unwrap();
        assert_eq!(payload.id, "8");
        assert_eq!(payload.name, "Ece");
        assert_eq!(payload.token.as_deref(), Some("t"));
    }

    #[test]
    fn bare_payload() {
        let payload =
            parse_payload(r#"{"id": "8", "name": "Ece", "email": "ece@example.com"}"#).unwrap();
        assert_eq!(payload.id, "8");
        assert_eq!(payload.profile_photo, None);
    }

    #[test]
    fn flags_drop_empty_optionals() {
        let args = LoginArgs {
            payload: None,
            user_id: Some("1".into()),
            name: Some("Ece".into()),
            email: Some("ece@example.com".into()),
            photo_url: Some(String::new()),
            token: Some(String::new()),
            remember_me: true,
        };
        let session = new_session_from_flags(args).unwrap();
        assert_eq!(session.photo_url, None);
        assert_eq!(session.auto_login_token, None);
        assert!(session.remember_me);
    }

    #[test]
    fn remaining_formatting() {
        assert_eq!(format_remaining(0), "expired");
        assert_eq!(format_remaining(26 * 3_600_000), "1d 2h");
    }
}
