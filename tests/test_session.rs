//! Session handshake, authentication and lifecycle against a scripted server.

mod common;

use common::*;
use mysql_thin_rs::protocol::constants::*;
use mysql_thin_rs::protocol::crypto::{scramble_caching_sha2, scramble_native_password};
use mysql_thin_rs::{Error, ErrorKind, Timestamp};
use pretty_assertions::assert_eq;

/// Split a handshake response into (username, auth response, rest).
fn split_handshake_response(payload: &[u8]) -> (String, Vec<u8>, Vec<u8>) {
    let body = &payload[32..];
    let nul = body.iter().position(|&b| b == 0).unwrap();
    let username = String::from_utf8(body[..nul].to_vec()).unwrap();
    let auth_len = body[nul + 1] as usize;
    let auth = body[nul + 2..nul + 2 + auth_len].to_vec();
    let rest = body[nul + 2 + auth_len..].to_vec();
    (username, auth, rest)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn test_native_password_login() {
    let (session, sent) = Script::new().connect();
    let session = session.unwrap();
    assert_eq!(session.server_version(), "8.0.36-scripted");
    assert_eq!(session.connection_id(), 77);

    let packets = sent.packets();
    let response = &packets[0];
    let caps = u32::from_le_bytes([response[0], response[1], response[2], response[3]]);
    assert!(caps & CLIENT_PROTOCOL_41 != 0);
    assert!(caps & CLIENT_CONNECT_WITH_DB != 0);
    assert_eq!(response[8], 33);

    let (username, auth, rest) = split_handshake_response(response);
    assert_eq!(username, "app");
    assert_eq!(auth, scramble_native_password(b"secret", &NONCE));
    assert!(rest.starts_with(b"test\0mysql_native_password\0"));
    assert!(contains(&rest, b"_client_name"));
    assert!(contains(&rest, b"mysql-thin-rs"));
}

#[test]
fn test_caching_sha2_fast_auth() {
    let (session, sent) = Script::empty()
        .frame(0, &greeting(AUTH_CACHING_SHA2_PASSWORD))
        .frame(2, &[AUTH_MORE_DATA_HEADER, CACHING_SHA2_FAST_AUTH_SUCCESS])
        .frame(3, &ok(0, 0, SERVER_STATUS_AUTOCOMMIT))
        .connect();
    session.unwrap();

    let (_, auth, rest) = split_handshake_response(&sent.packets()[0]);
    assert_eq!(auth, scramble_caching_sha2(b"secret", &NONCE));
    assert!(rest.starts_with(b"test\0caching_sha2_password\0"));
}

#[test]
fn test_caching_sha2_full_auth_is_rejected() {
    let (session, _sent) = Script::empty()
        .frame(0, &greeting(AUTH_CACHING_SHA2_PASSWORD))
        .frame(2, &[AUTH_MORE_DATA_HEADER, CACHING_SHA2_PERFORM_FULL_AUTH])
        .connect();
    let err = session.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connect);
    assert!(matches!(err, Error::AuthenticationFailed { .. }));
}

#[test]
fn test_auth_switch_to_native_password() {
    let switch_nonce: Vec<u8> = (101..=120).collect();
    let mut switch = vec![AUTH_SWITCH_HEADER];
    switch.extend_from_slice(b"mysql_native_password\0");
    switch.extend_from_slice(&switch_nonce);
    switch.push(0);

    let (session, sent) = Script::empty()
        .frame(0, &greeting(AUTH_CACHING_SHA2_PASSWORD))
        .frame(2, &switch)
        .frame(4, &ok(0, 0, SERVER_STATUS_AUTOCOMMIT))
        .connect();
    session.unwrap();

    let packets = sent.packets();
    assert_eq!(
        packets[1],
        scramble_native_password(b"secret", &switch_nonce)
    );
}

#[test]
fn test_unknown_default_plugin_falls_back_to_native() {
    let (session, sent) = Script::empty()
        .frame(0, &greeting("authentication_ldap_simple"))
        .frame(2, &ok(0, 0, SERVER_STATUS_AUTOCOMMIT))
        .connect();
    session.unwrap();
    let (_, auth, _) = split_handshake_response(&sent.packets()[0]);
    assert_eq!(auth, scramble_native_password(b"secret", &NONCE));
}

#[test]
fn test_access_denied() {
    let (session, _sent) = Script::empty()
        .frame(0, &greeting(AUTH_NATIVE_PASSWORD))
        .frame(
            2,
            &err(1045, "28000", "Access denied for user 'app'@'localhost'"),
        )
        .connect();
    let err = session.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connect);
    assert!(err.to_string().contains("1045"));
}

#[test]
fn test_closed_socket_during_handshake() {
    let (session, _sent) = Script::empty().connect();
    assert_eq!(session.unwrap_err().kind(), ErrorKind::Connect);
}

#[test]
fn test_unknown_charset() {
    let params = params().with_charset("klingon");
    let (session, sent) = Script::new().connect_with(&params);
    let err = session.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connect);
    assert!(err.to_string().contains("klingon"));
    assert!(sent.packets().is_empty());
}

#[test]
fn test_utf8mb4_collation_is_sent() {
    let params = params().with_charset("utf8mb4");
    let (session, sent) = Script::new().connect_with(&params);
    session.unwrap();
    assert_eq!(sent.packets()[0][8], 45);
}

#[test]
fn test_ping() {
    let (session, sent) = Script::new()
        .reply(vec![ok(0, 0, SERVER_STATUS_AUTOCOMMIT)])
        .connect();
    let mut session = session.unwrap();
    assert!(session.ping());
    // The script has run out, so the server looks gone.
    assert!(!session.ping());
    assert_eq!(sent.command_bytes(), vec![COM_PING, COM_PING]);
}

#[test]
fn test_close_sends_quit_once() {
    let (session, sent) = Script::new().connect();
    session.unwrap().close().unwrap();
    assert_eq!(sent.command_bytes(), vec![COM_QUIT]);
}

#[test]
fn test_drop_sends_quit() {
    let (session, sent) = Script::new().connect();
    drop(session.unwrap());
    assert_eq!(sent.command_bytes(), vec![COM_QUIT]);
}

#[test]
fn test_pool_bookkeeping() {
    let (session, _sent) = Script::new().connect_with(&params().with_pooled(true));
    let mut session = session.unwrap();
    assert!(session.is_pooled());
    session.set_pooled(false);
    assert!(!session.is_pooled());

    let released = Timestamp::new(2024, 6, 1, 12, 0, 0).unwrap();
    session.set_released(released);
    assert_eq!(session.last_released(), released);
    assert_eq!(session.params().database, "test");
}
