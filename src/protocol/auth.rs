//! Authentication plugin exchange.
//!
//! After the handshake response the server answers with OK, ERR, an auth
//! switch request (`0xFE`) or plugin-specific "more data" (`0x01`). Only the
//! `mysql_native_password` plugin and the fast path of `caching_sha2_password`
//! are implemented.

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::crypto::{scramble_caching_sha2, scramble_native_password};
use crate::protocol::messages::AuthDataMessage;
use crate::protocol::packet::PacketStream;
use crate::protocol::response::{parse_err, parse_ok, OkPacket};

/// Authentication credentials.
#[derive(Clone)]
pub struct AuthCredentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl AuthCredentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Compute the auth response for `plugin`.
pub fn auth_response(plugin: &str, password: &str, nonce: &[u8]) -> Result<Vec<u8>> {
    match plugin {
        AUTH_NATIVE_PASSWORD => Ok(scramble_native_password(password.as_bytes(), nonce)),
        AUTH_CACHING_SHA2_PASSWORD => Ok(scramble_caching_sha2(password.as_bytes(), nonce)),
        other => Err(Error::UnsupportedAuthPlugin {
            plugin: other.to_string(),
        }),
    }
}

/// Drive the auth exchange until the server accepts or rejects the login.
///
/// The handshake response must already have been sent. An auth switch
/// request carries its own nonce.
pub fn authenticate(
    stream: &mut PacketStream,
    creds: &AuthCredentials,
    plugin: &str,
) -> Result<OkPacket> {
    let mut plugin = plugin.to_string();
    loop {
        let packet = stream.read_packet()?;
        match packet.header() {
            Some(OK_HEADER) => {
                tracing::debug!(%plugin, "authentication succeeded");
                return parse_ok(&packet);
            }
            Some(ERR_HEADER) => return Err(parse_err(&packet).in_connect()),
            Some(AUTH_SWITCH_HEADER) => {
                let mut buf = ReadBuffer::new(packet.payload);
                buf.skip(1)?;
                plugin = buf.read_null_terminated()?;
                let mut nonce = buf.read_rest().to_vec();
                if nonce.last() == Some(&0) {
                    nonce.pop();
                }
                tracing::debug!(%plugin, "auth switch requested");
                let response = auth_response(&plugin, &creds.password, &nonce)?;
                stream.send_message(&AuthDataMessage { data: &response })?;
            }
            Some(AUTH_MORE_DATA_HEADER) => match packet.payload.get(1).copied() {
                Some(CACHING_SHA2_FAST_AUTH_SUCCESS) => {
                    tracing::debug!("caching_sha2_password fast auth accepted");
                }
                Some(CACHING_SHA2_PERFORM_FULL_AUTH) => {
                    return Err(Error::AuthenticationFailed {
                        message: "caching_sha2_password full authentication requires a secure \
                                  connection, which is not supported"
                            .to_string(),
                    });
                }
                other => {
                    return Err(Error::protocol(format!(
                        "Unexpected auth more-data status {:?}",
                        other
                    )));
                }
            },
            other => {
                return Err(Error::protocol(format!(
                    "Unexpected packet during authentication: {:?}",
                    other
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_dispatch() {
        let nonce = [7u8; 20];
        assert_eq!(
            auth_response(AUTH_NATIVE_PASSWORD, "pw", &nonce).unwrap().len(),
            20
        );
        assert_eq!(
            auth_response(AUTH_CACHING_SHA2_PASSWORD, "pw", &nonce)
                .unwrap()
                .len(),
            32
        );
    }

    #[test]
    fn test_unsupported_plugin() {
        match auth_response("sha256_password", "pw", &[]) {
            Err(Error::UnsupportedAuthPlugin { plugin }) => assert_eq!(plugin, "sha256_password"),
            other => panic!("Expected UnsupportedAuthPlugin, got {:?}", other),
        }
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = AuthCredentials::new("app", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
