//! Shared fixtures for client tests against a mockito server

#![allow(dead_code)]

use alliant_client::{AlliantClient, Credentials};
use mockito::{Matcher, Mock, ServerGuard};

pub const TOKEN: &str = "tok-123";

/// Client pointed at `server` with test credentials, not logged in
pub fn client(server: &ServerGuard) -> AlliantClient {
    AlliantClient::builder()
        .base_url(server.url())
        .unwrap()
        .credentials(Credentials::new("user", "pass", "default", "test"))
        .build()
        .unwrap()
}

/// Login endpoint that issues `token`, expiring far in the future
pub fn mock_login(server: &mut ServerGuard, token: &str) -> Mock {
    server
        .mock("POST", "/api/security/login")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"result":{{"token":"{token}","expires":"2099-01-01T00:00:00Z"}},"errors":[],"warnings":[]}}"#
        ))
        .create()
}

/// Logout endpoint expecting `token`, hit `hits` times
pub fn mock_logout(server: &mut ServerGuard, token: &str, hits: usize) -> Mock {
    server
        .mock("POST", "/api/security/logout")
        .match_header("X-AlliantSession", token)
        .with_status(200)
        .with_body(r#"{"result":null,"errors":[],"warnings":[]}"#)
        .expect(hits)
        .create()
}

/// Client that has already logged in with [`TOKEN`], and its login mock
pub fn logged_in_client(server: &mut ServerGuard) -> (AlliantClient, Mock) {
    let login = mock_login(server, TOKEN);
    let mut client = client(server);
    client.login().unwrap();
    (client, login)
}

/// JSON envelope with the given result and no errors or warnings
pub fn envelope(result: serde_json::Value) -> String {
    serde_json::json!({ "result": result, "errors": [], "warnings": [] }).to_string()
}
