//! Alliant API client implementation

use std::fmt;
use std::ops::Deref;
use std::time::Instant;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::blocking::RequestBuilder;
use serde_json::{Value, json};

use crate::error::{AlliantError, SessionError};
use crate::params::{CollectionParameters, Filter, ResourceParameters, Verbosity};
use crate::resource::{Action, ResourceKind};
use crate::response::{Adjustment, ApiResponse, Collection, Contract, TypedResponse};
use crate::session::{Credentials, SESSION_HEADER, SessionState, SessionToken};

/// Fetch the system layers served at `base_url`. No login is needed.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let layers = alliant_client::get_system_layers("http://alliantwebserver/")?;
/// println!("{}", layers.result());
/// # Ok(())
/// # }
/// ```
pub fn get_system_layers(base_url: impl reqwest::IntoUrl) -> Result<ApiResponse, AlliantError> {
    AlliantClient::builder()
        .base_url(base_url)?
        .build()?
        .system_layers()
}

/// Fetch the application layers of `system_layer` at `base_url`. No login is needed.
pub fn get_application_layers(
    base_url: impl reqwest::IntoUrl,
    system_layer: &str,
) -> Result<ApiResponse, AlliantError> {
    AlliantClient::builder()
        .base_url(base_url)?
        .build()?
        .application_layers(system_layer)
}

/// The main Alliant API client
///
/// Owns the HTTP client, the API root and one server-side session. The
/// session is a license-consuming resource: prefer [`AlliantClient::session`]
/// or [`AlliantClient::with_session`], which log out on every exit path.
///
/// One client serves one caller at a time; `login`/`logout` need `&mut self`.
/// Use one client per worker for concurrent work.
///
/// # Example
///
/// ```no_run
/// use alliant_client::{AlliantClient, Credentials};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = AlliantClient::builder()
///     .base_url("http://alliantwebserver/")?
///     .credentials(Credentials::new("svc_user", "secret", "default", "alt_test"))
///     .build()?;
///
/// let session = client.session()?;
/// let contract = session.lookup_contract("8c7d3f0e-0000-0000-0000-000000000001")?;
/// println!("status: {:?}", contract.contract_status());
/// // logout runs when `session` goes out of scope
/// # Ok(())
/// # }
/// ```
pub struct AlliantClient {
    http: reqwest::blocking::Client,
    base_url: reqwest::Url,
    credentials: Option<Credentials>,
    state: SessionState,
}

impl AlliantClient {
    /// Create a builder for configuring the client
    pub fn builder() -> AlliantClientBuilder {
        AlliantClientBuilder::new()
    }

    /// Normalized API root, always ending in `/api`
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    /// True between a successful login and logout
    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// True once the session has been logged out
    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// Expiry reported at login, if the server sent a readable one
    pub fn token_expires(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Active(token) => token.expires(),
            _ => None,
        }
    }

    fn endpoint<I, S>(&self, segments: I) -> Result<reqwest::Url, AlliantError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AlliantError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn resource_url(&self, kind: ResourceKind, extra: &[&str]) -> Result<reqwest::Url, AlliantError> {
        let mut segments = kind.segments()?;
        segments.extend(extra.iter().map(|s| s.to_string()));
        self.endpoint(segments)
    }

    /// Start a request carrying the session token
    ///
    /// Fails with [`SessionError`] before any I/O when there is no usable token.
    fn authorized(&self, method: Method, url: reqwest::Url) -> Result<RequestBuilder, AlliantError> {
        let token = self.state.current(Utc::now())?;
        Ok(self
            .http
            .request(method, url)
            .header(SESSION_HEADER, token.header_value()?))
    }

    fn send<R: TypedResponse>(&self, request: RequestBuilder) -> Result<R, AlliantError> {
        let request = request.build()?;
        tracing::debug!(method = %request.method(), path = request.url().path(), "sending request");
        let started = Instant::now();
        let response = self.http.execute(request)?;
        let response = ApiResponse::from_blocking(response, started)?;
        tracing::debug!(
            status = %response.status(),
            elapsed = ?response.elapsed(),
            "received response"
        );
        Ok(R::from_response(response))
    }

    /// List the system layers available at this server
    pub fn system_layers(&self) -> Result<ApiResponse, AlliantError> {
        let url = self.endpoint(["security", "systemLayers"])?;
        self.send(self.http.get(url))
    }

    /// List the application layers within `system_layer`
    pub fn application_layers(&self, system_layer: &str) -> Result<ApiResponse, AlliantError> {
        let url = self.endpoint(["security", "systemLayers", system_layer, "applicationLayers"])?;
        self.send(self.http.get(url))
    }

    /// Log in and store the session token
    ///
    /// Calling `login` on an active session replaces its token, which is how
    /// a caller refreshes a session nearing expiry. The old server-side
    /// session is logged out once the new token is stored; a failure there is
    /// logged, not returned. A failed login leaves the current session state
    /// untouched.
    ///
    /// # Errors
    ///
    /// * `AlliantError::Session(SessionError::Closed)` - the client was logged out
    /// * `AlliantError::MissingCredentials` - the client has no credentials
    /// * `AlliantError::Authentication` - the server rejected the login
    /// * `AlliantError::Transport` - network error
    pub fn login(&mut self) -> Result<ApiResponse, AlliantError> {
        if self.is_closed() {
            return Err(SessionError::Closed.into());
        }
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AlliantError::MissingCredentials)?;
        let user_id = credentials.user_id.clone();

        let url = self.endpoint(["security", "login"])?;
        let request = self.http.post(url).query(&[
            ("userId", credentials.user_id.as_str()),
            ("password", credentials.password.as_str()),
            ("systemLayer", credentials.system_layer_key.as_str()),
            ("applicationLayer", credentials.application_layer.as_str()),
        ]);
        // The request URL carries the password; keep it out of the response
        let response = self
            .send::<ApiResponse>(request)
            .map_err(|e| match e {
                AlliantError::Transport(e) => AlliantError::Transport(e.without_url()),
                other => other,
            })?
            .without_query();

        let token = if response.status().is_success() {
            serde_json::from_str::<Value>(response.text())
                .ok()
                .and_then(|body| SessionToken::from_login_body(&body))
        } else {
            None
        };

        match token {
            Some(token) => {
                tracing::info!(user_id = %user_id, expires = ?token.expires(), "logged in");
                let previous = std::mem::replace(&mut self.state, SessionState::Active(token));
                if let SessionState::Active(old) = previous {
                    match self.end_session(&old) {
                        Ok(logout) => {
                            tracing::info!(status = %logout.status(), "replaced session logged out")
                        }
                        Err(e) => tracing::warn!(error = %e, "logout of replaced session failed"),
                    }
                }
                Ok(response)
            }
            None => {
                let message = if response.has_errors() {
                    response
                        .errors()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ")
                } else {
                    response
                        .reason()
                        .unwrap_or("no token in login response")
                        .to_string()
                };
                tracing::warn!(user_id = %user_id, status = %response.status(), "login rejected");
                Err(AlliantError::Authentication {
                    status: response.status(),
                    message,
                })
            }
        }
    }

    /// Log out of the server-side session
    ///
    /// Local token state is cleared before the request is sent, so it is gone
    /// even if the request fails. Without an active session this is a no-op
    /// returning `Ok(None)`.
    pub fn logout(&mut self) -> Result<Option<ApiResponse>, AlliantError> {
        let token = match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Active(token) => token,
            previous => {
                self.state = previous;
                return Ok(None);
            }
        };

        let response = self.end_session(&token)?;
        tracing::info!(status = %response.status(), "logged out");
        Ok(Some(response))
    }

    /// Send the logout request for `token`
    fn end_session(&self, token: &SessionToken) -> Result<ApiResponse, AlliantError> {
        let url = self.endpoint(["security", "logout"])?;
        let request = self
            .http
            .post(url)
            .header(SESSION_HEADER, token.header_value()?);
        self.send(request)
    }

    /// Log in and return a guard that logs out when dropped
    ///
    /// The guard derefs to the client, so resource methods are called on it
    /// directly. Use [`SessionGuard::finish`] to observe the logout result.
    pub fn session(&mut self) -> Result<SessionGuard<'_>, AlliantError> {
        self.login()?;
        Ok(SessionGuard {
            client: self,
            finished: false,
        })
    }

    /// Run `f` between login and logout
    ///
    /// Logout runs whether `f` succeeds, fails or panics. When `f` fails, its
    /// error is returned even if logout fails too.
    pub fn with_session<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&AlliantClient) -> Result<T, E>,
        E: From<AlliantError>,
    {
        let guard = self.session()?;
        let outcome = f(&*guard);
        let logout = guard.finish();
        match (outcome, logout) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(logout_error)) => {
                tracing::warn!(error = %logout_error, "logout failed after an error");
                Err(e)
            }
        }
    }

    fn fetch<R: TypedResponse>(
        &self,
        kind: ResourceKind,
        guid: &str,
        params: &ResourceParameters,
    ) -> Result<R, AlliantError> {
        let mut url = self.resource_url(kind, &[guid])?;
        url.set_query(params.query_string().as_deref());
        self.send(self.authorized(Method::GET, url)?)
    }

    /// Look up a page of records
    pub fn lookup_collection(
        &self,
        kind: ResourceKind,
        params: &CollectionParameters,
    ) -> Result<Collection, AlliantError> {
        let mut url = self.resource_url(kind, &[])?;
        url.set_query(params.query_string().as_deref());
        self.send(self.authorized(Method::GET, url)?)
    }

    /// Look up records whose `field` equals `value`
    pub fn lookup_with_filter(
        &self,
        kind: ResourceKind,
        field: &str,
        value: &str,
        verbosity: Verbosity,
    ) -> Result<Collection, AlliantError> {
        let params = CollectionParameters::new()
            .verbosity(verbosity)
            .filter(Filter::eq(field, value));
        self.lookup_collection(kind, &params)
    }

    /// GUID of the first record whose `field` equals `value`
    ///
    /// Uses a minimal-verbosity lookup. Returns `None` when nothing matches.
    pub fn lookup_guid_with_filter(
        &self,
        kind: ResourceKind,
        field: &str,
        value: &str,
    ) -> Result<Option<String>, AlliantError> {
        let collection = self.lookup_with_filter(kind, field, value, Verbosity::Minimal)?;
        Ok(collection.guids().first().cloned())
    }

    /// Look up a single record by GUID
    pub fn lookup(
        &self,
        kind: ResourceKind,
        guid: &str,
        params: &ResourceParameters,
    ) -> Result<ApiResponse, AlliantError> {
        self.fetch(kind, guid, params)
    }

    pub fn lookup_adjustment(&self, guid: &str) -> Result<Adjustment, AlliantError> {
        self.fetch(ResourceKind::Adjustment, guid, &ResourceParameters::new())
    }

    pub fn lookup_contract(&self, guid: &str) -> Result<Contract, AlliantError> {
        self.fetch(ResourceKind::Contract, guid, &ResourceParameters::new())
    }

    /// Delete a record by GUID
    ///
    /// Contracts can only be deleted while in revision or in setup.
    pub fn delete(&self, kind: ResourceKind, guid: &str) -> Result<ApiResponse, AlliantError> {
        let url = self.resource_url(kind, &[guid])?;
        self.send(self.authorized(Method::DELETE, url)?)
    }

    /// Create a record from a JSON body
    pub fn create(&self, kind: ResourceKind, body: &Value) -> Result<ApiResponse, AlliantError> {
        let url = self.resource_url(kind, &[])?;
        self.send(self.authorized(Method::POST, url)?.json(body))
    }

    /// Replace fields of a record from a JSON body
    pub fn update(
        &self,
        kind: ResourceKind,
        guid: &str,
        body: &Value,
    ) -> Result<ApiResponse, AlliantError> {
        let url = self.resource_url(kind, &[guid])?;
        self.send(self.authorized(Method::PUT, url)?.json(body))
    }

    /// Request a status transition on a record
    ///
    /// Sends `PUT {resource}/{action}/{guid}`, with `{"comment": ..}` as the
    /// body when a comment is given.
    ///
    /// # Errors
    ///
    /// * `AlliantError::ActionNotSupported` - the resource has no such action
    /// * `AlliantError::CommentRequired` - the action needs a comment
    ///
    /// Both are raised before any request is made.
    pub fn action(
        &self,
        kind: ResourceKind,
        guid: &str,
        action: Action,
        comment: Option<&str>,
    ) -> Result<ApiResponse, AlliantError> {
        kind.validate_action(action, comment)?;
        let url = self.resource_url(kind, &[action.as_str(), guid])?;
        let mut request = self.authorized(Method::PUT, url)?;
        if let Some(comment) = comment {
            request = request.json(&json!({ "comment": comment }));
        }
        self.send(request)
    }

    pub fn adjustment_action(
        &self,
        guid: &str,
        action: Action,
        comment: Option<&str>,
    ) -> Result<ApiResponse, AlliantError> {
        self.action(ResourceKind::Adjustment, guid, action, comment)
    }

    pub fn contract_action(
        &self,
        guid: &str,
        action: Action,
        comment: Option<&str>,
    ) -> Result<ApiResponse, AlliantError> {
        self.action(ResourceKind::Contract, guid, action, comment)
    }

    /// Ask the server to reload its metadata cache
    pub fn reset_metadata(&self) -> Result<ApiResponse, AlliantError> {
        let url = self.endpoint(["metadata", "reset"])?;
        self.send(self.authorized(Method::POST, url)?)
    }
}

impl fmt::Debug for AlliantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            SessionState::Inactive => "inactive",
            SessionState::Active(_) => "active",
            SessionState::Closed => "closed",
        };
        f.debug_struct("AlliantClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .field("session", &state)
            .finish()
    }
}

/// A logged-in session that logs out when dropped
///
/// Created by [`AlliantClient::session`]. Logout runs exactly once: either in
/// [`SessionGuard::finish`] or on drop, including during a panic unwind.
/// A logout failure on drop is logged, not raised.
pub struct SessionGuard<'a> {
    client: &'a mut AlliantClient,
    finished: bool,
}

impl SessionGuard<'_> {
    /// Log out now and return the logout response
    pub fn finish(mut self) -> Result<Option<ApiResponse>, AlliantError> {
        self.finished = true;
        self.client.logout()
    }
}

impl Deref for SessionGuard<'_> {
    type Target = AlliantClient;

    fn deref(&self) -> &AlliantClient {
        &*self.client
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.client.logout() {
            tracing::warn!(error = %e, "logout on scope exit failed");
        }
    }
}

/// Builder for configuring an Alliant API client
///
/// # Example
///
/// ```no_run
/// use alliant_client::{AlliantClient, Credentials};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Discovery only, no credentials
/// let client = AlliantClient::builder()
///     .base_url("http://alliantwebserver/")?
///     .build()?;
///
/// // Custom timeout
/// let client = AlliantClient::builder()
///     .base_url("http://alliantwebserver/api")?
///     .credentials(Credentials::new("svc_user", "secret", "default", "alt_test"))
///     .client_builder(
///         reqwest::blocking::Client::builder()
///             .timeout(Duration::from_secs(30))
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AlliantClientBuilder {
    base_url: Option<reqwest::Url>,
    credentials: Option<Credentials>,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl AlliantClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            client_builder: None,
        }
    }

    /// Set the server URL
    ///
    /// A trailing `/` is dropped and `/api` is appended unless the path
    /// already ends in `api`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot have a path.
    pub fn base_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, AlliantError> {
        let url = url
            .into_url()
            .map_err(|e| AlliantError::InvalidBaseUrl(e.to_string()))?;
        self.base_url = Some(normalize_base_url(url)?);
        Ok(self)
    }

    /// Set the credentials used by `login`
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom HTTP client builder (timeouts, proxies, TLS)
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was set or the HTTP client cannot be
    /// initialized.
    pub fn build(self) -> Result<AlliantClient, AlliantError> {
        let base_url = self
            .base_url
            .ok_or_else(|| AlliantError::InvalidBaseUrl("base URL is required".to_string()))?;

        let builder = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls());

        let http = builder
            .build()
            .map_err(|e| AlliantError::ClientInit(e.to_string()))?;

        Ok(AlliantClient {
            http,
            base_url,
            credentials: self.credentials,
            state: SessionState::Inactive,
        })
    }
}

impl Default for AlliantClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop a trailing `/` and make sure the path ends in `api`
fn normalize_base_url(mut url: reqwest::Url) -> Result<reqwest::Url, AlliantError> {
    if url.cannot_be_a_base() {
        return Err(AlliantError::InvalidBaseUrl(url.to_string()));
    }
    let trimmed = url.path().trim_end_matches('/').to_string();
    let path = if trimmed.ends_with("api") {
        trimmed
    } else {
        format!("{trimmed}/api")
    };
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        #[test]
        fn prop_base_url_configuration(
            scheme in prop::sample::select(vec!["http", "https"]),
            host in "[a-z]{3,10}",
            port in 1000u16..10000u16,
            trailing_slash in any::<bool>(),
        ) {
            let slash = if trailing_slash { "/" } else { "" };
            let base_url = format!("{}://{}:{}{}", scheme, host, port, slash);

            let client = AlliantClient::builder()
                .base_url(&base_url)
                .unwrap()
                .build()
                .unwrap();

            prop_assert_eq!(client.base_url().scheme(), scheme);
            prop_assert_eq!(client.base_url().host_str(), Some(host.as_str()));
            prop_assert_eq!(client.base_url().port(), Some(port));
            prop_assert_eq!(client.base_url().path(), "/api");
        }
    }

    #[test]
    fn test_base_url_normalization() {
        let cases = [
            ("http://alliantwebserver", "http://alliantwebserver/api"),
            ("http://alliantwebserver/", "http://alliantwebserver/api"),
            ("http://alliantwebserver/api", "http://alliantwebserver/api"),
            ("http://alliantwebserver/api/", "http://alliantwebserver/api"),
            ("http://host/alliant/", "http://host/alliant/api"),
        ];
        for (input, expected) in cases {
            let url = normalize_base_url(reqwest::Url::parse(input).unwrap()).unwrap();
            assert_eq!(url.as_str(), expected, "input {input}");
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let client = AlliantClient::builder()
            .base_url("http://alliantwebserver/")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint(["security", "login"]).unwrap().as_str(),
            "http://alliantwebserver/api/security/login"
        );
        assert_eq!(
            client
                .resource_url(ResourceKind::Contract, &["approve", "g-1"])
                .unwrap()
                .as_str(),
            "http://alliantwebserver/api/data/contracts/approve/g-1"
        );
        assert_eq!(
            client
                .resource_url(ResourceKind::TransactionCharacteristic(4), &[])
                .unwrap()
                .as_str(),
            "http://alliantwebserver/api/data/user4"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(AlliantClient::builder().base_url("not a valid url").is_err());
        assert!(AlliantClient::builder().base_url("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_build_requires_base_url() {
        assert!(matches!(
            AlliantClient::builder().build(),
            Err(AlliantError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_requests_without_login_fail_before_io() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create();

        let client = AlliantClient::builder()
            .base_url(server.url())
            .unwrap()
            .build()
            .unwrap();

        let result = client.lookup_contract("g1");
        assert!(matches!(
            result,
            Err(AlliantError::Session(SessionError::NotLoggedIn))
        ));
        mock.assert();
    }

    #[test]
    fn test_login_without_credentials() {
        let mut client = AlliantClient::builder()
            .base_url("http://localhost:1")
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(client.login(), Err(AlliantError::MissingCredentials)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let client = AlliantClient::builder()
            .base_url("http://alliantwebserver")
            .unwrap()
            .credentials(Credentials::new("svc", "pa55word", "default", "test"))
            .build()
            .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("pa55word"));
        assert!(debug.contains("inactive"));
    }
}
