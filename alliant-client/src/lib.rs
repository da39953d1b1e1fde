//! Alliant API Client Library
//!
//! A blocking client for the Alliant REST API: session login/logout, lookups
//! by filter or GUID, deletes, and status-transition actions on adjustments,
//! contracts, transaction characteristics and contacts.
//!
//! # Features
//!
//! - Explicit `login`/`logout` plus a scoped session that always logs out
//! - Typed responses that parse the `result`/`errors`/`warnings` envelope once
//! - API errors and warnings are data on the response, not `Err` values
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Blocking synchronous API
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use alliant_client::{Action, AlliantClient, Credentials, ResourceKind, Verbosity};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = AlliantClient::builder()
//!     .base_url("http://alliantwebserver/")?
//!     .credentials(Credentials::new("svc_user", "secret", "default", "alt_test"))
//!     .build()?;
//!
//! client.with_session(|api| {
//!     let contracts = api.lookup_with_filter(
//!         ResourceKind::Contract,
//!         "id",
//!         "C-100",
//!         Verbosity::Default,
//!     )?;
//!     for guid in contracts.guids() {
//!         let response = api.contract_action(guid, Action::Complete, None)?;
//!         if response.has_errors() {
//!             eprintln!("{guid}: {:?}", response.errors());
//!         }
//!     }
//!     Ok::<_, alliant_client::AlliantError>(())
//! })?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod list;
mod params;
mod resource;
mod response;
mod session;
mod workflow;

pub use client::{
    AlliantClient, AlliantClientBuilder, SessionGuard, get_application_layers, get_system_layers,
};
pub use error::{AlliantError, SessionError};
pub use list::{ItemReference, ListDefinition};
pub use params::{
    CollectionParameters, Filter, FilterOperator, ResourceParameters, SortOrder, Verbosity,
};
pub use resource::{Action, ResourceKind};
pub use response::{Adjustment, ApiMessage, ApiResponse, Collection, Contract, TypedResponse};
pub use session::{Credentials, SESSION_HEADER};
pub use workflow::DeletionOutcome;
