//! Basic usage example for the Alliant API client
//!
//! This example demonstrates how to:
//! - Discover system and application layers without logging in
//! - Create a client with credentials and a custom timeout
//! - Run lookups inside a scoped session that always logs out
//! - Inspect API errors and warnings on a response
//!
//! Note: This example needs a reachable Alliant server. Set ALLIANT_BASE_URL,
//! ALLIANT_USER, ALLIANT_PASSWORD, ALLIANT_APPLICATION_LAYER and optionally
//! ALLIANT_SYSTEM_LAYER (defaults to `default`).

use alliant_client::{AlliantClient, Credentials, ResourceKind, Verbosity};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("ALLIANT_BASE_URL")?;
    let system_layer =
        std::env::var("ALLIANT_SYSTEM_LAYER").unwrap_or_else(|_| "default".to_string());

    // Example 1: Discovery calls need no session
    println!("=== Example 1: Layers ===");
    let layers = alliant_client::get_system_layers(&base_url)?;
    println!("System layers: {}", layers.result());
    let app_layers = alliant_client::get_application_layers(&base_url, &system_layer)?;
    println!("Application layers in '{}': {}", system_layer, app_layers.result());

    // Example 2: Client with credentials and a custom timeout
    println!("\n=== Example 2: Configured Client ===");
    let credentials = Credentials::new(
        std::env::var("ALLIANT_USER")?,
        std::env::var("ALLIANT_PASSWORD")?,
        system_layer,
        std::env::var("ALLIANT_APPLICATION_LAYER")?,
    );
    let mut client = AlliantClient::builder()
        .base_url(&base_url)?
        .credentials(credentials)
        .client_builder(reqwest::blocking::Client::builder().timeout(Duration::from_secs(30)))
        .build()?;
    println!("Client created for {}", client.base_url());

    // Example 3: Scoped session; logout runs when `session` is dropped
    println!("\n=== Example 3: Scoped Session ===");
    let session = client.session()?;
    println!("Logged in, token expires {:?}", session.token_expires());

    let contracts = session.lookup_with_filter(
        ResourceKind::Contract,
        "statusReference.id",
        "ACTIVE",
        Verbosity::Minimal,
    )?;
    if contracts.has_errors() {
        for error in contracts.errors() {
            println!("API error: {}", error);
        }
    } else {
        println!(
            "Found {} active contract(s) in {:?}",
            contracts.items().len(),
            contracts.elapsed()
        );
    }

    if let Some(guid) = contracts.guids().first() {
        let contract = session.lookup_contract(guid)?;
        println!("{} is {:?}", guid, contract.contract_status());
    }

    match session.finish()? {
        Some(response) => println!("\nLogged out ({})", response.status()),
        None => println!("\nNo session to log out"),
    }

    Ok(())
}
