//! Resource operations against a mock server

mod common;

use alliant_client::{
    Action, AlliantError, CollectionParameters, Filter, ResourceKind, ResourceParameters,
    SortOrder, Verbosity,
};
use common::{TOKEN, client, envelope, logged_in_client};
use mockito::Matcher;
use serde_json::json;

#[test]
fn test_discovery_needs_no_session() {
    let mut server = mockito::Server::new();
    let system_layers = server
        .mock("GET", "/api/security/systemLayers")
        .match_header("X-AlliantSession", Matcher::Missing)
        .with_status(200)
        .with_body(envelope(json!([{"key": "default"}])))
        .expect(1)
        .create();
    let application_layers = server
        .mock("GET", "/api/security/systemLayers/default/applicationLayers")
        .with_status(200)
        .with_body(envelope(json!([{"name": "alt_test"}, {"name": "alt_prod"}])))
        .expect(1)
        .create();

    let layers = alliant_client::get_system_layers(format!("{}/", server.url())).unwrap();
    assert_eq!(layers.result()[0]["key"], "default");

    let apps = alliant_client::get_application_layers(server.url(), "default").unwrap();
    assert_eq!(apps.result().as_array().map(Vec::len), Some(2));

    system_layers.assert();
    application_layers.assert();
}

#[test]
fn test_filtered_lookup() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let lookup = server
        .mock("GET", "/api/data/contracts")
        .match_header("X-AlliantSession", TOKEN)
        .match_query(Matcher::AllOf(vec![
            Matcher::Regex(r"^\$default&".into()),
            Matcher::UrlEncoded("$filter".into(), "guid eq 'g1'".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"result":[{"guid":"g1"},{"guid":"g2"}],"errors":[],"warnings":[]}"#)
        .expect(1)
        .create();

    let collection = client
        .lookup_with_filter(ResourceKind::Contract, "guid", "g1", Verbosity::Default)
        .unwrap();

    assert!(!collection.has_errors());
    assert_eq!(collection.result().as_array().map(Vec::len), Some(2));
    assert_eq!(collection.items().len(), 2);
    assert_eq!(collection.guids(), ["g1", "g2"]);
    lookup.assert();
}

#[test]
fn test_lookup_guid_with_filter() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let lookup = server
        .mock("GET", "/api/data/adjustmentHeaders")
        .match_query(Matcher::AllOf(vec![
            Matcher::Regex(r"^\$minimal&".into()),
            Matcher::UrlEncoded("$filter".into(), "description eq 'Q3 rebate'".into()),
        ]))
        .with_status(200)
        .with_body(envelope(json!({
            "items": [{"guid": "adj-1"}, {"guid": "adj-2"}],
            "itemCount": 2,
            "totalItemCount": 2
        })))
        .expect(1)
        .create();

    let guid = client
        .lookup_guid_with_filter(ResourceKind::Adjustment, "description", "Q3 rebate")
        .unwrap();

    assert_eq!(guid.as_deref(), Some("adj-1"));
    lookup.assert();
}

#[test]
fn test_filter_values_with_reserved_characters() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);

    for (value, guid) in [("R&D", "c-rd"), ("A+B", "c-ab"), ("50%", "c-50")] {
        let lookup = server
            .mock("GET", "/api/data/contracts")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("$minimal".into(), "".into()),
                Matcher::UrlEncoded("$filter".into(), format!("description eq '{value}'")),
            ]))
            .with_status(200)
            .with_body(envelope(json!([{"guid": guid}])))
            .expect(1)
            .create();

        let found = client
            .lookup_guid_with_filter(ResourceKind::Contract, "description", value)
            .unwrap();

        assert_eq!(found.as_deref(), Some(guid), "value {value}");
        lookup.assert();
    }
}

#[test]
fn test_lookup_guid_with_no_match() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let _lookup = server
        .mock("GET", "/api/data/contacts")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(json!({"items": [], "itemCount": 0})))
        .create();

    let guid = client
        .lookup_guid_with_filter(ResourceKind::Contact, "id", "nobody")
        .unwrap();

    assert_eq!(guid, None);
}

#[test]
fn test_collection_paging_parameters() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let lookup = server
        .mock("GET", "/api/data/user5")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("$top".into(), "10".into()),
            Matcher::UrlEncoded("$skip".into(), "20".into()),
            Matcher::UrlEncoded("$orderby".into(), "id desc".into()),
        ]))
        .with_status(200)
        .with_body(envelope(json!({
            "items": [{"guid": "tc-21"}],
            "itemCount": 1,
            "totalItemCount": 21,
            "previousPageUrl": "http://alliant/api/data/user5?$top=10&$skip=10"
        })))
        .expect(1)
        .create();

    let params = CollectionParameters::new()
        .top(10)
        .skip(20)
        .order_by("id", SortOrder::Desc);
    let kind = ResourceKind::transaction_characteristic(5).unwrap();
    let page = client.lookup_collection(kind, &params).unwrap();

    assert_eq!(page.item_count(), Some(1));
    assert_eq!(page.total_item_count(), Some(21));
    assert_eq!(page.next_page_url(), None);
    assert!(page.previous_page_url().is_some());
    lookup.assert();
}

#[test]
fn test_lookup_by_guid() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let lookup = server
        .mock("GET", "/api/data/contacts/c-9")
        .match_query(Matcher::UrlEncoded("include".into(), "addresses,phones".into()))
        .with_status(200)
        .with_body(envelope(json!({"guid": "c-9", "name": "Acme Records"})))
        .expect(1)
        .create();

    let params = ResourceParameters::new().include(["addresses", "phones"]);
    let contact = client.lookup(ResourceKind::Contact, "c-9", &params).unwrap();

    assert_eq!(contact.result()["name"], "Acme Records");
    lookup.assert();
}

#[test]
fn test_typed_lookups_expose_status() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let _contract = server
        .mock("GET", "/api/data/contracts/k-1")
        .with_status(200)
        .with_body(envelope(json!({
            "guid": "k-1",
            "statusReference": {"id": "INREVISION", "displayName": "In Revision"}
        })))
        .create();
    let _adjustment = server
        .mock("GET", "/api/data/adjustmentHeaders/a-1")
        .with_status(200)
        .with_body(envelope(json!({
            "guid": "a-1",
            "statusReference": {"id": "INSETUP", "displayName": "In Setup"}
        })))
        .create();

    let contract = client.lookup_contract("k-1").unwrap();
    assert_eq!(contract.contract_status(), Some("In Revision"));

    let adjustment = client.lookup_adjustment("a-1").unwrap();
    assert_eq!(adjustment.adjustment_status(), Some("In Setup"));
}

#[test]
fn test_delete() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let delete = server
        .mock("DELETE", "/api/data/contracts/k-1")
        .match_header("X-AlliantSession", TOKEN)
        .with_status(200)
        .with_body(envelope(json!(null)))
        .expect(1)
        .create();

    let response = client.delete(ResourceKind::Contract, "k-1").unwrap();

    assert!(response.ok());
    delete.assert();
}

#[test]
fn test_action_with_comment() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let approve = server
        .mock("PUT", "/api/data/contracts/approve/k-1")
        .match_header("X-AlliantSession", TOKEN)
        .match_body(Matcher::Json(json!({"comment": "Approved by API script"})))
        .with_status(200)
        .with_body(envelope(json!({"guid": "k-1"})))
        .expect(1)
        .create();

    let response = client
        .contract_action("k-1", Action::Approve, Some("Approved by API script"))
        .unwrap();

    assert!(response.ok());
    approve.assert();
}

#[test]
fn test_action_without_comment() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let clear = server
        .mock("PUT", "/api/data/adjustmentHeaders/clear/a-1")
        .with_status(200)
        .with_body(envelope(json!({"guid": "a-1"})))
        .expect(1)
        .create();

    client.adjustment_action("a-1", Action::Clear, None).unwrap();

    clear.assert();
}

#[test]
fn test_invalid_actions_fail_before_io() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let any_put = server.mock("PUT", Matcher::Any).expect(0).create();

    assert!(matches!(
        client.adjustment_action("a-1", Action::Approve, None),
        Err(AlliantError::CommentRequired { .. })
    ));
    assert!(matches!(
        client.contract_action("k-1", Action::Post, Some("comment")),
        Err(AlliantError::ActionNotSupported { .. })
    ));
    assert!(matches!(
        client.action(ResourceKind::Contact, "c-1", Action::Copy, None),
        Err(AlliantError::ActionNotSupported { .. })
    ));

    any_put.assert();
}

#[test]
fn test_create_and_update() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let create = server
        .mock("POST", "/api/data/user3")
        .match_body(Matcher::Json(json!({"id": "GENRE-1", "description": "Jazz"})))
        .with_status(201)
        .with_body(envelope(json!({"guid": "tc-new"})))
        .expect(1)
        .create();
    let update = server
        .mock("PUT", "/api/data/user3/tc-new")
        .match_body(Matcher::Json(json!({"description": "Modern Jazz"})))
        .with_status(200)
        .with_body(envelope(json!({"guid": "tc-new"})))
        .expect(1)
        .create();

    let kind = ResourceKind::transaction_characteristic(3).unwrap();
    let created = client
        .create(kind, &json!({"id": "GENRE-1", "description": "Jazz"}))
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    client
        .update(kind, "tc-new", &json!({"description": "Modern Jazz"}))
        .unwrap();

    create.assert();
    update.assert();
}

#[test]
fn test_reset_metadata() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let reset = server
        .mock("POST", "/api/metadata/reset")
        .match_header("X-AlliantSession", TOKEN)
        .with_status(200)
        .with_body(envelope(json!(null)))
        .expect(1)
        .create();

    assert!(client.reset_metadata().unwrap().ok());
    reset.assert();
}

#[test]
fn test_api_errors_are_data() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let _mock = server
        .mock("PUT", "/api/data/contracts/complete/k-1")
        .with_status(409)
        .with_body(r#"{"result":null,"errors":[{"message":"Contract has no rights"}],"warnings":[{"message":"Dates overlap"}]}"#)
        .create();

    let response = client
        .contract_action("k-1", Action::Complete, None)
        .unwrap();

    assert!(!response.ok());
    assert!(response.has_errors());
    assert!(response.has_warnings());
    assert_eq!(response.errors()[0].to_string(), "Contract has no rights");
    // The status check is opt-in
    assert!(matches!(
        response.error_for_status(),
        Err(AlliantError::Http { .. })
    ));
}

#[test]
fn test_malformed_body_is_not_an_error() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let _mock = server
        .mock("GET", "/api/data/contracts/k-1")
        .with_status(502)
        .with_header("content-type", "text/html; charset=iso-8859-1")
        .with_body("<html><body>Bad Gateway</body></html>")
        .create();

    let contract = client.lookup_contract("k-1").unwrap();

    assert!(contract.result().is_null());
    assert!(contract.errors().is_empty());
    assert!(contract.warnings().is_empty());
    assert_eq!(contract.contract_status(), None);
    assert_eq!(contract.encoding(), Some("iso-8859-1"));
    assert_eq!(contract.reason(), Some("Bad Gateway"));
    assert!(contract.text().contains("Bad Gateway"));
}

#[test]
fn test_raw_filter_expression() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let lookup = server
        .mock("GET", "/api/data/contracts")
        .match_query(Matcher::UrlEncoded(
            "$filter".into(),
            "(id eq 'A' or id eq 'B') and statusReference.id ne 'ACTIVE'".into(),
        ))
        .with_status(200)
        .with_body(envelope(json!([])))
        .expect(1)
        .create();

    let params = CollectionParameters::new().filter(Filter::Expression(
        "(id eq 'A' or id eq 'B') and statusReference.id ne 'ACTIVE'".to_string(),
    ));
    let collection = client
        .lookup_collection(ResourceKind::Contract, &params)
        .unwrap();

    assert!(collection.items().is_empty());
    lookup.assert();
}

#[test]
fn test_out_of_range_transaction_characteristic_fails_before_io() {
    let mut server = mockito::Server::new();
    let (client, _login) = logged_in_client(&mut server);
    let any_get = server.mock("GET", Matcher::Any).expect(0).create();

    let kind = ResourceKind::TransactionCharacteristic(0);
    assert!(matches!(
        client.lookup(kind, "g1", &ResourceParameters::new()),
        Err(AlliantError::InvalidTransactionCharacteristic(0))
    ));
    assert!(matches!(
        client.lookup_collection(
            ResourceKind::TransactionCharacteristic(99),
            &CollectionParameters::new()
        ),
        Err(AlliantError::InvalidTransactionCharacteristic(99))
    ));

    any_get.assert();
}

#[test]
fn test_unauthenticated_client_cannot_reach_resources() {
    let server = mockito::Server::new();
    let client = client(&server);

    assert!(matches!(
        client.delete(ResourceKind::Contract, "k-1"),
        Err(AlliantError::Session(_))
    ));
}
