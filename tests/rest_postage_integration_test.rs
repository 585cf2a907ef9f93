use anyhow::Result;
use httpmock::prelude::*;
use omniship::adapters::rest_postage::{
    RestPostageOptions, RestPostageRateOptions, RestPostageShipOptions, NO_RATES_MESSAGE,
};
use omniship::domain::ports::canned_shipment;
use omniship::{Carrier, CarrierError, RestPostage, RestPostageConfig};
use serde_json::json;

const AUTHORIZATION: &str = "RSIS key-123";

fn carrier(server: &MockServer) -> RestPostage {
    RestPostage::new(RestPostageConfig {
        api_key: "key-123".to_string(),
        customer_id: "C42".to_string(),
        test: true,
        endpoint: Some(server.base_url()),
        ..Default::default()
    })
    .unwrap()
}

fn rate_options(codes: &[&str]) -> RestPostageRateOptions {
    RestPostageRateOptions {
        service_codes: codes.iter().map(|code| code.to_string()).collect(),
        ..Default::default()
    }
}

/// Rejected service codes are skipped; one usable quote makes the scan a success.
#[tokio::test]
async fn test_rate_scan_keeps_only_usable_quotes() -> Result<()> {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/C42/rates")
                .header("Authorization", AUTHORIZATION)
                .json_body_partial(r#"{"serviceCode":"First"}"#);
            then.status(400).json_body(json!({
                "errorCategory": "Validation",
                "message": "Parcel too large for First"
            }));
        })
        .await;
    let priority = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/C42/rates")
                .header("Authorization", AUTHORIZATION)
                .json_body_partial(
                    r#"{"serviceCode":"Priority","currency":"USD","parcel":{"weightLb":1.0,"lengthIn":10.0}}"#,
                );
            then.status(200).json_body(json!({
                "serviceCode": "Priority",
                "serviceName": "Priority Mail",
                "totalAmount": 9.35,
                "currency": "USD",
                "deliveryDays": 2
            }));
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let response = carrier(&server)
        .find_rates(&origin, &destination, &[package], &rate_options(&["First", "Priority"]))
        .await?;

    first.assert_async().await;
    priority.assert_async().await;
    assert!(response.success);
    assert_eq!(response.rates.len(), 1);
    let rate = &response.rates[0];
    assert_eq!(rate.service_code, "Priority");
    assert_eq!(rate.service_name, "Priority Mail");
    assert_eq!(rate.total_price, 935);
    assert_eq!(rate.delivery_days, Some(2));
    assert_eq!(response.skipped, vec!["First".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_rate_scan_without_any_quote_fails() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/C42/rates");
            then.status(200).json_body(json!({ "message": "Service unavailable for lane" }));
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let response = carrier(&server)
        .find_rates(&origin, &destination, &[package], &RestPostageRateOptions::default())
        .await?;

    mock.assert_hits_async(4).await;
    assert!(!response.success);
    assert_eq!(response.message, NO_RATES_MESSAGE);
    assert_eq!(
        response.skipped,
        vec!["First", "Priority", "PriorityExpress", "ParcelSelect"]
    );
    Ok(())
}

/// A gateway page is not a rejected service code; the scan stops with the HTTP status.
#[tokio::test]
async fn test_rate_scan_fails_on_unreadable_reply() -> Result<()> {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/C42/rates")
                .json_body_partial(r#"{"serviceCode":"First"}"#);
            then.status(502)
                .header("content-type", "text/html")
                .body("<html><body><h1>502 Bad Gateway</h1></body></html>");
        })
        .await;
    let priority = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/C42/rates")
                .json_body_partial(r#"{"serviceCode":"Priority"}"#);
            then.status(200).json_body(json!({ "totalAmount": 9.35 }));
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let error = carrier(&server)
        .find_rates(&origin, &destination, &[package], &rate_options(&["First", "Priority"]))
        .await
        .unwrap_err();

    first.assert_async().await;
    assert_eq!(priority.hits_async().await, 0);
    let CarrierError::HttpStatus { status, body } = &error else {
        panic!("expected an HTTP status error, got {error:?}");
    };
    assert_eq!(*status, 502);
    assert!(body.contains("Bad Gateway"));
    Ok(())
}

#[tokio::test]
async fn test_rate_scan_fails_on_malformed_success_body() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/C42/rates");
            then.status(200).body("totalAmount=9.35");
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let result = carrier(&server)
        .find_rates(&origin, &destination, &[package], &rate_options(&["Priority"]))
        .await;

    assert!(matches!(result, Err(CarrierError::SerializationError(_))));
    Ok(())
}

/// Booking and label fetch must both succeed.
#[tokio::test]
async fn test_book_then_fetch_label() -> Result<()> {
    let server = MockServer::start_async().await;
    let book = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/C42/books")
                .header("Authorization", AUTHORIZATION)
                .json_body_partial(r#"{"serviceCode":"Priority","to":{"postalCode":"95014","countryCode":"US"}}"#);
            then.status(201).json_body(json!({
                "bookNumber": "B-1001",
                "trackingNumber": "9405500000000000000001",
                "totalAmount": 9.35
            }));
        })
        .await;
    let label = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/C42/books/B-1001/label")
                .header("Authorization", AUTHORIZATION);
            then.status(200).json_body(json!({ "labelImage": "iVBORw0KGgo=" }));
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let responses = carrier(&server)
        .create_shipment(&origin, &destination, &[package], &RestPostageShipOptions::default())
        .await?;

    book.assert_async().await;
    label.assert_async().await;
    let response = &responses[0];
    assert!(response.success);
    assert_eq!(response.book_number.as_deref(), Some("B-1001"));
    assert_eq!(response.tracking_number.as_deref(), Some("9405500000000000000001"));
    assert_eq!(response.label.as_deref(), Some("iVBORw0KGgo="));
    assert_eq!(response.charges, Some(935));
    Ok(())
}

#[tokio::test]
async fn test_booking_failure_surfaces_error_category() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/C42/books");
            then.status(402).json_body(json!({
                "errorCategory": "Funds",
                "message": "Insufficient balance"
            }));
        })
        .await;
    let label = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/label");
            then.status(200).json_body(json!({ "labelImage": "unused" }));
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let response = carrier(&server)
        .book_label(&origin, &destination, &package, &RestPostageShipOptions::default())
        .await?;

    assert_eq!(label.hits_async().await, 0);
    assert!(!response.success);
    assert_eq!(response.message, "Funds: Insufficient balance");
    assert!(response.book_number.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unreadable_booking_reply_is_an_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/C42/books");
            then.status(503).body("<html>Service Temporarily Unavailable</html>");
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let result = carrier(&server)
        .book_label(&origin, &destination, &package, &RestPostageShipOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(CarrierError::HttpStatus { status: 503, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_label_fetch_failure_fails_the_shipment() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/C42/books");
            then.status(200).json_body(json!({
                "bookNumber": "B-7",
                "trackingNumber": "9405",
                "totalAmount": 4.0
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/C42/books/B-7/label");
            then.status(404).json_body(json!({
                "errorCategory": "NotFound",
                "message": "Label not ready"
            }));
        })
        .await;

    let (origin, destination, package) = canned_shipment();
    let response = carrier(&server)
        .book_label(&origin, &destination, &package, &RestPostageShipOptions::default())
        .await?;

    assert!(!response.success);
    assert_eq!(response.message, "NotFound: Label not ready");
    assert_eq!(response.book_number.as_deref(), Some("B-7"));
    assert!(response.label.is_none());
    Ok(())
}

#[tokio::test]
async fn test_void_follows_http_status() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/C42/books/B-1/void")
                .header("Authorization", AUTHORIZATION);
            then.status(204);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/C42/books/B-2/void");
            then.status(409).json_body(json!({
                "errorCategory": "State",
                "message": "Already scanned"
            }));
        })
        .await;

    let carrier = carrier(&server);
    let voided = carrier
        .delete_shipment("B-1", "", &RestPostageOptions::default())
        .await?;
    assert!(voided.success);

    let refused = carrier
        .void_booking("B-2", &RestPostageOptions::default())
        .await?;
    assert!(!refused.success);
    assert_eq!(refused.error_code.as_deref(), Some("State"));
    assert_eq!(refused.error_description.as_deref(), Some("Already scanned"));
    Ok(())
}
