use anyhow::Result;
use httpmock::prelude::*;
use omniship::adapters::endicia::{
    EndiciaLabelOptions, EndiciaOptions, EndiciaRateOptions, PassPhraseOptions,
};
use omniship::domain::ports::canned_shipment;
use omniship::{
    Carrier, CarrierError, Endicia, EndiciaConfig, Length, Location, Package, Weight,
};

const SERVICE_PATH: &str = "/LabelService/EwsLabelService.asmx";

fn config(server: &MockServer, token: Option<&str>) -> EndiciaConfig {
    EndiciaConfig {
        requester_id: "abcd".to_string(),
        account_id: Some("2500334".to_string()),
        passphrase: Some("old phrase".to_string()),
        token: token.map(str::to_string),
        test: true,
        endpoint: Some(server.url(SERVICE_PATH)),
        ..Default::default()
    }
}

fn soap_reply(operation: &str, inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><{op}Response xmlns="www.envmgr.com/LabelService">{inner}</{op}Response></soap:Body></soap:Envelope>"#,
        op = operation,
        inner = inner
    )
}

fn action(operation: &str) -> String {
    format!("\"www.envmgr.com/LabelService/{}\"", operation)
}

/// With an issued token, rotation sends only the token.
#[tokio::test]
async fn test_pass_phrase_rotation_with_token() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("ChangePassPhrase").as_str())
                .body_contains("<Token>issued-token</Token>")
                .body_contains("<NewPassPhrase>new phrase</NewPassPhrase>")
                .matches(|request| {
                    let body = String::from_utf8_lossy(request.body.as_deref().unwrap_or_default());
                    !body.contains("<AccountID>") && !body.contains("<PassPhrase>")
                });
            then.status(200).body(soap_reply(
                "ChangePassPhrase",
                "<ChangePassPhraseRequestResponse><Status>0</Status></ChangePassPhraseRequestResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("issued-token")))?;
    let response = carrier
        .change_pass_phrase("new phrase", &PassPhraseOptions::default())
        .await?;

    mock.assert_async().await;
    assert!(response.success);
    assert_eq!(response.status, "0");
    Ok(())
}

/// Without a token, rotation sends account id and old pass phrase and may request a token.
#[tokio::test]
async fn test_pass_phrase_rotation_without_token() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .body_contains(r#"TokenRequested="true""#)
                .body_contains("<AccountID>2500334</AccountID>")
                .body_contains("<PassPhrase>old phrase</PassPhrase>")
                .body_contains("<RequesterID>lxxx</RequesterID>");
            then.status(200).body(soap_reply(
                "ChangePassPhrase",
                "<ChangePassPhraseRequestResponse><Status>0</Status><Token>fresh-token</Token></ChangePassPhraseRequestResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, None))?;
    let response = carrier
        .change_pass_phrase(
            "new phrase",
            &PassPhraseOptions {
                request_token: true,
                ..Default::default()
            },
        )
        .await?;

    mock.assert_async().await;
    assert!(response.success);
    assert_eq!(response.token.as_deref(), Some("fresh-token"));
    Ok(())
}

#[tokio::test]
async fn test_production_mode_sends_configured_requester_id() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("BuyPostage").as_str())
                .body_contains("<RequesterID>abcd</RequesterID>")
                .body_contains("<RecreditAmount>100.00</RecreditAmount>");
            then.status(200).body(soap_reply(
                "BuyPostage",
                "<RecreditRequestResponse><Status>0</Status><CertifiedIntermediary><PostageBalance>150.00</PostageBalance></CertifiedIntermediary></RecreditRequestResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, None))?;
    let response = carrier
        .buy_postage(10_000, &EndiciaOptions { test: Some(false) })
        .await?;

    mock.assert_async().await;
    assert!(response.success);
    assert_eq!(response.balance.as_deref(), Some("150.00"));
    Ok(())
}

#[tokio::test]
async fn test_rates_and_failure_status() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("CalculatePostageRates").as_str())
                .body_contains("<MailClass>Domestic</MailClass>")
                .body_contains("<WeightOz>16</WeightOz>");
            then.status(200).body(soap_reply(
                "CalculatePostageRates",
                r#"<PostageRatesResponse><Status>0</Status><PostagePrice TotalAmount="8.70"><MailClass>Priority</MailClass><Postage TotalAmount="8.70"><MailService>Priority Mail</MailService></Postage></PostagePrice></PostageRatesResponse>"#,
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .body_contains("<MailClass>International</MailClass>");
            then.status(200).body(soap_reply(
                "CalculatePostageRates",
                "<PostageRatesResponse><Status>12345</Status><ErrorMessage>Destination not served</ErrorMessage></PostageRatesResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    let (origin, destination, package) = canned_shipment();

    let domestic = carrier
        .find_rates(&origin, &destination, &[package.clone()], &EndiciaRateOptions::default())
        .await?;
    assert!(domestic.success);
    assert_eq!(domestic.rates.len(), 1);
    assert_eq!(domestic.rates[0].total_price, 870);
    assert_eq!(domestic.rates[0].service_name, "Priority Mail");

    let abroad = carrier
        .find_rates(
            &origin,
            &Location::new("FR").with_postal_code("75001"),
            &[package],
            &EndiciaRateOptions::default(),
        )
        .await?;
    assert!(!abroad.success);
    assert_eq!(abroad.message, "Destination not served");
    Ok(())
}

/// International labels arrive in parts that are joined in document order.
#[tokio::test]
async fn test_international_label_concatenates_image_parts() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("GetPostageLabel").as_str())
                .body_contains(r#"LabelSubtype="Integrated""#)
                .body_contains("<CustomsCertify>TRUE</CustomsCertify>");
            then.status(200).body(soap_reply(
                "GetPostageLabel",
                r#"<LabelRequestResponse><Status>0</Status><Label><Image PartNumber="1">iVBORw0K</Image><Image PartNumber="2">Ggo=</Image></Label><TrackingNumber>LZ123456789US</TrackingNumber><FinalPostage>32.15</FinalPostage></LabelRequestResponse>"#,
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    let (origin, _, package) = canned_shipment();
    let destination = Location::new("GB")
        .with_name("Sam Buyer")
        .with_address1("1 High St")
        .with_city("London")
        .with_postal_code("SW1A 1AA");
    let response = carrier
        .get_postage_label(
            &origin,
            &destination,
            &package,
            &EndiciaLabelOptions {
                service: "PriorityMailInternational".to_string(),
                ..Default::default()
            },
        )
        .await?;

    mock.assert_async().await;
    assert!(response.success);
    assert_eq!(response.label.as_deref(), Some("iVBORw0KGgo="));
    assert_eq!(response.tracking_number.as_deref(), Some("LZ123456789US"));
    assert_eq!(response.charges, Some(3215));
    Ok(())
}

#[tokio::test]
async fn test_create_shipment_buys_one_label_per_package() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("GetPostageLabel").as_str());
            then.status(200).body(soap_reply(
                "GetPostageLabel",
                "<LabelRequestResponse><Status>0</Status><Base64LabelImage>iVBORw0KGgo=</Base64LabelImage><TrackingNumber>9400</TrackingNumber><FinalPostage>4.10</FinalPostage></LabelRequestResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    let (origin, destination, package) = canned_shipment();
    let light = Package::new(Weight::from_ounces(8.0), [Length::from_inches(6.0); 3]);
    let responses = carrier
        .create_shipment(
            &origin,
            &destination,
            &[package, light],
            &EndiciaLabelOptions::default(),
        )
        .await?;

    mock.assert_hits_async(2).await;
    assert_eq!(responses.len(), 2);
    assert!(responses.iter().all(|response| response.success));
    Ok(())
}

/// An overweight package anywhere in the list stops the shipment before any label is bought.
#[tokio::test]
async fn test_overweight_package_blocks_the_whole_shipment() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("GetPostageLabel").as_str());
            then.status(200).body(soap_reply(
                "GetPostageLabel",
                "<LabelRequestResponse><Status>0</Status><Base64LabelImage>iVBORw0KGgo=</Base64LabelImage><TrackingNumber>9400</TrackingNumber><FinalPostage>4.10</FinalPostage></LabelRequestResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    let (origin, destination, _) = canned_shipment();
    let light = Package::new(Weight::from_pounds(1.0), [Length::from_inches(6.0); 3]);
    let heavy = Package::new(Weight::from_pounds(71.0), [Length::from_inches(20.0); 3]);
    let result = carrier
        .create_shipment(
            &origin,
            &destination,
            &[light, heavy],
            &EndiciaLabelOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(CarrierError::ValidationError { .. })));
    assert_eq!(mock.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_gateway_page_is_an_http_status_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(SERVICE_PATH);
            then.status(503)
                .header("content-type", "text/html")
                .body("<html><body><h1>503 Service Unavailable</h1></body></html>");
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    let (origin, destination, package) = canned_shipment();
    let result = carrier
        .get_postage_label(&origin, &destination, &package, &EndiciaLabelOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(CarrierError::HttpStatus { status: 503, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_refund_denied_surfaces_status() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("GetRefund").as_str())
                .body_contains("<PicNumber>9400</PicNumber>");
            then.status(200).body(soap_reply(
                "GetRefund",
                "<RefundResponse><Refund><PicNumber>9400</PicNumber><RefundStatus>DeniedExpired</RefundStatus><RefundStatusMessage>Refund window has passed</RefundStatusMessage></Refund></RefundResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    let response = carrier.get_refund("9400", &EndiciaOptions::default()).await?;

    assert!(!response.success);
    assert_eq!(response.error_code.as_deref(), Some("DeniedExpired"));
    assert_eq!(
        response.error_description.as_deref(),
        Some("Refund window has passed")
    );
    Ok(())
}

#[tokio::test]
async fn test_valid_credentials_in_test_mode_checks_account_status() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action("GetAccountStatus").as_str());
            then.status(200).body(soap_reply(
                "GetAccountStatus",
                "<AccountStatusResponse><Status>0</Status><CertifiedIntermediary><PostageBalance>42.00</PostageBalance></CertifiedIntermediary></AccountStatusResponse>",
            ));
        })
        .await;

    let carrier = Endicia::new(config(&server, Some("tok")))?;
    assert!(carrier.valid_credentials().await?);
    mock.assert_async().await;
    Ok(())
}
