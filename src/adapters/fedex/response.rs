//! Reply parsing. Every reply carries the same notification grammar:
//! success iff the first `Notifications/Severity` is SUCCESS, WARNING or NOTE.

use super::service::{
    delivery_days, normalize_currency, parse_zoneless_timestamp, service_name_for_code,
};
use super::CARRIER_NAME;
use crate::domain::model::{
    parse_cents, DeleteResponse, Location, Package, RateEstimate, RateResponse, ShipResponse,
    ShipmentEvent, TrackingResponse,
};
use crate::utils::error::{CarrierError, Result};
use crate::utils::xml::XmlElement;
use chrono::{DateTime, Utc};

const SUCCESS_SEVERITIES: [&str; 3] = ["SUCCESS", "WARNING", "NOTE"];
const NO_RATES_MESSAGE: &str = "No shipping rates could be found for the destination address";
const SHIPMENT_FAILED_MESSAGE: &str = "Shipment was not successful.";

pub fn response_success(doc: &XmlElement) -> bool {
    let severity = doc.select_text("//Notifications/Severity");
    SUCCESS_SEVERITIES.contains(&severity.as_str())
}

/// `SEVERITY - CODE: Message` from the first notification, or the SOAP fault
/// fields when the reply has no notification. Empty when neither is present.
pub fn response_message(doc: &XmlElement) -> String {
    if let Some(notification) = doc.select_first("//Notifications") {
        return format!(
            "{} - {}: {}",
            notification.child_text("Severity"),
            notification.child_text("Code"),
            notification.child_text("Message")
        );
    }

    let cause = doc.select_text("//cause");
    let code = doc.select_text("//code");
    let fault = doc.select_text("//Fault");
    if cause.is_empty() && code.is_empty() && fault.is_empty() {
        String::new()
    } else {
        format!("{} - {}: {}", cause, code, fault)
    }
}

pub fn parse_rate_response(
    origin: &Location,
    destination: &Location,
    package: &Package,
    body: &str,
    now: DateTime<Utc>,
) -> Result<RateResponse> {
    let doc = XmlElement::parse(body)?;
    let mut success = response_success(&doc);
    let mut message = response_message(&doc);
    let mut rates = Vec::new();

    for rate in doc.select("//RateReplyDetails") {
        let service_code = rate.child_text("ServiceType");
        let service_name = if rate.child_text("AppliedOptions") == "SATURDAY_DELIVERY" {
            service_name_for_code(&format!("{}_SATURDAY_DELIVERY", service_code)).to_uppercase()
        } else {
            service_name_for_code(&service_code)
        };

        let net_charge = rate.select_first("RatedShipmentDetails/ShipmentRateDetail/TotalNetCharge");
        let total_price = net_charge.and_then(|charge| parse_cents(&charge.child_text("Amount")));
        let Some(total_price) = total_price else {
            tracing::warn!("FedEx rate for {} has no net charge, skipping", service_code);
            continue;
        };
        let currency = net_charge
            .map(|charge| normalize_currency(&charge.child_text("Currency")))
            .unwrap_or_default();

        rates.push(RateEstimate {
            origin: origin.clone(),
            destination: destination.clone(),
            carrier: CARRIER_NAME.to_string(),
            delivery_days: delivery_days(
                &service_code,
                &rate.child_text("TransitTime"),
                &rate.child_text("DeliveryTimestamp"),
                now,
            ),
            service_code,
            service_name,
            total_price,
            currency,
            packages: vec![package.clone()],
        });
    }

    if rates.is_empty() {
        success = false;
        if message.trim().is_empty() {
            message = NO_RATES_MESSAGE.to_string();
        }
    }

    Ok(RateResponse {
        success,
        message,
        rates,
        skipped: Vec::new(),
    })
}

pub fn parse_ship_response(body: &str) -> Result<ShipResponse> {
    let doc = XmlElement::parse(body)?;
    let success = response_success(&doc);
    let message = response_message(&doc);

    if !success {
        let message = if message.trim().is_empty() {
            SHIPMENT_FAILED_MESSAGE.to_string()
        } else {
            message
        };
        return Ok(ShipResponse::failure(message));
    }

    Ok(ShipResponse {
        success,
        message,
        tracking_number: doc
            .select_first("//TrackingNumber")
            .map(XmlElement::text)
            .filter(|number| !number.is_empty()),
        label: Some(doc.select_text("//Image")).filter(|label| !label.is_empty()),
        ..Default::default()
    })
}

pub fn parse_delete_response(body: &str) -> Result<DeleteResponse> {
    let doc = XmlElement::parse(body)?;
    let success = response_success(&doc);
    let message = response_message(&doc);

    let (error_code, error_description) = if success {
        (None, None)
    } else {
        (
            Some(doc.select_text("//Notifications/Code")).filter(|code| !code.is_empty()),
            Some(doc.select_text("//Notifications/Message")).filter(|text| !text.is_empty()),
        )
    };

    Ok(DeleteResponse {
        success,
        message,
        error_code,
        error_description,
    })
}

pub fn parse_tracking_response(body: &str) -> Result<TrackingResponse> {
    let doc = XmlElement::parse(body)?;
    let success = response_success(&doc);
    let message = response_message(&doc);

    if !success {
        return Ok(TrackingResponse {
            success,
            message,
            ..Default::default()
        });
    }

    let Some(details) = doc.select_first("//TrackDetails") else {
        return Ok(TrackingResponse {
            success: false,
            message: format!("{} (no track details returned)", message),
            ..Default::default()
        });
    };

    let tracking_number = details.child_text("TrackingNumber");
    let destination = Location::new(&details.child_text("DestinationAddress/CountryCode"))
        .with_state(details.child_text("DestinationAddress/StateOrProvinceCode"))
        .with_city(details.child_text("DestinationAddress/City"));

    let mut events = Vec::new();
    for event in details.children_named("Events") {
        let country = event.child_text("Address/CountryCode");
        let description = event.child_text("EventDescription");
        if country.trim().is_empty() {
            tracing::debug!("Dropping tracking event without country: {}", description);
            continue;
        }

        let location = Location::new(&country)
            .with_city(event.child_text("Address/City"))
            .with_state(event.child_text("Address/StateOrProvinceCode"))
            .with_postal_code(event.child_text("Address/PostalCode"));

        let raw_time = event.child_text("Timestamp");
        let time = parse_zoneless_timestamp(&raw_time)
            .ok_or_else(|| CarrierError::xml(format!("invalid event timestamp '{}'", raw_time)))?;

        events.push(ShipmentEvent {
            description,
            time,
            location,
        });
    }

    Ok(TrackingResponse::found(
        message,
        tracking_number,
        destination,
        events,
    ))
}
