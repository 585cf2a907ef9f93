//! Readers for Endicia replies. Status `0` means success, anything else
//! carries an `ErrorMessage`.

use super::CARRIER_NAME;
use crate::domain::model::{
    parse_cents, AccountStatusResponse, BuyPostageResponse, Location, Package,
    PassPhraseResponse, RateEstimate, RateResponse, RefundResponse, ShipResponse,
};
use crate::utils::error::Result;
use crate::utils::xml::XmlElement;

const SUCCESS_STATUS: &str = "0";
const REFUND_APPROVED: &str = "Approved";

fn status(document: &XmlElement) -> String {
    document.select_text("//Status").trim().to_string()
}

fn error_message(document: &XmlElement) -> Option<String> {
    let message = document.select_text("//ErrorMessage");
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn parse_pass_phrase_response(body: &str) -> Result<PassPhraseResponse> {
    let document = XmlElement::parse(body)?;
    let status = status(&document);
    let success = status == SUCCESS_STATUS;
    Ok(PassPhraseResponse {
        success,
        token: if success {
            non_blank(document.select_text("//Token"))
        } else {
            None
        },
        error_message: if success { None } else { error_message(&document) },
        status,
    })
}

pub fn parse_buy_postage_response(body: &str) -> Result<BuyPostageResponse> {
    let document = XmlElement::parse(body)?;
    let error = error_message(&document);
    if error.is_some() {
        return Ok(BuyPostageResponse {
            success: false,
            balance: None,
            error_description: error,
        });
    }
    Ok(BuyPostageResponse {
        success: true,
        balance: non_blank(document.select_text("//PostageBalance")),
        error_description: None,
    })
}

pub fn parse_account_status_response(body: &str) -> Result<AccountStatusResponse> {
    let document = XmlElement::parse(body)?;
    let status = status(&document);
    let success = status == SUCCESS_STATUS;
    Ok(AccountStatusResponse {
        success,
        balance: non_blank(document.select_text("//PostageBalance")),
        error_message: if success { None } else { error_message(&document) },
        status,
    })
}

pub fn parse_rate_response(
    origin: &Location,
    destination: &Location,
    package: &Package,
    body: &str,
) -> Result<RateResponse> {
    let document = XmlElement::parse(body)?;
    let success = status(&document) == SUCCESS_STATUS;
    let mut message = error_message(&document).unwrap_or_default();

    let mut rates = Vec::new();
    let mut skipped = Vec::new();
    if success {
        for price in document.select("//PostagePrice") {
            let service_code = price.child_text("MailClass");
            let Some(total_price) = price.attribute("TotalAmount").and_then(parse_cents) else {
                tracing::warn!("Endicia price for {} has no total, skipping", service_code);
                skipped.push(service_code);
                continue;
            };
            let service_name = non_blank(price.child_text("Postage/MailService"))
                .unwrap_or_else(|| service_code.clone());

            rates.push(RateEstimate {
                origin: origin.clone(),
                destination: destination.clone(),
                carrier: CARRIER_NAME.to_string(),
                service_code,
                service_name,
                total_price,
                currency: "USD".to_string(),
                delivery_days: None,
                packages: vec![package.clone()],
            });
        }
    }

    let success = success && !rates.is_empty();
    if !success && message.is_empty() {
        message = "No postage rates were returned".to_string();
    }

    Ok(RateResponse {
        success,
        message,
        rates,
        skipped,
    })
}

/// `concatenate_parts` joins every `Label/Image` part, as returned for label subtypes.
pub fn parse_label_response(body: &str, concatenate_parts: bool) -> Result<ShipResponse> {
    let document = XmlElement::parse(body)?;
    if status(&document) != SUCCESS_STATUS {
        return Ok(ShipResponse::failure(
            error_message(&document).unwrap_or_else(|| "Label request was not successful.".to_string()),
        ));
    }

    let label = if concatenate_parts {
        let joined: String = document
            .select("//Image")
            .into_iter()
            .map(|image| image.text().trim().to_string())
            .collect();
        non_blank(joined)
    } else {
        non_blank(document.select_text("//Base64LabelImage"))
    };

    Ok(ShipResponse {
        success: true,
        message: String::new(),
        tracking_number: non_blank(document.select_text("//TrackingNumber")),
        label,
        book_number: None,
        charges: parse_cents(&document.select_text("//FinalPostage")),
    })
}

pub fn parse_refund_response(body: &str) -> Result<RefundResponse> {
    let document = XmlElement::parse(body)?;
    let refund_status = document.select_text("//RefundStatus").trim().to_string();
    let status_message = non_blank(document.select_text("//RefundStatusMessage"));

    if refund_status == REFUND_APPROVED {
        return Ok(RefundResponse {
            success: true,
            message: status_message.unwrap_or_else(|| REFUND_APPROVED.to_string()),
            error_code: None,
            error_description: None,
        });
    }

    let description = status_message.or_else(|| error_message(&document));
    Ok(RefundResponse {
        success: false,
        message: description.clone().unwrap_or_default(),
        error_code: non_blank(refund_status),
        error_description: description,
    })
}
