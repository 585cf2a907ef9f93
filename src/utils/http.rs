use crate::utils::error::{CarrierError, Result};
use crate::utils::xml::XmlElement;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("omniship/", env!("CARGO_PKG_VERSION"));

/// Nodes through which the SOAP services report failures in a non-2xx reply.
const CARRIER_REPLY_NODES: [&str; 3] = ["//Fault", "//Notifications", "//Status"];

pub fn build_client(timeout_seconds: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(seconds) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    Ok(builder.build()?)
}

/// True when a reply carries a fault or status the adapters know how to read.
pub fn is_carrier_reply(body: &str) -> bool {
    match XmlElement::parse(body) {
        Ok(document) => CARRIER_REPLY_NODES.iter().any(|path| document.exists(path)),
        Err(_) => false,
    }
}

/// Posts an XML document and returns the reply body. Non-2xx replies are
/// passed through only when they hold a SOAP fault or a carrier status;
/// anything else (gateway error pages, empty bodies) is `HttpStatus`.
pub async fn post_xml(
    client: &Client,
    url: &str,
    body: String,
    soap_action: Option<&str>,
) -> Result<String> {
    let mut request = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
        .body(body);
    if let Some(action) = soap_action {
        request = request.header("SOAPAction", format!("\"{}\"", action));
    }

    let response = request.send().await?;
    let status = response.status();
    tracing::debug!("XML reply status: {}", status);
    let text = response.text().await?;

    if !status.is_success() && !is_carrier_reply(&text) {
        tracing::warn!("Unreadable {} reply from {}", status, url);
        return Err(CarrierError::http_status(status.as_u16(), &text));
    }
    Ok(text)
}
