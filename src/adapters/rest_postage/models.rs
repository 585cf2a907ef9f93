//! JSON bodies exchanged with the postage API.

use crate::domain::measure::{round3, Axis};
use crate::domain::model::{Location, Package};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub weight_lb: f64,
    pub length_in: f64,
    pub width_in: f64,
    pub height_in: f64,
    pub declared_value: f64,
}

impl Parcel {
    pub fn from_package(package: &Package) -> Self {
        Self {
            weight_lb: round3(package.pounds()),
            length_in: round3(package.inches(Axis::Length)),
            width_in: round3(package.inches(Axis::Width)),
            height_in: round3(package.inches(Axis::Height)),
            declared_value: package.value() as f64 / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub street: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    pub postal_code: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
}

impl From<&Location> for Address {
    fn from(location: &Location) -> Self {
        let street = [location.address1(), location.address2(), location.address3()]
            .into_iter()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            name: location.name().to_string(),
            company: location.company().to_string(),
            street,
            city: location.city().to_string(),
            state: location.state().to_string(),
            postal_code: location.postal_code().to_string(),
            country_code: location.country_code().to_string(),
            phone: location.phone().to_string(),
        }
    }
}

/// One service code per request; the API has no multi-service quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub service_code: String,
    pub from_postal_code: String,
    pub from_country_code: String,
    pub to_postal_code: String,
    pub to_country_code: String,
    pub parcel: Parcel,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateReply {
    pub service_code: Option<String>,
    pub service_name: Option<String>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub delivery_days: Option<i64>,
    pub error_category: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub service_code: String,
    pub from: Address,
    pub to: Address,
    pub parcel: Parcel,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookReply {
    pub book_number: Option<String>,
    pub tracking_number: Option<String>,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelReply {
    pub label_image: Option<String>,
}

/// Error shape shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiError {
    pub error_category: Option<String>,
    pub message: Option<String>,
}

impl ApiError {
    /// `None` unless the body is a JSON object.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Reads an error body; anything that is not JSON becomes the message as-is.
    pub fn from_body(body: &str) -> Self {
        Self::parse(body).unwrap_or_else(|| ApiError {
            error_category: None,
            message: Some(body.trim().to_string()).filter(|text| !text.is_empty()),
        })
    }

    pub fn describe(&self) -> String {
        match (&self.error_category, &self.message) {
            (Some(category), Some(message)) => format!("{}: {}", category, message),
            (Some(category), None) => category.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
        }
    }
}
