use crate::domain::measure::{Axis, Length, Weight};
use crate::utils::error::Result;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Package option key carrying the carrier packaging code (mailpiece shape, etc.).
pub const PACKAGE_TYPE_OPTION: &str = "package_type";

/// Postal address plus contact details. Built once by the caller, read by the adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    name: String,
    company: String,
    phone: String,
    address1: String,
    address2: String,
    address3: String,
    city: String,
    state: String,
    postal_code: String,
    country_code: String,
    residential: bool,
}

impl Location {
    pub fn new(country_code: &str) -> Self {
        Self {
            country_code: country_code.trim().to_ascii_uppercase(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_address1(mut self, line: impl Into<String>) -> Self {
        self.address1 = line.into();
        self
    }

    pub fn with_address2(mut self, line: impl Into<String>) -> Self {
        self.address2 = line.into();
        self
    }

    pub fn with_address3(mut self, line: impl Into<String>) -> Self {
        self.address3 = line.into();
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = postal_code.into();
        self
    }

    pub fn residential(mut self, residential: bool) -> Self {
        self.residential = residential;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address1(&self) -> &str {
        &self.address1
    }

    pub fn address2(&self) -> &str {
        &self.address2
    }

    pub fn address3(&self) -> &str {
        &self.address3
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn is_residential(&self) -> bool {
        self.residential
    }
}

/// One physical piece. Maps to exactly one wire piece / line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    weight: Weight,
    dimensions: [Length; 3],
    value: i64,
    options: BTreeMap<String, String>,
}

impl Package {
    /// `dimensions` are length, width, height in that order.
    pub fn new(weight: Weight, dimensions: [Length; 3]) -> Self {
        Self {
            weight,
            dimensions,
            value: 0,
            options: BTreeMap::new(),
        }
    }

    /// Declared value in cents.
    pub fn with_value(mut self, cents: i64) -> Self {
        self.value = cents;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_package_type(self, package_type: impl Into<String>) -> Self {
        self.with_option(PACKAGE_TYPE_OPTION, package_type)
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn pounds(&self) -> f64 {
        self.weight.to_pounds()
    }

    pub fn kilograms(&self) -> f64 {
        self.weight.to_kilograms()
    }

    pub fn ounces(&self) -> f64 {
        self.weight.to_ounces()
    }

    pub fn inches(&self, axis: Axis) -> f64 {
        self.dimension(axis).to_inches()
    }

    pub fn centimeters(&self, axis: Axis) -> f64 {
        self.dimension(axis).to_centimeters()
    }

    /// Declared value in cents.
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn package_type(&self) -> Option<&str> {
        self.options.get(PACKAGE_TYPE_OPTION).map(String::as_str)
    }

    fn dimension(&self, axis: Axis) -> Length {
        match axis {
            Axis::Length => self.dimensions[0],
            Axis::Width => self.dimensions[1],
            Axis::Height => self.dimensions[2],
        }
    }
}

/// A quoted price for one service. Amounts are in minor units (cents).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateEstimate {
    pub origin: Location,
    pub destination: Location,
    pub carrier: String,
    pub service_code: String,
    pub service_name: String,
    pub total_price: i64,
    pub currency: String,
    pub delivery_days: Option<i64>,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateResponse {
    pub success: bool,
    pub message: String,
    pub rates: Vec<RateEstimate>,
    /// Service codes the carrier declined to price.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShipResponse {
    pub success: bool,
    pub message: String,
    pub tracking_number: Option<String>,
    /// Carrier-encoded label image (base64), passed through untouched.
    pub label: Option<String>,
    pub book_number: Option<String>,
    /// Postage charged, in cents.
    pub charges: Option<i64>,
}

impl ShipResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Decodes the label payload into raw image bytes.
    pub fn label_bytes(&self) -> Result<Option<Vec<u8>>> {
        match &self.label {
            Some(label) => {
                let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
                Ok(Some(base64::engine::general_purpose::STANDARD.decode(compact)?))
            }
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefundResponse {
    pub success: bool,
    pub message: String,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentEvent {
    pub description: String,
    pub time: DateTime<Utc>,
    pub location: Location,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub message: String,
    pub tracking_number: Option<String>,
    pub destination: Option<Location>,
    /// Ascending by `time`.
    pub events: Vec<ShipmentEvent>,
}

impl TrackingResponse {
    pub fn found(
        message: impl Into<String>,
        tracking_number: String,
        destination: Location,
        mut events: Vec<ShipmentEvent>,
    ) -> Self {
        events.sort_by_key(|event| event.time);
        Self {
            success: true,
            message: message.into(),
            tracking_number: Some(tracking_number),
            destination: Some(destination),
            events,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassPhraseResponse {
    pub success: bool,
    pub status: String,
    pub token: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuyPostageResponse {
    pub success: bool,
    pub balance: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountStatusResponse {
    pub success: bool,
    pub status: String,
    pub balance: Option<String>,
    pub error_message: Option<String>,
}

/// "12.34" -> 1234. `None` for blank or non-numeric input.
pub fn parse_cents(amount: &str) -> Option<i64> {
    amount.trim().parse::<f64>().ok().map(cents_from_amount)
}

pub fn cents_from_amount(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// 4500 -> "45.00"
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}
