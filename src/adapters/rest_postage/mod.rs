//! REST/JSON postage API. Every path is scoped by the customer id and
//! authenticated with `Authorization: RSIS <key>`.

pub mod models;

use crate::config::RestPostageConfig;
use crate::domain::model::{
    cents_from_amount, DeleteResponse, Location, Package, RateEstimate, RateResponse,
    RefundResponse, ShipResponse,
};
use crate::domain::ports::{first_package, Carrier, CarrierDescriptor};
use crate::utils::error::{CarrierError, Result};
use crate::utils::http::build_client;
use crate::utils::validation::{validate_country_code, Validate};
use async_trait::async_trait;
use models::{Address, ApiError, BookReply, BookRequest, LabelReply, Parcel, RateReply, RateRequest};
use reqwest::{Client, RequestBuilder, StatusCode};

pub const CARRIER_NAME: &str = "RestPostage";

/// Amounts are always quoted and charged in US dollars.
pub const CURRENCY: &str = "USD";

pub const DEFAULT_SERVICE_CODES: [&str; 4] = ["First", "Priority", "PriorityExpress", "ParcelSelect"];

pub const NO_RATES_MESSAGE: &str = "No valid rates were returned";

pub static DESCRIPTOR: CarrierDescriptor = CarrierDescriptor {
    name: CARRIER_NAME,
    requirements: &["api_key", "customer_id"],
    retry_safe: true,
    test_url: "https://sandbox.postage-api.invalid/v1",
    live_url: "https://api.postage-api.invalid/v1",
};

#[derive(Debug, Clone, Default)]
pub struct RestPostageRateOptions {
    pub test: Option<bool>,
    /// Candidate services, one request each. The default set when empty.
    pub service_codes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RestPostageShipOptions {
    pub test: Option<bool>,
    pub service_code: String,
    /// Caller reference stored on the booking.
    pub reference: Option<String>,
}

impl Default for RestPostageShipOptions {
    fn default() -> Self {
        Self {
            test: None,
            service_code: "Priority".to_string(),
            reference: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestPostageOptions {
    pub test: Option<bool>,
}

pub struct RestPostage {
    config: RestPostageConfig,
    client: Client,
}

impl RestPostage {
    pub fn new(config: RestPostageConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(config.timeout_seconds)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RestPostageConfig {
        &self.config
    }

    fn url(&self, test: Option<bool>, path: &str) -> String {
        let base = DESCRIPTOR.base_url(
            self.config.endpoint.as_deref(),
            test.unwrap_or(self.config.test),
        );
        format!(
            "{}/{}{}",
            base.trim_end_matches('/'),
            self.config.customer_id,
            path
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            reqwest::header::AUTHORIZATION,
            format!("RSIS {}", self.config.api_key),
        )
    }

    /// Sends a request and hands back status and body; callers decide what a
    /// status means.
    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Postage API replied {}", status);
        Ok((status, body))
    }

    async fn quote(
        &self,
        origin: &Location,
        destination: &Location,
        package: &Package,
        service_code: &str,
        test: Option<bool>,
    ) -> Result<Option<RateEstimate>> {
        let body = RateRequest {
            service_code: service_code.to_string(),
            from_postal_code: origin.postal_code().to_string(),
            from_country_code: origin.country_code().to_string(),
            to_postal_code: destination.postal_code().to_string(),
            to_country_code: destination.country_code().to_string(),
            parcel: Parcel::from_package(package),
            currency: CURRENCY.to_string(),
        };
        let url = self.url(test, "/rates");
        tracing::debug!("Postage API rate request for {} to {}", service_code, url);
        let (status, text) = self.send(self.client.post(&url).json(&body)).await?;

        // Only well-formed replies without a total count as a rejected code.
        let reply: RateReply = match serde_json::from_str(&text) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(CarrierError::http_status(status.as_u16(), &text));
            }
            Err(e) => return Err(e.into()),
        };
        let total = match reply.total_amount {
            Some(total) if status.is_success() => total,
            _ => {
                tracing::warn!(
                    "No rate for {}: {}",
                    service_code,
                    ApiError {
                        error_category: reply.error_category,
                        message: reply.message,
                    }
                    .describe()
                );
                return Ok(None);
            }
        };

        Ok(Some(RateEstimate {
            origin: origin.clone(),
            destination: destination.clone(),
            carrier: CARRIER_NAME.to_string(),
            service_code: reply
                .service_code
                .unwrap_or_else(|| service_code.to_string()),
            service_name: reply
                .service_name
                .unwrap_or_else(|| service_code.to_string()),
            total_price: cents_from_amount(total),
            currency: reply.currency.unwrap_or_else(|| CURRENCY.to_string()),
            delivery_days: reply.delivery_days,
            packages: vec![package.clone()],
        }))
    }

    /// Books one package and fetches its label. Both steps must answer 200 or 201.
    pub async fn book_label(
        &self,
        origin: &Location,
        destination: &Location,
        package: &Package,
        options: &RestPostageShipOptions,
    ) -> Result<ShipResponse> {
        let request = BookRequest {
            service_code: options.service_code.clone(),
            from: Address::from(origin),
            to: Address::from(destination),
            parcel: Parcel::from_package(package),
            currency: CURRENCY.to_string(),
            reference: options.reference.clone(),
        };
        let url = self.url(options.test, "/books");
        let (status, text) = self.send(self.client.post(&url).json(&request)).await?;
        if !is_created(status) {
            let error = ApiError::parse(&text)
                .ok_or_else(|| CarrierError::http_status(status.as_u16(), &text))?;
            tracing::warn!("Booking failed with {}: {}", status, error.describe());
            return Ok(ShipResponse::failure(error.describe()));
        }

        let booking: BookReply = serde_json::from_str(&text)?;
        let Some(book_number) = booking.book_number else {
            return Ok(ShipResponse::failure("Booking reply carried no book number"));
        };

        let url = self.url(options.test, &format!("/books/{}/label", book_number));
        let (status, text) = self.send(self.client.get(&url)).await?;
        // The booking is already paid for, so even an unreadable reply keeps the book number.
        if !is_created(status) {
            let error = ApiError::from_body(&text);
            tracing::warn!(
                "Label fetch for booking {} failed with {}: {}",
                book_number,
                status,
                error.describe()
            );
            return Ok(ShipResponse {
                book_number: Some(book_number),
                ..ShipResponse::failure(error.describe())
            });
        }
        let label: LabelReply = serde_json::from_str(&text)?;

        tracing::info!(
            "Booked {} with tracking number {:?}",
            book_number,
            booking.tracking_number
        );
        Ok(ShipResponse {
            success: true,
            message: String::new(),
            tracking_number: booking.tracking_number,
            label: label.label_image,
            book_number: Some(book_number),
            charges: booking.total_amount.map(cents_from_amount),
        })
    }

    /// Voids a booking. Success is the HTTP status class alone.
    pub async fn void_booking(&self, book_number: &str, options: &RestPostageOptions) -> Result<RefundResponse> {
        let url = self.url(options.test, &format!("/books/{}/void", book_number));
        let (status, text) = self.send(self.client.post(&url)).await?;

        if status.is_success() {
            tracing::info!("Voided booking {}", book_number);
            return Ok(RefundResponse {
                success: true,
                message: format!("Booking {} voided", book_number),
                error_code: None,
                error_description: None,
            });
        }

        let error = ApiError::from_body(&text);
        tracing::warn!("Void of {} failed with {}: {}", book_number, status, error.describe());
        Ok(RefundResponse {
            success: false,
            message: error.describe(),
            error_code: Some(
                error
                    .error_category
                    .clone()
                    .unwrap_or_else(|| status.as_u16().to_string()),
            ),
            error_description: error.message,
        })
    }
}

fn is_created(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

#[async_trait]
impl Carrier for RestPostage {
    type RateOptions = RestPostageRateOptions;
    type ShipOptions = RestPostageShipOptions;
    type DeleteOptions = RestPostageOptions;
    type TrackingOptions = RestPostageOptions;

    fn descriptor(&self) -> &'static CarrierDescriptor {
        &DESCRIPTOR
    }

    /// Quotes each candidate service in turn; services without a usable total are skipped.
    async fn find_rates(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &RestPostageRateOptions,
    ) -> Result<RateResponse> {
        validate_country_code("origin", origin.country_code())?;
        validate_country_code("destination", destination.country_code())?;
        let package = first_package(packages)?;

        let codes: Vec<String> = if options.service_codes.is_empty() {
            DEFAULT_SERVICE_CODES.iter().map(|code| code.to_string()).collect()
        } else {
            options.service_codes.clone()
        };

        let mut rates = Vec::new();
        let mut skipped = Vec::new();
        for code in codes {
            match self
                .quote(origin, destination, package, &code, options.test)
                .await?
            {
                Some(rate) => rates.push(rate),
                None => skipped.push(code),
            }
        }

        let success = !rates.is_empty();
        if success {
            tracing::info!(
                "Postage API returned {} rates, skipped {:?}",
                rates.len(),
                skipped
            );
        } else {
            tracing::warn!("Postage API returned no rates");
        }

        Ok(RateResponse {
            success,
            message: if success {
                String::new()
            } else {
                NO_RATES_MESSAGE.to_string()
            },
            rates,
            skipped,
        })
    }

    async fn create_shipment(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &RestPostageShipOptions,
    ) -> Result<Vec<ShipResponse>> {
        let mut responses = Vec::with_capacity(packages.len());
        for package in packages {
            responses.push(self.book_label(origin, destination, package, options).await?);
        }
        Ok(responses)
    }

    async fn delete_shipment(
        &self,
        tracking_number: &str,
        _shipment_type: &str,
        options: &RestPostageOptions,
    ) -> Result<DeleteResponse> {
        let refund = self.void_booking(tracking_number, options).await?;
        Ok(DeleteResponse {
            success: refund.success,
            message: refund.message,
            error_code: refund.error_code,
            error_description: refund.error_description,
        })
    }
}
