//! FedEx web services (XML over HTTPS, versioned rate/ship/track schemas).

pub mod request;
pub mod response;
pub mod service;

use crate::config::FedExConfig;
use crate::domain::model::{
    DeleteResponse, Location, Package, RateResponse, ShipResponse, TrackingResponse,
};
use crate::domain::ports::{first_package, Carrier, CarrierDescriptor};
use crate::utils::error::Result;
use crate::utils::http::{build_client, post_xml};
use crate::utils::validation::{validate_country_code, Validate};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;

pub use request::ShipSequence;
pub use service::{
    service_name_for_code, DeletionControl, DropoffType, PackageIdentifierType, PackagingType,
    UnitSystem,
};

pub const CARRIER_NAME: &str = "FedEx";

pub static DESCRIPTOR: CarrierDescriptor = CarrierDescriptor {
    name: CARRIER_NAME,
    requirements: &["key", "account", "meter", "password"],
    retry_safe: true,
    test_url: "https://gatewaybeta.fedex.com:443/xml",
    live_url: "https://gateway.fedex.com:443/xml",
};

#[derive(Debug, Clone, Default)]
pub struct FedExRateOptions {
    /// Overrides the configured sandbox flag for this call.
    pub test: Option<bool>,
    /// Defaults to the time of the call.
    pub ship_date: Option<DateTime<Utc>>,
    pub dropoff_type: DropoffType,
    pub packaging_type: PackagingType,
    /// Shipping party when it differs from the physical origin.
    pub shipper: Option<Location>,
    /// Ground quotes only carry a transit bucket when this is set.
    pub return_transit_and_commit: bool,
    pub without_signature: bool,
    pub include_dimensions: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FedExShipOptions {
    pub test: Option<bool>,
    pub ship_date: Option<DateTime<Utc>>,
    pub dropoff_type: DropoffType,
    /// `GROUND_HOME_DELIVERY` when unset.
    pub service_type: Option<String>,
    pub packaging_type: PackagingType,
    pub shipper: Option<Location>,
    pub receiver_pays: bool,
    /// Payor account when the receiver pays; the configured account otherwise.
    pub receiver_account: Option<String>,
    pub saturday_delivery: bool,
    pub return_shipment: bool,
    pub without_signature: bool,
    pub include_dimensions: bool,
    pub commodity: Commodity,
}

/// Customs commodity line declared for every package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commodity {
    pub name: String,
    pub description: String,
    pub country_of_manufacture: String,
}

impl Default for Commodity {
    fn default() -> Self {
        Self {
            name: "Merchandise".to_string(),
            description: "Merchandise".to_string(),
            country_of_manufacture: "US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FedExDeleteOptions {
    pub test: Option<bool>,
    pub ship_timestamp: Option<DateTime<Utc>>,
    pub deletion_control: DeletionControl,
}

#[derive(Debug, Clone, Default)]
pub struct FedExTrackingOptions {
    pub test: Option<bool>,
    pub package_identifier_type: PackageIdentifierType,
    pub ship_date_range_begin: Option<NaiveDate>,
    pub ship_date_range_end: Option<NaiveDate>,
}

pub struct FedEx {
    config: FedExConfig,
    client: Client,
}

impl FedEx {
    pub fn new(config: FedExConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(config.timeout_seconds)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FedExConfig {
        &self.config
    }

    fn url(&self, test: Option<bool>) -> &str {
        DESCRIPTOR.base_url(
            self.config.endpoint.as_deref(),
            test.unwrap_or(self.config.test),
        )
    }

    async fn commit(&self, request: String, test: Option<bool>) -> Result<String> {
        let url = self.url(test);
        tracing::debug!("FedEx request to {}", url);
        post_xml(&self.client, url, request, None).await
    }
}

#[async_trait]
impl Carrier for FedEx {
    type RateOptions = FedExRateOptions;
    type ShipOptions = FedExShipOptions;
    type DeleteOptions = FedExDeleteOptions;
    type TrackingOptions = FedExTrackingOptions;

    fn descriptor(&self) -> &'static CarrierDescriptor {
        &DESCRIPTOR
    }

    async fn find_rates(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &FedExRateOptions,
    ) -> Result<RateResponse> {
        validate_country_code("origin", origin.country_code())?;
        validate_country_code("destination", destination.country_code())?;
        let package = first_package(packages)?;
        if packages.len() > 1 {
            tracing::debug!("FedEx rates only the first of {} packages", packages.len());
        }

        let now = Utc::now();
        let request =
            request::build_rate_request(&self.config, origin, destination, package, options, now);
        let body = self.commit(request, options.test).await?;
        let response = response::parse_rate_response(origin, destination, package, &body, now)?;

        if response.success {
            tracing::info!("FedEx returned {} rates", response.rates.len());
        } else {
            tracing::warn!("FedEx rate request failed: {}", response.message);
        }
        Ok(response)
    }

    /// Packages are shipped one request at a time. The first package's
    /// tracking number becomes the master id of every later package; when the
    /// first request fails the later ones go out without a master id.
    async fn create_shipment(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &FedExShipOptions,
    ) -> Result<Vec<ShipResponse>> {
        validate_country_code("origin", origin.country_code())?;
        validate_country_code("destination", destination.country_code())?;

        let mut responses: Vec<ShipResponse> = Vec::with_capacity(packages.len());
        let mut master_tracking_id: Option<String> = None;

        for (index, package) in packages.iter().enumerate() {
            let request = {
                let sequence = ShipSequence {
                    package_count: packages.len(),
                    package_number: index + 1,
                    master_tracking_id: master_tracking_id.as_deref(),
                };
                request::build_ship_request(
                    &self.config,
                    origin,
                    destination,
                    package,
                    options,
                    &sequence,
                    Utc::now(),
                )
            };
            let body = self.commit(request, options.test).await?;
            let response = response::parse_ship_response(&body)?;

            if response.success {
                tracing::info!(
                    "FedEx package {}/{} shipped: {:?}",
                    index + 1,
                    packages.len(),
                    response.tracking_number
                );
            } else {
                tracing::warn!(
                    "FedEx package {}/{} failed: {}",
                    index + 1,
                    packages.len(),
                    response.message
                );
            }

            if index == 0 {
                master_tracking_id = response.tracking_number.clone();
            }
            responses.push(response);
        }

        Ok(responses)
    }

    async fn delete_shipment(
        &self,
        tracking_number: &str,
        shipment_type: &str,
        options: &FedExDeleteOptions,
    ) -> Result<DeleteResponse> {
        let request =
            request::build_delete_request(&self.config, tracking_number, shipment_type, options);
        let body = self.commit(request, options.test).await?;
        let response = response::parse_delete_response(&body)?;
        tracing::info!(
            "FedEx delete of {} success={}",
            tracking_number,
            response.success
        );
        Ok(response)
    }

    async fn find_tracking_info(
        &self,
        tracking_number: &str,
        options: &FedExTrackingOptions,
    ) -> Result<TrackingResponse> {
        let request = request::build_tracking_request(&self.config, tracking_number, options);
        let body = self.commit(request, options.test).await?;
        let response = response::parse_tracking_response(&body)?;
        tracing::info!(
            "FedEx tracking for {} success={} events={}",
            tracking_number,
            response.success,
            response.events.len()
        );
        Ok(response)
    }
}
