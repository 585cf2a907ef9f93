use crate::domain::measure::{Length, Weight};
use crate::domain::model::{
    DeleteResponse, Location, Package, RateResponse, ShipResponse, TrackingResponse,
};
use crate::utils::error::{CarrierError, Result};
use async_trait::async_trait;

/// Static facts about one carrier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierDescriptor {
    pub name: &'static str,
    /// Configuration keys that must be present and non-blank.
    pub requirements: &'static [&'static str],
    /// Whether an external retry policy may resend requests automatically.
    pub retry_safe: bool,
    pub test_url: &'static str,
    pub live_url: &'static str,
}

impl CarrierDescriptor {
    /// Base URL for a call: an explicit override wins over the fixed sandbox/production pair.
    pub fn base_url<'a>(&'a self, endpoint_override: Option<&'a str>, test: bool) -> &'a str {
        match endpoint_override {
            Some(endpoint) => endpoint,
            None if test => self.test_url,
            None => self.live_url,
        }
    }
}

/// Shipping operations every adapter exposes.
///
/// Carrier-reported failures come back as responses with `success == false`;
/// `Err` is reserved for transport failures, unreadable replies and caller mistakes.
#[async_trait]
pub trait Carrier: Send + Sync {
    type RateOptions: Default + Send + Sync;
    type ShipOptions: Default + Send + Sync;
    type DeleteOptions: Default + Send + Sync;
    type TrackingOptions: Default + Send + Sync;

    fn descriptor(&self) -> &'static CarrierDescriptor;

    /// Rates a shipment. Only the first package is rated.
    async fn find_rates(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &Self::RateOptions,
    ) -> Result<RateResponse>;

    /// One response per package, issued in package order.
    async fn create_shipment(
        &self,
        _origin: &Location,
        _destination: &Location,
        _packages: &[Package],
        _options: &Self::ShipOptions,
    ) -> Result<Vec<ShipResponse>> {
        Err(self.not_implemented("create_shipment"))
    }

    async fn delete_shipment(
        &self,
        _tracking_number: &str,
        _shipment_type: &str,
        _options: &Self::DeleteOptions,
    ) -> Result<DeleteResponse> {
        Err(self.not_implemented("delete_shipment"))
    }

    async fn find_tracking_info(
        &self,
        _tracking_number: &str,
        _options: &Self::TrackingOptions,
    ) -> Result<TrackingResponse> {
        Err(self.not_implemented("find_tracking_info"))
    }

    /// Performs the cheapest authenticated call: a rate quote for a canned shipment.
    async fn valid_credentials(&self) -> Result<bool> {
        let (origin, destination, package) = canned_shipment();
        let options = Self::RateOptions::default();
        let response = self
            .find_rates(&origin, &destination, &[package], &options)
            .await?;
        Ok(response.success)
    }

    fn not_implemented(&self, operation: &'static str) -> CarrierError {
        CarrierError::NotImplemented {
            carrier: self.descriptor().name,
            operation,
        }
    }
}

/// Domestic US shipment used for credential checks.
pub fn canned_shipment() -> (Location, Location, Package) {
    let origin = Location::new("US")
        .with_name("Shipping Department")
        .with_address1("455 N Rexford Dr")
        .with_city("Beverly Hills")
        .with_state("CA")
        .with_postal_code("90210")
        .with_phone("3105550100");
    let destination = Location::new("US")
        .with_name("Receiving")
        .with_address1("1 Infinite Loop")
        .with_city("Cupertino")
        .with_state("CA")
        .with_postal_code("95014")
        .with_phone("4085550100");
    let package = Package::new(
        Weight::from_pounds(1.0),
        [
            Length::from_inches(10.0),
            Length::from_inches(6.0),
            Length::from_inches(4.0),
        ],
    )
    .with_value(1000);
    (origin, destination, package)
}

/// First package of a shipment; an empty slice is a caller error.
pub fn first_package(packages: &[Package]) -> Result<&Package> {
    packages
        .first()
        .ok_or_else(|| CarrierError::validation("at least one package is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: CarrierDescriptor = CarrierDescriptor {
        name: "Test",
        requirements: &["key"],
        retry_safe: true,
        test_url: "https://sandbox.example.com",
        live_url: "https://api.example.com",
    };

    #[test]
    fn test_base_url_selection() {
        assert_eq!(DESCRIPTOR.base_url(None, true), "https://sandbox.example.com");
        assert_eq!(DESCRIPTOR.base_url(None, false), "https://api.example.com");
        assert_eq!(
            DESCRIPTOR.base_url(Some("http://127.0.0.1:9000"), false),
            "http://127.0.0.1:9000"
        );
    }

    #[test]
    fn test_first_package_requires_one() {
        assert!(first_package(&[]).is_err());
        let (_, _, package) = canned_shipment();
        assert_eq!(first_package(std::slice::from_ref(&package)).unwrap(), &package);
    }
}
