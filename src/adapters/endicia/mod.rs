//! Endicia label server (USPS postage) over SOAP.
//!
//! Every call authenticates as a certified intermediary: with the issued
//! token when one exists, with account id and pass phrase otherwise.

pub mod request;
pub mod response;

use crate::config::EndiciaConfig;
use crate::domain::model::{
    AccountStatusResponse, BuyPostageResponse, Location, Package, PassPhraseResponse,
    RateResponse, RefundResponse, ShipResponse,
};
use crate::domain::ports::{canned_shipment, first_package, Carrier, CarrierDescriptor};
use crate::utils::error::{CarrierError, Result};
use crate::utils::http::{build_client, post_xml};
use crate::utils::validation::{validate_country_code, Validate};
use async_trait::async_trait;
use reqwest::Client;

use request::RequestContext;

pub const CARRIER_NAME: &str = "USPS";

/// Heaviest mailpiece the label server accepts.
pub const MAX_WEIGHT_POUNDS: f64 = 70.0;

pub static DESCRIPTOR: CarrierDescriptor = CarrierDescriptor {
    name: CARRIER_NAME,
    requirements: &["requester_id"],
    retry_safe: true,
    test_url: "https://elstestserver.endicia.com/LabelService/EwsLabelService.asmx",
    live_url: "https://labelserver.endicia.com/LabelService/EwsLabelService.asmx",
};

/// Options for calls that only need the sandbox switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndiciaOptions {
    pub test: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassPhraseOptions {
    pub test: Option<bool>,
    /// Ask the server to issue a token alongside the new pass phrase.
    pub request_token: bool,
}

#[derive(Debug, Clone)]
pub struct EndiciaRateOptions {
    pub test: Option<bool>,
    /// `Domestic` or `International` by destination when unset.
    pub mail_class: Option<String>,
    pub mailpiece_shape: String,
}

impl Default for EndiciaRateOptions {
    fn default() -> Self {
        Self {
            test: None,
            mail_class: None,
            mailpiece_shape: "Parcel".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndiciaLabelOptions {
    pub test: Option<bool>,
    /// Mail class to purchase.
    pub service: String,
    pub label_type: Option<String>,
    pub label_subtype: Option<String>,
    pub label_size: String,
    pub image_format: String,
    pub image_resolution: String,
    pub image_rotation: String,
    pub order_number: Option<String>,
    pub customs: CustomsDeclaration,
}

impl Default for EndiciaLabelOptions {
    fn default() -> Self {
        Self {
            test: None,
            service: "First".to_string(),
            label_type: None,
            label_subtype: None,
            label_size: "4x6".to_string(),
            image_format: "PNG".to_string(),
            image_resolution: "600".to_string(),
            image_rotation: "None".to_string(),
            order_number: None,
            customs: CustomsDeclaration::default(),
        }
    }
}

impl EndiciaLabelOptions {
    pub fn resolved_label_type(&self, destination: &Location) -> String {
        self.label_type.clone().unwrap_or_else(|| {
            if request::is_domestic(destination) {
                "Default".to_string()
            } else {
                "International".to_string()
            }
        })
    }

    /// International labels come back as an integrated multi-part form.
    pub fn resolved_label_subtype(&self, destination: &Location) -> Option<String> {
        self.label_subtype.clone().or_else(|| {
            (!request::is_domestic(destination)).then(|| "Integrated".to_string())
        })
    }
}

/// Customs form filled in for international labels.
#[derive(Debug, Clone)]
pub struct CustomsDeclaration {
    pub contents_type: String,
    pub description: String,
    pub country_of_origin: String,
    /// Origin name when unset.
    pub signer: Option<String>,
    pub senders_copy: bool,
}

impl Default for CustomsDeclaration {
    fn default() -> Self {
        Self {
            contents_type: "Merchandise".to_string(),
            description: "Merchandise".to_string(),
            country_of_origin: "US".to_string(),
            signer: None,
            senders_copy: false,
        }
    }
}

pub struct Endicia {
    config: EndiciaConfig,
    client: Client,
}

impl Endicia {
    pub fn new(config: EndiciaConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(config.timeout_seconds)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EndiciaConfig {
        &self.config
    }

    fn is_test(&self, test: Option<bool>) -> bool {
        test.unwrap_or(self.config.test)
    }

    fn context(&self, test: Option<bool>) -> RequestContext<'_> {
        RequestContext {
            config: &self.config,
            test: self.is_test(test),
        }
    }

    async fn commit(&self, operation: &str, body: String, test: Option<bool>) -> Result<String> {
        let url = DESCRIPTOR.base_url(self.config.endpoint.as_deref(), self.is_test(test));
        let action = request::soap_action(operation);
        tracing::debug!("Endicia {} request to {}", operation, url);
        post_xml(&self.client, url, body, Some(&action)).await
    }

    /// Rotates the pass phrase. The caller is responsible for storing the new
    /// phrase (and token, if one was requested) in its configuration.
    pub async fn change_pass_phrase(
        &self,
        new_phrase: &str,
        options: &PassPhraseOptions,
    ) -> Result<PassPhraseResponse> {
        if new_phrase.trim().is_empty() {
            return Err(CarrierError::validation("new pass phrase must not be blank"));
        }
        let body = request::build_change_pass_phrase_request(
            &self.context(options.test),
            new_phrase,
            options.request_token,
        );
        let reply = self.commit("ChangePassPhrase", body, options.test).await?;
        let response = response::parse_pass_phrase_response(&reply)?;
        if response.success {
            tracing::info!("Endicia pass phrase changed");
        } else {
            tracing::warn!(
                "Endicia pass phrase change failed with status {}",
                response.status
            );
        }
        Ok(response)
    }

    /// Adds funds to the postage account.
    pub async fn buy_postage(
        &self,
        amount_cents: i64,
        options: &EndiciaOptions,
    ) -> Result<BuyPostageResponse> {
        if amount_cents <= 0 {
            return Err(CarrierError::validation("postage amount must be positive"));
        }
        let body = request::build_buy_postage_request(&self.context(options.test), amount_cents);
        let reply = self.commit("BuyPostage", body, options.test).await?;
        let response = response::parse_buy_postage_response(&reply)?;
        tracing::info!(
            "Endicia postage purchase success={} balance={:?}",
            response.success,
            response.balance
        );
        Ok(response)
    }

    pub async fn account_status(&self, options: &EndiciaOptions) -> Result<AccountStatusResponse> {
        let body = request::build_account_status_request(&self.context(options.test));
        let reply = self.commit("GetAccountStatus", body, options.test).await?;
        response::parse_account_status_response(&reply)
    }

    /// Buys one label.
    pub async fn get_postage_label(
        &self,
        origin: &Location,
        destination: &Location,
        package: &Package,
        options: &EndiciaLabelOptions,
    ) -> Result<ShipResponse> {
        validate_country_code("destination", destination.country_code())?;
        check_weight(package)?;

        let body = request::build_get_postage_label_request(
            &self.context(options.test),
            origin,
            destination,
            package,
            options,
        );
        let reply = self.commit("GetPostageLabel", body, options.test).await?;
        let concatenate_parts = options.resolved_label_subtype(destination).is_some();
        let response = response::parse_label_response(&reply, concatenate_parts)?;

        if response.success {
            tracing::info!("Endicia label purchased: {:?}", response.tracking_number);
        } else {
            tracing::warn!("Endicia label request failed: {}", response.message);
        }
        Ok(response)
    }

    pub async fn get_refund(
        &self,
        tracking_number: &str,
        options: &EndiciaOptions,
    ) -> Result<RefundResponse> {
        let body = request::build_get_refund_request(&self.context(options.test), tracking_number);
        let reply = self.commit("GetRefund", body, options.test).await?;
        let response = response::parse_refund_response(&reply)?;
        tracing::info!(
            "Endicia refund for {} success={}",
            tracking_number,
            response.success
        );
        Ok(response)
    }
}

fn check_weight(package: &Package) -> Result<()> {
    if package.pounds() > MAX_WEIGHT_POUNDS {
        return Err(CarrierError::validation(format!(
            "package weighs {:.2} lb, above the {} lb limit",
            package.pounds(),
            MAX_WEIGHT_POUNDS
        )));
    }
    Ok(())
}

#[async_trait]
impl Carrier for Endicia {
    type RateOptions = EndiciaRateOptions;
    type ShipOptions = EndiciaLabelOptions;
    type DeleteOptions = EndiciaOptions;
    type TrackingOptions = EndiciaOptions;

    fn descriptor(&self) -> &'static CarrierDescriptor {
        &DESCRIPTOR
    }

    async fn find_rates(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &EndiciaRateOptions,
    ) -> Result<RateResponse> {
        validate_country_code("origin", origin.country_code())?;
        validate_country_code("destination", destination.country_code())?;
        let package = first_package(packages)?;

        let body = request::build_calculate_postage_rates_request(
            &self.context(options.test),
            origin,
            destination,
            package,
            options,
        );
        let reply = self.commit("CalculatePostageRates", body, options.test).await?;
        let response = response::parse_rate_response(origin, destination, package, &reply)?;

        if response.success {
            tracing::info!("Endicia returned {} rates", response.rates.len());
        } else {
            tracing::warn!("Endicia rate request failed: {}", response.message);
        }
        Ok(response)
    }

    async fn create_shipment(
        &self,
        origin: &Location,
        destination: &Location,
        packages: &[Package],
        options: &EndiciaLabelOptions,
    ) -> Result<Vec<ShipResponse>> {
        // Nothing is bought unless every package can be labelled.
        validate_country_code("destination", destination.country_code())?;
        packages.iter().try_for_each(check_weight)?;

        let mut responses = Vec::with_capacity(packages.len());
        for package in packages {
            responses.push(
                self.get_postage_label(origin, destination, package, options)
                    .await?,
            );
        }
        Ok(responses)
    }

    /// The sandbox answers account status requests without charging, so test
    /// mode checks with that; production checks with a rate quote.
    async fn valid_credentials(&self) -> Result<bool> {
        if self.config.test {
            let status = self.account_status(&EndiciaOptions::default()).await?;
            return Ok(status.success);
        }
        let (origin, destination, package) = canned_shipment();
        let response = self
            .find_rates(
                &origin,
                &destination,
                &[package],
                &EndiciaRateOptions::default(),
            )
            .await?;
        Ok(response.success)
    }
}
