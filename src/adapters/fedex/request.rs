//! Request documents, one builder per FedEx operation.

use super::service::UnitSystem;
use super::{FedExDeleteOptions, FedExRateOptions, FedExShipOptions, FedExTrackingOptions};
use crate::config::FedExConfig;
use crate::domain::measure::{round3, Axis};
use crate::domain::model::{format_amount, Location, Package};
use crate::utils::xml::XmlBuilder;
use chrono::{DateTime, SecondsFormat, Utc};

pub const RATE_NAMESPACE: &str = "http://fedex.com/ws/rate/v12";
pub const SHIP_NAMESPACE: &str = "http://fedex.com/ws/ship/v12";
pub const TRACK_NAMESPACE: &str = "http://fedex.com/ws/track/v3";

const CUSTOMER_TRANSACTION_ID: &str = "Omniship";

/// Position of one package inside a multi-piece shipment.
#[derive(Debug, Clone, Copy)]
pub struct ShipSequence<'a> {
    pub package_count: usize,
    /// 1-based.
    pub package_number: usize,
    /// Tracking number returned for the first package, once known.
    pub master_tracking_id: Option<&'a str>,
}

pub fn build_rate_request(
    config: &FedExConfig,
    origin: &Location,
    destination: &Location,
    package: &Package,
    options: &FedExRateOptions,
    now: DateTime<Utc>,
) -> String {
    let units = UnitSystem::for_origin(origin);

    let mut xml = XmlBuilder::new();
    xml.element("RateRequest", &[("xmlns", RATE_NAMESPACE)], |xml| {
        access_block(xml, config);
        version_block(xml, "crs", "12");
        xml.leaf("ReturnTransitAndCommit", options.return_transit_and_commit);
        xml.leaf("VariableOptions", "SATURDAY_DELIVERY");
        xml.element("RequestedShipment", &[], |xml| {
            xml.leaf("ShipTimestamp", timestamp(options.ship_date.unwrap_or(now)));
            xml.leaf("DropoffType", options.dropoff_type.code());
            xml.leaf("PackagingType", options.packaging_type.code());
            parties(xml, origin, destination, options.shipper.as_ref());
            xml.leaf("RateRequestTypes", "ACCOUNT");
            xml.leaf("PackageCount", 1);
            xml.element("RequestedPackageLineItems", &[], |xml| {
                xml.leaf("SequenceNumber", 1);
                xml.leaf("GroupPackageCount", 1);
                weight_node(xml, units, package);
                if options.include_dimensions {
                    dimensions_node(xml, units, package);
                }
                signature_services(xml, options.without_signature);
            });
        });
    });
    xml.finish()
}

pub fn build_ship_request(
    config: &FedExConfig,
    origin: &Location,
    destination: &Location,
    package: &Package,
    options: &FedExShipOptions,
    sequence: &ShipSequence<'_>,
    now: DateTime<Utc>,
) -> String {
    let units = UnitSystem::for_origin(origin);
    let payment_type = if options.receiver_pays { "RECIPIENT" } else { "SENDER" };
    let payor_account = options
        .receiver_account
        .as_deref()
        .unwrap_or(config.account.as_str());
    let declared_value = format_amount(package.value());

    let mut xml = XmlBuilder::new();
    xml.element("ProcessShipmentRequest", &[("xmlns", SHIP_NAMESPACE)], |xml| {
        access_block(xml, config);
        version_block(xml, "ship", "12");
        xml.element("RequestedShipment", &[], |xml| {
            xml.leaf("ShipTimestamp", timestamp(options.ship_date.unwrap_or(now)));
            xml.leaf("DropoffType", options.dropoff_type.code());
            xml.leaf(
                "ServiceType",
                options.service_type.as_deref().unwrap_or("GROUND_HOME_DELIVERY"),
            );
            xml.leaf("PackagingType", options.packaging_type.code());
            parties(xml, origin, destination, options.shipper.as_ref());
            xml.element("ShippingChargesPayment", &[], |xml| {
                xml.leaf("PaymentType", payment_type);
                xml.element("Payor", &[], |xml| {
                    xml.element("ResponsibleParty", &[], |xml| {
                        xml.leaf("AccountNumber", payor_account);
                        xml.empty("Contact");
                    });
                });
            });
            shipment_special_services(xml, config, options);
            xml.element("CustomsClearanceDetail", &[], |xml| {
                xml.element("DutiesPayment", &[], |xml| {
                    xml.leaf("PaymentType", payment_type);
                    xml.element("Payor", &[], |xml| {
                        xml.element("ResponsibleParty", &[], |xml| {
                            xml.leaf("AccountNumber", payor_account);
                            xml.element("Contact", &[], |xml| {
                                xml.leaf("PersonName", origin.name());
                            });
                        });
                    });
                });
                xml.element("CustomsValue", &[], |xml| {
                    xml.leaf("Currency", "USD");
                    xml.leaf("Amount", &declared_value);
                });
                xml.element("Commodities", &[], |xml| {
                    xml.leaf("Name", &options.commodity.name);
                    xml.leaf("NumberOfPieces", 1);
                    xml.leaf("Description", &options.commodity.description);
                    xml.leaf("CountryOfManufacture", &options.commodity.country_of_manufacture);
                    xml.element("Weight", &[], |xml| {
                        xml.leaf("Units", "LB");
                        xml.leaf("Value", round3(package.pounds()));
                    });
                    xml.leaf("Quantity", 1);
                    xml.leaf("QuantityUnits", "EA");
                    xml.element("UnitPrice", &[], |xml| {
                        xml.leaf("Currency", "USD");
                        xml.leaf("Amount", &declared_value);
                    });
                });
            });
            xml.element("LabelSpecification", &[], |xml| {
                xml.leaf("LabelFormatType", "COMMON2D");
                xml.leaf("ImageType", "PNG");
                xml.leaf("LabelStockType", "PAPER_4X8");
            });
            xml.leaf("RateRequestTypes", "ACCOUNT");
            if let Some(master) = sequence.master_tracking_id.filter(|id| !id.is_empty()) {
                xml.element("MasterTrackingId", &[], |xml| {
                    xml.leaf("TrackingIdType", "FEDEX");
                    xml.leaf("TrackingNumber", master);
                });
            }
            xml.leaf("PackageCount", sequence.package_count);
            xml.element("RequestedPackageLineItems", &[], |xml| {
                xml.leaf("SequenceNumber", sequence.package_number);
                weight_node(xml, units, package);
                if options.include_dimensions {
                    dimensions_node(xml, units, package);
                }
                signature_services(xml, options.without_signature);
            });
        });
    });
    xml.finish()
}

pub fn build_delete_request(
    config: &FedExConfig,
    tracking_number: &str,
    shipment_type: &str,
    options: &FedExDeleteOptions,
) -> String {
    let mut xml = XmlBuilder::new();
    xml.element("DeleteShipmentRequest", &[("xmlns", SHIP_NAMESPACE)], |xml| {
        access_block(xml, config);
        version_block(xml, "ship", "12");
        if let Some(ship_timestamp) = options.ship_timestamp {
            xml.leaf("ShipTimestamp", timestamp(ship_timestamp));
        }
        xml.element("TrackingId", &[], |xml| {
            xml.leaf("TrackingIdType", shipment_type);
            xml.leaf("TrackingNumber", tracking_number);
        });
        xml.leaf("DeletionControl", options.deletion_control.code());
    });
    xml.finish()
}

pub fn build_tracking_request(
    config: &FedExConfig,
    tracking_number: &str,
    options: &FedExTrackingOptions,
) -> String {
    let mut xml = XmlBuilder::new();
    xml.element("TrackRequest", &[("xmlns", TRACK_NAMESPACE)], |xml| {
        access_block(xml, config);
        version_block(xml, "trck", "3");
        xml.element("PackageIdentifier", &[], |xml| {
            xml.leaf("Value", tracking_number);
            xml.leaf("Type", options.package_identifier_type.code());
        });
        if let Some(begin) = options.ship_date_range_begin {
            xml.leaf("ShipDateRangeBegin", begin.format("%Y-%m-%d"));
        }
        if let Some(end) = options.ship_date_range_end {
            xml.leaf("ShipDateRangeEnd", end.format("%Y-%m-%d"));
        }
        xml.leaf("IncludeDetailedScans", 1);
    });
    xml.finish()
}

fn access_block(xml: &mut XmlBuilder, config: &FedExConfig) {
    xml.element("WebAuthenticationDetail", &[], |xml| {
        xml.element("UserCredential", &[], |xml| {
            xml.leaf("Key", &config.key);
            xml.leaf("Password", &config.password);
        });
    });
    xml.element("ClientDetail", &[], |xml| {
        xml.leaf("AccountNumber", &config.account);
        xml.leaf("MeterNumber", &config.meter);
    });
    xml.element("TransactionDetail", &[], |xml| {
        xml.leaf("CustomerTransactionId", CUSTOMER_TRANSACTION_ID);
    });
}

fn version_block(xml: &mut XmlBuilder, service_id: &str, major: &str) {
    xml.element("Version", &[], |xml| {
        xml.leaf("ServiceId", service_id);
        xml.leaf("Major", major);
        xml.leaf("Intermediate", "0");
        xml.leaf("Minor", "0");
    });
}

/// Shipper and recipient; a distinct shipper moves `origin` into its own node.
fn parties(
    xml: &mut XmlBuilder,
    origin: &Location,
    destination: &Location,
    shipper: Option<&Location>,
) {
    location_node(xml, "Shipper", shipper.unwrap_or(origin));
    location_node(xml, "Recipient", destination);
    if shipper.is_some_and(|shipper| shipper != origin) {
        location_node(xml, "Origin", origin);
    }
}

fn location_node(xml: &mut XmlBuilder, name: &str, location: &Location) {
    xml.element(name, &[], |xml| {
        xml.element("Contact", &[], |xml| {
            xml.leaf_present("PersonName", location.name());
            xml.leaf_present("CompanyName", location.company());
            xml.leaf("PhoneNumber", location.phone());
        });
        xml.element("Address", &[], |xml| {
            xml.leaf("StreetLines", location.address1());
            xml.leaf_present("StreetLines", location.address2());
            xml.leaf("City", location.city());
            xml.leaf("StateOrProvinceCode", location.state());
            xml.leaf("PostalCode", location.postal_code());
            xml.leaf("CountryCode", location.country_code());
            if !location.is_residential() {
                xml.leaf("Residential", false);
            }
        });
    });
}

fn weight_node(xml: &mut XmlBuilder, units: UnitSystem, package: &Package) {
    xml.element("Weight", &[], |xml| {
        xml.leaf("Units", units.weight_units());
        xml.leaf("Value", round3(units.weight(package)));
    });
}

fn dimensions_node(xml: &mut XmlBuilder, units: UnitSystem, package: &Package) {
    xml.element("Dimensions", &[], |xml| {
        for axis in Axis::ALL {
            xml.leaf(axis.label(), round3(units.length(package, axis)));
        }
        xml.leaf("Units", units.length_units());
    });
}

fn signature_services(xml: &mut XmlBuilder, without_signature: bool) {
    xml.element("SpecialServicesRequested", &[], |xml| {
        if without_signature {
            xml.leaf("SpecialServiceTypes", "SIGNATURE_OPTION");
            xml.element("SignatureOptionDetail", &[], |xml| {
                xml.leaf("OptionType", "NO_SIGNATURE_REQUIRED");
            });
        }
    });
}

/// Shipment-level services. Service types precede their detail blocks.
fn shipment_special_services(
    xml: &mut XmlBuilder,
    config: &FedExConfig,
    options: &FedExShipOptions,
) {
    let notify = !config.notifications.is_empty();
    xml.element("SpecialServicesRequested", &[], |xml| {
        if options.saturday_delivery {
            xml.leaf("SpecialServiceTypes", "SATURDAY_DELIVERY");
        }
        if options.return_shipment {
            xml.leaf("SpecialServiceTypes", "RETURN_SHIPMENT");
        }
        if notify {
            xml.leaf("SpecialServiceTypes", "EMAIL_NOTIFICATION");
        }
        if options.return_shipment {
            xml.element("ReturnShipmentDetail", &[], |xml| {
                xml.leaf("ReturnType", "PRINT_RETURN_LABEL");
            });
        }
        if notify {
            xml.element("EMailNotificationDetail", &[], |xml| {
                if let Some(aggregation) = &config.notification_aggregation_type {
                    xml.leaf("AggregationType", aggregation);
                }
                xml.empty("PersonalMessage");
                for email in &config.notifications {
                    xml.element("Recipients", &[], |xml| {
                        xml.leaf("EMailAddress", &email.address);
                        let events = [
                            (email.on_delivery, "ON_DELIVERY"),
                            (email.on_exception, "ON_EXCEPTION"),
                            (email.on_shipment, "ON_SHIPMENT"),
                            (email.on_tender, "ON_TENDER"),
                        ];
                        for (_, event) in events.iter().filter(|(wanted, _)| *wanted) {
                            xml.leaf("NotificationEventsRequested", event);
                        }
                        xml.leaf("Format", email.format.as_deref().unwrap_or("HTML"));
                        xml.element("Localization", &[], |xml| {
                            xml.leaf("LanguageCode", email.language.as_deref().unwrap_or("EN"));
                            if let Some(locale) = &email.locale_code {
                                xml.leaf("LocaleCode", locale);
                            }
                        });
                    });
                }
            });
        }
    });
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, false)
}
