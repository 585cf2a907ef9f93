//! FedEx code tables and the arithmetic built on them.

use crate::domain::model::{Location, Package};
use crate::domain::measure::Axis;
use chrono::{DateTime, NaiveDateTime, Utc};

const SERVICE_TYPES: &[(&str, &str)] = &[
    ("PRIORITY_OVERNIGHT", "FedEx Priority Overnight"),
    ("PRIORITY_OVERNIGHT_SATURDAY_DELIVERY", "FedEx Priority Overnight Saturday Delivery"),
    ("FEDEX_2_DAY", "FedEx 2 Day"),
    ("FEDEX_2_DAY_SATURDAY_DELIVERY", "FedEx 2 Day Saturday Delivery"),
    ("STANDARD_OVERNIGHT", "FedEx Standard Overnight"),
    ("FIRST_OVERNIGHT", "FedEx First Overnight"),
    ("FIRST_OVERNIGHT_SATURDAY_DELIVERY", "FedEx First Overnight Saturday Delivery"),
    ("FEDEX_EXPRESS_SAVER", "FedEx Express Saver"),
    ("FEDEX_1_DAY_FREIGHT", "FedEx 1 Day Freight"),
    ("FEDEX_1_DAY_FREIGHT_SATURDAY_DELIVERY", "FedEx 1 Day Freight Saturday Delivery"),
    ("FEDEX_2_DAY_FREIGHT", "FedEx 2 Day Freight"),
    ("FEDEX_2_DAY_FREIGHT_SATURDAY_DELIVERY", "FedEx 2 Day Freight Saturday Delivery"),
    ("FEDEX_3_DAY_FREIGHT", "FedEx 3 Day Freight"),
    ("FEDEX_3_DAY_FREIGHT_SATURDAY_DELIVERY", "FedEx 3 Day Freight Saturday Delivery"),
    ("INTERNATIONAL_PRIORITY", "FedEx International Priority"),
    ("INTERNATIONAL_PRIORITY_SATURDAY_DELIVERY", "FedEx International Priority Saturday Delivery"),
    ("INTERNATIONAL_ECONOMY", "FedEx International Economy"),
    ("INTERNATIONAL_FIRST", "FedEx International First"),
    ("INTERNATIONAL_PRIORITY_FREIGHT", "FedEx International Priority Freight"),
    ("INTERNATIONAL_ECONOMY_FREIGHT", "FedEx International Economy Freight"),
    ("GROUND_HOME_DELIVERY", "FedEx Ground Home Delivery"),
    ("FEDEX_GROUND", "FedEx Ground"),
    ("INTERNATIONAL_GROUND", "FedEx International Ground"),
];

const TRANSIT_TIMES: &[(&str, i64)] = &[
    ("ONE_DAY", 1),
    ("TWO_DAYS", 2),
    ("THREE_DAYS", 3),
    ("FOUR_DAYS", 4),
    ("FIVE_DAYS", 5),
    ("SIX_DAYS", 6),
    ("SEVEN_DAYS", 7),
    ("EIGHT_DAYS", 8),
    ("NINE_DAYS", 9),
    ("TEN_DAYS", 10),
    ("ELEVEN_DAYS", 11),
    ("TWELVE_DAYS", 12),
    ("THIRTEEN_DAYS", 13),
    ("FOURTEEN_DAYS", 14),
    ("FIFTEEN_DAYS", 15),
    ("SIXTEEN_DAYS", 16),
    ("SEVENTEEN_DAYS", 17),
    ("EIGHTEEN_DAYS", 18),
    ("NINETEEN_DAYS", 19),
    ("TWENTY_DAYS", 20),
];

/// Day count for the `UNKNOWN` bucket and for buckets this table does not know.
pub const UNKNOWN_TRANSIT_DAYS: i64 = 100;

/// Service quoted as a transit bucket instead of a delivery timestamp.
pub const GROUND_SERVICE: &str = "FEDEX_GROUND";

const IMPERIAL_COUNTRIES: [&str; 3] = ["US", "LR", "MM"];

/// Display name for a service code. Unknown codes are title-cased from the
/// code itself, e.g. `FEDEX_SMART_POST` -> `FedEx Smart Post`.
pub fn service_name_for_code(service_code: &str) -> String {
    if let Some((_, name)) = SERVICE_TYPES.iter().find(|(code, _)| *code == service_code) {
        return (*name).to_string();
    }

    let name = service_code
        .to_lowercase()
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    format!("FedEx {}", name.replacen("Fedex ", "", 1))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn transit_days(bucket: &str) -> i64 {
    TRANSIT_TIMES
        .iter()
        .find(|(name, _)| *name == bucket)
        .map(|(_, days)| *days)
        .unwrap_or(UNKNOWN_TRANSIT_DAYS)
}

/// Ground quotes use the transit bucket as-is. Other services carry an
/// absolute delivery timestamp: whole days from `now`, plus one.
pub fn delivery_days(
    service_code: &str,
    transit_time: &str,
    delivery_timestamp: &str,
    now: DateTime<Utc>,
) -> Option<i64> {
    if service_code == GROUND_SERVICE {
        if transit_time.is_empty() {
            return None;
        }
        return Some(transit_days(transit_time));
    }

    let delivery = parse_timestamp(delivery_timestamp)?;
    let seconds = (delivery - now).num_seconds() as f64;
    Some((seconds / 86_400.0).round() as i64 + 1)
}

/// Reads a FedEx timestamp. Offsets are honoured when present; zoneless values are UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Reads an event timestamp keeping the wall-clock fields and discarding any offset.
pub fn parse_zoneless_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_local().and_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// FedEx reports sterling as `UKL`.
pub fn normalize_currency(currency: &str) -> String {
    if currency.to_ascii_uppercase().contains("UKL") {
        "GBP".to_string()
    } else {
        currency.to_string()
    }
}

/// Weight and length units for a shipment, chosen by the origin country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Imperial,
    Metric,
}

impl UnitSystem {
    pub fn for_origin(origin: &Location) -> Self {
        if IMPERIAL_COUNTRIES.contains(&origin.country_code()) {
            UnitSystem::Imperial
        } else {
            UnitSystem::Metric
        }
    }

    pub fn weight_units(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "LB",
            UnitSystem::Metric => "KG",
        }
    }

    pub fn length_units(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "IN",
            UnitSystem::Metric => "CM",
        }
    }

    pub fn weight(self, package: &Package) -> f64 {
        match self {
            UnitSystem::Imperial => package.pounds(),
            UnitSystem::Metric => package.kilograms(),
        }
    }

    pub fn length(self, package: &Package, axis: Axis) -> f64 {
        match self {
            UnitSystem::Imperial => package.inches(axis),
            UnitSystem::Metric => package.centimeters(axis),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropoffType {
    #[default]
    RegularPickup,
    RequestCourier,
    DropBox,
    BusinessServiceCenter,
    Station,
}

impl DropoffType {
    pub fn code(self) -> &'static str {
        match self {
            DropoffType::RegularPickup => "REGULAR_PICKUP",
            DropoffType::RequestCourier => "REQUEST_COURIER",
            DropoffType::DropBox => "DROP_BOX",
            DropoffType::BusinessServiceCenter => "BUSINESS_SERVICE_CENTER",
            DropoffType::Station => "STATION",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackagingType {
    FedexEnvelope,
    FedexPak,
    FedexBox,
    FedexTube,
    Fedex10KgBox,
    Fedex25KgBox,
    #[default]
    YourPackaging,
}

impl PackagingType {
    pub fn code(self) -> &'static str {
        match self {
            PackagingType::FedexEnvelope => "FEDEX_ENVELOPE",
            PackagingType::FedexPak => "FEDEX_PAK",
            PackagingType::FedexBox => "FEDEX_BOX",
            PackagingType::FedexTube => "FEDEX_TUBE",
            PackagingType::Fedex10KgBox => "FEDEX_10KG_BOX",
            PackagingType::Fedex25KgBox => "FEDEX_25KG_BOX",
            PackagingType::YourPackaging => "YOUR_PACKAGING",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackageIdentifierType {
    #[default]
    TrackingNumber,
    DoorTag,
    Rma,
    GroundShipmentId,
    GroundInvoiceNumber,
    GroundCustomerReference,
    GroundPo,
    ExpressReference,
    ExpressMpsMaster,
}

impl PackageIdentifierType {
    pub fn code(self) -> &'static str {
        match self {
            PackageIdentifierType::TrackingNumber | PackageIdentifierType::DoorTag => {
                "TRACKING_NUMBER_OR_DOORTAG"
            }
            PackageIdentifierType::Rma => "RMA",
            PackageIdentifierType::GroundShipmentId => "GROUND_SHIPMENT_ID",
            PackageIdentifierType::GroundInvoiceNumber => "GROUND_INVOICE_NUMBER",
            PackageIdentifierType::GroundCustomerReference => "GROUND_CUSTOMER_REFERENCE",
            PackageIdentifierType::GroundPo => "GROUND_PO",
            PackageIdentifierType::ExpressReference => "EXPRESS_REFERENCE",
            PackageIdentifierType::ExpressMpsMaster => "EXPRESS_MPS_MASTER",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionControl {
    #[default]
    DeleteAllPackages,
    DeleteOnePackage,
    Legacy,
}

impl DeletionControl {
    pub fn code(self) -> &'static str {
        match self {
            DeletionControl::DeleteAllPackages => "DELETE_ALL_PACKAGES",
            DeletionControl::DeleteOnePackage => "DELETE_ONE_PACKAGE",
            DeletionControl::Legacy => "LEGACY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::measure::{Length, Weight};
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_known_service_names_come_from_table() {
        for (code, name) in SERVICE_TYPES {
            assert_eq!(service_name_for_code(code), *name);
        }
    }

    #[test]
    fn test_unknown_service_names_are_derived() {
        assert_eq!(service_name_for_code("SMART_POST"), "FedEx Smart Post");
        assert_eq!(service_name_for_code("FEDEX_FREIGHT_ECONOMY"), "FedEx Freight Economy");
        assert_eq!(
            service_name_for_code("FEDEX_FREIGHT_ECONOMY"),
            service_name_for_code("FEDEX_FREIGHT_ECONOMY")
        );
    }

    #[test]
    fn test_ground_delivery_days_use_transit_bucket() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
        assert_eq!(delivery_days("FEDEX_GROUND", "THREE_DAYS", "", now), Some(3));
        assert_eq!(delivery_days("FEDEX_GROUND", "UNKNOWN", "", now), Some(100));
        assert_eq!(delivery_days("FEDEX_GROUND", "", "", now), None);
    }

    #[test]
    fn test_timestamp_delivery_days_add_one() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
        let in_two_days = (now + Duration::days(2)).format("%Y-%m-%dT%H:%M:%S").to_string();
        assert_eq!(delivery_days("PRIORITY_OVERNIGHT", "", &in_two_days, now), Some(3));
        assert_eq!(
            delivery_days("FEDEX_2_DAY", "", "2024-05-07T10:30:00-04:00", now),
            Some(2)
        );
        assert_eq!(delivery_days("FEDEX_2_DAY", "", "", now), None);
    }

    #[test]
    fn test_unit_selection_by_origin() {
        let package = Package::new(
            Weight::from_pounds(2.0),
            [
                Length::from_inches(1.0),
                Length::from_inches(1.0),
                Length::from_inches(1.0),
            ],
        );

        let us = UnitSystem::for_origin(&Location::new("US"));
        assert_eq!(us, UnitSystem::Imperial);
        assert_eq!(us.weight_units(), "LB");
        assert!((us.weight(&package) - 2.0).abs() < 1e-9);

        let de = UnitSystem::for_origin(&Location::new("DE"));
        assert_eq!(de, UnitSystem::Metric);
        assert_eq!(de.weight_units(), "KG");
        assert_eq!(de.length_units(), "CM");
        assert!((de.weight(&package) - 0.907_184_74).abs() < 1e-9);

        assert_eq!(UnitSystem::for_origin(&Location::new("MM")), UnitSystem::Imperial);
    }

    #[test]
    fn test_currency_and_timestamps() {
        assert_eq!(normalize_currency("UKL"), "GBP");
        assert_eq!(normalize_currency("USD"), "USD");
        let event = parse_zoneless_timestamp("2024-03-01T14:05:00-05:00").unwrap();
        assert_eq!(event, Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 0).unwrap());
    }
}
