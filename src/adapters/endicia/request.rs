//! SOAP request bodies for the Endicia label service.

use super::{EndiciaLabelOptions, EndiciaRateOptions};
use crate::config::EndiciaConfig;
use crate::domain::measure::Axis;
use crate::domain::model::{format_amount, Location, Package};
use crate::utils::xml::XmlBuilder;

pub const SERVICE_NAMESPACE: &str = "www.envmgr.com/LabelService";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Partner id the sandbox expects regardless of account.
const TEST_REQUESTER_ID: &str = "lxxx";
const REQUEST_ID: &str = "1";
const PARTNER_TRANSACTION_ID: &str = "1";

/// Credentials and mode shared by every request body.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub config: &'a EndiciaConfig,
    pub test: bool,
}

impl RequestContext<'_> {
    fn requester_id(&self) -> &str {
        if self.test {
            TEST_REQUESTER_ID
        } else {
            &self.config.requester_id
        }
    }

    fn token(&self) -> Option<&str> {
        self.config
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }

    /// Token when one was issued, account id and pass phrase otherwise. Never both.
    fn credentials(&self, xml: &mut XmlBuilder) {
        match self.token() {
            Some(token) => {
                xml.leaf("Token", token);
            }
            None => {
                xml.leaf("AccountID", self.config.account_id.as_deref().unwrap_or_default());
                xml.leaf("PassPhrase", self.config.passphrase.as_deref().unwrap_or_default());
            }
        }
    }

    fn certified_intermediary(&self, xml: &mut XmlBuilder) {
        xml.element("CertifiedIntermediary", &[], |xml| self.credentials(xml));
    }
}

/// Wraps one operation element in the SOAP envelope.
fn envelope<F>(operation: &str, body: F) -> String
where
    F: FnOnce(&mut XmlBuilder),
{
    let mut xml = XmlBuilder::new();
    xml.element(
        "soap:Envelope",
        &[
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xmlns:xsd", XSD_NAMESPACE),
            ("xmlns:soap", SOAP_NAMESPACE),
        ],
        |xml| {
            xml.element("soap:Body", &[], |xml| {
                xml.element(operation, &[("xmlns", SERVICE_NAMESPACE)], body);
            });
        },
    );
    xml.finish()
}

pub fn soap_action(operation: &str) -> String {
    format!("{}/{}", SERVICE_NAMESPACE, operation)
}

pub fn build_change_pass_phrase_request(
    context: &RequestContext<'_>,
    new_phrase: &str,
    request_token: bool,
) -> String {
    let token_requested = request_token.to_string();
    envelope("ChangePassPhrase", |xml| {
        xml.element(
            "ChangePassPhraseRequest",
            &[("TokenRequested", token_requested.as_str())],
            |xml| {
                xml.leaf("RequesterID", context.requester_id());
                xml.leaf("RequestID", REQUEST_ID);
                context.certified_intermediary(xml);
                xml.leaf("NewPassPhrase", new_phrase);
            },
        );
    })
}

pub fn build_buy_postage_request(context: &RequestContext<'_>, amount_cents: i64) -> String {
    envelope("BuyPostage", |xml| {
        xml.element("RecreditRequest", &[], |xml| {
            xml.leaf("RequesterID", context.requester_id());
            xml.leaf("RequestID", REQUEST_ID);
            context.certified_intermediary(xml);
            xml.leaf("RecreditAmount", format_amount(amount_cents));
        });
    })
}

pub fn build_account_status_request(context: &RequestContext<'_>) -> String {
    envelope("GetAccountStatus", |xml| {
        xml.element("AccountStatusRequest", &[], |xml| {
            xml.leaf("RequesterID", context.requester_id());
            xml.leaf("RequestID", REQUEST_ID);
            context.certified_intermediary(xml);
        });
    })
}

pub fn build_calculate_postage_rates_request(
    context: &RequestContext<'_>,
    origin: &Location,
    destination: &Location,
    package: &Package,
    options: &EndiciaRateOptions,
) -> String {
    let mail_class = options
        .mail_class
        .clone()
        .unwrap_or_else(|| default_mail_class(destination).to_string());

    envelope("CalculatePostageRates", |xml| {
        xml.element("PostageRatesRequest", &[("ResponseVersion", "0")], |xml| {
            xml.leaf("RequesterID", context.requester_id());
            context.certified_intermediary(xml);
            xml.leaf("MailClass", &mail_class);
            xml.leaf("WeightOz", package.ounces().round());
            xml.leaf("MailpieceShape", &options.mailpiece_shape);
            dimensions(xml, package);
            xml.leaf("FromCountryCode", origin.country_code());
            xml.leaf("FromPostalCode", origin.postal_code());
            xml.leaf("ToPostalCode", destination.postal_code());
            xml.leaf("ToCountryCode", destination.country_code());
        });
    })
}

pub fn build_get_postage_label_request(
    context: &RequestContext<'_>,
    origin: &Location,
    destination: &Location,
    package: &Package,
    options: &EndiciaLabelOptions,
) -> String {
    let international = !is_domestic(destination);
    let test_flag = if context.test { "YES" } else { "NO" };
    let label_type = options.resolved_label_type(destination);
    let label_subtype = options.resolved_label_subtype(destination);

    let mut attributes = vec![("Test", test_flag), ("LabelType", label_type.as_str())];
    if let Some(subtype) = label_subtype.as_deref() {
        attributes.push(("LabelSubtype", subtype));
    }
    attributes.extend([
        ("LabelSize", options.label_size.as_str()),
        ("ImageFormat", options.image_format.as_str()),
        ("ImageResolution", options.image_resolution.as_str()),
        ("ImageRotation", options.image_rotation.as_str()),
    ]);

    let weight_oz = package.ounces().round();
    let signer = options
        .customs
        .signer
        .clone()
        .unwrap_or_else(|| origin.name().to_string());

    envelope("GetPostageLabel", |xml| {
        xml.element("LabelRequest", &attributes, |xml| {
            xml.leaf("RequesterID", context.requester_id());
            context.credentials(xml);
            xml.leaf("MailClass", &options.service);
            if international {
                xml.leaf("CustomsCertify", "TRUE");
                xml.leaf("CustomsSigner", &signer);
                xml.leaf(
                    "CustomsSendersCopy",
                    if options.customs.senders_copy { "TRUE" } else { "FALSE" },
                );
                xml.element("CustomsInfo", &[], |xml| {
                    xml.leaf("ContentsType", &options.customs.contents_type);
                    xml.element("CustomsItems", &[], |xml| {
                        xml.element("CustomsItem", &[], |xml| {
                            xml.leaf("Description", &options.customs.description);
                            xml.leaf("Quantity", 1);
                            xml.leaf("Weight", weight_oz);
                            xml.leaf("Value", format_amount(package.value()));
                            xml.leaf("CountryOfOrigin", &options.customs.country_of_origin);
                        });
                    });
                });
            }
            xml.leaf("WeightOz", weight_oz);
            xml.leaf("MailpieceShape", package.package_type().unwrap_or("Parcel"));
            dimensions(xml, package);
            if let Some(order_number) = options.order_number.as_deref().filter(|n| !n.is_empty()) {
                xml.leaf("Description", format!("Order#{}", order_number));
            }
            xml.leaf("PartnerTransactionID", PARTNER_TRANSACTION_ID);

            xml.leaf_present("FromName", origin.name());
            xml.leaf_present("FromCompany", origin.company());
            xml.leaf_present("ReturnAddress1", origin.address1());
            xml.leaf_present("ReturnAddress2", origin.address2());
            xml.leaf_present("ReturnAddress3", origin.address3());
            xml.leaf_present("FromCity", origin.city());
            xml.leaf_present("FromState", origin.state());
            xml.leaf_present("FromPostalCode", origin.postal_code());
            xml.leaf_present("FromPhone", &strip_phone(origin.phone()));

            xml.leaf_present("ToName", destination.name());
            xml.leaf_present("ToCompany", destination.company());
            xml.leaf_present("ToAddress1", destination.address1());
            xml.leaf_present("ToAddress2", destination.address2());
            xml.leaf_present("ToAddress3", destination.address3());
            xml.leaf_present("ToCity", destination.city());
            xml.leaf_present("ToState", destination.state());
            xml.leaf_present("ToPostalCode", destination.postal_code());
            xml.leaf_present("ToCountryCode", destination.country_code());
            xml.leaf_present("ToPhone", &strip_phone(destination.phone()));
        });
    })
}

pub fn build_get_refund_request(context: &RequestContext<'_>, pic_number: &str) -> String {
    envelope("GetRefund", |xml| {
        xml.element("RefundRequest", &[], |xml| {
            xml.leaf("RequesterID", context.requester_id());
            xml.leaf("RequestID", REQUEST_ID);
            context.certified_intermediary(xml);
            xml.element("PicNumbers", &[], |xml| {
                xml.leaf("PicNumber", pic_number);
            });
        });
    })
}

pub fn is_domestic(destination: &Location) -> bool {
    destination.country_code() == "US"
}

pub fn default_mail_class(destination: &Location) -> &'static str {
    if is_domestic(destination) {
        "Domestic"
    } else {
        "International"
    }
}

fn dimensions(xml: &mut XmlBuilder, package: &Package) {
    xml.element("MailpieceDimensions", &[], |xml| {
        for axis in Axis::ALL {
            xml.leaf(axis.label(), crate::domain::measure::round3(package.inches(axis)));
        }
    });
}

fn strip_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '-' | ' '))
        .collect()
}
