// Adapters layer: one module per carrier wire protocol.

pub mod endicia;
pub mod fedex;
pub mod rest_postage;

pub use endicia::Endicia;
pub use fedex::FedEx;
pub use rest_postage::RestPostage;
