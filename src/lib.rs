pub mod adapters;
pub mod config;
pub mod domain;
pub mod utils;

pub use adapters::{Endicia, FedEx, RestPostage};
pub use config::{CarrierSettings, EndiciaConfig, FedExConfig, RestPostageConfig};
pub use domain::measure::{Length, Weight};
pub use domain::model::{
    DeleteResponse, Location, Package, RateEstimate, RateResponse, RefundResponse,
    ShipResponse, ShipmentEvent, TrackingResponse,
};
pub use domain::ports::{Carrier, CarrierDescriptor};
pub use utils::error::{CarrierError, Result};
