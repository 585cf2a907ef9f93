// Domain layer: carrier-independent value types and the carrier contract.

pub mod measure;
pub mod model;
pub mod ports;
