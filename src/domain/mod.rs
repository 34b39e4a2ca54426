// Domain layer: value types and the ports the reporting engine depends on.

pub mod model;
pub mod ports;
