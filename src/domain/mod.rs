// Domain layer: request/response models and the provider port.

pub mod model;
pub mod ports;
