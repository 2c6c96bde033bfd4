// Domain layer: attribute model and the output port.

pub mod model;
pub mod ports;
