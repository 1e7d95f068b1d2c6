// Domain layer: binding types and the ports (model, element access, validity hook).

pub mod model;
pub mod ports;
