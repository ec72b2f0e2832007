// Domain layer: content records and the ports the catalog talks through.

pub mod model;
pub mod ports;
