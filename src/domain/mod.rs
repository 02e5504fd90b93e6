// Domain layer: DTOs, model wire types and ports. No HTTP or filesystem code here.

pub mod generation;
pub mod model;
pub mod ports;
