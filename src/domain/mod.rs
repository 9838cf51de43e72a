// Domain layer: core models, tagged raw records and ports (interfaces).

pub mod contact;
pub mod model;
pub mod ports;
pub mod record;
