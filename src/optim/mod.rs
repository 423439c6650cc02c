pub mod rprop;
pub mod sgd;
pub mod weight_update;

pub use rprop::{RpropCell, RpropConfig, RpropState};
pub use sgd::Sgd;
pub use weight_update::WeightUpdate;
