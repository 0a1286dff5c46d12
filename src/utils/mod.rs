//! Shared utilities: data rates, simulated time, input validation.

pub mod rate;
pub mod time;
pub mod validation;

pub use rate::{DataRate, DataRateError};
pub use time::{periodic_instants, SimTime};
pub use validation::{inspect_matrix, MatrixReport};
