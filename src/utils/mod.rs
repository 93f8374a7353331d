pub mod error;
pub mod logging;
pub mod phone;

pub use error::*;
pub use phone::{clean_phone, normalize_phone};
