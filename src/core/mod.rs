pub mod error;
pub mod value;

pub use error::{MigrationError, Result};
pub use value::{CoercionError, Numeric, parse_integer};
