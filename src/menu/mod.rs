pub mod cost_calculator;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

pub use cost_calculator::*;
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use repository::*;
