pub mod error;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod services;
pub mod settings;

pub use error::AppError;
pub use models::events::WorkerEvent;
pub use models::result::ResultRow;
