pub mod api_observability;
pub mod app_config;
pub mod dispatcher_worker;

pub use api_observability::*;
pub use app_config::*;
pub use dispatcher_worker::*;
