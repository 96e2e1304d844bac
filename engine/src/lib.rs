pub mod config;
pub mod events;
pub mod matching;
pub mod order_service;
pub mod reservation;
pub mod validation;

pub use config::EngineConfig;
pub use events::{EngineEvent, EventBus};
pub use order_service::OrderService;
