mod caption;
mod chat;
mod health;
mod metrics;

pub use caption::caption_handler;
pub use chat::{CHAT_FAILURE_MESSAGE, chat_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
