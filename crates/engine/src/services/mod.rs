//! Engine services.

pub mod alerts;
pub mod dispatch;
pub mod ingest;
pub mod push;

pub use alerts::AlertLifecycleManager;
pub use dispatch::{NotificationDispatcher, Subscription};
pub use ingest::PositionIngestor;
pub use push::HttpPushSender;
