//! Domain services for CollarTrack.
//!
//! Services contain business logic seams that operate on domain models.

pub mod notification;

pub use notification::{
    MockPushSender, PushError, PushNotification, PushRecipient, PushSender,
};
