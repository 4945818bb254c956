//! Administrator notifications.
//!
//! Request events are queued by [`NotificationHandle`] and delivered by a
//! single background worker to every configured administrator chat.
//!
//! - **message**: HTML rendering of a [`RequestEvent`](crate::domain::RequestEvent)
//! - **dispatcher**: the [`Notifier`] sink trait, fan-out and the worker
//! - **telegram**: [`TelegramNotifier`] over the Bot API

pub mod dispatcher;
pub mod message;
pub mod telegram;

pub use dispatcher::{
    spawn_dispatcher, DeliveryReport, LogNotifier, NotificationDispatcher, NotificationHandle,
    Notifier, NotifyError,
};
pub use message::render_event;
pub use telegram::TelegramNotifier;
