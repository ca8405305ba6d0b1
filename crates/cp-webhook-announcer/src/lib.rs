//! # Webhook Announcer
//!
//! Fans processed announcements out to registered webhook subscribers.
//!
//! ```text
//! AnnouncementResponse ──→ resolve endpoints (schema, category, per-request)
//!                     ──→ POST to every endpoint concurrently
//!                     ──→ report: delivered everywhere, or which failed
//! ```
//!
//! Subscribers are isolated from each other: a failing endpoint never stops
//! delivery to the rest. An announcement with no subscribers is delivered
//! trivially.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod announcer;
pub mod sender;
pub mod subscribers;

pub use announcer::{Announce, DeliveryError, DeliveryReport, FailedDelivery, WebhookAnnouncer};
pub use sender::{HttpWebhookSender, SendError, WebhookSender};
pub use subscribers::{InMemorySubscriberRegistry, SubscriberRegistry};
