//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Ports to the SIP engine and platform collaborators
//! - The event bus and command executor
//! - The attachment export worker
//! - Metrics
//! - An in-memory engine for demos and tests

pub mod event_bus;
pub mod executor;
pub mod media_export;
pub mod metrics;
pub mod ports;
pub mod simulated;

pub use event_bus::{EventBus, EventPublisher};
pub use executor::CommandExecutor;
pub use media_export::{MediaExportQueue, MediaExportWorker};
pub use ports::{Collaborators, MediaStore, Navigator, NotificationManager, SipEngine, UserMessageSink};
