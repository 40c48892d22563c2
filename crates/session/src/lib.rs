//! Telemetry Session Service
//!
//! Owns the single active telemetry session: sequences samples through
//! validation, the adaptive band, and anomaly detection, notifies observers,
//! and hands the accepted samples to the persistence sink at session end.

mod controller;
mod events;
mod response;

pub use controller::{SessionConfig, SessionController, Strictness};
pub use events::{ChannelObserver, EventBus, EventObserver, LogObserver, SessionEvent};
pub use response::{ResponseKind, ServiceFault, ServiceResponse, SessionStatus};
