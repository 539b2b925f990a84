//! Modal dialog flows: publish, image export, video export.

pub mod export;
pub mod host;
pub mod orchestrator;
pub mod outcome;
pub mod publish;

pub use host::{DestinationChoice, RfdSaveHost, SaveDestinationHost};
pub use orchestrator::DialogOrchestrator;
pub use outcome::{DialogKind, DialogOutcome, DialogTicket};
