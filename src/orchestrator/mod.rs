//! Orchestration Core — §4.3, §4.4, §4.5.

pub mod hybrid;
pub mod premium;
pub mod quality;
pub mod smart;

pub use hybrid::{HybridOrchestrator, HybridResult, HybridStatus};
pub use premium::PremiumOrchestrator;
pub use quality::{QualityAwareOrchestrator, ResultEnvelope, Statistics};
pub use smart::{OrchestrationMode, SmartOrchestrator};
