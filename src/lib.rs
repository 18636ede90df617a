//! Cost-aware task delegation fabric for multi-agent workflows.
//!
//! See `SPEC_FULL.md` for the full component contract; the module layout
//! below mirrors its numbering: `router`/`validation` (§4.2/§4.4),
//! `orchestrator` (§4.3–§4.5), `a2a` (§4.6), `apc` (§4.7), `session` (§4.8).

pub mod a2a;
pub mod apc;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod router;
pub mod session;
pub mod types;
pub mod utils;
pub mod validation;

pub use a2a::{default_bus, AgentHandler, MessageBus};
pub use config::Config;
pub use error::{A2AError, ConfigError, LlmError, OrchestratorError, RouterError, SessionError};
pub use llm::{CostSummary, CostTracker, LLMClient, LLMProvider, OpenAICompatibleProvider, ProviderDescriptor};
pub use orchestrator::{HybridOrchestrator, PremiumOrchestrator, QualityAwareOrchestrator, ResultEnvelope, SmartOrchestrator};
pub use router::Router;
pub use session::{BootstrapManager, RecoveryAgent, SessionMonitor};
pub use types::{A2AMessage, MessageType, Plan, RoutingAction, RoutingDecision, Subtask, Task, TaskType, ValidationReport};
