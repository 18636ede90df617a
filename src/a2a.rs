//! Agent-to-Agent Message Bus — §4.6.
//!
//! Grounded in the teacher's `orchestrator/event_bus.rs` (`broadcast::Sender`
//! pub/sub, lazy-static global singleton with override) for the broadcast
//! and default-instance idioms, and in `orchestrator/a2a.rs`'s bridge
//! concept for the notion of a peer-addressed call — but the request/
//! response correlation, per-agent inbound queues, capability registry, and
//! timeout semantics required by §4.6 have no teacher counterpart and are
//! grounded primarily in `original_source/agentflow/integration/a2a_protocol.py`.

use crate::error::A2AError;
use crate::types::{A2AMessage, Capability, MessageType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};

/// A registered agent's handler: receives an inbound message and may
/// produce a response payload (for Query/Command messages).
#[async_trait]
pub trait AgentHandler: Send + Sync {
    async fn handle(&self, message: A2AMessage) -> Option<serde_json::Value>;
}

struct AgentEntry {
    agent_type: String,
    capabilities: Vec<Capability>,
    sender: mpsc::UnboundedSender<A2AMessage>,
    handler: Arc<dyn AgentHandler>,
}

/// In-process, capability-addressed, cooperative-async message bus.
pub struct MessageBus {
    agents: Mutex<HashMap<String, AgentEntry>>,
    receivers: Mutex<HashMap<String, mpsc::UnboundedReceiver<A2AMessage>>>,
    pending: Mutex<HashMap<String, oneshot::Sender<A2AMessage>>>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self {
            agents: Mutex::new(HashMap::new()),
            receivers: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register `agent_id` with `capabilities`, creating its inbound queue.
    /// Duplicate registration is an error.
    pub async fn register_agent(
        &self,
        agent_id: &str,
        agent_type: &str,
        capabilities: Vec<Capability>,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), A2AError> {
        let mut agents = self.agents.lock().await;
        if agents.contains_key(agent_id) {
            return Err(A2AError::DuplicateAgent(agent_id.to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        agents.insert(
            agent_id.to_string(),
            AgentEntry { agent_type: agent_type.to_string(), capabilities, sender: tx, handler },
        );
        self.receivers.lock().await.insert(agent_id.to_string(), rx);
        Ok(())
    }

    pub async fn unregister_agent(&self, agent_id: &str) {
        self.agents.lock().await.remove(agent_id);
        self.receivers.lock().await.remove(agent_id);
    }

    /// Enqueue `message`. `to_agent == "broadcast"` fans out to every agent
    /// except the sender; otherwise the recipient must exist.
    pub async fn send(&self, mut message: A2AMessage) -> Result<(), A2AError> {
        if message.correlation_id.is_empty() {
            message.correlation_id = message.message_id.clone();
        }

        if message.to_agent == "broadcast" {
            let agents = self.agents.lock().await;
            for (id, entry) in agents.iter() {
                if id != &message.from_agent {
                    let mut copy = message.clone();
                    copy.to_agent = id.clone();
                    let _ = entry.sender.send(copy);
                }
            }
            return Ok(());
        }

        let agents = self.agents.lock().await;
        let entry = agents
            .get(&message.to_agent)
            .ok_or_else(|| A2AError::UnknownRecipient(message.to_agent.clone()))?;
        entry.sender.send(message).map_err(|_| A2AError::UnknownRecipient("channel closed".to_string()))?;
        Ok(())
    }

    /// Send `message` and await the correlated Response, or time out.
    pub async fn send_and_wait(
        &self,
        message: A2AMessage,
        timeout_seconds: u64,
    ) -> Result<A2AMessage, A2AError> {
        let correlation_id = if message.correlation_id.is_empty() {
            message.message_id.clone()
        } else {
            message.correlation_id.clone()
        };

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(correlation_id.clone(), tx);

        self.send(message).await?;

        match tokio::time::timeout(std::time::Duration::from_secs(timeout_seconds), rx).await {
            Ok(Ok(response)) => Ok(response),
            _ => {
                self.pending.lock().await.remove(&correlation_id);
                Err(A2AError::Timeout(correlation_id, timeout_seconds))
            }
        }
    }

    /// Build and deliver the Response to `original`. If a pending waiter
    /// exists for the correlation id, resolve it directly; otherwise enqueue
    /// normally to the original sender.
    pub async fn send_response(
        &self,
        original: &A2AMessage,
        payload: serde_json::Value,
    ) -> Result<(), A2AError> {
        let response = original.respond(payload);
        let mut pending = self.pending.lock().await;
        if let Some(waiter) = pending.remove(&response.correlation_id) {
            let _ = waiter.send(response);
            return Ok(());
        }
        drop(pending);
        self.send(response).await
    }

    /// Receive the next message for `agent_id`, blocking cooperatively.
    pub async fn receive(&self, agent_id: &str) -> Option<A2AMessage> {
        let mut receivers = self.receivers.lock().await;
        let rx = receivers.get_mut(agent_id)?;
        rx.recv().await
    }

    /// Long-running task: receive → handle → (for Query/Command) respond.
    /// Handler errors are caught and, for Query/Command, translated into an
    /// error Response rather than propagated.
    pub async fn start_listener(self: Arc<Self>, agent_id: String) {
        loop {
            let message = {
                let mut receivers = self.receivers.lock().await;
                match receivers.get_mut(&agent_id) {
                    Some(rx) => rx.recv().await,
                    None => return,
                }
            };
            let Some(message) = message else { return };

            let handler = {
                let agents = self.agents.lock().await;
                agents.get(&agent_id).map(|e| e.handler.clone())
            };
            let Some(handler) = handler else { return };

            let needs_response = matches!(message.message_type, MessageType::Query | MessageType::Command);
            let result = handler.handle(message.clone()).await;

            if needs_response {
                let payload = result.unwrap_or_else(|| {
                    serde_json::json!({"error": "handler produced no response"})
                });
                let _ = self.send_response(&message, payload).await;
            }
        }
    }

    /// First agent matching `capability` (stable but otherwise unspecified
    /// order among ties), per §4.6's registry contract.
    pub async fn find_agent_by_capability(&self, capability: Capability) -> Option<String> {
        let agents = self.agents.lock().await;
        let mut ids: Vec<&String> = agents
            .iter()
            .filter(|(_, entry)| entry.capabilities.contains(&capability))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids.into_iter().next().cloned()
    }

    pub async fn get_agent_info(&self, agent_id: &str) -> Option<(String, Vec<Capability>)> {
        let agents = self.agents.lock().await;
        agents.get(agent_id).map(|e| (e.agent_type.clone(), e.capabilities.clone()))
    }

    pub async fn get_all_agents(&self) -> Vec<String> {
        let agents = self.agents.lock().await;
        let mut ids: Vec<String> = agents.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// A replaceable default bus helper, per §9's design note: global mutable
/// state is re-architected as a first-class object, but a convenience
/// default is acceptable as long as it is replaceable in tests (callers
/// simply construct their own `MessageBus` rather than reaching for this).
pub fn default_bus() -> Arc<MessageBus> {
    Arc::new(MessageBus::new())
}
