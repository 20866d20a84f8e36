//! Scripted in-memory gateway shared by the application tests.

use crate::ports::provider_gateway::{ProviderError, ProviderGateway, RawCompletion};
use async_trait::async_trait;
use consensus_domain::{FailureReason, ProviderId, QueryRequest, TokenUsage};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Which pipeline prompt a request carries, detected from its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Draft,
    Review,
    Arbitration,
}

impl PromptKind {
    fn detect(prompt: &str) -> Self {
        if prompt.starts_with("You are the arbiter") {
            PromptKind::Arbitration
        } else if prompt.starts_with("You are a critical reviewer") {
            PromptKind::Review
        } else {
            PromptKind::Draft
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Ok(Option<String>),
    Fail(FailureReason),
    Panic,
}

/// Scripted behaviour for one (model, prompt kind) slot
#[derive(Debug, Clone)]
pub struct Script {
    outcome: Outcome,
    delay: Option<Duration>,
}

impl Script {
    pub fn ok() -> Self {
        Self {
            outcome: Outcome::Ok(None),
            delay: None,
        }
    }

    pub fn ok_with(content: &str) -> Self {
        Self {
            outcome: Outcome::Ok(Some(content.to_string())),
            delay: None,
        }
    }

    pub fn fail(reason: FailureReason) -> Self {
        Self {
            outcome: Outcome::Fail(reason),
            delay: None,
        }
    }

    pub fn panic() -> Self {
        Self {
            outcome: Outcome::Panic,
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Gateway whose answers are scripted per model id.
///
/// Unscripted calls succeed with `"{model} {kind:?}"` and 10 + 10 tokens.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: HashMap<(String, Option<PromptKind>), Script>,
    calls: Mutex<Vec<(String, PromptKind)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script every prompt kind for `model`
    pub fn with_any(mut self, model: &str, script: Script) -> Self {
        self.scripts.insert((model.to_string(), None), script);
        self
    }

    /// Script one prompt kind for `model`
    pub fn with(mut self, model: &str, kind: PromptKind, script: Script) -> Self {
        self.scripts.insert((model.to_string(), Some(kind)), script);
        self
    }

    pub fn calls(&self) -> Vec<(String, PromptKind)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: PromptKind) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, k)| *k == kind)
            .map(|(model, _)| model)
            .collect()
    }

    fn script_for(&self, model: &str, kind: PromptKind) -> Script {
        self.scripts
            .get(&(model.to_string(), Some(kind)))
            .or_else(|| self.scripts.get(&(model.to_string(), None)))
            .cloned()
            .unwrap_or_else(Script::ok)
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    async fn execute_raw(&self, request: &QueryRequest) -> Result<RawCompletion, ProviderError> {
        let kind = PromptKind::detect(&request.prompt);
        self.calls
            .lock()
            .unwrap()
            .push((request.model_id.clone(), kind));

        let script = self.script_for(&request.model_id, kind);
        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }

        match script.outcome {
            Outcome::Ok(content) => Ok(RawCompletion::new(
                content.unwrap_or_else(|| format!("{} {:?}", request.model_id, kind)),
                TokenUsage::new(10, 10),
            )),
            Outcome::Fail(reason) => Err(ProviderError::new(
                request.provider_id,
                reason,
                format!("scripted {} failure", reason),
            )),
            Outcome::Panic => panic!("scripted panic for {}", request.model_id),
        }
    }

    fn providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL.to_vec()
    }
}
