//! Outbound command transport.
//!
//! The card never talks to the router itself; every action becomes a single
//! [`ServiceCall`] handed to the host's [`CommandBus`].

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use tracing::warn;

use crate::config::Preset;

pub const SELECT_DOMAIN: &str = "select";
pub const SELECT_OPTION_SERVICE: &str = "select_option";
pub const VIDEOHUB_DOMAIN: &str = "blackmagic_videohub";
pub const ROUTE_OUTPUT_SERVICE: &str = "route_output";

/// A named service invocation: `domain.service` with a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub data: Map<String, Value>,
}

impl ServiceCall {
    fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            data,
        }
    }

    /// `select.select_option` for one output row.
    pub fn select_option(entity_id: &str, option: &str) -> Self {
        let mut data = Map::new();
        data.insert("entity_id".to_string(), Value::from(entity_id));
        data.insert("option".to_string(), Value::from(option));
        Self::new(SELECT_DOMAIN, SELECT_OPTION_SERVICE, data)
    }

    /// The call a preset makes.
    ///
    /// A preset naming a `domain.service_name` calls it with the preset's data (or an empty
    /// mapping). Any other preset routes `input` to `output` through the integration's
    /// `route_output` service, forwarding `entry_id`, `output` and `input` as configured and
    /// omitting the ones the preset leaves out.
    pub fn for_preset(preset: &Preset) -> Self {
        let named = preset
            .service
            .as_deref()
            .filter(|service| !service.is_empty())
            .map(|service| (service, split_service(service)));

        match named {
            Some((_, Some((domain, service)))) => {
                let data = preset.data.clone().unwrap_or_default();
                Self::new(domain, service, data)
            }
            Some((service, None)) => {
                warn!(service, "preset service is not domain.service_name, using route_output");
                Self::route_output(preset)
            }
            None => Self::route_output(preset),
        }
    }

    fn route_output(preset: &Preset) -> Self {
        let mut data = Map::new();
        if let Some(entry_id) = &preset.entry_id {
            data.insert("entry_id".to_string(), entry_id.clone());
        }
        if let Some(output) = &preset.output {
            data.insert("output".to_string(), output.clone());
        }
        if let Some(input) = &preset.input {
            data.insert("input".to_string(), input.clone());
        }
        Self::new(VIDEOHUB_DOMAIN, ROUTE_OUTPUT_SERVICE, data)
    }
}

/// Split on the first '.'; both halves must be non-empty.
fn split_service(service: &str) -> Option<(&str, &str)> {
    service
        .split_once('.')
        .filter(|(domain, name)| !domain.is_empty() && !name.is_empty())
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}

/// Host command transport
#[async_trait]
pub trait CommandBus: Send + Sync {
    /// Issue `call`, resolving once the host reports it settled.
    async fn call_service(&self, call: ServiceCall) -> Result<(), CommandError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("service call rejected: {0}")]
    Rejected(String),

    #[error("command transport failed: {0}")]
    Transport(#[source] Box<dyn Error + Send + Sync>),
}

/// Recording bus for tests.
///
/// A gated bus holds every call until [`MockBus::release`] hands out permits, so tests can
/// observe the card while commands are in flight.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockBus {
    pub calls: std::sync::Mutex<Vec<ServiceCall>>,
    settled: std::sync::atomic::AtomicUsize,
    gate: Option<tokio::sync::Semaphore>,
    fail: bool,
}

#[cfg(test)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(tokio::sync::Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn gated_failing() -> Self {
        Self {
            fail: true,
            ..Self::gated()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn settled(&self) -> usize {
        self.settled.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Let `n` held calls settle.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_settled(&self, n: usize) {
        while self.settled() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CommandBus for MockBus {
    async fn call_service(&self, call: ServiceCall) -> Result<(), CommandError> {
        self.calls.lock().unwrap().push(call);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.settled
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail {
            Err(CommandError::Rejected("mock failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_select_option_call() {
        let call = ServiceCall::select_option("select.videohub_output_1", "3: Graphics");
        assert_eq!(call.to_string(), "select.select_option");
        assert_eq!(
            call.data,
            data(json!({ "entity_id": "select.videohub_output_1", "option": "3: Graphics" }))
        );
    }

    #[test]
    fn test_preset_service_split_on_first_dot() {
        let preset = Preset {
            service: Some("script.route.wide".to_string()),
            data: Some(data(json!({ "speed": 2 }))),
            ..Preset::default()
        };
        let call = ServiceCall::for_preset(&preset);
        assert_eq!(call.domain, "script");
        assert_eq!(call.service, "route.wide");
        assert_eq!(call.data, data(json!({ "speed": 2 })));
    }

    #[test]
    fn test_preset_service_without_data() {
        let preset = Preset {
            service: Some("scene.turn_on".to_string()),
            ..Preset::default()
        };
        let call = ServiceCall::for_preset(&preset);
        assert_eq!(call.to_string(), "scene.turn_on");
        assert!(call.data.is_empty());
    }

    #[test]
    fn test_unusable_service_falls_back_to_route_output() {
        for service in ["script", ".turn_on", "scene.", ""] {
            let preset = Preset {
                service: Some(service.to_string()),
                entry_id: Some(json!("01J0VIDEOHUB")),
                output: Some(json!(2)),
                input: Some(json!(5)),
                ..Preset::default()
            };
            let call = ServiceCall::for_preset(&preset);
            assert_eq!(call.to_string(), "blackmagic_videohub.route_output", "{service:?}");
            assert_eq!(
                call.data,
                data(json!({ "entry_id": "01J0VIDEOHUB", "output": 2, "input": 5 }))
            );
        }
    }

    #[test]
    fn test_route_output_forwards_values_as_given() {
        let preset = Preset {
            name: Some("Cam 4 to Program".to_string()),
            entry_id: Some(json!("abc")),
            output: Some(json!("3")),
            input: Some(json!("7")),
            ..Preset::default()
        };
        let call = ServiceCall::for_preset(&preset);
        assert_eq!(
            call.data,
            data(json!({ "entry_id": "abc", "output": "3", "input": "7" }))
        );

        let call = ServiceCall::for_preset(&Preset::default());
        assert_eq!(call.to_string(), "blackmagic_videohub.route_output");
        assert!(call.data.is_empty());
    }
}
