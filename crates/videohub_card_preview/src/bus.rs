use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use videohub_card::CommandBus;
use videohub_card::CommandError;
use videohub_card::ServiceCall;

/// Command bus that logs each service call instead of sending it anywhere.
#[derive(Debug, Default)]
pub struct LoggingBus {
    /// Reject every call, to preview the card's failure handling
    fail: bool,
}

impl LoggingBus {
    pub fn new(fail: bool) -> Self {
        Self { fail }
    }
}

#[async_trait]
impl CommandBus for LoggingBus {
    async fn call_service(&self, call: ServiceCall) -> Result<(), CommandError> {
        let payload = Value::Object(call.data.clone());
        info!(service = %call, %payload, "service call");

        if self.fail {
            return Err(CommandError::Rejected(format!("{} rejected by --fail", call)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_bus_outcomes() {
        let call = ServiceCall::select_option("select.videohub_output_1", "1: Camera 1");

        assert!(LoggingBus::new(false).call_service(call.clone()).await.is_ok());

        let err = LoggingBus::new(true).call_service(call).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "service call rejected: select.select_option rejected by --fail"
        );
    }
}
