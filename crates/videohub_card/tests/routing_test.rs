use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use videohub_card::Card;
use videohub_card::CommandBus;
use videohub_card::CommandError;
use videohub_card::CommandKey;
use videohub_card::Dispatch;
use videohub_card::ServiceCall;
use videohub_card::Snapshot;

/// Bus that records calls and rejects anything routed to input 4
#[derive(Default)]
struct FlakyRouter {
    calls: Mutex<Vec<ServiceCall>>,
}

#[async_trait]
impl CommandBus for FlakyRouter {
    async fn call_service(&self, call: ServiceCall) -> Result<(), CommandError> {
        let rejected = call.data.get("option").and_then(|o| o.as_str()) == Some("4: Broken");
        self.calls.lock().unwrap().push(call);
        if rejected {
            Err(CommandError::Rejected("router did not acknowledge".to_string()))
        } else {
            Ok(())
        }
    }
}

fn host_states() -> Snapshot {
    serde_json::from_value(json!({
        "select.videohub_output_10": {
            "state": "1: Camera 1",
            "attributes": {
                "friendly_name": "Videohub Output 10 (Record)",
                "options": ["1: Camera 1", "2: Camera 2", "4: Broken"]
            }
        },
        "select.videohub_output_2": {
            "state": "2: Camera 2",
            "attributes": {
                "friendly_name": "Videohub Output 2 (Preview)",
                "options": ["1: Camera 1", "2: Camera 2", "4: Broken"]
            }
        },
        "select.videohub_output_1": {
            "state": "1: Camera 1",
            "attributes": {
                "friendly_name": "Videohub Output 1 (Program)",
                "options": ["1: Camera 1", "2: Camera 2", "4: Broken"]
            }
        },
        "sensor.videohub_temperature": { "state": "41" },
        "select.living_room_source": {
            "state": "TV",
            "attributes": { "friendly_name": "Living room output", "options": ["TV"] }
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_discovered_card_round_trip() {
    let bus = Arc::new(FlakyRouter::default());
    let card = Card::new(bus.clone());
    card.configure(json!({
        "type": "custom:blackmagic-videohub-card",
        "presets": [{ "name": "Record Program", "entry_id": "01J0VIDEOHUB", "output": 9, "input": 0 }]
    }))
    .unwrap();
    card.update_state(host_states());

    let view = card.view().unwrap();
    let labels: Vec<String> = view.rows().iter().map(|r| r.label.to_string()).collect();
    assert_eq!(
        labels,
        [
            "Videohub Output 1 (Program)",
            "Videohub Output 2 (Preview)",
            "Videohub Output 10 (Record)",
        ]
    );
    assert_eq!(view.count, "3 outputs");
    assert_eq!(card.sizing_hint(), 5);

    assert_eq!(
        card.route_entity("select.videohub_output_2", "1: Camera 1").await,
        Dispatch::Completed
    );
    assert_eq!(
        card.route_entity("select.videohub_output_2", "4: Broken").await,
        Dispatch::Failed
    );
    assert_eq!(card.run_preset(0).await, Dispatch::Completed);

    let calls = bus.calls.lock().unwrap().clone();
    let services: Vec<String> = calls.iter().map(ToString::to_string).collect();
    assert_eq!(
        services,
        [
            "select.select_option",
            "select.select_option",
            "blackmagic_videohub.route_output",
        ]
    );

    // Nothing is left in flight and the failed row is usable again
    assert!(!card.is_pending(&CommandKey::entity("select.videohub_output_2")));
    assert!(!card.is_pending(&CommandKey::Preset(0)));
    let view = card.view().unwrap();
    assert!(view.rows().iter().all(|row| !row.disabled));
    assert!(view.presets.iter().all(|preset| !preset.disabled));
}

#[tokio::test]
async fn test_explicit_entities_with_missing_row() {
    let card = Card::new(Arc::new(FlakyRouter::default()));
    card.configure(json!({
        "title": "Master Control",
        "entities": [
            { "entity": "select.videohub_output_10", "name": "Recorder" },
            "select.videohub_output_99",
            "select.videohub_output_1"
        ]
    }))
    .unwrap();
    card.update_state(host_states());

    let view = card.view().unwrap();
    let ids: Vec<&str> = view.rows().iter().map(|r| r.entity.as_str()).collect();
    assert_eq!(ids, ["select.videohub_output_10", "select.videohub_output_1"]);
    assert_eq!(view.rows()[0].label, "Recorder");

    let html = view.to_html();
    assert!(html.contains(r#"<div class="title">Master Control</div>"#));
    assert!(!html.contains("select.videohub_output_99"));
}
