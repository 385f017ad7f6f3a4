use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use videohub_card::Card;
use videohub_card::Dispatch;
use videohub_card_preview::load_config;
use videohub_card_preview::load_snapshot;
use videohub_card_preview::LoggingBus;

const STATES: &str = r#"{
    "select.videohub_output_1": {
        "state": "1: Camera 1",
        "attributes": {
            "friendly_name": "Output 1 (Program)",
            "options": ["1: Camera 1", "2: Camera 2"]
        }
    },
    "select.videohub_output_2": {
        "state": "2: Camera 2",
        "attributes": {
            "friendly_name": "Output 2 (Preview)",
            "options": ["1: Camera 1", "2: Camera 2"]
        }
    }
}"#;

#[test]
fn test_load_toml_and_json_configs() {
    let temp_dir = TempDir::new().unwrap();
    let toml_path = temp_dir.path().join("card.toml");
    let json_path = temp_dir.path().join("card.json");

    fs::write(
        &toml_path,
        r#"
        title = "Studio"
        entities = ["select.videohub_output_2"]
        "#,
    )
    .unwrap();
    fs::write(&json_path, r#"{ "auto_discover": false }"#).unwrap();

    let config = load_config(&toml_path).unwrap();
    assert_eq!(config.title, "Studio");
    assert_eq!(config.entities().len(), 1);

    let config = load_config(&json_path).unwrap();
    assert!(!config.auto_discover);
}

#[test]
fn test_load_errors_name_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.toml");
    let err = load_config(&missing).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read card config"));

    let null_config = temp_dir.path().join("null.json");
    fs::write(&null_config, "null").unwrap();
    let err = load_config(&null_config).unwrap_err();
    assert!(err.to_string().starts_with("Invalid card config"));

    let bad_states = temp_dir.path().join("states.json");
    fs::write(&bad_states, "[1, 2, 3]").unwrap();
    let err = load_snapshot(&bad_states).unwrap_err();
    assert!(err.to_string().starts_with("Invalid state snapshot"));
}

#[tokio::test]
async fn test_preview_from_files() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("card.toml");
    let states_path = temp_dir.path().join("states.json");

    fs::write(
        &config_path,
        r#"
        [[presets]]
        name = "Program to Record"
        entry_id = "01J0VIDEOHUB"
        output = 2
        input = 1
        "#,
    )
    .unwrap();
    fs::write(&states_path, STATES).unwrap();

    let card = Card::new(Arc::new(LoggingBus::new(true)));
    card.set_config(load_config(&config_path).unwrap());
    card.update_state(load_snapshot(&states_path).unwrap());

    assert_eq!(
        card.route_entity("select.videohub_output_1", "2: Camera 2").await,
        Dispatch::Failed
    );
    assert_eq!(card.run_preset(0).await, Dispatch::Failed);

    let html = card.view().unwrap().to_html();
    assert!(html.contains(r#"<div class="subtle">2 outputs</div>"#));
    assert!(html.contains(r#"<button type="button" data-preset-index="0">Program to Record</button>"#));
    assert!(!html.contains("disabled"));
}
