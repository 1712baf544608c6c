use sen5x_exporter::{
    error::ExporterError,
    metrics::{Reading, SensorSource, SharedSnapshot, SimulatedSensor},
    web::{encode, exposition::metric_names, render_response},
    NoDataValue, ServerConfig,
};
use std::time::Duration;

fn scenario_reading() -> Reading {
    Reading::new(
        12.3,
        8.1,
        9.0,
        10.2,
        Some(45.6),
        Some(22.1),
        120.0,
        Some(15.0),
    )
    .with_timestamp(1_234_567_890)
}

/// Test Reading serialization and deserialization
#[test]
fn test_reading_serialization() {
    let reading = scenario_reading();

    let json = serde_json::to_string_pretty(&reading).expect("Should serialize to JSON");
    assert!(json.contains("\"humidity\": 45.6"));
    assert!(json.contains("1234567890"));

    let deserialized: Reading = serde_json::from_str(&json).expect("Should deserialize from JSON");
    assert_eq!(deserialized, reading);
}

/// Test JSON field names of Reading
#[test]
fn test_json_schema_validation() {
    let json_str = serde_json::to_string(&scenario_reading()).expect("Should serialize");
    let json_value: serde_json::Value = serde_json::from_str(&json_str).expect("Should parse JSON");

    for field in [
        "timestamp",
        "pm1_0",
        "pm2_5",
        "pm4_0",
        "pm10_0",
        "humidity",
        "temperature",
        "voc",
        "nox",
    ] {
        assert!(json_value.get(field).is_some(), "missing field {}", field);
    }
}

/// Test ExporterError creation and formatting
#[test]
fn test_exporter_error_types() {
    let acquisition = ExporterError::acquisition_error("CRC mismatch");
    assert!(format!("{}", acquisition).contains("CRC mismatch"));
    assert!(!acquisition.is_fatal());

    let connection = ExporterError::connection_error("Connection reset");
    assert!(format!("{}", connection).contains("Connection reset"));
    assert!(!connection.is_fatal());

    let setup = ExporterError::setup_error("No such device");
    assert!(format!("{}", setup).contains("No such device"));
    assert!(setup.is_fatal());

    let config = ExporterError::config_error("Invalid configuration");
    assert!(format!("{}", config).contains("Invalid configuration"));
    assert!(config.is_fatal());
}

/// Test ServerConfig builder pattern
#[test]
fn test_server_config() {
    let config = ServerConfig::default()
        .with_host("127.0.0.1")
        .with_port(9100)
        .with_io_timeout(Duration::from_millis(250))
        .with_no_data(NoDataValue::Nan);

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 9100);
    assert_eq!(config.io_timeout, Duration::from_millis(250));
    assert_eq!(config.no_data, NoDataValue::Nan);
    assert_eq!(config.bind_address(), "127.0.0.1:9100");
}

/// Test ServerConfig serialization
#[test]
fn test_server_config_serialization() {
    let config = ServerConfig::new("0.0.0.0", 80);
    let json = serde_json::to_string(&config).expect("Should serialize");
    assert!(json.contains("\"no_data\":\"zero\""));

    let back: ServerConfig = serde_json::from_str(&json).expect("Should deserialize");
    assert_eq!(back.bind_address(), config.bind_address());
}

/// Test the fixed metric order
#[test]
fn test_metric_order() {
    let names: Vec<_> = metric_names().collect();
    assert_eq!(
        names,
        vec![
            "sen5x_ppm1_0",
            "sen5x_ppm2_5",
            "sen5x_ppm4_0",
            "sen5x_ppm10_0",
            "sen5x_humidity",
            "sen5x_temperature",
            "sen5x_voc",
            "sen5x_nox",
        ]
    );

    let text = encode(Some(&scenario_reading()), NoDataValue::Zero);
    let rendered: Vec<_> = text
        .lines()
        .filter_map(|line| line.strip_prefix("# TYPE "))
        .map(|rest| rest.trim_end_matches(" gauge"))
        .collect();
    assert_eq!(rendered, names);
}

/// Test the full response for the published scenario reading
#[test]
fn test_scenario_response() {
    let snapshot = SharedSnapshot::new();
    snapshot.publish(scenario_reading());

    let response = render_response(&encode(snapshot.read().as_ref(), NoDataValue::Zero));
    assert!(response.starts_with("HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n"));
    assert!(response.lines().any(|line| line == "sen5x_humidity 45.6"));
}

/// Test simulated sensor through the SensorSource trait
#[tokio::test]
async fn test_simulated_sensor() {
    let mut sensor = SimulatedSensor::new();
    let first = sensor.read_reading().await.expect("Simulator never fails");
    let second = sensor.read_reading().await.expect("Simulator never fails");

    assert!(first.timestamp > 0);
    assert!(first.humidity.is_some());
    assert!(second.temperature.is_some());
}
