//! End-to-end synchronization scenarios through the bridge

use std::sync::Arc;

use parking_lot::Mutex;
use zwave_bridge::{
    AccessoryConfig, BindingError, Bridge, BridgeConfig, Capability, Characteristic, CharacteristicKind,
    CharacteristicValue, ChargingState, RecordingDriver, SetValueCommand,
};
use zwave_state::{CommandClass, DriverEvent, NodeId, NodeInfo, RawValue, Value, ValueId};

// ============================================================================
// Test Helpers
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn bridge_for(accessories: Vec<AccessoryConfig>) -> (Bridge, Arc<RecordingDriver>) {
    init_tracing();
    let driver = Arc::new(RecordingDriver::new());
    let bridge = Bridge::new(BridgeConfig { accessories }, driver.clone()).unwrap();
    (bridge, driver)
}

fn add_node(bridge: &Bridge, node: u8, values: Vec<Value>) {
    let node_id = NodeId::new(node);
    bridge.handle_event(DriverEvent::NodeAdded { node_id }).unwrap();
    for value in values {
        bridge.handle_event(DriverEvent::ValueAdded { node_id, value }).unwrap();
    }
}

fn ready(bridge: &Bridge, node: u8) {
    bridge
        .handle_event(DriverEvent::NodeReady {
            node_id: NodeId::new(node),
            info: NodeInfo {
                manufacturer: "Aeotec".to_string(),
                product: "Test Device".to_string(),
                product_type: String::new(),
            },
        })
        .unwrap();
}

fn change(bridge: &Bridge, node: u8, value: Value) {
    bridge
        .handle_event(DriverEvent::ValueChanged {
            node_id: NodeId::new(node),
            value,
        })
        .unwrap();
}

/// Record every push a characteristic makes
fn record_pushes(characteristic: &Characteristic) -> Arc<Mutex<Vec<CharacteristicValue>>> {
    let pushes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&pushes);
    characteristic.subscribe(move |v| sink.lock().push(v.clone()));
    pushes
}

fn characteristic(bridge: &Bridge, accessory: &str, kind: CharacteristicKind) -> Arc<Characteristic> {
    bridge.accessory(accessory).unwrap().characteristic(kind).unwrap()
}

fn temperature(value: f64) -> Value {
    Value::new(CommandClass::SENSOR_MULTILEVEL, 1, 1, "Temperature", value)
}

fn switch(value: bool) -> Value {
    Value::root(CommandClass::SWITCH_BINARY, "Switch", value)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn temperature_reading_and_single_push() {
    let (bridge, _driver) = bridge_for(vec![AccessoryConfig::new(
        "Hallway Sensor",
        NodeId::new(4),
        vec![Capability::Temperature { value: None }],
    )]);
    add_node(&bridge, 4, vec![temperature(21.5)]);
    ready(&bridge, 4);

    let current = characteristic(&bridge, "Hallway Sensor", CharacteristicKind::CurrentTemperature);
    let pushes = record_pushes(&current);

    assert_eq!(current.get(), Ok(CharacteristicValue::Float(21.5)));

    change(&bridge, 4, temperature(22.0));
    assert_eq!(*pushes.lock(), vec![CharacteristicValue::Float(22.0)]);

    // Repeated report of the same reading is not pushed again
    change(&bridge, 4, temperature(22.0));
    assert_eq!(pushes.lock().len(), 1);
}

#[test]
fn switch_set_issues_command_and_waits_for_device() {
    let (bridge, driver) = bridge_for(vec![AccessoryConfig::new(
        "Desk Lamp",
        NodeId::new(2),
        vec![Capability::Switch { value: None }],
    )]);
    add_node(&bridge, 2, vec![switch(false)]);
    ready(&bridge, 2);

    let on = characteristic(&bridge, "Desk Lamp", CharacteristicKind::On);
    let pushes = record_pushes(&on);

    on.set(CharacteristicValue::Bool(true)).unwrap();

    assert_eq!(
        driver.commands(),
        vec![SetValueCommand {
            value_id: ValueId::new(NodeId::new(2), CommandClass::SWITCH_BINARY, 1, 0),
            value: RawValue::Bool(true),
        }]
    );
    assert!(pushes.lock().is_empty());

    // The store still holds the device's last report until it confirms
    let stored = bridge
        .session()
        .store()
        .get_value(&ValueId::new(NodeId::new(2), CommandClass::SWITCH_BINARY, 1, 0))
        .map(|v| v.value.clone());
    assert_eq!(stored, Some(RawValue::Bool(false)));

    // Device confirms the set: same value, no echo
    change(&bridge, 2, switch(true));
    assert!(pushes.lock().is_empty());

    // Someone flips the wall switch: pushed exactly once
    change(&bridge, 2, switch(false));
    assert_eq!(*pushes.lock(), vec![CharacteristicValue::Bool(false)]);
}

#[test]
fn low_battery_follows_power_mode() {
    let (bridge, _driver) = bridge_for(vec![AccessoryConfig::new(
        "Garden Sensor",
        NodeId::new(5),
        vec![serde_json::from_str(r#"{"type": "battery"}"#).unwrap()],
    )]);
    add_node(
        &bridge,
        5,
        vec![
            Value::root(CommandClass::BATTERY, "Battery Level", 30.0),
            Value::new(CommandClass::CONFIGURATION, 1, 9, "Power Mode", "Battery power"),
            Value::new(CommandClass::CONFIGURATION, 1, 39, "Low Battery Threshold", 20.0),
        ],
    );
    ready(&bridge, 5);

    let low = characteristic(&bridge, "Garden Sensor", CharacteristicKind::StatusLowBattery);
    let charging = characteristic(&bridge, "Garden Sensor", CharacteristicKind::ChargingState);
    let low_pushes = record_pushes(&low);

    assert_eq!(low.get(), Ok(CharacteristicValue::Bool(true)));
    assert_eq!(charging.get(), Ok(ChargingState::NotCharging.into()));
    assert_eq!(
        characteristic(&bridge, "Garden Sensor", CharacteristicKind::BatteryLevel).get(),
        Ok(CharacteristicValue::Int(30))
    );

    change(
        &bridge,
        5,
        Value::new(CommandClass::CONFIGURATION, 1, 9, "Power Mode", "Plugged in"),
    );

    assert_eq!(*low_pushes.lock(), vec![CharacteristicValue::Bool(false)]);
    assert_eq!(charging.value(), Some(ChargingState::Charging.into()));

    // Back on battery with the device threshold raised past the level
    change(
        &bridge,
        5,
        Value::new(CommandClass::CONFIGURATION, 1, 39, "Low Battery Threshold", 5.0),
    );
    change(
        &bridge,
        5,
        Value::new(CommandClass::CONFIGURATION, 1, 9, "Power Mode", "Battery power"),
    );
    assert_eq!(low_pushes.lock().len(), 1);
    change(
        &bridge,
        5,
        Value::new(CommandClass::CONFIGURATION, 1, 39, "Low Battery Threshold", 25.0),
    );
    assert_eq!(
        *low_pushes.lock(),
        vec![CharacteristicValue::Bool(false), CharacteristicValue::Bool(true)]
    );
}

#[test]
fn unready_accessory_fails_fast() {
    let (bridge, driver) = bridge_for(vec![AccessoryConfig::new(
        "Desk Lamp",
        NodeId::new(2),
        vec![Capability::Switch { value: None }],
    )]);
    add_node(&bridge, 2, vec![switch(false)]);

    let on = characteristic(&bridge, "Desk Lamp", CharacteristicKind::On);
    assert!(matches!(on.get(), Err(BindingError::NotReady { .. })));
    assert!(matches!(
        on.set(CharacteristicValue::Bool(true)),
        Err(BindingError::NotReady { .. })
    ));
    assert!(driver.commands().is_empty());
    assert_eq!(on.value(), None);
}

#[test]
fn missing_value_on_ready_node_is_an_error() {
    let (bridge, _driver) = bridge_for(vec![AccessoryConfig::new(
        "Hallway Sensor",
        NodeId::new(4),
        vec![Capability::Humidity { value: None }],
    )]);
    add_node(&bridge, 4, vec![temperature(21.5)]);
    ready(&bridge, 4);

    let humidity = characteristic(&bridge, "Hallway Sensor", CharacteristicKind::CurrentRelativeHumidity);
    assert!(matches!(humidity.get(), Err(BindingError::ValueNotFound { .. })));
}

#[test]
fn motion_and_tamper_from_one_sensor() {
    let (bridge, _driver) = bridge_for(vec![AccessoryConfig::new(
        "Porch Motion",
        NodeId::new(7),
        vec![Capability::Motion {
            value: None,
            tamper: None,
            tamper_keyword: None,
        }],
    )]);
    add_node(
        &bridge,
        7,
        vec![
            Value::root(CommandClass::SENSOR_BINARY, "Sensor", false),
            Value::new(CommandClass::ALARM, 1, 10, "Home Security", "Clear"),
        ],
    );
    ready(&bridge, 7);

    let tampered = characteristic(&bridge, "Porch Motion", CharacteristicKind::StatusTampered);
    let motion = characteristic(&bridge, "Porch Motion", CharacteristicKind::MotionDetected);
    assert_eq!(tampered.get(), Ok(CharacteristicValue::Bool(false)));
    let tamper_pushes = record_pushes(&tampered);
    let motion_pushes = record_pushes(&motion);

    change(
        &bridge,
        7,
        Value::new(CommandClass::ALARM, 1, 10, "Home Security", "Tampering -  Cover Removed"),
    );
    change(&bridge, 7, Value::root(CommandClass::SENSOR_BINARY, "Sensor", true));

    assert_eq!(*tamper_pushes.lock(), vec![CharacteristicValue::Bool(true)]);
    assert_eq!(*motion_pushes.lock(), vec![CharacteristicValue::Bool(true)]);
}

#[test]
fn dimmer_brightness_round_trip() {
    let (bridge, driver) = bridge_for(vec![AccessoryConfig::new(
        "Living Room",
        NodeId::new(3),
        vec![Capability::Dimmer { value: None }],
    )]);
    add_node(
        &bridge,
        3,
        vec![Value::root(CommandClass::SWITCH_MULTILEVEL, "Level", 0.0)],
    );
    ready(&bridge, 3);

    let on = characteristic(&bridge, "Living Room", CharacteristicKind::On);
    let brightness = characteristic(&bridge, "Living Room", CharacteristicKind::Brightness);
    let on_pushes = record_pushes(&on);

    brightness.set(CharacteristicValue::Int(60)).unwrap();
    assert_eq!(driver.take()[0].value, RawValue::Number(60.0));

    change(&bridge, 3, Value::root(CommandClass::SWITCH_MULTILEVEL, "Level", 60.0));
    assert_eq!(brightness.value(), Some(CharacteristicValue::Int(60)));
    assert_eq!(*on_pushes.lock(), vec![CharacteristicValue::Bool(true)]);

    on.set(CharacteristicValue::Bool(false)).unwrap();
    assert_eq!(driver.take()[0].value, RawValue::Number(0.0));
}

#[test]
fn events_parsed_from_driver_json() {
    let (bridge, _driver) = bridge_for(vec![AccessoryConfig::new(
        "Hallway Sensor",
        NodeId::new(4),
        vec![Capability::Temperature { value: None }],
    )]);

    let events = [
        r#"{"event": "node_added", "node_id": 4}"#,
        r#"{"event": "value_added", "node_id": 4,
            "value": {"command_class": 49, "index": 1, "label": "Temperature", "value": 21.5}}"#,
        r#"{"event": "node_ready", "node_id": 4, "info": {"manufacturer": "Aeotec"}}"#,
    ];
    for json in events {
        let event: DriverEvent = serde_json::from_str(json).unwrap();
        bridge.handle_event(event).unwrap();
    }

    let current = characteristic(&bridge, "Hallway Sensor", CharacteristicKind::CurrentTemperature);
    assert_eq!(current.get(), Ok(CharacteristicValue::Float(21.5)));
}

#[test]
fn configured_bridge_survives_node_rejoin() {
    init_tracing();
    let config = BridgeConfig::from_json(
        r#"{
            "accessories": [
                {"name": "Desk Lamp", "node_id": 2, "capabilities": [{"type": "switch"}]},
                {"name": "Hallway Sensor", "node_id": 4, "capabilities": [
                    {"type": "temperature"},
                    {"type": "humidity", "value": {"command_class": 49, "index": 5}}
                ]}
            ]
        }"#,
    )
    .unwrap();
    let driver = Arc::new(RecordingDriver::new());
    let bridge = Bridge::new(config, driver.clone()).unwrap();
    assert_eq!(bridge.accessories().len(), 2);

    add_node(&bridge, 2, vec![switch(true)]);
    ready(&bridge, 2);
    let stale = characteristic(&bridge, "Desk Lamp", CharacteristicKind::On);
    let stale_pushes = record_pushes(&stale);
    assert_eq!(stale.get(), Ok(CharacteristicValue::Bool(true)));

    bridge
        .handle_event(DriverEvent::NodeRemoved { node_id: NodeId::new(2) })
        .unwrap();
    assert!(bridge.accessory("Desk Lamp").is_none());
    assert!(bridge.accessory("Hallway Sensor").is_some());

    add_node(&bridge, 2, vec![switch(false)]);
    let fresh = characteristic(&bridge, "Desk Lamp", CharacteristicKind::On);
    assert!(matches!(fresh.get(), Err(BindingError::NotReady { .. })));

    ready(&bridge, 2);
    assert_eq!(fresh.get(), Ok(CharacteristicValue::Bool(false)));

    change(&bridge, 2, switch(true));
    assert_eq!(fresh.value(), Some(CharacteristicValue::Bool(true)));
    // Listeners of the removed accessory are gone
    assert!(stale_pushes.lock().is_empty());

    fresh.set(CharacteristicValue::Bool(false)).unwrap();
    assert_eq!(driver.commands().len(), 1);
}

#[test]
fn override_without_index_tracks_the_matching_value() {
    init_tracing();
    let config = BridgeConfig::from_json(
        r#"{"accessories": [
            {"name": "Hallway Sensor", "node_id": 4, "capabilities": [
                {"type": "temperature", "value": {"command_class": 49}}
            ]},
            {"name": "Porch Light", "node_id": 6, "capabilities": [
                {"type": "switch", "value": {"command_class": 37}}
            ]}
        ]}"#,
    )
    .unwrap();
    let driver = Arc::new(RecordingDriver::new());
    let bridge = Bridge::new(config, driver.clone()).unwrap();

    add_node(&bridge, 4, vec![temperature(21.5)]);
    ready(&bridge, 4);
    let current = characteristic(&bridge, "Hallway Sensor", CharacteristicKind::CurrentTemperature);
    let pushes = record_pushes(&current);
    assert_eq!(current.get(), Ok(CharacteristicValue::Float(21.5)));

    change(&bridge, 4, temperature(22.0));
    assert_eq!(*pushes.lock(), vec![CharacteristicValue::Float(22.0)]);

    // Switch reported on index 1: commands and pushes use that value
    add_node(&bridge, 6, vec![Value::new(CommandClass::SWITCH_BINARY, 1, 1, "Switch", false)]);
    ready(&bridge, 6);
    let on = characteristic(&bridge, "Porch Light", CharacteristicKind::On);
    let on_pushes = record_pushes(&on);

    on.set(CharacteristicValue::Bool(true)).unwrap();
    assert_eq!(
        driver.commands(),
        vec![SetValueCommand {
            value_id: ValueId::new(NodeId::new(6), CommandClass::SWITCH_BINARY, 1, 1),
            value: RawValue::Bool(true),
        }]
    );

    change(&bridge, 6, Value::new(CommandClass::SWITCH_BINARY, 1, 1, "Switch", false));
    assert_eq!(*on_pushes.lock(), vec![CharacteristicValue::Bool(false)]);
}
