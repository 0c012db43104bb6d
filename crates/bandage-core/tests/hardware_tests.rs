//! Hardware integration tests for bandage-core
//!
//! These tests require a powered Bluetooth adapter and a Smart Bandage in
//! range, and should be run with:
//! ```
//! cargo test --package bandage-core --test hardware_tests -- --ignored --nocapture
//! ```
//!
//! Set `BANDAGE_DEVICE` to target a device advertising a different name.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use bandage_core::events::default_adapter_channel;
use bandage_core::{
    BtleplugAdapter, Command, SessionConfig, SessionHandle, SessionManager, SessionState,
};
use tokio::time::timeout;

/// Default timeout for reaching the ready state
const READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Get the advertised device name from environment or use default
fn device_name() -> String {
    env::var("BANDAGE_DEVICE")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| bandage_core::uuid::DEVICE_NAME.to_string())
}

async fn connect() -> SessionHandle {
    let (tx, rx) = default_adapter_channel();
    let adapter = match BtleplugAdapter::new(tx).await {
        Ok(adapter) => Arc::new(adapter.operation_timeout(Duration::from_secs(15))),
        Err(e) => panic!("No Bluetooth adapter: {}", e),
    };
    let config = SessionConfig::default()
        .device_name(device_name())
        .discovery_timeout(Duration::from_secs(15));
    let session = SessionManager::new(adapter, config).unwrap().spawn(rx);

    session.start_session().await.unwrap();
    match session.wait_for_state(SessionState::Ready, READY_TIMEOUT).await {
        Ok(_) => session,
        Err(e) => panic!("Session did not become ready: {}", e),
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_connect_and_receive_telemetry() {
    let session = connect().await;
    println!("Connected to {}", device_name());

    let mut rx = session.subscribe_state();
    let result = timeout(Duration::from_secs(10), rx.wait_for(|s| s.frames_decoded > 0)).await;
    match result {
        Ok(Ok(snapshot)) => println!(
            "Temperature {:?} ({:?}), humidity {:?} ({:?})",
            snapshot.temperature,
            snapshot.temperature_band,
            snapshot.humidity,
            snapshot.humidity_band
        ),
        Ok(Err(_)) => panic!("Session closed"),
        Err(_) => panic!("No telemetry within 10 seconds"),
    }

    session.shutdown().await;
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_motor_on_off() {
    let session = connect().await;

    session.send_command(Command::MotorOn).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    session.send_command(Command::MotorOff).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(session.snapshot().last_error, None);
    session.shutdown().await;
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_connect_disconnect_cycle() {
    for i in 0..3 {
        println!("Cycle {}", i + 1);
        let session = connect().await;
        session.disconnect().await.unwrap();
        session
            .wait_for_state(SessionState::Idle, Duration::from_secs(10))
            .await
            .unwrap();
        session.shutdown().await;
    }
}
