//! Example: Shared Subscriptions Over a Mock Transport
//!
//! This example creates a Modosmart room sensor on an in-memory transport,
//! subscribes to presence twice, feeds a few notifications through and
//! prints the readings that arrive on the event bus.
//!
//! Run with: `cargo run --example subscribe_mock`

use std::sync::Arc;
use std::time::Duration;

use sensorlink_core::types::{GattProfile, uuids};
use sensorlink_core::{DeviceDefinition, DeviceEvent, DeviceManager, MockTransport, TransportOp};

const ADDRESS: &str = "B0:B4:48:C9:8F:02";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let transport = Arc::new(MockTransport::new());
    let manager = DeviceManager::new(transport.clone());
    let mut events = manager.events().subscribe();

    let id = manager
        .create(&DeviceDefinition::new(ADDRESS, "MODOSMART_ROOM_SENSOR"))
        .await?;
    println!("Created {}", id);

    // Two consumers, one transport subscription
    manager.subscribe(&id, "Presence").await?;
    let count = manager.subscribe(&id, "Presence").await?;
    println!(
        "Presence subscribers: {} (transport subscribes: {})",
        count,
        transport.count(TransportOp::Subscribe)
    );

    let presence = GattProfile::new(uuids::MODOSMART_ENVIRONMENT_SERVICE, uuids::MODOSMART_PRESENCE);
    for people in [1u8, 0, 3] {
        transport.emit(ADDRESS, presence, vec![people, 0x00]);
    }

    // The zero value is filtered, so two readings arrive
    let mut received = 0;
    while received < 2 {
        match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
            Ok(Ok(DeviceEvent::Reading { reading })) => {
                println!("{} {} = {}", reading.device_id, reading.component, reading.value);
                received += 1;
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => break,
        }
    }

    manager.unsubscribe(&id, "Presence").await?;
    manager.unsubscribe(&id, "Presence").await?;
    println!(
        "Transport unsubscribes: {}",
        transport.count(TransportOp::Unsubscribe)
    );

    manager.remove(&id).await?;
    Ok(())
}
