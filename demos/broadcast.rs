//! Broadcast a beacon frame and report what the radio says
//!
//! Run with: cargo run --example broadcast

use beacon_proximity::{
    BeaconEvent, BeaconFrame, BeaconSession, BtleplugRadio, Result, SessionConfig,
    BEACON_SERVICE_UUID,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("beacon_proximity=debug".parse().unwrap()),
        )
        .init();

    let session = BeaconSession::with_radio(&BtleplugRadio::new(), SessionConfig::default()).await?;
    let mut events = session.subscribe();

    let frame = BeaconFrame::new(BEACON_SERVICE_UUID, 9, 6, -75);
    println!("Payload: {:02X?}", frame.encode());

    session.start_advertise(frame).await?;

    let deadline = tokio::time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(BeaconEvent::Error(error)) if !error.is_failure() => println!("{}", error),
                Ok(BeaconEvent::Error(error)) => {
                    println!("{}", error);
                    if let Some(caps) = error.capabilities() {
                        println!("  multiple advertisement: {}", caps.multi_advertise);
                        println!("  offloaded filtering:    {}", caps.offload_filter);
                        println!("  offloaded batch scan:   {}", caps.offload_batch_scan);
                    }
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            },
            _ = &mut deadline => break,
        }
    }

    session.shutdown().await?;
    Ok(())
}
