//! Scan for beacons and print distance readings
//!
//! Run with: cargo run --example scan_distance

use beacon_proximity::{BeaconSession, BtleplugRadio, Result, SessionConfig};
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

    let config = SessionConfig::default();
    println!("Scanning for beacons of service {}...", config.service_id);

    let session = BeaconSession::with_radio(&BtleplugRadio::new(), config).await?;

    let _distance_handle = session.on_distance(|reading| {
        let frame = &reading.frame;
        match reading.distance() {
            Some(meters) => println!(
                "Beacon {}/{}: {:.2} m (RSSI {} dBm, reference {} dBm)",
                frame.major, frame.minor, meters, reading.rssi, frame.reference_power
            ),
            None => println!("Beacon {}/{}: distance unknown", frame.major, frame.minor),
        }
    });

    let _proximity_handle = session.on_proximity(|transition| {
        println!("Proximity: {:?}", transition);
    });

    let _error_handle = session.on_error(|error| {
        eprintln!("Error: {}", error);
    });

    session.start_scan().await?;

    println!("Scanning for 30 seconds...");
    println!("Press Ctrl+C to exit early.\n");

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(30)) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted!");
        }
    }

    session.shutdown().await?;
    println!("Done!");

    Ok(())
}
