//! Callbook lookup example for the HamQTH library.
//!
//! Looks up every call sign given on the command line the way a QSO logger
//! would: print the record, or print the error and move on to the next one.
//!
//! Usage:
//! ```
//! HAMQTH_USER=your_username HAMQTH_PASS=your_password cargo run --example callbook_lookup -- OK7AN AG5XY
//! ```

use hamqth_xml::{HamQthClient, HamQthError};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: callbook_lookup <callsign> [<callsign> ...]");
        eprintln!("Example: callbook_lookup OK7AN");
        std::process::exit(1);
    }

    let client = match HamQthClient::from_env() {
        Ok(client) => client,
        Err(e @ HamQthError::MissingCredentials { .. }) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    for call_sign in &args {
        println!("\n=== {} ===", call_sign.trim().to_uppercase());

        match client.callbook_lookup(call_sign).await {
            Ok(info) => {
                println!("Call: {}", info.call_sign);

                if let Some(name) = &info.name {
                    println!("Name: {}", name);
                }

                if let Some(location) = info.location() {
                    println!("Location: {}", location);
                }

                if let Some(grid) = &info.grid {
                    println!("Grid: {}", grid);
                }

                // Zones
                if let (Some(cq), Some(itu)) = (&info.cq_zone, &info.itu_zone) {
                    println!("Zones: CQ {}, ITU {}", cq, itu);
                }
            }
            Err(HamQthError::NotFound { callsign }) => {
                println!("No callbook entry for {}", callsign);
            }
            Err(HamQthError::LoginFailed { reason }) => {
                eprintln!("HamQTH login failed: {}", reason);
            }
            Err(e) if e.is_transient() => {
                eprintln!("{} (try again later)", e);
            }
            Err(e) => {
                eprintln!("Lookup error: {}", e);
            }
        }
    }

    Ok(())
}
