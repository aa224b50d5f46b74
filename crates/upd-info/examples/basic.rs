//! Basic usage example for upd-info
//!
//! Run with: cargo run --package upd-info --example basic

use upd_info::RegistryClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== upd-info Basic Example ===\n");

    let client = RegistryClient::new()?;

    for name in ["react", "@types/node"] {
        println!("Fetching {name} from npm...");
        let info = client.fetch_npm(name).await?;
        println!("   Latest: {}", info.latest().unwrap_or("N/A"));
        println!("   Versions published: {}", info.versions.len());
        println!("   Response size: {} bytes\n", info.bytes);
    }

    Ok(())
}
