//! Example running a full session against the in-memory backend.
//!
//! Generates a number, copies it, shows the simulated SMS arriving and then
//! replaces the number with one from another country.
//!
//! # Running
//!
//! ```bash
//! cargo run --example local_session
//! ```

use disposable_sms::memory::{InMemoryBackend, InMemoryBackendConfig};
use disposable_sms::{MemoryClipboard, SessionCoordinator, SessionView};
use std::time::Duration;

fn print_view(view: &SessionView) {
    match (&view.lease, &view.countdown) {
        (Some(lease), Some(countdown)) => println!(
            "  {} [{}] {} left ({:?})",
            lease.number,
            lease.country,
            countdown,
            countdown.urgency()
        ),
        _ => println!("  no active number"),
    }
    for message in &view.messages {
        println!("  <- {}: {}", message.sender_address, message.body);
    }
    if let Some(notice) = &view.notice {
        println!("  ! {notice}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let backend = InMemoryBackend::new(
        InMemoryBackendConfig::default()
            .with_delivery_delay(Duration::from_secs(2))
            .with_exhausted_country("JP"),
    );
    let session = SessionCoordinator::new(backend, MemoryClipboard::new());

    println!("Available countries:");
    for country in session.countries() {
        println!("  {} - {}", country.code(), country.label());
    }

    println!("\nGenerating a US number...");
    session.generate("US").await?;
    session.copy_number().await?;
    println!(
        "Copied to clipboard: {}",
        session.clipboard().contents().unwrap_or_default()
    );
    print_view(&session.snapshot());

    println!("\nWaiting for the inbox...");
    tokio::time::sleep(Duration::from_secs(4)).await;
    print_view(&session.snapshot());

    println!("\nTrying Japan...");
    if let Err(e) = session.generate("JP").await {
        println!("Generation failed: {e}");
    }
    print_view(&session.snapshot());
    session.dismiss_notice();

    println!("\nSwitching to France...");
    session.generate("FR").await?;
    tokio::time::sleep(Duration::from_secs(4)).await;
    print_view(&session.snapshot());

    session.shutdown();
    Ok(())
}
