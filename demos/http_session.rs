//! Example running a session against a deployed backend.
//!
//! Generates a number and prints the inbox as messages arrive. Stops after
//! two minutes or on Ctrl+C.
//!
//! # Running
//!
//! ```bash
//! DISPOSABLE_SMS_URL=https://your-project.supabase.co \
//! DISPOSABLE_SMS_API_KEY=your_anon_key \
//! cargo run --example http_session -- UK
//! ```

use disposable_sms::http::HttpBackend;
use disposable_sms::{
    CancellationToken, MemoryClipboard, RetryConfig, RetryableBackend, SessionCoordinator,
};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = env::var("DISPOSABLE_SMS_URL")
        .expect("DISPOSABLE_SMS_URL environment variable must be set");
    let api_key = env::var("DISPOSABLE_SMS_API_KEY")
        .expect("DISPOSABLE_SMS_API_KEY environment variable must be set");
    let country = env::args().nth(1).unwrap_or_else(|| "US".to_string());

    let backend = RetryableBackend::with_config(
        HttpBackend::new(&url, api_key)?,
        RetryConfig::default().with_max_retries(2),
    );

    let cancel_token = CancellationToken::new();
    let session = SessionCoordinator::builder(backend, MemoryClipboard::new())
        .cancellation_token(cancel_token.clone())
        .build();

    let lease = session.generate(&country).await?;
    println!("Your number: {} (expires {})", lease.number, lease.expires_at);

    let token_clone = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCancelling...");
            token_clone.cancel();
        }
    });

    let mut seen = 0;
    let deadline = tokio::time::sleep(Duration::from_secs(120));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = &mut deadline => break,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }

        let view = session.snapshot();
        if view.messages.len() != seen {
            seen = view.messages.len();
            println!("Inbox ({seen}):");
            for message in &view.messages {
                println!("  {} {}: {}", message.received_at, message.sender_address, message.body);
            }
        }
        if let Some(notice) = view.notice {
            println!("{notice}");
            break;
        }
    }

    session.shutdown();
    Ok(())
}
