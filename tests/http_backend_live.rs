//! Integration tests against a deployed backend.
//!
//! These tests make real API calls and need a project URL and API key.
//! They are ignored by default and should be run manually.
//!
//! # Setup
//!
//! 1. Create `tests/.env` with:
//!    ```text
//!    DISPOSABLE_SMS_URL=https://your-project.supabase.co
//!    DISPOSABLE_SMS_API_KEY=your_anon_key
//!    ```
//!
//! 2. Run the tests:
//!    ```bash
//!    cargo test --test http_backend_live -- --ignored
//!    ```
//!
//! **WARNING**: Every run allocates real numbers!

use disposable_sms::http::{HttpBackend, HttpBackendError};
use disposable_sms::{
    Backend, MemoryClipboard, RetryConfig, RetryableBackend, RetryableError, SessionCoordinator,
};
use std::env;
use std::time::Duration;

/// Read endpoint and key from the environment or a .env file.
fn get_credentials() -> (String, String) {
    dotenvy::dotenv().ok();

    let url = env::var("DISPOSABLE_SMS_URL")
        .expect("DISPOSABLE_SMS_URL must be set (environment or tests/.env)");
    let key = env::var("DISPOSABLE_SMS_API_KEY")
        .expect("DISPOSABLE_SMS_API_KEY must be set (environment or tests/.env)");
    (url, key)
}

fn create_backend() -> HttpBackend {
    let (url, key) = get_credentials();
    HttpBackend::new(&url, key).expect("Failed to create backend")
}

/// Skip quietly when the deployment has run out of numbers.
fn is_no_numbers_error(err: &HttpBackendError) -> bool {
    err.no_numbers_available()
}

#[test]
#[ignore = "requires backend credentials"]
fn test_backend_creation() {
    let _backend = create_backend();
}

#[tokio::test]
#[ignore = "requires backend credentials and allocates a number"]
async fn test_generate_phone_us() {
    let backend = create_backend();

    match backend.generate_phone("US").await {
        Ok(lease) => {
            println!("Got lease {} -> {}", lease.id, lease.number);
            assert!(lease.number.starts_with("+1 "));
            assert!(lease.expires_at > lease.issued_at);
        }
        Err(e) if is_no_numbers_error(&e) => println!("No numbers available: {e}"),
        Err(e) => panic!("Unexpected error: {e:?}"),
    }
}

#[tokio::test]
#[ignore = "requires backend credentials and allocates a number"]
async fn test_messages_of_fresh_lease() {
    let backend = create_backend();

    let lease = match backend.generate_phone("GB").await {
        Ok(lease) => lease,
        Err(e) if is_no_numbers_error(&e) => {
            println!("No numbers available: {e}");
            return;
        }
        Err(e) => panic!("Unexpected error: {e:?}"),
    };

    let messages = backend
        .get_messages(&lease.id)
        .await
        .expect("Failed to fetch messages");
    println!("Fresh lease has {} message(s)", messages.len());
    assert!(messages.iter().all(|m| m.lease_id == lease.id));
}

#[tokio::test]
#[ignore = "requires backend credentials and allocates a number"]
async fn test_session_receives_inbox() {
    let backend = RetryableBackend::with_config(
        create_backend(),
        RetryConfig::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(5))
            .with_max_retries(3),
    );
    let session = SessionCoordinator::new(backend, MemoryClipboard::new());

    match session.generate("US").await {
        Ok(lease) => println!("Session number: {}", lease.number),
        Err(e) if e.no_numbers_available() => {
            println!("No numbers available: {e}");
            return;
        }
        Err(e) => panic!("Unexpected error: {e:?}"),
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    let view = session.snapshot();
    println!("Inbox after 10s: {} message(s)", view.messages.len());
    assert!(view.lease.is_some());

    session.copy_number().await.expect("Copy failed");
    assert!(session.snapshot().copied);
    session.shutdown();
}
