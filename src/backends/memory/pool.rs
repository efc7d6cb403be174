//! Sample messages used to simulate inbound SMS.

use rand::Rng;
use rand::seq::SliceRandom;

/// One simulated inbound SMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMessage {
    /// Sender phone number or short code.
    pub sender: String,
    /// Message text.
    pub body: String,
}

impl SampleMessage {
    /// Create a new sample.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }
}

/// Pool the in-memory backend draws simulated messages from.
///
/// An empty pool disables simulated delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePool {
    samples: Vec<SampleMessage>,
}

impl MessagePool {
    /// Create a pool from explicit samples.
    pub fn new(samples: Vec<SampleMessage>) -> Self {
        Self { samples }
    }

    /// Pool without samples.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the pool has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples.
    pub fn samples(&self) -> &[SampleMessage] {
        &self.samples
    }

    /// Draw one sample uniformly.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SampleMessage> {
        self.samples.choose(rng)
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new(vec![
            SampleMessage::new("+1234567890", "Your verification code is: 123456"),
            SampleMessage::new(
                "+9876543210",
                "Welcome! Your account has been created successfully.",
            ),
            SampleMessage::new("+5555555555", "Your OTP is 789012. Valid for 5 minutes."),
            SampleMessage::new(
                "+1111111111",
                "Thank you for signing up! Please confirm your email address.",
            ),
            SampleMessage::new(
                "+2222222222",
                "Security alert: New login detected from Chrome browser.",
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_default_pool() {
        let pool = MessagePool::default();
        assert_eq!(pool.len(), 5);
        assert!(pool.samples().iter().all(|s| s.sender.starts_with('+')));
    }

    #[test]
    fn test_pick_from_single_sample() {
        let pool = MessagePool::new(vec![SampleMessage::new("+100", "hello")]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pool.pick(&mut rng).unwrap().body, "hello");
    }

    #[test]
    fn test_pick_from_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(MessagePool::empty().pick(&mut rng).is_none());
    }
}
