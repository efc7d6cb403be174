//! Synthetic phone number generation and display formatting.

use crate::countries::Country;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").unwrap());

/// Generate a plausible phone number for `country_code`.
///
/// Unknown codes fall back to the North American format. The shape is fixed
/// per country, the digits are random and nothing guarantees uniqueness.
///
/// # Example
///
/// ```rust
/// use disposable_sms::generate_number;
///
/// let number = generate_number("UK");
/// assert!(number.starts_with("+44 "));
/// ```
pub fn generate_number(country_code: &str) -> String {
    generate_number_with(country_code, &mut rand::thread_rng())
}

/// Same as [`generate_number`] with an explicit random source.
pub fn generate_number_with<R: Rng + ?Sized>(country_code: &str, rng: &mut R) -> String {
    match Country::resolve(country_code) {
        Country::UnitedStates | Country::Canada => north_american(rng),
        Country::UnitedKingdom => {
            let area = rng.gen_range(1000..9999);
            let number = rng.gen_range(0..1_000_000);
            format!("+44 {area} {number:06}")
        }
        Country::Australia => {
            let area = rng.gen_range(1..=9);
            let number = rng.gen_range(0..100_000_000);
            format!("+61 {area} {number:08}")
        }
        Country::Germany => {
            let area = rng.gen_range(100..9999);
            let number = rng.gen_range(0..10_000_000);
            format!("+49 {area} {number:07}")
        }
        Country::France => {
            let first = rng.gen_range(1..=9);
            let groups: Vec<String> = (0..4)
                .map(|_| format!("{:02}", rng.gen_range(0..100)))
                .collect();
            format!("+33 {first} {}", groups.join(" "))
        }
        Country::Japan => {
            let area = rng.gen_range(10..999);
            let number = rng.gen_range(0..100_000_000);
            format!("+81 {area} {number:08}")
        }
        Country::India => {
            // Mobile numbers start with 6-9
            let first = rng.gen_range(6..=9);
            let number = rng.gen_range(0..1_000_000_000);
            format!("+91 {first}{number:09}")
        }
    }
}

fn north_american<R: Rng + ?Sized>(rng: &mut R) -> String {
    let area = rng.gen_range(200..999);
    let exchange = rng.gen_range(200..999);
    let number = rng.gen_range(0..10_000);
    format!("+1 ({area}) {exchange}-{number:04}")
}

/// Normalise a raw number for display.
///
/// Eleven ASCII digits starting with `1` are rendered in the North American
/// format; anything else is returned unchanged.
pub fn format_phone_number(raw: &str) -> String {
    let digits = NON_DIGIT.replace_all(raw, "");
    if digits.len() == 11 && digits.starts_with('1') {
        return format!(
            "+1 ({}) {}-{}",
            &digits[1..4],
            &digits[4..7],
            &digits[7..]
        );
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn parse(s: &str) -> u32 {
        s.parse().unwrap()
    }

    #[test]
    fn test_us_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let re = Regex::new(r"^\+1 \((\d{3})\) (\d{3})-(\d{4})$").unwrap();
        for _ in 0..500 {
            let number = generate_number_with("US", &mut rng);
            let caps = re.captures(&number).unwrap();
            assert!((200..999).contains(&parse(&caps[1])));
            assert!((200..999).contains(&parse(&caps[2])));
        }
    }

    #[test]
    fn test_india_leading_digit() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let number = generate_number_with("IN", &mut rng);
            let first = number.as_bytes()[4];
            assert!((b'6'..=b'9').contains(&first), "bad number {number}");
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_number_with("DE", &mut StdRng::seed_from_u64(42));
        let b = generate_number_with("DE", &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_nanp() {
        assert_eq!(format_phone_number("14155550134"), "+1 (415) 555-0134");
        assert_eq!(format_phone_number("+1-415-555-0134"), "+1 (415) 555-0134");
    }

    #[test]
    fn test_format_passthrough() {
        assert_eq!(format_phone_number("+44 1234 567890"), "+44 1234 567890");
        assert_eq!(format_phone_number("24155550134"), "24155550134");
        assert_eq!(format_phone_number(""), "");
    }

    #[test]
    fn test_format_ignores_non_ascii_digits() {
        // Arabic-Indic digits are not dialable digits
        assert_eq!(format_phone_number("1١٢٣٤٥"), "1١٢٣٤٥");
        assert_eq!(format_phone_number("+1 ٤١٥ 555 0134"), "+1 ٤١٥ 555 0134");
        assert_eq!(
            format_phone_number("1 (415) ５５５-0134"),
            "1 (415) ５５５-0134"
        );
    }
}
