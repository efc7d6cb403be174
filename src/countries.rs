//! Catalog of countries a number can be generated for.

use crate::types::DialCode;
use keshvar::Alpha2;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Error when looking up a country code.
#[derive(Debug, Clone, Error)]
pub enum CountryError {
    /// The code is not part of the catalog.
    #[error("Unknown country code '{code}'")]
    Unknown { code: String },
}

/// Country offered by the number picker.
///
/// This is a closed set. Lookups by code never fail hard: use
/// [`Country::resolve`] to fall back to [`Country::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    UnitedStates,
    UnitedKingdom,
    Canada,
    Australia,
    Germany,
    France,
    Japan,
    India,
}

impl Country {
    /// Every country in picker order.
    pub const ALL: [Country; 8] = [
        Country::UnitedStates,
        Country::UnitedKingdom,
        Country::Canada,
        Country::Australia,
        Country::Germany,
        Country::France,
        Country::Japan,
        Country::India,
    ];

    /// Country used for unknown codes.
    pub const DEFAULT: Country = Country::UnitedStates;

    /// Picker code, e.g. "US" or "UK".
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnitedStates => "US",
            Self::UnitedKingdom => "UK",
            Self::Canada => "CA",
            Self::Australia => "AU",
            Self::Germany => "DE",
            Self::France => "FR",
            Self::Japan => "JP",
            Self::India => "IN",
        }
    }

    /// Human-readable name shown in the picker.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UnitedStates => "United States",
            Self::UnitedKingdom => "United Kingdom",
            Self::Canada => "Canada",
            Self::Australia => "Australia",
            Self::Germany => "Germany",
            Self::France => "France",
            Self::Japan => "Japan",
            Self::India => "India",
        }
    }

    fn dial_digits(&self) -> &'static str {
        match self {
            Self::UnitedStates | Self::Canada => "1",
            Self::UnitedKingdom => "44",
            Self::Australia => "61",
            Self::Germany => "49",
            Self::France => "33",
            Self::Japan => "81",
            Self::India => "91",
        }
    }

    /// International dialing prefix.
    pub fn dial_code(&self) -> DialCode {
        DialCode::from_catalog(self.dial_digits())
    }

    /// Picker label, e.g. "United Kingdom (+44)".
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.display_name(),
            self.dial_code().with_plus_prefix()
        )
    }

    /// ISO 3166-1 alpha-2 code. The picker says "UK", ISO says "GB".
    pub fn alpha2(&self) -> Alpha2 {
        match self {
            Self::UnitedStates => Alpha2::US,
            Self::UnitedKingdom => Alpha2::GB,
            Self::Canada => Alpha2::CA,
            Self::Australia => Alpha2::AU,
            Self::Germany => Alpha2::DE,
            Self::France => Alpha2::FR,
            Self::Japan => Alpha2::JP,
            Self::India => Alpha2::IN,
        }
    }

    /// Full ISO country record.
    pub fn to_keshvar(&self) -> keshvar::Country {
        self.alpha2().to_country()
    }

    /// Look up a country by picker code or ISO alpha-2 code.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        if let Some(country) = Self::ALL.iter().find(|c| c.code() == code) {
            return Some(*country);
        }

        let iso = keshvar::Country::try_from(code.as_str()).ok()?;
        Self::ALL
            .iter()
            .find(|c| c.alpha2() == iso.alpha2())
            .copied()
    }

    /// Look up a country, falling back to [`Country::DEFAULT`].
    pub fn resolve(code: &str) -> Self {
        Self::from_code(code).unwrap_or(Self::DEFAULT)
    }
}

impl Display for Country {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Country {
    type Err = CountryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| CountryError::Unknown {
            code: s.to_string(),
        })
    }
}
