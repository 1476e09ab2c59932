//! Validated primitive types shared across the OPD encounter backend.
//!
//! Construction is the only place validation happens: once a value of one of
//! these types exists, its invariant holds everywhere it flows. Domain code
//! should accept these types at its boundaries instead of re-checking raw
//! strings and numbers.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ENTITY IDENTIFIERS
// ============================================================================

/// Errors that can occur when parsing an entity identifier.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was not a valid UUID
    #[error("invalid identifier: {0}")]
    Invalid(String),
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Validates and parses an externally supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Invalid` if `input` is not a valid UUID.
            pub fn parse(input: &str) -> Result<Self, IdError> {
                Uuid::parse_str(input)
                    .map(Self)
                    .map_err(|_| IdError::Invalid(input.to_owned()))
            }

            /// Returns the underlying UUID.
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered patient.
    PatientId
);
entity_id!(
    /// Identifier of a doctor (master data).
    DoctorId
);
entity_id!(
    /// Identifier of a clinical visit (one encounter on one day).
    VisitId
);
entity_id!(
    /// Identifier of the prescription owned by a visit.
    PrescriptionId
);
entity_id!(
    /// Identifier of the bill owned by a visit.
    BillId
);
entity_id!(
    /// Identifier of a medicine in the formulary (master data).
    MedicineId
);
entity_id!(
    /// Identifier of a dose pattern (master data).
    DoseId
);
entity_id!(
    /// Identifier of a predefined advice item (master data).
    AdviceId
);

// ============================================================================
// MONETARY TYPES
// ============================================================================

/// Errors that can occur when creating monetary or percentage values.
#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    /// A monetary amount was negative
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// A percentage was outside 0..=100
    #[error("percentage must be between 0 and 100: {0}")]
    PercentageOutOfRange(Decimal),
}

/// A non-negative monetary amount.
///
/// All fees, payments and derived billing totals in the system are `Money`;
/// negative amounts are rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Negative` if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, AmountError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(AmountError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the inner decimal value.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts. Non-negative inputs cannot overflow a `Decimal` in
    /// any realistic billing scenario, so this is a plain addition.
    pub fn plus(&self, other: Money) -> Money {
        Money(self.0 + other.0)
    }

    /// Subtracts `other`, clamping at zero rather than going negative.
    pub fn saturating_sub(&self, other: Money) -> Money {
        if other.0 >= self.0 {
            Money::zero()
        } else {
            Money(self.0 - other.0)
        }
    }

    /// Rounds to two decimal places using banker's rounding.
    pub fn rounded(&self) -> Money {
        Money(self.0.round_dp(2))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = serde::Deserialize::deserialize(deserializer)?;
        Money::new(amount).map_err(serde::de::Error::custom)
    }
}

/// A percentage bounded to `0..=100`.
///
/// Used for bill discounts and taxes, where an out-of-range value would make
/// derived totals negative or nonsensical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Percentage(Decimal);

impl Percentage {
    /// Wraps a decimal percentage, rejecting values outside `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::PercentageOutOfRange` for out-of-range input.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(AmountError::PercentageOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// The zero percentage.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the percentage as entered (e.g. `10` for 10%).
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the percentage as a fraction (e.g. `0.10` for 10%).
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Percentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde::Deserialize::deserialize(deserializer)?;
        Percentage::new(value).map_err(serde::de::Error::custom)
    }
}
