//! RUT (Chilean national ID) value object.
//!
//! Format is `NNNNNNN-D` (7 or 8 digits plus a check digit), where the check
//! digit is computed by the standard modulo-11 weighted sum with weights
//! cycling 2..=7 from the least significant digit. Residue 11 maps to `0`,
//! residue 10 maps to `K`.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A validated RUT. The check digit is stored uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rut {
    number: String,
    check_digit: char,
}

impl Rut {
    /// Parse and validate a RUT string.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let (number, dv) = input
            .split_once('-')
            .ok_or_else(|| DomainError::validation("RUT debe tener formato 12345678-9"))?;

        if number.len() < 7 || number.len() > 8 || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(
                "RUT debe tener 7 u 8 dígitos antes del guión",
            ));
        }

        let mut dv_chars = dv.chars();
        let check_digit = match (dv_chars.next(), dv_chars.next()) {
            (Some(c), None) if c.is_ascii_digit() || c == 'k' || c == 'K' => {
                c.to_ascii_uppercase()
            }
            _ => {
                return Err(DomainError::validation(
                    "Dígito verificador debe ser un dígito o K",
                ));
            }
        };

        if Self::expected_check_digit(number) != check_digit {
            return Err(DomainError::validation("Dígito verificador incorrecto"));
        }

        Ok(Self {
            number: number.to_string(),
            check_digit,
        })
    }

    /// Whether `input` is a well-formed RUT with a correct check digit.
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    fn expected_check_digit(number: &str) -> char {
        let mut sum: u32 = 0;
        let mut weight: u32 = 2;
        for b in number.bytes().rev() {
            sum += u32::from(b - b'0') * weight;
            weight = if weight == 7 { 2 } else { weight + 1 };
        }
        match 11 - (sum % 11) {
            11 => '0',
            10 => 'K',
            d => char::from_digit(d, 10).unwrap_or('0'),
        }
    }
}

impl core::fmt::Display for Rut {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.number, self.check_digit)
    }
}

impl TryFrom<String> for Rut {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rut> for String {
    fn from(value: Rut) -> Self {
        value.to_string()
    }
}
