// src/models/cpf.rs
//! CPF (Cadastro de Pessoas Físicas) identifier model.
//!
//! A CPF is accepted when, after every non-digit character is stripped, exactly
//! eleven digits remain and they are not all the same digit. The official
//! modulo-11 check digits are intentionally **not** verified: the deployed
//! handler only performs this shape check, and callers rely on that behavior
//! (e.g. `52998224726` is accepted even though its last digit is wrong).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of digits in a normalized CPF.
pub const CPF_LENGTH: usize = 11;

/// Reasons a raw string is not accepted as a CPF.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpfError {
    /// Wrong number of digits once separators were removed.
    #[error("CPF must contain {CPF_LENGTH} digits, found {0}")]
    InvalidLength(usize),

    /// All eleven digits are the same (e.g. `000.000.000-00`).
    #[error("CPF is a repeated-digit sequence")]
    RepeatedDigits,
}

/// A validated, normalized CPF: always eleven ASCII digits.
///
/// The only way to obtain a `Cpf` is [`Cpf::parse`], so holding one proves the
/// shape check already passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Normalizes and validates a raw CPF string.
    ///
    /// # Arguments
    /// * `raw` - User input, with or without `.`/`-` separators
    ///
    /// # Errors
    /// - [`CpfError::InvalidLength`] if the digit count is not eleven
    /// - [`CpfError::RepeatedDigits`] for degenerate sequences
    pub fn parse(raw: &str) -> Result<Self, CpfError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        if digits.len() != CPF_LENGTH {
            return Err(CpfError::InvalidLength(digits.len()));
        }

        let first = digits.as_bytes()[0];
        if digits.bytes().all(|b| b == first) {
            return Err(CpfError::RepeatedDigits);
        }

        Ok(Self(digits))
    }

    /// The eleven normalized digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering that keeps only the first three and last two digits.
    pub fn masked(&self) -> String {
        format!("{}.***.***-{}", &self.0[..3], &self.0[9..])
    }
}

/// Returns `true` if `raw` normalizes to an acceptable CPF.
///
/// Pure and total: never panics, whatever the input.
pub fn validate(raw: &str) -> bool {
    Cpf::parse(raw).is_ok()
}

impl fmt::Display for Cpf {
    /// Formats as `XXX.XXX.XXX-XX`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.0;
        write!(f, "{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..])
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Cpf {
    type Error = CpfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cpf::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_input_is_normalized() {
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");
        assert_eq!(cpf.to_string(), "529.982.247-25");
    }

    #[test]
    fn test_short_and_long_inputs_are_rejected() {
        for raw in ["", "1", "5299822472", "529.982.247-2", "abc"] {
            assert!(!validate(raw), "{raw:?} should be rejected");
        }
        for raw in ["529982247250", "529.982.247-251", "1234567890123456"] {
            assert!(!validate(raw), "{raw:?} should be rejected");
        }
        assert_eq!(Cpf::parse("12-34"), Err(CpfError::InvalidLength(4)));
    }

    #[test]
    fn test_repeated_digit_sequences_are_rejected() {
        for d in '0'..='9' {
            let raw: String = std::iter::repeat(d).take(CPF_LENGTH).collect();
            assert_eq!(Cpf::parse(&raw), Err(CpfError::RepeatedDigits));
        }
        assert!(!validate("111.111.111-11"));
    }

    #[test]
    fn test_check_digits_are_not_verified() {
        // Valid checksum
        assert!(validate("52998224725"));
        // Wrong checksum, still accepted
        assert!(validate("52998224726"));
        assert!(validate("12345678900"));
        assert!(validate("00000000001"));
    }

    #[test]
    fn test_non_digit_noise_is_stripped() {
        assert!(validate(" 529 982 247 25 "));
        assert!(validate("cpf:52998224725"));
        // Non-ASCII digits do not count
        assert!(!validate("５２９９８２２４７２５"));
    }

    #[test]
    fn test_masked_hides_middle_digits() {
        let cpf = Cpf::parse("52998224725").unwrap();
        assert_eq!(cpf.masked(), "529.***.***-25");
    }

    #[test]
    fn test_serde_rejects_invalid_values() {
        let cpf: Cpf = serde_json::from_str("\"529.982.247-25\"").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");
        assert_eq!(serde_json::to_string(&cpf).unwrap(), "\"52998224725\"");
        assert!(serde_json::from_str::<Cpf>("\"00000000000\"").is_err());
    }
}
