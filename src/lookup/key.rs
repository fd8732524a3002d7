use std::fmt;

use crate::error::LookupError;

/// The canonical primary-key form of a weight: the weight rounded to a whole
/// number and written in plain decimal (no sign, no leading zeros, no fraction).
///
/// Ties round to even, so `0.5 -> "0"`, `1.5 -> "2"` and `2.5 -> "2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn from_weight(weight: f64) -> Result<Self, LookupError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(LookupError::InvalidWeight);
        }
        // `+ 0.0` turns -0.0 into 0.0
        let rounded = weight.round_ties_even() + 0.0;
        Ok(Self(format!("{rounded:.0}")))
    }

    /// Parse a weight supplied as text, e.g. a CLI argument or a JSON string.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let weight: f64 = raw.trim().parse().map_err(|_| LookupError::InvalidWeight)?;
        Self::from_weight(weight)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
