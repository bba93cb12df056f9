// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit conversion into the host's internal unit
//!
//! Hosts store lengths in decimal feet. Source data arrives tagged with a
//! unit name; [`scale_factor`] returns the multiplier that converts a length
//! in that unit into feet.

const MM_PER_FOOT: f64 = 304.8;

/// Multiplier converting a length in `unit` into host feet.
///
/// Matching is case-insensitive and accepts the common abbreviations and
/// spellings. Unrecognized units return `1.0`.
#[inline]
pub fn scale_factor(unit: &str) -> f64 {
    match unit.trim().to_ascii_lowercase().as_str() {
        "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => 1.0 / MM_PER_FOOT,
        "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => 10.0 / MM_PER_FOOT,
        "m" | "meter" | "meters" | "metre" | "metres" => 1000.0 / MM_PER_FOOT,
        "in" | "inch" | "inches" | "\"" => 1.0 / 12.0,
        "ft" | "foot" | "feet" | "'" => 1.0,
        _ => 1.0, // Unknown = already host units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_metric_factors() {
        assert_relative_eq!(scale_factor("millimeters"), 1.0 / 304.8, epsilon = 1e-12);
        assert_relative_eq!(scale_factor("MM"), 1.0 / 304.8, epsilon = 1e-12);
        assert_relative_eq!(scale_factor("Centimetres"), 1.0 / 30.48, epsilon = 1e-12);
        assert_relative_eq!(scale_factor("m"), 1.0 / 0.3048, epsilon = 1e-12);
    }

    #[test]
    fn test_imperial_factors() {
        assert_relative_eq!(scale_factor("inches"), 1.0 / 12.0, epsilon = 1e-12);
        assert_eq!(scale_factor("feet"), 1.0);
    }

    #[test]
    fn test_unknown_unit_is_identity() {
        assert_eq!(scale_factor("furlongs"), 1.0);
        assert_eq!(scale_factor(""), 1.0);
    }
}
