//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::LeafType;
use regex::Regex;

/// Checks `value` against `leaf_type` (spec §4.F "Type validation"),
/// returning a human-readable detail string on failure. Leafref isn't
/// checked here — it needs union-view lookup, done by the caller.
pub fn check(leaf_type: &LeafType, value: &str) -> Result<(), String> {
    match leaf_type {
        LeafType::Int64 { ranges } => {
            let n: i64 = value.parse().map_err(|_| format!("\"{value}\" isn't an integer"))?;
            if ranges.is_empty() || ranges.iter().any(|(lo, hi)| n >= *lo && n <= *hi) {
                Ok(())
            } else {
                Err(format!("{n} out of range"))
            }
        }
        LeafType::Decimal64 { fraction_digits, ranges } => {
            let n: f64 = value.parse().map_err(|_| format!("\"{value}\" isn't a decimal"))?;
            let decimals = value.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0);
            if decimals > *fraction_digits as usize {
                return Err(format!("\"{value}\" has more than {fraction_digits} fraction digits"));
            }
            if ranges.is_empty() || ranges.iter().any(|(lo, hi)| n >= *lo as f64 && n <= *hi as f64) {
                Ok(())
            } else {
                Err(format!("{n} out of range"))
            }
        }
        LeafType::String { length, patterns } => {
            let len = value.chars().count();
            if !length.is_empty() && !length.iter().any(|(min, max)| len >= *min && max.is_none_or(|m| len <= m)) {
                return Err(format!("length {len} out of bounds"));
            }
            for pattern in patterns {
                let anchored = format!("^(?:{pattern})$");
                let re = Regex::new(&anchored).map_err(|e| format!("invalid pattern \"{pattern}\": {e}"))?;
                if !re.is_match(value) {
                    return Err(format!("\"{value}\" doesn't match pattern \"{pattern}\""));
                }
            }
            Ok(())
        }
        LeafType::Boolean => match value {
            "true" | "false" => Ok(()),
            other => Err(format!("\"{other}\" isn't a boolean")),
        },
        LeafType::Empty => Ok(()),
        LeafType::Enumeration(values) => {
            if values.iter().any(|v| v == value) {
                Ok(())
            } else {
                Err(format!("\"{value}\" isn't one of {values:?}"))
            }
        }
        LeafType::Leafref(_) => Ok(()),
        LeafType::Union(branches) => {
            if branches.iter().any(|branch| check(branch, value).is_ok()) {
                Ok(())
            } else {
                Err(format!("\"{value}\" matches no branch of the union"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_range_rejects_out_of_bounds() {
        let t = LeafType::Int64 { ranges: vec![(1, 100)] };
        assert!(check(&t, "50").is_ok());
        assert!(check(&t, "200").is_err());
    }

    #[test]
    fn string_pattern_is_anchored() {
        let t = LeafType::String { length: vec![], patterns: vec!["[a-z]+".into()] };
        assert!(check(&t, "abc").is_ok());
        assert!(check(&t, "abc123").is_err());
    }

    #[test]
    fn decimal64_rejects_excess_fraction_digits() {
        let t = LeafType::Decimal64 { fraction_digits: 2, ranges: vec![] };
        assert!(check(&t, "1.23").is_ok());
        assert!(check(&t, "1.234").is_err());
    }

    #[test]
    fn union_passes_if_any_branch_matches() {
        let t = LeafType::Union(vec![
            LeafType::Int64 { ranges: vec![(0, 10)] },
            LeafType::Enumeration(vec!["auto".into()]),
        ]);
        assert!(check(&t, "5").is_ok());
        assert!(check(&t, "auto").is_ok());
        assert!(check(&t, "bogus").is_err());
    }
}
