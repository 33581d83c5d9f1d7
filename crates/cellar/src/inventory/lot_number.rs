//! Lot number formatting.

use chrono::NaiveDate;

/// Maximum number of initials kept from the blend name.
const MAX_INITIALS: usize = 3;

/// Build a lot number from a blend name and bottling date.
///
/// Takes the first letter of each whitespace-separated word, uppercased and
/// truncated to three characters, followed by `-YYMMDD`.
///
/// No collision check is made. Two lots of the same blend bottled on the
/// same day get the same number; see [`with_sequence_suffix`].
///
/// ```
/// use chrono::NaiveDate;
/// use cider_cellar::inventory::generate_lot_number;
///
/// let date = NaiveDate::from_ymd_opt(2024, 9, 15).unwrap();
/// assert_eq!(generate_lot_number("Autumn Harvest", date), "AH-240915");
/// ```
#[must_use]
pub fn generate_lot_number(blend_name: &str, bottling_date: NaiveDate) -> String {
    let initials: String = blend_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(MAX_INITIALS)
        .collect();

    format!("{initials}-{}", bottling_date.format("%y%m%d"))
}

/// Make `base` unique among `taken` by appending `-2`, `-3`, ...
///
/// `base` itself is returned when it is free.
#[must_use]
pub fn with_sequence_suffix<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|t| t.as_ref() == candidate);
    if !is_taken(base) {
        return base.to_string();
    }
    (2_u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_word_blend() {
        assert_eq!(generate_lot_number("Autumn Harvest", date(2024, 9, 15)), "AH-240915");
    }

    #[test]
    fn test_truncates_to_three_initials() {
        assert_eq!(
            generate_lot_number("old orchard dry reserve", date(2023, 1, 2)),
            "OOD-230102"
        );
    }

    #[test]
    fn test_collapses_repeated_whitespace() {
        assert_eq!(
            generate_lot_number("  Kingston   Black ", date(2025, 12, 31)),
            "KB-251231"
        );
    }

    #[test]
    fn test_empty_name_keeps_date_suffix() {
        assert_eq!(generate_lot_number("", date(2024, 3, 4)), "-240304");
    }

    #[test]
    fn test_sequence_suffix_free_base() {
        let taken: [&str; 0] = [];
        assert_eq!(with_sequence_suffix("AH-240915", &taken), "AH-240915");
    }

    #[test]
    fn test_sequence_suffix_skips_taken_numbers() {
        let taken = ["AH-240915", "AH-240915-2", "AH-240915-4"];
        assert_eq!(with_sequence_suffix("AH-240915", &taken), "AH-240915-3");
    }

    #[test]
    fn test_non_ascii_initials_are_uppercased() {
        assert_eq!(generate_lot_number("élan vital", date(2024, 6, 1)), "ÉV-240601");
    }
}
