//! Character-presence bitmasks.
//!
//! Every path tree node carries a 64-bit summary of the characters
//! appearing in its subtree's names. Fuzzy search tests the remaining
//! query suffix against that summary and skips whole subtrees that
//! cannot possibly complete a match, which is what makes fuzzy search
//! over millions of paths tractable.
//!
//! Bit layout: 0-9 for the digits, 10-35 for 'A'-'Z', 36-61 for
//! 'a'-'z', 62 for '.', 63 for '-'. Any other character maps to no bit
//! and only ever participates in exact matching.

/// Bits occupied by 'A'-'Z'.
const UPPER_BITS: u64 = 0x0000_000F_FFFF_FC00;

/// Bits occupied by 'a'-'z'.
const LOWER_BITS: u64 = 0x3FFF_FFF0_0000_0000;

/// Computes the presence mask of every character in `name`.
pub fn name_mask(name: &str) -> u64 {
    bytes_mask(name.as_bytes())
}

/// Byte-level variant used by the fuzzy matcher, which works on raw
/// query bytes.
pub(crate) fn bytes_mask(bytes: &[u8]) -> u64 {
    let mut mask = 0u64;
    for &b in bytes {
        let bit = match b {
            b'0'..=b'9' => b - b'0',
            b'A'..=b'Z' => b - b'A' + 10,
            b'a'..=b'z' => b - b'a' + 36,
            b'.' => 62,
            b'-' => 63,
            _ => continue,
        };
        mask |= 1u64 << bit;
    }
    mask
}

/// Folds each case's bit range onto the other, so a case-insensitive
/// comparison sees both spellings as present.
pub fn fold_case(mask: u64) -> u64 {
    let mut folded = mask;
    folded |= (folded & UPPER_BITS) << 26;
    folded |= (folded & LOWER_BITS) >> 26;
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        assert_eq!(name_mask("0"), 1 << 0);
        assert_eq!(name_mask("9"), 1 << 9);
        assert_eq!(name_mask("A"), 1 << 10);
        assert_eq!(name_mask("Z"), 1 << 35);
        assert_eq!(name_mask("a"), 1 << 36);
        assert_eq!(name_mask("z"), 1 << 61);
        assert_eq!(name_mask("."), 1 << 62);
        assert_eq!(name_mask("-"), 1 << 63);
    }

    #[test]
    fn test_unmapped_characters_contribute_nothing() {
        assert_eq!(name_mask("/_ !@#ü"), 0);
        assert_eq!(name_mask("a/b"), name_mask("ab"));
    }

    #[test]
    fn test_mask_is_a_union() {
        assert_eq!(
            name_mask("report.txt"),
            name_mask("r") | name_mask("e") | name_mask("p") | name_mask("o") | name_mask("t") | name_mask(".") | name_mask("x")
        );
    }

    #[test]
    fn test_fold_case_merges_both_ranges() {
        let folded = fold_case(name_mask("aZ"));
        assert_eq!(folded, name_mask("aAzZ"));
        // Digits and punctuation are unaffected.
        assert_eq!(fold_case(name_mask("3.-")), name_mask("3.-"));
    }

    #[test]
    fn test_fold_case_makes_cases_comparable() {
        let upper = fold_case(name_mask("README"));
        let lower = fold_case(name_mask("readme"));
        assert_eq!(upper, lower);
    }
}
