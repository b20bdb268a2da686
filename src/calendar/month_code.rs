//! Futures delivery-month letter codes.
//!
//! Exchanges identify delivery months by the fixed letter sequence:
//! F=Jan, G=Feb, H=Mar, J=Apr, K=May, M=Jun,
//! N=Jul, Q=Aug, U=Sep, V=Oct, X=Nov, Z=Dec.

/// Month codes indexed by zero-based month number.
pub const MONTH_CODES: [char; 12] = ['F', 'G', 'H', 'J', 'K', 'M', 'N', 'Q', 'U', 'V', 'X', 'Z'];

/// Convert a month number (1-12) to its futures month code.
pub fn month_to_code(month: u32) -> Option<char> {
    match month {
        1..=12 => Some(MONTH_CODES[(month - 1) as usize]),
        _ => None,
    }
}

/// Convert a futures month code to its month number (1-12).
pub fn code_to_month(code: char) -> Option<u32> {
    let code = code.to_ascii_uppercase();
    MONTH_CODES
        .iter()
        .position(|&c| c == code)
        .map(|idx| idx as u32 + 1)
}

/// Whether a character is a valid futures month code.
pub fn is_month_code(code: char) -> bool {
    code_to_month(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_code_conversion() {
        assert_eq!(month_to_code(1), Some('F'));
        assert_eq!(month_to_code(3), Some('H'));
        assert_eq!(month_to_code(6), Some('M'));
        assert_eq!(month_to_code(9), Some('U'));
        assert_eq!(month_to_code(12), Some('Z'));

        assert_eq!(code_to_month('H'), Some(3));
        assert_eq!(code_to_month('Z'), Some(12));
        assert_eq!(code_to_month('h'), Some(3)); // case-insensitive
        assert_eq!(code_to_month('A'), None);
    }

    #[test]
    fn test_out_of_range_months() {
        assert_eq!(month_to_code(0), None);
        assert_eq!(month_to_code(13), None);
    }

    #[test]
    fn test_is_month_code() {
        assert!(is_month_code('F'));
        assert!(is_month_code('z'));
        assert!(!is_month_code('E'));
        assert!(!is_month_code('1'));
    }
}
