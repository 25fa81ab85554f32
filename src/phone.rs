//! Phone number formatting.
//!
//! One canonical form is used everywhere a number is stored or displayed:
//! `xxx-xxx-xxxx`, applied only when the input holds exactly ten digits.
//! Every other input passes through untouched.

/// Number of digits in a dialable number.
pub const NANP_DIGITS: usize = 10;

/// Keep only the ASCII digits of `number`.
pub fn digits_only(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Remove every `-` from `number`.
pub fn strip_dashes(number: &str) -> String {
    number.replace('-', "")
}

/// Format a number into canonical `xxx-xxx-xxxx` form.
///
/// Only applies when the cleaned digit count is exactly ten; any other input
/// (seven digits, international numbers, free text) is returned verbatim.
/// Already-canonical input is returned unchanged.
pub fn format_phone_number(number: &str) -> String {
    let cleaned = digits_only(number);
    if cleaned.len() == NANP_DIGITS {
        format!("{}-{}-{}", &cleaned[0..3], &cleaned[3..6], &cleaned[6..])
    } else {
        number.to_string()
    }
}

/// True when `number` is already in canonical form.
pub fn is_canonical(number: &str) -> bool {
    number.len() == 12
        && number.char_indices().all(|(i, c)| match i {
            3 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        })
}

/// Format a partially dialed number the way the keypad displays it.
///
/// Dashes appear as soon as a group is complete: `832` shows as `832-`,
/// `832234` as `832-234-`.
pub fn format_as_typed(input: &str) -> String {
    let digits = digits_only(input);
    let len = digits.len();

    if len < 3 {
        return digits;
    }
    if len == 3 {
        return format!("{}-", &digits[..3]);
    }
    if len < 6 {
        return format!("{}-{}", &digits[..3], &digits[3..]);
    }
    format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..])
}

/// Append a keypad digit to the displayed number.
///
/// Non-digit keys and digits past the tenth are ignored.
pub fn push_digit(current: &str, key: char) -> String {
    let mut digits = digits_only(current);
    if key.is_ascii_digit() && digits.len() < NANP_DIGITS {
        digits.push(key);
    }
    format_as_typed(&digits)
}

/// Remove the last digit from the displayed number.
pub fn pop_digit(current: &str) -> String {
    let mut digits = digits_only(current);
    digits.pop();
    format_as_typed(&digits)
}
