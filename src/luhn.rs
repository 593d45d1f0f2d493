// 🔢 Luhn Checksum - mod-10 check digit engine
// Derives and verifies the trailing digit of every synthesized number

// ============================================================================
// CHECK DIGIT
// ============================================================================

/// Compute the Luhn check digit for `partial` (the number without its last digit)
///
/// Walking from the rightmost digit leftwards, the 1st, 3rd, 5th... digits are
/// doubled (because the check digit will sit to their right).
///
/// # Returns
/// * `Some(digit)` - 0..=9
/// * `None` - if `partial` is empty or contains anything but ASCII digits
pub fn check_digit(partial: &str) -> Option<u8> {
    if partial.is_empty() || !partial.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits: Vec<u8> = partial.bytes().map(|b| b - b'0').collect();
    Some(check_digit_of(&digits))
}

/// Same as `check_digit`, over digit values (each 0..=9) instead of text
pub fn check_digit_of(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            let d = u32::from(d);
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    ((10 - sum % 10) % 10) as u8
}

/// Validate a full card number (check digit included)
///
/// Spaces and hyphens are ignored. Any other non-digit, an empty string or a
/// single lone digit yields `false`.
pub fn validate(full: &str) -> bool {
    let cleaned: String = full
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if cleaned.len() < 2 || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let (body, last) = cleaned.split_at(cleaned.len() - 1);
    match check_digit(body) {
        Some(expected) => last.as_bytes()[0] - b'0' == expected,
        None => false,
    }
}

/// Append the check digit to `partial`
pub fn complete(partial: &str) -> Option<String> {
    let digit = check_digit(partial)?;
    Some(format!("{}{}", partial, digit))
}

// ============================================================================
// DISPLAY
// ============================================================================

/// Group a number for reading
///
/// Amex-length (15): `XXXX XXXXXX XXXXX`, everything else in blocks of 4.
pub fn format_card_number(number: &str) -> String {
    if number.len() == 15 && number.is_ascii() {
        return format!("{} {} {}", &number[..4], &number[4..10], &number[10..]);
    }

    number
        .chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
