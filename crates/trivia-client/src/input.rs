use trivia_common::protocol;

/// A guess is sent only if it is a number naming one of the current options.
/// With no question on screen (`num_options == 0`) nothing is valid.
pub fn validate_guess(line: &str, num_options: usize) -> Option<u32> {
    protocol::parse_guess(line).filter(|&guess| guess >= 1 && guess as usize <= num_options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_in_range() {
        assert_eq!(validate_guess("1", 3), Some(1));
        assert_eq!(validate_guess("3", 3), Some(3));
        assert_eq!(validate_guess("03", 3), Some(3));
    }

    #[test]
    fn test_guess_out_of_range() {
        assert_eq!(validate_guess("0", 3), None);
        assert_eq!(validate_guess("4", 3), None);
        assert_eq!(validate_guess("1", 0), None);
    }

    #[test]
    fn test_guess_not_numeric() {
        assert_eq!(validate_guess("", 3), None);
        assert_eq!(validate_guess("two", 3), None);
        assert_eq!(validate_guess(" 2", 3), None);
        assert_eq!(validate_guess("-2", 3), None);
    }
}
