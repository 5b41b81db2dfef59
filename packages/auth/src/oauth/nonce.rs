// ABOUTME: Anti-forgery state nonce generation for the authorization request
// ABOUTME: Produces URL-safe random strings with well over 128 bits of entropy

/// Length of the generated state nonce.
///
/// Each character carries 6 bits (64-symbol URL-safe alphabet), so 32
/// characters give 192 bits.
pub const STATE_LENGTH: usize = 32;

/// Generate a fresh state parameter for CSRF protection
pub fn generate_state() -> String {
    nanoid::nanoid!(STATE_LENGTH)
}

/// Compare a returned state against the expected nonce.
///
/// Runs in time independent of where the strings first differ.
pub fn state_matches(expected: &str, returned: Option<&str>) -> bool {
    let Some(returned) = returned else {
        return false;
    };
    if expected.len() != returned.len() || expected.is_empty() {
        return false;
    }
    expected
        .bytes()
        .zip(returned.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_state_length_and_alphabet() {
        let state = generate_state();
        assert_eq!(state.len(), STATE_LENGTH);
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_state_uniqueness() {
        let states: HashSet<String> = (0..1000).map(|_| generate_state()).collect();
        assert_eq!(states.len(), 1000);
    }

    #[test]
    fn test_state_matches() {
        let state = generate_state();
        assert!(state_matches(&state, Some(&state)));
        assert!(!state_matches(&state, Some("wrong")));
        assert!(!state_matches(&state, None));
        assert!(!state_matches("", Some("")));
    }

    #[test]
    fn test_state_matches_same_length_different_content() {
        assert!(!state_matches("abcdef", Some("abcdeg")));
    }
}
