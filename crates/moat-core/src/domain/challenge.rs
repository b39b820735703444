//! The single live captcha challenge.

/// A server-issued captcha: an opaque token identifying the captcha
/// instance plus the decoded image bytes to show the user.
///
/// At most one challenge is live at a time.  A challenge is created by a
/// successful `fetch`, consumed exactly once by the subsequent `check`, and
/// discarded on re-fetch even if unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Opaque token the server uses to pair the solution with this captcha.
    pub token: String,
    /// Decoded captcha image bytes, ready for display.
    pub image: Vec<u8>,
}

impl Challenge {
    /// Creates a challenge from a token and already-decoded image bytes.
    pub fn new(token: impl Into<String>, image: Vec<u8>) -> Self {
        Self { token: token.into(), image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_holds_token_and_image() {
        let challenge = Challenge::new("abc", vec![0xFF, 0xD8]);
        assert_eq!(challenge.token, "abc");
        assert_eq!(challenge.image, vec![0xFF, 0xD8]);
    }
}
