use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// RFC 7636 §4.1: verifier length bounds.
const MIN_VERIFIER_LEN: usize = 43;
const MAX_VERIFIER_LEN: usize = 128;

/// PKCE validation errors.
#[derive(Debug, PartialEq, Eq)]
pub enum PkceError {
    /// The verifier is shorter than 43 or longer than 128 characters.
    InvalidLength(usize),
    /// The verifier contains a character outside the unreserved set.
    InvalidCharacter(char),
}

impl std::fmt::Display for PkceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PkceError::InvalidLength(len) => {
                write!(f, "code verifier must be 43-128 characters, got {len}")
            }
            PkceError::InvalidCharacter(c) => {
                write!(f, "code verifier contains invalid character {c:?}")
            }
        }
    }
}

impl std::error::Error for PkceError {}

/// A PKCE verifier/challenge pair (S256).
#[derive(Debug, Clone)]
pub struct PkceCodes {
    pub code_verifier: String,
    pub code_challenge: String,
}

/// Generate a fresh PKCE pair.
///
/// The verifier is 64 random bytes as URL-safe base64 without padding
/// (86 characters); the challenge is `BASE64URL(SHA256(verifier))`.
pub fn generate_pkce() -> PkceCodes {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    let code_verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    let code_challenge = challenge_s256(&code_verifier);
    PkceCodes {
        code_verifier,
        code_challenge,
    }
}

/// Compute the S256 challenge for an existing verifier.
pub fn challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Check a verifier against RFC 7636 §4.1: 43-128 characters from the
/// unreserved set `[A-Za-z0-9-._~]`.
pub fn validate_verifier(verifier: &str) -> Result<(), PkceError> {
    let len = verifier.len();
    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&len) {
        return Err(PkceError::InvalidLength(len));
    }
    if let Some(c) = verifier
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '.' | '_' | '~'))
    {
        return Err(PkceError::InvalidCharacter(c));
    }
    Ok(())
}
