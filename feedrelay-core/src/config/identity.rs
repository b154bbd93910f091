//! Identity derivation configuration.

/// Process-wide secret used to derive every feed's signing key.
///
/// Changing the secret gives every registered feed a new keypair; profiles
/// and notes published under the old public keys stop resolving.
#[derive(Clone)]
pub struct IdentityConfig {
    pub secret: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}
