//! Profile synthesis configuration.

/// Settings used when building a feed's profile metadata.
#[derive(Debug, Clone, Default)]
pub struct ProfileConfig {
    /// Advertise a NIP-05 handle in every profile.
    pub enable_auto_nip05: bool,
    /// Domain part of the advertised NIP-05 handle.
    pub nip05_domain: String,
    /// Picture used when a feed has no image. Empty means none.
    pub default_picture_url: String,
}
