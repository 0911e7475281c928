//! Domain constants
//!
//! Limits and wire identifiers shared by the core services and the platform
//! adapter.

/// Maximum commentary length accepted by the platform.
pub const MAX_COMMENTARY_CHARS: usize = 3000;

/// Maximum number of media assets attached to a single post.
pub const MAX_MEDIA_PER_POST: usize = 20;

/// URN prefix for member (person) identities.
pub const PERSON_URN_PREFIX: &str = "urn:li:person:";

/// Upload recipe for feed images.
pub const IMAGE_RECIPE: &str = "urn:li:digitalmediaRecipe:feedshare-image";

/// Upload recipe for feed videos.
pub const VIDEO_RECIPE: &str = "urn:li:digitalmediaRecipe:feedshare-video";

/// Default refresh safety margin in seconds.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

/// Maximum length in bytes of a caller-supplied idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Longest access-token lifetime accepted from a token grant (one year).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;
