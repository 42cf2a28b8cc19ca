//! Cryptographic primitives for airlift
//!
//! The security model is deliberately small:
//!
//! - **Per-share secrets**: every share event mints a fresh random `Secret`.
//!   The secret never appears in a link; it travels only over the local
//!   unix socket to the server process.
//! - **Capability tokens**: the link embeds a token signed with the share's
//!   secret (see [`crate::token`]). Holding a valid token for a path is the
//!   only authorization the server recognizes.
//!
//! Re-sharing a path mints a new secret and silently invalidates every
//! token signed with the old one.

mod secret;

pub use secret::{Secret, SecretError, SECRET_SIZE};
