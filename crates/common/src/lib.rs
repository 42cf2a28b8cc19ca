/**
 * Cryptographic types and operations.
 *  - Per-share random secrets
 *  - HMAC-signed capability tokens
 */
pub mod crypto;
/**
 * Wire types for the local client -> server
 *  handoff of a share's credentials over a
 *  unix domain socket.
 */
pub mod ipc;
/**
 * Capability tokens: a signed assertion binding
 *  a download request to one shared file path,
 *  keyed by that path's current secret.
 */
pub mod token;

pub mod prelude {
    pub use crate::crypto::{Secret, SecretError, SECRET_SIZE};
    pub use crate::ipc::{FileAuth, IpcError, SharePayload};
    pub use crate::token::TokenError;
}
