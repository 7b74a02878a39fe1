//! # CiviAI auth service
//!
//! `civiai` is the authentication back end of the CiviAI civic services
//! portal. Citizens sign in with a one-time code sent to their email address
//! or phone number and receive a signed session token.
//!
//! ## One-time codes
//!
//! Codes are six digits, live for ten minutes and are keyed by
//! `channel:address`. Requesting a new code replaces the pending one. A code
//! is consumed by its first successful verification; expired entries are only
//! reclaimed when someone tries to verify them.
//!
//! ## Sessions
//!
//! Sessions are `HS256` JWTs valid for seven days. They are not stored
//! server-side, so logging out only clears the client cookie. The token is
//! accepted from the `token` cookie or an `Authorization: Bearer` header.
//!
//! ## eKYC
//!
//! Signed-in users can confirm an Aadhaar number through a mocked UIDAI
//! client. A confirmed number stores its last four digits on the identity.

pub mod civiai;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
