//! Login verification: identity provider first, local hash fallback

mod identity;
mod verifier;

pub use identity::{HttpIdentityProvider, IdentityProvider, ProviderVerdict};
pub use verifier::{AuthMethod, AuthOutcome, Verifier};
