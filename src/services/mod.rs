pub mod credential_issuer;
pub mod identity_manager;
pub mod verifier;
