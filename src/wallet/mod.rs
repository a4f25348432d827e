pub mod credential_storage;
pub mod key_management;
pub mod presentation_builder;
