pub mod credentials;
pub mod document;

pub use credentials::CredentialStore;
pub use document::Document;
pub use document::DocumentKind;
pub use document::DocumentStore;
