//! Authentication: credential state, recovery ladder, and the seams for
//! persistence and interactive login.

pub mod controller;
pub mod csrf;
pub mod login;
pub mod store;
pub mod types;

pub use controller::{AuthController, RawResponse};
pub use login::InteractiveLoginProvider;
pub use store::{CredentialStore, MemoryCredentialStore, StoredCredentials};
pub use types::{AuthType, Credentials};
