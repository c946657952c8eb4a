//! Credential storage, remote session checks and login/logout.

pub mod authenticator;
pub mod cookie;
pub mod error;
pub mod http;
pub mod profile;
pub mod service;
pub mod store;
pub mod token;

pub use authenticator::{AuthCheck, InvalidReason, TokenAuthenticator};
pub use cookie::{Cookie, CookieJar, SameSite};
pub use error::AuthError;
pub use profile::{HttpProfileFetcher, ProfileFetcher};
pub use service::{AuthService, Navigation, SessionStatus};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use token::{Credentials, CurrentUser, UserProfile};
