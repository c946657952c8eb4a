//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthCheck, AuthError, AuthService, CredentialStore, FileCredentialStore, HttpProfileFetcher,
    InvalidReason, MemoryCredentialStore, ProfileFetcher, TokenAuthenticator,
};
pub use crate::config::KeywardConfig;
pub use crate::error::{KeywardError, Result};
pub use crate::guard::{GuardHandle, GuardMode, GuardOptions, GuardState, Rendered, RouteGuard};
