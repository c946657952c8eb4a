//! keyward — session tokens and route guards for admin front ends.
//!
//! Keeps the access token and refresh-token cookie, checks the session
//! against the backend's probe endpoint (refreshing once on 401), and gates
//! protected routes behind that check.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use keyward::prelude::*;
//!
//! # async fn example() {
//! let config = KeywardConfig::from_env();
//! let store = Arc::new(MemoryCredentialStore::with_credentials("access", "refresh"));
//! let auth = Arc::new(TokenAuthenticator::new(store, &config));
//!
//! let guard = RouteGuard::new(auth, GuardOptions::token_only(&config));
//! let mut page = guard.mount("/projects");
//! assert_eq!(page.render("projects table"), Rendered::Loading);
//! match page.settled().await {
//!     GuardState::Authorized => println!("{:?}", page.render("projects table")),
//!     other => println!("blocked: {other}"),
//! }
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
