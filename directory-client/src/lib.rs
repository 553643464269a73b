//! # directory-client
//!
//! Caller side of the user directory. [`DirectoryClient`] wraps the
//! generated stubs and attaches a freshly fetched bearer token to every
//! `GetUserById` call. [`run_session`] drives the interactive flow used by
//! the `directory-client` binary.

pub mod client;
pub mod error;
pub mod session;
pub mod token;

pub use client::{format_detail, format_summary, ClientOptions, DirectoryClient};
pub use error::ClientError;
pub use session::{run_session, EXIT_COMMAND};
pub use token::TokenSource;

pub use directory_service::proto;
