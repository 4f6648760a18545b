//!
//! A small async client for streaming newly arrived messages out of a
//! public Mailinator mailbox.
//!
//! Construction bootstraps an anonymous session, opens the service's
//! notification socket, and starts a background loop that fetches every
//! announced message and delivers the complete ones in arrival order.
//!
//! Example of a simple watch loop:
//! ```no_run
//! use mailinator_stream::Inbox;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut inbox = Inbox::subscribe("test", None).await?;
//!     println!("waiting for mail sent to {}", inbox.address());
//!
//!     while let Some(message) = inbox.recv().await {
//!         println!("{}: {}", message.from, message.data.subject);
//!     }
//!     if let Some(err) = inbox.last_error() {
//!         return Err(format!("inbox closed: {}", err).into());
//!     }
//!     Ok(())
//! }
//! ```
//!

pub mod client;
pub mod constants;
pub mod error;
pub mod models;

pub use client::{random_mailbox, Config, Inbox, InboxBuilder};
pub use constants::{DEFAULT_HOSTNAME, DEFAULT_USER_AGENT, SESSION_COOKIE};
pub use error::{Error, Result};
pub use models::{Message, MessageData, MessageHeaders, MessagePart, PartHeaders};
