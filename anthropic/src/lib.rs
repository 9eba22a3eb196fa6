//! # Anthropic Claude API Client
//!
//! Minimal client for the Anthropic Messages API. Volunteer Hub only needs a
//! single non-streaming text completion per suggestion request.
//!
//! ## Example
//!
//! ```no_run
//! use volunteer_hub_anthropic::{AnthropicClient, MessagesRequest};
//! use volunteer_hub_anthropic::types::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnthropicClient::from_env()?;
//!
//!     let request = MessagesRequest::new(vec![
//!         Message::user("Suggest three volunteer events for a gardener."),
//!     ])
//!     .with_max_tokens(1024);
//!
//!     let response = client.messages(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod messages;
pub mod types;

pub use client::{ANTHROPIC_VERSION, AnthropicClient, DEFAULT_API_URL};
pub use error::ClaudeError;
pub use messages::{DEFAULT_MODEL, MessagesRequest, MessagesResponse};
pub use types::{ContentBlock, Message, Role, StopReason, Usage};
