//! teamca service - lifecycle of the running certificate authority
//!
//! - [`ShutdownCoordinator`] turns SIGINT/SIGTERM into a cancellation token
//! - [`ServiceRunner`] publishes client configs, runs the bot and retracts
//!   on every exit path
//! - [`bot`] holds the chat signing bot and its keybase transport

pub mod bot;
pub mod error;
pub mod service;
pub mod shutdown;

pub use bot::{ChatBot, ChatMessage, ChatTransport, KeybaseChatTransport, SigningBot};
pub use error::{Result, ServiceError};
pub use service::ServiceRunner;
pub use shutdown::{run_cleanup, ShutdownCoordinator, ShutdownOutcome, ShutdownState};
