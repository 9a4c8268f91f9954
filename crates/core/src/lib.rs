//! # digestr Core
//!
//! Domain types, traits, and error definitions for the digestr pipeline.
//! This crate has **no transport dependencies** — it defines the domain model
//! that the provider, channel, and pipeline crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the summarization pipeline is a trait here:
//! - [`Provider`] — the completion backend (text in, text out)
//! - [`MessageSource`] — where channel posts come from
//! - [`DigestSink`] — where the finished digest goes
//!
//! Implementations live in their respective crates, which keeps the
//! pipeline testable with scripted stand-ins.

pub mod error;
pub mod message;
pub mod provider;
pub mod record;
pub mod channel;

// Re-export key types at crate root for ergonomics
pub use error::{ChannelError, DigestError, Error, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use record::{format_corpus, DigestWindow, SourceRecord, BLOCK_SEPARATOR};
pub use channel::{is_folder_link, DeliveryReport, DigestSink, MessageSource};
