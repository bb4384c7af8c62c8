//! Debounced file system watching for Settle
//!
//! This crate turns raw filesystem notifications into settled events:
//! - Per-path debouncing with a configurable quiet period
//! - Coalescing of repeated writes into one event (latest write wins)
//! - Optional hiding of files created and removed within one window
//! - Passthrough of source errors on a separate channel
//!
//! ```no_run
//! # async fn demo() -> watcher::Result<()> {
//! use std::time::Duration;
//! use watcher::Watcher;
//!
//! let mut watcher = Watcher::new(Duration::from_secs(1))?;
//! watcher.add("/tmp/inbox")?;
//!
//! while let Some(event) = watcher.events.recv().await {
//!     println!("{} settled", event.path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod source;

mod debounce;
mod dispatch;
mod shutdown;
mod table;
mod watcher;

// Re-exports
pub use config::WatcherConfig;
pub use error::{Result, WatchError};
pub use event::{Event, Op};
pub use filter::{IgnoreConfig, PathFilter};
pub use source::{ChannelFeed, ChannelSource, EventSource, NotifySource, RawStreams};
pub use watcher::Watcher;
