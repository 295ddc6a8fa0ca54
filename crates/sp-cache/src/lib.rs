//! # sp-cache
//!
//! Replay cache abstraction for the SAML service provider.
//!
//! Assertion and response IDs are single use. The validator records every ID it
//! accepts through a [`ReplayCache`] and refuses an ID it has already seen while
//! the entry is live. Deployments with more than one SP node plug in a shared
//! store; a single process can use [`InMemoryReplayCache`].
//!
//! ## Example
//!
//! ```
//! use sp_cache::{InMemoryReplayCache, ReplayCache};
//! use std::time::Duration;
//!
//! let cache = InMemoryReplayCache::new();
//! assert!(cache.insert_if_absent("_assert1", Duration::from_secs(300)).unwrap());
//! assert!(!cache.insert_if_absent("_assert1", Duration::from_secs(300)).unwrap());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod replay;

pub use error::{CacheError, CacheResult};
pub use replay::{InMemoryReplayCache, ReplayCache};
