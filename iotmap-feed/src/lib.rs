//! # iotmap-feed
//!
//! The unified transmission feed.
//!
//! Protocol-specific decoders write captures out as CSV rows of the
//! unified 8-tuple; this crate reads them back, drops malformed rows
//! without aborting, re-sorts by timestamp, and derives the layer-2 node
//! population either from an explicit node-list file or from the
//! addresses observed in the feed itself.

pub mod error;
pub mod loader;
pub mod nodes;

pub use error::FeedError;
pub use loader::{load_csv, read_transmissions, FeedBatch};
pub use nodes::{extract_nodes, load_nodes, read_nodes};
