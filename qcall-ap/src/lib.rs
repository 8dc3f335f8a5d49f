//! # Queue Ticket Announcer (qcall-ap)
//!
//! Speaks "ticket 34, please come to room 5" over a speaker by chaining
//! pre-recorded clips.
//!
//! **Architecture:**
//! - [`playback::FileSegmentPlayer`]: one clip, decoded with symphonia,
//!   resampled with rubato, played through cpal
//! - [`playback::NumeralAnnouncer`]: ticket number to clip sequence
//! - [`playback::AnnouncementQueue`]: bounded FIFO drained by worker tasks
//! - [`api`]: axum HTTP interface that feeds the queue

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::RequestMetrics;
