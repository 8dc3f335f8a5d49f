//! Announcement pipeline: segment lookup and playback, numeral
//! decomposition, and the worker queue that drives them.

pub mod announcer;
pub mod numerals;
pub mod player;
pub mod queue;
pub mod segment;

pub use announcer::{AnnouncementReport, AnnouncementStep, NumeralAnnouncer, StepOutcome};
pub use numerals::{decompose, extract_number};
pub use player::{FileSegmentPlayer, SegmentPlayer};
pub use queue::{AnnouncementQueue, AnnouncementTask, QueueStats, QueueStatus, TaskPriority};
pub use segment::{SegmentId, SegmentLibrary};
