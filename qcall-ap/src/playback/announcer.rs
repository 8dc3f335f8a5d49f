//! Numeral Announcer
//!
//! Turns a ticket and room into the fixed four-step announcement:
//! ticket number, "ticket holder", room clip, "please come".
//! Every step is best-effort; failures are logged and the next step plays.

use crate::playback::numerals::{decompose, extract_number};
use crate::playback::player::SegmentPlayer;
use crate::playback::segment::{SegmentId, PHRASE_PLEASE_COME, PHRASE_TICKET_OWNER};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementStep {
    TicketNumber,
    TicketOwner,
    RoomNumber,
    PleaseCome,
}

impl AnnouncementStep {
    pub fn label(self) -> &'static str {
        match self {
            AnnouncementStep::TicketNumber => "ticket number",
            AnnouncementStep::TicketOwner => "ticket owner phrase",
            AnnouncementStep::RoomNumber => "room number",
            AnnouncementStep::PleaseCome => "please come phrase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Played,
    /// Some clips of the step failed; the rest played
    Partial { failed: Vec<SegmentId> },
    Skipped(String),
}

/// What happened during one announcement.
#[derive(Debug, Clone)]
pub struct AnnouncementReport {
    pub ticket_number: u32,
    pub steps: Vec<(AnnouncementStep, StepOutcome)>,
    pub elapsed: Duration,
}

impl AnnouncementReport {
    /// Every step played in full.
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|(_, outcome)| *outcome == StepOutcome::Played)
    }
}

/// Plays announcements through a [`SegmentPlayer`].
pub struct NumeralAnnouncer {
    player: Arc<dyn SegmentPlayer>,
}

impl NumeralAnnouncer {
    pub fn new(player: Arc<dyn SegmentPlayer>) -> Self {
        Self { player }
    }

    /// Speak `queue_number` and `room_number`. Blocks until done; never fails.
    pub fn announce(&self, queue_number: &str, room_number: &str) -> AnnouncementReport {
        let started = Instant::now();
        let ticket_number = extract_number(queue_number);

        info!(
            "Announcing ticket {} (number {}) to room {}",
            queue_number, ticket_number, room_number
        );

        let ticket_outcome = match decompose(ticket_number) {
            Ok(segments) => self.play_all(AnnouncementStep::TicketNumber, &segments),
            Err(e) => {
                warn!("Skipping ticket number for {}: {}", queue_number, e);
                StepOutcome::Skipped(e.to_string())
            }
        };

        let steps = vec![
            (AnnouncementStep::TicketNumber, ticket_outcome),
            self.play_step(AnnouncementStep::TicketOwner, SegmentId::phrase(PHRASE_TICKET_OWNER)),
            self.play_step(AnnouncementStep::RoomNumber, SegmentId::room(room_number)),
            self.play_step(AnnouncementStep::PleaseCome, SegmentId::phrase(PHRASE_PLEASE_COME)),
        ];

        let report = AnnouncementReport {
            ticket_number,
            steps,
            elapsed: started.elapsed(),
        };

        if report.is_complete() {
            info!("Announcement for {} finished in {}ms", queue_number, report.elapsed.as_millis());
        } else {
            warn!(
                "Announcement for {} finished with failures in {}ms",
                queue_number,
                report.elapsed.as_millis()
            );
        }
        report
    }

    fn play_step(&self, step: AnnouncementStep, segment: SegmentId) -> (AnnouncementStep, StepOutcome) {
        let outcome = match self.player.play(&segment) {
            Ok(()) => StepOutcome::Played,
            Err(e) => {
                warn!("Skipping {} ({}): {}", step.label(), segment, e);
                StepOutcome::Skipped(e.to_string())
            }
        };
        (step, outcome)
    }

    /// Play each segment in order; a failed clip does not stop the rest.
    fn play_all(&self, step: AnnouncementStep, segments: &[SegmentId]) -> StepOutcome {
        let mut failed = Vec::new();
        for segment in segments {
            match self.player.play(segment) {
                Ok(()) => debug!("Played {}", segment),
                Err(e) => {
                    warn!("Missing part of {} ({}): {}", step.label(), segment, e);
                    failed.push(segment.clone());
                }
            }
        }

        if failed.is_empty() {
            StepOutcome::Played
        } else if failed.len() == segments.len() {
            StepOutcome::Skipped(format!("none of {} clips played", segments.len()))
        } else {
            StepOutcome::Partial { failed }
        }
    }
}
