//! Announcement Queue integration tests
//!
//! Runs the real queue and announcer over a recording segment player.

mod helpers;

use helpers::RecordingPlayer;
use qcall_ap::playback::{AnnouncementQueue, NumeralAnnouncer};
use qcall_common::config::QueueConfig;
use std::sync::Arc;
use std::time::Duration;

fn queue_config(worker_count: usize, capacity: usize) -> QueueConfig {
    QueueConfig {
        worker_count,
        capacity,
        inter_task_pause_ms: 1,
    }
}

fn setup(player: RecordingPlayer, worker_count: usize, capacity: usize) -> (Arc<RecordingPlayer>, AnnouncementQueue) {
    let player = Arc::new(player);
    let announcer = Arc::new(NumeralAnnouncer::new(player.clone()));
    let queue = AnnouncementQueue::new(announcer, &queue_config(worker_count, capacity));
    (player, queue)
}

fn announcement(ticket: &[&str], room: &str) -> Vec<String> {
    let mut expected: Vec<String> = ticket.iter().map(|s| s.to_string()).collect();
    expected.push("phrases/raqam_egasi".to_string());
    expected.push(format!("numbers/{}-xona", room));
    expected.push("phrases/honaga_kelishin".to_string());
    expected
}

#[tokio::test]
async fn test_overflow_keeps_exactly_capacity() {
    let (_player, queue) = setup(RecordingPlayer::new(), 1, 3);

    for n in 1..=5 {
        queue.add_task(&format!("K-{:03}", n), "1");
    }

    let status = queue.get_status().await;
    assert_eq!(status.pending_count, 3);
    assert_eq!(status.capacity, 3);
    assert!(!status.is_running);

    let stats = queue.stats();
    assert_eq!(stats.enqueued, 3);
    assert_eq!(stats.dropped, 2);
}

#[tokio::test]
async fn test_clear_returns_pending_count() {
    let (player, queue) = setup(RecordingPlayer::new(), 1, 10);

    for n in 1..=4 {
        queue.add_task(&format!("K-{:03}", n), "2");
    }

    assert_eq!(queue.clear().await, 4);
    assert_eq!(queue.get_status().await.pending_count, 0);
    assert_eq!(queue.stats().cleared, 4);
    assert_eq!(queue.clear().await, 0);

    // Nothing left for the workers
    queue.start().await;
    queue.stop().await;
    assert!(player.played().is_empty());
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (_player, queue) = setup(RecordingPlayer::new(), 2, 10);

    // Not running yet: no-op
    queue.stop().await;

    queue.start().await;
    queue.start().await;
    assert!(queue.is_running().await);

    queue.stop().await;
    queue.stop().await;
    assert!(!queue.is_running().await);

    // One-shot lifecycle
    queue.start().await;
    assert!(!queue.get_status().await.is_running);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_stop_drains_once() {
    let (player, queue) = setup(RecordingPlayer::with_delay(Duration::from_millis(10)), 1, 10);

    queue.start().await;
    queue.add_task("K-001", "1");
    queue.add_task("K-002", "2");

    // Whichever call runs first does the draining; the other is a no-op
    tokio::join!(queue.stop(), queue.stop());

    assert!(!queue.is_running().await);
    assert_eq!(queue.stats().announced, 2);
    assert_eq!(player.played().len(), 8);
}

#[tokio::test]
async fn test_single_worker_plays_in_fifo_order() {
    let (player, queue) = setup(RecordingPlayer::new(), 1, 10);

    queue.start().await;
    queue.add_task("K-007", "3");
    queue.add_task("K-034", "5");
    queue.stop().await;

    let mut expected = announcement(&["numbers/7"], "3");
    expected.extend(announcement(&["numbers/30a", "numbers/4"], "5"));
    assert_eq!(player.played(), expected);
    assert_eq!(queue.stats().announced, 2);
}

#[tokio::test]
async fn test_tasks_buffered_before_start_are_played() {
    let (player, queue) = setup(RecordingPlayer::new(), 1, 10);

    queue.add_task("A-015", "12");
    assert_eq!(queue.pending_count(), 1);

    queue.start().await;
    queue.stop().await;

    assert_eq!(player.played(), announcement(&["numbers/10", "numbers/5"], "12"));
    assert_eq!(queue.pending_count(), 0);
}

#[tokio::test]
async fn test_tasks_after_stop_are_dropped() {
    let (player, queue) = setup(RecordingPlayer::new(), 1, 10);

    queue.start().await;
    queue.stop().await;
    queue.add_task("K-001", "1");

    assert_eq!(queue.pending_count(), 0);
    assert_eq!(queue.stats().dropped, 1);
    assert!(player.played().is_empty());
}

#[tokio::test]
async fn test_incomplete_announcements_are_counted() {
    let (player, queue) = setup(RecordingPlayer::with_missing(&["phrases/raqam_egasi"]), 1, 10);

    queue.start().await;
    queue.add_task("K-000", "4");
    queue.add_task("K-002", "4");
    queue.stop().await;

    let stats = queue.stats();
    assert_eq!(stats.announced, 0);
    assert_eq!(stats.incomplete, 2);
    // Unsupported number skips only the number; the failing phrase does not stop the rest
    assert_eq!(player.played().len(), 3 + 4);
}

#[tokio::test]
async fn test_worker_survives_panicking_announcement() {
    let (player, queue) = setup(RecordingPlayer::panicking_once(), 1, 10);

    queue.start().await;
    queue.add_task("K-001", "1");
    queue.add_task("K-002", "2");
    queue.stop().await;

    // The first task died on its first clip; the same worker went on to the second
    assert_eq!(player.played(), announcement(&["numbers/2"], "2"));

    let stats = queue.stats();
    assert_eq!(stats.announced, 1);
    assert_eq!(stats.incomplete, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_leaves_claimed_task_alone() {
    let (player, queue) = setup(RecordingPlayer::with_delay(Duration::from_millis(100)), 1, 10);

    queue.add_task("K-001", "1");
    queue.add_task("K-002", "2");
    queue.add_task("K-003", "3");
    queue.start().await;

    // Let the worker claim the first task
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(queue.clear().await, 2);
    queue.stop().await;

    assert_eq!(player.played(), announcement(&["numbers/1"], "1"));
}
