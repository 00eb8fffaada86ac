// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use ndarray::{array, Array1, Array2};
use signrt_core::{ClientId, FakeClock, LandmarkFrame, Point3};

use super::*;

struct StubClassifier {
    labels: Vec<String>,
}

impl Classifier for StubClassifier {
    fn predict(&self, _tensor: &Array2<f32>) -> Array1<f32> {
        array![0.25, 0.75]
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

fn frame() -> LandmarkFrame {
    let mut pose = [Point3::ZERO; 33];
    pose[11] = Point3(0.0, 0.0, 0.0);
    pose[12] = Point3(1.0, 0.0, 0.0);
    LandmarkFrame { pose: Some(pose), left_hand: None, right_hand: None }
}

fn manager(sequence_length: usize, prediction_interval: u64) -> SessionManager<FakeClock> {
    let classifier = Arc::new(StubClassifier { labels: vec!["a".into(), "b".into()] });
    let idle_timer = IdleShutdownTimer::new(FakeClock::new(), Duration::from_secs(60));
    SessionManager::new(sequence_length, prediction_interval, 4, classifier, idle_timer)
}

#[test]
fn no_event_until_buffer_is_full() {
    let manager = manager(3, 1);
    let client = ClientId::new("c1");
    manager.on_connect(client.clone());

    assert!(manager.on_frame(&client, frame()).is_none());
    assert!(manager.on_frame(&client, frame()).is_none());
    assert!(manager.on_frame(&client, frame()).is_some());
}

#[test]
fn cadence_gates_classification_after_buffer_is_full() {
    let manager = manager(2, 3);
    let client = ClientId::new("c1");
    manager.on_connect(client.clone());

    assert!(manager.on_frame(&client, frame()).is_none()); // 1: buffer filling
    assert!(manager.on_frame(&client, frame()).is_none()); // 2: full, but 2 % 3 != 0
    assert!(manager.on_frame(&client, frame()).is_some()); // 3: full, 3 % 3 == 0
    assert!(manager.on_frame(&client, frame()).is_none()); // 4
    assert!(manager.on_frame(&client, frame()).is_none()); // 5
    assert!(manager.on_frame(&client, frame()).is_some()); // 6
}

#[test]
fn unknown_client_produces_no_event() {
    let manager = manager(2, 1);
    let client = ClientId::new("ghost");
    assert!(manager.on_frame(&client, frame()).is_none());
}

#[test]
fn disconnect_arms_idle_timer_only_once_last_client_leaves() {
    let manager = manager(2, 1);
    let a = ClientId::new("a");
    let b = ClientId::new("b");
    manager.on_connect(a.clone());
    manager.on_connect(b.clone());
    assert!(!manager.idle_timer.is_armed());

    manager.on_disconnect(&a);
    assert!(!manager.idle_timer.is_armed());

    manager.on_disconnect(&b);
    assert!(manager.idle_timer.is_armed());
}

#[test]
fn connect_cancels_idle_timer() {
    let manager = manager(2, 1);
    manager.idle_timer.arm();
    manager.on_connect(ClientId::new("a"));
    assert!(!manager.idle_timer.is_armed());
}

#[yare::parameterized(
    interval_one                = { 5, 1, 5 },
    interval_three_exact        = { 6, 3, 2 },
    interval_three_remainder    = { 8, 3, 2 },
    interval_larger_than_frames = { 2, 5, 0 },
)]
fn cadence_produces_floor_frames_over_interval_events(frames_sent: u64, prediction_interval: u64, expected_events: usize) {
    // sequence_length 1 fills the buffer on the first frame, so every
    // subsequent frame is "after the buffer is full".
    let manager = manager(1, prediction_interval);
    let client = ClientId::new("c1");
    manager.on_connect(client.clone());

    let events = (0..frames_sent).filter(|_| manager.on_frame(&client, frame()).is_some()).count();
    assert_eq!(events, expected_events);
}

#[test]
fn classification_event_carries_smoothed_probabilities() {
    let manager = manager(1, 1);
    let client = ClientId::new("c1");
    manager.on_connect(client.clone());

    let event = manager.on_frame(&client, frame()).expect("sequence is immediately full");
    assert_eq!(event.frame_index, 1);
    assert!((event.smoothed.probabilities[1] - 0.75).abs() < 1e-6);
    assert_eq!(event.smoothed.argmax, 1);
}
