// SPDX-License-Identifier: MIT

//! Per-client session state and the frame-handling pipeline: buffering,
//! cadence-gated classification, and the in-flight guard that keeps at most
//! one classification running per session at a time.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use signrt_core::{ClientId, Clock, LandmarkFrame};

use crate::classifier::Classifier;
use crate::idle::IdleShutdownTimer;
use crate::preprocess::preprocess;
use crate::smoother::{SmoothedResult, Smoother};

pub struct Session {
    sequence_buffer: VecDeque<LandmarkFrame>,
    smoother: Smoother,
    frame_counter: u64,
    in_flight: bool,
    current_smoothed: Option<SmoothedResult>,
}

impl Session {
    fn new(smoothing_window: usize) -> Self {
        Self {
            sequence_buffer: VecDeque::new(),
            smoother: Smoother::new(smoothing_window),
            frame_counter: 0,
            in_flight: false,
            current_smoothed: None,
        }
    }
}

/// A classification produced for one session's frame.
pub struct ClassificationEvent {
    pub smoothed: SmoothedResult,
    pub frame_index: u64,
}

/// Owns every connected client's session state for one worker process.
pub struct SessionManager<C: Clock> {
    sequence_length: usize,
    prediction_interval: u64,
    smoothing_window: usize,
    classifier: Arc<dyn Classifier>,
    sessions: Mutex<HashMap<ClientId, Session>>,
    idle_timer: IdleShutdownTimer<C>,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(
        sequence_length: usize,
        prediction_interval: u64,
        smoothing_window: usize,
        classifier: Arc<dyn Classifier>,
        idle_timer: IdleShutdownTimer<C>,
    ) -> Self {
        assert!(prediction_interval > 0, "prediction_interval must be positive");
        // No client is connected yet, so the idle countdown starts right away,
        // same as if the last client had just disconnected.
        idle_timer.arm();
        Self {
            sequence_length,
            prediction_interval,
            smoothing_window,
            classifier,
            sessions: Mutex::new(HashMap::new()),
            idle_timer,
        }
    }

    pub fn on_connect(&self, client_id: ClientId) {
        self.sessions.lock().insert(client_id, Session::new(self.smoothing_window));
        self.idle_timer.cancel();
    }

    pub fn on_disconnect(&self, client_id: &ClientId) {
        let mut sessions = self.sessions.lock();
        sessions.remove(client_id);
        if sessions.is_empty() {
            self.idle_timer.arm();
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Resolves once the fleet of sessions has been empty continuously for
    /// the configured idle timeout.
    pub async fn wait_for_idle_shutdown(&self) {
        self.idle_timer.wait_for_shutdown().await;
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    /// Accept one frame for `client_id`. Returns a classification event only
    /// when the pipeline actually ran this tick.
    pub fn on_frame(&self, client_id: &ClientId, frame: LandmarkFrame) -> Option<ClassificationEvent> {
        // The session-map lock is only held for bookkeeping; classifier
        // inference runs with it released so one session's prediction never
        // blocks another session's frame from being accepted.
        let (window, frame_index) = {
            let mut sessions = self.sessions.lock();
            let session = sessions.get_mut(client_id)?;

            session.frame_counter += 1;
            if session.sequence_buffer.len() == self.sequence_length {
                session.sequence_buffer.pop_front();
            }
            session.sequence_buffer.push_back(frame);

            if session.in_flight {
                return None;
            }
            if session.sequence_buffer.len() < self.sequence_length {
                return None;
            }
            if session.frame_counter % self.prediction_interval != 0 {
                return None;
            }

            session.in_flight = true;
            let window: Vec<LandmarkFrame> = session.sequence_buffer.iter().cloned().collect();
            (window, session.frame_counter)
        };

        let tensor = preprocess(&window, self.sequence_length);
        let raw = self.classifier.predict(&tensor);

        let mut sessions = self.sessions.lock();
        // The client may have disconnected while inference was running.
        let session = sessions.get_mut(client_id)?;
        let smoothed = session.smoother.push(raw);
        session.current_smoothed = Some(smoothed.clone());
        session.in_flight = false;

        Some(ClassificationEvent { smoothed, frame_index })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
