// SPDX-License-Identifier: MIT

//! Error kinds for the fleet controller.

use signrt_core::ModelId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("lesson {lesson} has no associated model")]
    LessonHasNoModel { lesson: String },

    #[error("model artifact unavailable for {model_id}: {cause}")]
    ArtifactUnavailable { model_id: ModelId, cause: String },

    #[error("port pool exhausted")]
    PortExhausted,

    #[error("failed to start worker for model {model_id}: {cause}")]
    WorkerStartFailed { model_id: ModelId, cause: String },

    #[error("document store error: {0}")]
    DocumentStore(String),
}
