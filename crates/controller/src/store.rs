// SPDX-License-Identifier: MIT

//! Document store abstraction: the external collaborator holding chapters and
//! lessons. The HTTP surface and persistence backing it are out of scope here;
//! we only specify the read it needs to make.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signrt_core::{ChapterId, LessonId, ModelId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: LessonId,
    /// Absent when a lesson has no recognition component.
    pub model_id: Option<ModelId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_id: ChapterId,
    pub lessons: Vec<Lesson>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_chapter(&self, chapter_id: &ChapterId) -> std::io::Result<Option<Chapter>>;
}

/// An in-process document store backed by a map, used in tests and by the
/// standalone CLI demo where no real document database is wired up.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    chapters: parking_lot::RwLock<std::collections::HashMap<ChapterId, Chapter>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, chapter: Chapter) {
        self.chapters.write().insert(chapter.chapter_id.clone(), chapter);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_chapter(&self, chapter_id: &ChapterId) -> std::io::Result<Option<Chapter>> {
        Ok(self.chapters.read().get(chapter_id).cloned())
    }
}
