// SPDX-License-Identifier: MIT

//! Loads a flat JSON description of chapters/lessons into an
//! `InMemoryDocumentStore`, standing in for the real document database this
//! core treats as an external collaborator.

use std::path::Path;

use serde::Deserialize;
use signrt_controller::{Chapter, InMemoryDocumentStore, Lesson};
use signrt_core::{ChapterId, LessonId, ModelId};

#[derive(Debug, Deserialize)]
struct ChaptersFile {
    chapters: Vec<ChapterEntry>,
}

#[derive(Debug, Deserialize)]
struct ChapterEntry {
    chapter_id: String,
    lessons: Vec<LessonEntry>,
}

#[derive(Debug, Deserialize)]
struct LessonEntry {
    lesson_id: String,
    model_id: Option<String>,
}

pub fn load(path: &Path) -> anyhow::Result<InMemoryDocumentStore> {
    let bytes = std::fs::read(path)?;
    let parsed: ChaptersFile = serde_json::from_slice(&bytes)?;

    let store = InMemoryDocumentStore::new();
    for chapter in parsed.chapters {
        store.insert(Chapter {
            chapter_id: ChapterId::new(chapter.chapter_id),
            lessons: chapter
                .lessons
                .into_iter()
                .map(|lesson| Lesson {
                    lesson_id: LessonId::new(lesson.lesson_id),
                    model_id: lesson.model_id.map(ModelId::new),
                })
                .collect(),
        });
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use signrt_controller::DocumentStore;

    #[tokio::test]
    async fn loads_chapters_and_lessons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapters.json");
        std::fs::write(
            &path,
            r#"{"chapters":[{"chapter_id":"ch1","lessons":[{"lesson_id":"l1","model_id":"m1.json"},{"lesson_id":"l2","model_id":null}]}]}"#,
        )
        .unwrap();

        let store = load(&path).unwrap();
        let chapter = store.get_chapter(&ChapterId::new("ch1")).await.unwrap().unwrap();
        assert_eq!(chapter.lessons.len(), 2);
        assert_eq!(chapter.lessons[0].model_id, Some(ModelId::new("m1.json")));
        assert_eq!(chapter.lessons[1].model_id, None);
    }
}
