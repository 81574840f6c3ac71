use crate::ports::projects::{Project, ProjectDraft, ProjectStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// In-memory project store for single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: Mutex<HashMap<String, Project>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

fn apply_draft(project: &mut Project, draft: ProjectDraft) {
    project.name = draft.name;
    project.html = draft.html;
    project.css = draft.css;
    project.js = draft.js;
    project.resolution = draft.resolution;
    project.format = draft.format;
    project.duration = draft.duration;
    project.fps = draft.fps;
    project.updated_at = unix_now();
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create(&self, draft: ProjectDraft) -> Project {
        let now = unix_now();
        let mut project = Project {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            html: String::new(),
            css: String::new(),
            js: String::new(),
            resolution: draft.resolution,
            format: draft.format,
            duration: draft.duration,
            fps: draft.fps,
            created_at: now,
            updated_at: now,
        };
        apply_draft(&mut project, draft);
        self.projects
            .lock()
            .unwrap()
            .insert(project.id.clone(), project.clone());
        project
    }

    async fn get(&self, id: &str) -> Option<Project> {
        self.projects.lock().unwrap().get(id).cloned()
    }

    async fn list(&self) -> Vec<Project> {
        let mut projects: Vec<Project> =
            self.projects.lock().unwrap().values().cloned().collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        projects
    }

    async fn update(&self, id: &str, draft: ProjectDraft) -> Option<Project> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects.get_mut(id)?;
        apply_draft(project, draft);
        Some(project.clone())
    }

    async fn delete(&self, id: &str) -> bool {
        self.projects.lock().unwrap().remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::render::{OutputFormat, Resolution};

    fn draft(name: &str) -> ProjectDraft {
        ProjectDraft {
            name: name.to_owned(),
            html: String::from("<h1>title</h1>"),
            css: String::new(),
            js: String::new(),
            resolution: Resolution::Square,
            format: OutputFormat::Gif,
            duration: 5,
            fps: 10,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_roundtrip() {
        let store = InMemoryProjectStore::new();
        let created = store.create(draft("intro")).await;
        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched.name, "intro");
        assert_eq!(fetched.format, OutputFormat::Gif);
        assert_eq!(fetched.duration, 5);
    }

    #[tokio::test]
    async fn update_unknown_id_is_none() {
        let store = InMemoryProjectStore::new();
        assert!(store.update("missing", draft("x")).await.is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryProjectStore::new();
        let created = store.create(draft("one")).await;
        assert!(store.delete(&created.id).await);
        assert!(!store.delete(&created.id).await);
        assert!(store.get(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn list_returns_every_project() {
        let store = InMemoryProjectStore::new();
        store.create(draft("a")).await;
        store.create(draft("b")).await;
        assert_eq!(store.list().await.len(), 2);
    }
}
