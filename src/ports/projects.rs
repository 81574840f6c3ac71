use crate::domain::render::{OutputFormat, Resolution};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A saved render configuration. The pipeline itself only ever reads these
/// by id; persistence is entirely behind this port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub html: String,
    pub css: String,
    pub js: String,
    pub resolution: Resolution,
    pub format: OutputFormat,
    pub duration: u32,
    pub fps: u32,
    /// Unix seconds
    pub created_at: u64,
    pub updated_at: u64,
}

/// Fields accepted when creating or updating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub js: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_duration() -> u32 {
    15
}

fn default_fps() -> u32 {
    30
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, draft: ProjectDraft) -> Project;

    async fn get(&self, id: &str) -> Option<Project>;

    /// Most recently updated first.
    async fn list(&self) -> Vec<Project>;

    /// Returns the updated project, or None if the id is unknown.
    async fn update(&self, id: &str, draft: ProjectDraft) -> Option<Project>;

    /// Returns whether a project was removed.
    async fn delete(&self, id: &str) -> bool;
}
