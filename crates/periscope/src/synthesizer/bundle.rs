//! Bundle and manifest generation

use super::step_formatter::SkillStep;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One emitted skill document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Display name
    pub name: String,
    /// Sanitized filename, including the `.md` extension
    pub filename: String,
    /// Full document: front matter plus numbered steps
    pub markdown: String,
}

/// Everything one finalized goal produces: skills plus the manifest index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillBundle {
    pub app_name: String,
    pub goal: String,
    pub skills: Vec<Skill>,
    /// Markdown index over the skills
    pub manifest: String,
}

impl SkillBundle {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// A well-formed bundle with no skills, for runs that never captured a
    /// screen.
    pub fn empty(app_name: &str, goal: &str) -> Self {
        generate(app_name, goal, Vec::new())
    }

    /// Persist the bundle: one markdown file per skill plus `manifest.md`.
    /// Returns the written paths.
    pub fn write_to_dir(&self, dir: &Path) -> crate::errors::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.skills.len() + 1);
        for skill in &self.skills {
            let path = dir.join(&skill.filename);
            std::fs::write(&path, &skill.markdown)?;
            written.push(path);
        }
        let manifest_path = dir.join("manifest.md");
        std::fs::write(&manifest_path, &self.manifest)?;
        written.push(manifest_path);
        Ok(written)
    }
}

/// Sanitize a display name into a filename stem: lowercase, non-alphanumeric
/// runs collapse to single hyphens, no leading or trailing hyphen.
/// Idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Render one skill document.
pub(super) fn skill_from_steps(name: &str, app_name: &str, steps: Vec<SkillStep>) -> Skill {
    let filename = format!("{}.md", sanitize_filename(name));
    let mut markdown = String::new();
    markdown.push_str("---\n");
    markdown.push_str(&format!("name: {name}\n"));
    markdown.push_str(&format!("app: {app_name}\n"));
    markdown.push_str(&format!("created: {}\n", Utc::now().to_rfc3339()));
    markdown.push_str(&format!("steps: {}\n", steps.len()));
    markdown.push_str("---\n\n");
    markdown.push_str(&format!("# {name}\n\n"));
    for (i, step) in steps.iter().enumerate() {
        markdown.push_str(&format!("{}. {}\n", i + 1, step.render()));
    }
    Skill {
        name: name.to_string(),
        filename,
        markdown,
    }
}

/// Assemble the bundle and its manifest.
pub(super) fn generate(app_name: &str, goal: &str, skills: Vec<Skill>) -> SkillBundle {
    let mut manifest = String::new();
    manifest.push_str(&format!("# {app_name} skills\n\n"));
    manifest.push_str(&format!("Goal: {goal}\n\n"));
    for skill in &skills {
        manifest.push_str(&format!("- [{}]({})\n", skill.name, skill.filename));
    }
    SkillBundle {
        app_name: app_name.to_string(),
        goal: goal.to_string(),
        skills,
        manifest,
    }
}
