//! Vault file operations.
//!
//! Each archived post is one markdown note: YAML frontmatter (the post record
//! plus the `aiComments` array) and a body. AI comment bodies are appended
//! under an `## AI Comments` section as id-marked blocks; a comment's
//! frontmatter entry and body block are always added and removed together in
//! a single read-modify-write of the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use walkdir::WalkDir;

use crate::ai::hash::content_hash;
use crate::ai::{AiCommentMeta, CommentType};
use crate::post::frontmatter::{parse_note, render_note, NoteFrontmatter};
use crate::post::Post;

pub const COMMENT_SECTION: &str = "## AI Comments";

fn block_start(id: &str) -> String {
    format!("<!-- ai-comment:{} -->", id)
}

fn block_end(id: &str) -> String {
    format!("<!-- /ai-comment:{} -->", id)
}

pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Vault { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive destination for a post: `<root>/<platform>/<year>/<slug>.md`.
    pub fn note_path_for(&self, post: &Post) -> PathBuf {
        let core = post.core();
        let year = core
            .metadata
            .timestamp
            .unwrap_or_else(Utc::now)
            .format("%Y")
            .to_string();
        let slug = slugify(&format!(
            "{}-{}",
            core.author.name,
            core.content.text.chars().take(40).collect::<String>()
        ));
        self.root
            .join(core.platform.as_str())
            .join(year)
            .join(format!("{}.md", slug))
    }

    /// Write a freshly archived post as a new note.
    pub fn write_post(&self, post: &Post) -> Result<PathBuf> {
        let path = self.note_path_for(post);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let fm = NoteFrontmatter {
            post: post.clone(),
            ai_comments: vec![],
        };
        let text = render_note(&fm, post.body_markdown())?;
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn read_note(&self, path: &Path) -> Result<(NoteFrontmatter, String)> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_note(&text).with_context(|| format!("invalid note {}", path.display()))
    }

    /// All markdown notes under the vault root.
    pub fn list_notes(&self) -> Result<Vec<PathBuf>> {
        let mut notes = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "md")
            {
                notes.push(entry.path().to_path_buf());
            }
        }
        notes.sort();
        Ok(notes)
    }

    /// The main body of a note: everything above the AI comments section.
    /// This is what prompts are built from and what staleness is hashed over.
    pub fn main_body(body: &str) -> &str {
        match body.find(COMMENT_SECTION) {
            Some(idx) => body[..idx].trim_end(),
            None => body.trim_end(),
        }
    }

    /// Append a generated comment: frontmatter entry and body block together.
    pub fn append_ai_comment(
        &self,
        path: &Path,
        meta: &AiCommentMeta,
        content: &str,
    ) -> Result<()> {
        let (mut fm, mut body) = self.read_note(path)?;
        if fm.ai_comments.iter().any(|m| m.id == meta.id) {
            bail!("note already has a comment with id {}", meta.id);
        }
        fm.ai_comments.push(meta.clone());

        if !body.contains(COMMENT_SECTION) {
            body = format!("{}\n\n{}", body.trim_end(), COMMENT_SECTION);
        }
        let block = format!(
            "\n\n{}\n**{} · {} · {}**\n\n{}\n{}",
            block_start(&meta.id),
            meta.cli,
            meta.comment_type,
            meta.generated_at,
            content.trim_end(),
            block_end(&meta.id),
        );
        body.push_str(&block);

        fs::write(path, render_note(&fm, &body)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Delete a comment: removes BOTH the frontmatter entry and the body
    /// block. Errors if the id is unknown.
    pub fn delete_ai_comment(&self, path: &Path, id: &str) -> Result<()> {
        let (mut fm, body) = self.read_note(path)?;
        let before = fm.ai_comments.len();
        fm.ai_comments.retain(|m| m.id != id);
        if fm.ai_comments.len() == before {
            bail!("no comment with id {} in {}", id, path.display());
        }

        let body = remove_block(&body, id);
        fs::write(path, render_note(&fm, &body)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Extract one comment's body text by id.
    pub fn comment_body(body: &str, id: &str) -> Option<String> {
        let start_marker = block_start(id);
        let end_marker = block_end(id);
        let start = body.find(&start_marker)? + start_marker.len();
        let end = body[start..].find(&end_marker)? + start;
        Some(body[start..end].trim().to_string())
    }

    /// Replace the main body with a reformat comment's output, leaving the
    /// comments section untouched. The one sanctioned mutation of archived
    /// content; always user-initiated.
    pub fn apply_reformat(&self, path: &Path, id: &str, new_content: &str) -> Result<()> {
        let (fm, body) = self.read_note(path)?;
        let meta = fm
            .ai_comments
            .iter()
            .find(|m| m.id == id)
            .with_context(|| format!("no comment with id {}", id))?;
        if meta.comment_type != CommentType::Reformat {
            bail!("comment {} is a {} comment, not a reformat", id, meta.comment_type);
        }

        let new_body = match body.find(COMMENT_SECTION) {
            Some(idx) => format!("{}\n\n{}", new_content.trim_end(), &body[idx..]),
            None => new_content.trim_end().to_string(),
        };
        fs::write(path, render_note(&fm, &new_body)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Ids of comments whose source content has drifted since generation.
    pub fn stale_comments(&self, path: &Path) -> Result<Vec<String>> {
        let (fm, body) = self.read_note(path)?;
        let current = content_hash(Self::main_body(&body));
        Ok(fm
            .ai_comments
            .iter()
            .filter(|m| m.content_hash != current)
            .map(|m| m.id.clone())
            .collect())
    }

    /// Body blocks with no matching frontmatter entry. Reported, never
    /// silently dropped.
    pub fn orphan_blocks(&self, path: &Path) -> Result<Vec<String>> {
        let (fm, body) = self.read_note(path)?;
        let known: Vec<&str> = fm.ai_comments.iter().map(|m| m.id.as_str()).collect();
        let mut orphans = Vec::new();
        let mut rest = body.as_str();
        while let Some(idx) = rest.find("<!-- ai-comment:") {
            let after = &rest[idx + "<!-- ai-comment:".len()..];
            if let Some(end) = after.find(" -->") {
                let id = &after[..end];
                if !known.contains(&id) {
                    orphans.push(id.to_string());
                }
                rest = &after[end..];
            } else {
                break;
            }
        }
        Ok(orphans)
    }
}

fn remove_block(body: &str, id: &str) -> String {
    let start_marker = block_start(id);
    let end_marker = block_end(id);
    let Some(start) = body.find(&start_marker) else {
        return body.to_string();
    };
    let Some(end_rel) = body[start..].find(&end_marker) else {
        return body.to_string();
    };
    let end = start + end_rel + end_marker.len();
    let mut out = String::with_capacity(body.len());
    out.push_str(body[..start].trim_end());
    let tail = body[end..].trim_start_matches('\n');
    if !tail.is_empty() {
        out.push_str("\n\n");
        out.push_str(tail);
    }
    out
}

fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in input.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_flattens_punctuation_and_case() {
        assert_eq!(slugify("Ada Lovelace-Hello, World!"), "ada-lovelace-hello-world");
        assert_eq!(slugify("日本語 text"), "日本語-text");
        assert_eq!(slugify("!!!"), "post");
    }

    #[test]
    fn comment_body_extraction() {
        let body = format!(
            "main text\n\n{}\n\n{}\nhello there\n{}",
            COMMENT_SECTION,
            block_start("x-1"),
            block_end("x-1")
        );
        assert_eq!(Vault::comment_body(&body, "x-1").as_deref(), Some("hello there"));
        assert_eq!(Vault::comment_body(&body, "x-2"), None);
    }

    #[test]
    fn main_body_stops_at_comment_section() {
        let body = format!("the post\n\n{}\n\nstuff", COMMENT_SECTION);
        assert_eq!(Vault::main_body(&body), "the post");
        assert_eq!(Vault::main_body("no section here"), "no section here");
    }
}
