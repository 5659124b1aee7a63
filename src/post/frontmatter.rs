//! YAML frontmatter parsing and rendering.
//!
//! A note is a `---` delimited YAML block followed by a markdown body. The
//! frontmatter carries the post record plus the `aiComments` array; comment
//! bodies live in the note body, referenced by id.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ai::AiCommentMeta;
use crate::post::Post;

pub const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteFrontmatter {
    #[serde(flatten)]
    pub post: Post,
    #[serde(
        rename = "aiComments",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ai_comments: Vec<AiCommentMeta>,
}

/// Split a note into its frontmatter and body.
pub fn parse_note(text: &str) -> Result<(NoteFrontmatter, String)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
        .context("note has no frontmatter block")?;

    let (yaml, body) = match rest.find("\n---") {
        Some(idx) => {
            let yaml = &rest[..idx + 1];
            let after = &rest[idx + 1..];
            // Skip the closing delimiter line.
            let body = after
                .splitn(2, '\n')
                .nth(1)
                .unwrap_or("");
            (yaml, body)
        }
        None => bail!("frontmatter block is not closed"),
    };

    let fm: NoteFrontmatter =
        serde_yaml::from_str(yaml).context("failed to parse note frontmatter")?;
    Ok((fm, body.trim_start_matches('\n').to_string()))
}

/// Render a note back to text.
pub fn render_note(fm: &NoteFrontmatter, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(fm).context("failed to serialize frontmatter")?;
    Ok(format!(
        "{}\n{}{}\n\n{}",
        DELIMITER,
        yaml,
        DELIMITER,
        body.trim_start_matches('\n')
    ))
}
