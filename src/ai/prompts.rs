//! Prompt templates and placeholder substitution.
//!
//! Each comment type has a fixed template containing a `{{content}}`
//! placeholder; `translation` adds `{{targetLanguage}}` and `connections`
//! adds `{{vaultPath}}`, `{{currentNote}}` and `{{currentNoteName}}`.
//! Rendering substitutes every placeholder and appends a language
//! instruction block, so no `{{...}}` token survives into the final prompt.

use super::{CommentType, GenerationRequest};

const SUMMARY: &str = "Summarize the following post in 2-4 sentences. \
Capture the core claim and any conclusion, skip pleasantries.\n\n{{content}}";

const FACTCHECK: &str = "Fact-check the following post. List each checkable claim, \
verify it against what you know, and label it Supported, Disputed, or Unverifiable \
with a one-line justification.\n\n{{content}}";

const CRITIQUE: &str = "Write a short critique of the following post: the strongest \
point, the weakest point, and what is missing.\n\n{{content}}";

const EXPLAIN: &str = "Explain the following post for a reader with no background in \
the topic. Define jargon on first use.\n\n{{content}}";

const KEYPOINTS: &str = "Extract the key points of the following post as a bullet \
list, at most 7 bullets, each a single sentence.\n\n{{content}}";

const SENTIMENT: &str = "Describe the sentiment and tone of the following post \
(positive/negative/mixed, plus the emotional register), with one quoted phrase as \
evidence for each judgment.\n\n{{content}}";

const QUESTIONS: &str = "List the open questions a careful reader should ask after \
reading the following post.\n\n{{content}}";

const TRANSLATION: &str = "Translate the following post into {{targetLanguage}}. \
Preserve formatting, links, and hashtags as-is.\n\n{{content}}";

const CONNECTIONS: &str = "You are looking at a note archived at {{currentNote}} \
(named {{currentNoteName}}) inside the vault at {{vaultPath}}. Suggest notes in \
that vault this post connects to and why, as a short list of wiki-links with a \
one-line rationale each.\n\n{{content}}";

const REFORMAT: &str = "Reformat the following post as clean markdown: fix broken \
line wrapping, convert bare URLs to links, and turn enumerations into lists. Do \
not change the wording.\n\n{{content}}";

const CUSTOM: &str = "{{customPrompt}}\n\n{{content}}";

/// Fallback instruction used for the `custom` type when no prompt is given.
const CUSTOM_FALLBACK: &str = "Comment on the following post.";

/// The built-in template for a comment type.
pub fn default_prompt(comment_type: CommentType) -> &'static str {
    match comment_type {
        CommentType::Summary => SUMMARY,
        CommentType::Factcheck => FACTCHECK,
        CommentType::Critique => CRITIQUE,
        CommentType::Explain => EXPLAIN,
        CommentType::Keypoints => KEYPOINTS,
        CommentType::Sentiment => SENTIMENT,
        CommentType::Questions => QUESTIONS,
        CommentType::Translation => TRANSLATION,
        CommentType::Connections => CONNECTIONS,
        CommentType::Reformat => REFORMAT,
        CommentType::Custom => CUSTOM,
    }
}

/// Render the final prompt for a request: template substitution plus the
/// trailing language instruction.
pub fn render_prompt(req: &GenerationRequest) -> String {
    let template = default_prompt(req.comment_type);

    let note_name = req
        .current_note
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(untitled)".to_string());
    let note_path = req
        .current_note
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unknown note)".to_string());
    let vault_path = req
        .vault_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unknown vault)".to_string());

    let mut prompt = template
        .replace("{{customPrompt}}", req.custom_prompt.unwrap_or(CUSTOM_FALLBACK))
        .replace("{{targetLanguage}}", req.target_language.unwrap_or("English"))
        .replace("{{vaultPath}}", &vault_path)
        .replace("{{currentNoteName}}", &note_name)
        .replace("{{currentNote}}", &note_path)
        .replace("{{content}}", req.content);

    prompt.push_str("\n\n");
    match req.output_language {
        Some(lang) => {
            prompt.push_str(&format!(
                "Respond in {lang}. Any format labels or section headings in your \
                 response must also be in {lang}."
            ));
        }
        None => {
            prompt.push_str("Respond in the same language as the content above.");
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GenerationRequest;
    use std::path::Path;

    #[test]
    fn every_template_embeds_the_content() {
        for t in CommentType::ALL {
            assert!(
                default_prompt(t).contains("{{content}}"),
                "{} template must contain {{{{content}}}}",
                t
            );
        }
    }

    #[test]
    fn translation_template_takes_a_target_language() {
        assert!(default_prompt(CommentType::Translation).contains("{{targetLanguage}}"));
    }

    #[test]
    fn connections_template_takes_vault_context() {
        let t = default_prompt(CommentType::Connections);
        assert!(t.contains("{{vaultPath}}"));
        assert!(t.contains("{{currentNote}}"));
        assert!(t.contains("{{currentNoteName}}"));
    }

    #[test]
    fn rendering_leaves_no_placeholders() {
        for t in CommentType::ALL {
            let mut req = GenerationRequest::new(t, "Hello world");
            req.vault_path = Some(Path::new("/vault"));
            req.current_note = Some(Path::new("/vault/archive/x/post.md"));
            req.target_language = Some("Korean");
            let rendered = render_prompt(&req);
            assert!(
                !rendered.contains("{{"),
                "{} prompt still has a placeholder: {}",
                t,
                rendered
            );
            assert!(rendered.contains("Hello world"));
        }
    }

    #[test]
    fn custom_prompt_is_substituted() {
        let mut req = GenerationRequest::new(CommentType::Custom, "body text");
        req.custom_prompt = Some("Answer like a pirate.");
        let rendered = render_prompt(&req);
        assert!(rendered.starts_with("Answer like a pirate."));
        assert!(rendered.contains("body text"));
    }

    #[test]
    fn output_language_changes_the_instruction_block() {
        let req = GenerationRequest::new(CommentType::Summary, "text");
        assert!(render_prompt(&req).contains("same language as the content"));

        let mut req = GenerationRequest::new(CommentType::Summary, "text");
        req.output_language = Some("Japanese");
        let rendered = render_prompt(&req);
        assert!(rendered.contains("Respond in Japanese"));
        assert!(rendered.contains("must also be in Japanese"));
    }
}
