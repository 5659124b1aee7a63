//! Vault persistence tests: frontmatter entries and body blocks move
//! together, reformat only touches the main body, staleness follows the
//! content hash.

use tempfile::TempDir;

use postvault::ai::hash::content_hash;
use postvault::ai::{AiCli, AiCommentMeta, CommentType};
use postvault::post::{Author, Content, Platform, Post, PostCore, SocialPost};
use postvault::vault::Vault;

fn sample_post(text: &str) -> Post {
    Post::Social(SocialPost {
        core: PostCore {
            platform: Platform::Twitter,
            author: Author {
                name: "Ada Lovelace".to_string(),
                handle: Some("@ada".to_string()),
                url: None,
                avatar: None,
            },
            content: Content {
                text: text.to_string(),
                markdown: None,
                raw_markdown: None,
            },
            media: vec![],
            metadata: Default::default(),
            tags: vec!["engines".to_string()],
            comment: None,
            archived: true,
            liked: false,
            quoted: None,
        },
    })
}

fn meta_for(source: &str, comment_type: CommentType, id: &str) -> AiCommentMeta {
    AiCommentMeta {
        id: id.to_string(),
        cli: AiCli::Claude,
        comment_type,
        generated_at: "2026-08-24T12:00:00+00:00".to_string(),
        processing_time_ms: 1234,
        content_hash: content_hash(source),
        custom_prompt: None,
        source_language: None,
        target_language: None,
    }
}

#[test]
fn append_and_delete_move_entry_and_block_together() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());
    let path = vault.write_post(&sample_post("The analytical engine weaves patterns.")).unwrap();

    let (_, body) = vault.read_note(&path).unwrap();
    let source = Vault::main_body(&body).to_string();
    let meta = meta_for(&source, CommentType::Summary, "claude-summary-20260824T12000000-ab12");
    vault.append_ai_comment(&path, &meta, "A concise summary.").unwrap();

    let (fm, body) = vault.read_note(&path).unwrap();
    assert_eq!(fm.ai_comments.len(), 1);
    assert_eq!(
        Vault::comment_body(&body, &meta.id).as_deref(),
        Some("A concise summary.")
    );
    assert!(vault.orphan_blocks(&path).unwrap().is_empty());

    vault.delete_ai_comment(&path, &meta.id).unwrap();
    let (fm, body) = vault.read_note(&path).unwrap();
    assert!(fm.ai_comments.is_empty(), "frontmatter entry removed");
    assert!(
        Vault::comment_body(&body, &meta.id).is_none(),
        "body block removed with it"
    );
}

#[test]
fn deleting_an_unknown_comment_errors() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());
    let path = vault.write_post(&sample_post("body")).unwrap();
    assert!(vault.delete_ai_comment(&path, "nope").is_err());
}

#[test]
fn duplicate_comment_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());
    let path = vault.write_post(&sample_post("body")).unwrap();

    let (_, body) = vault.read_note(&path).unwrap();
    let meta = meta_for(Vault::main_body(&body), CommentType::Summary, "dup-1");
    vault.append_ai_comment(&path, &meta, "one").unwrap();
    assert!(vault.append_ai_comment(&path, &meta, "two").is_err());
}

#[test]
fn reformat_replaces_main_body_but_not_comments() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());
    let path = vault.write_post(&sample_post("messy   text\nbadly wrapped")).unwrap();

    let (_, body) = vault.read_note(&path).unwrap();
    let source = Vault::main_body(&body).to_string();
    let summary = meta_for(&source, CommentType::Summary, "s-1");
    vault.append_ai_comment(&path, &summary, "A summary.").unwrap();
    let reformat = meta_for(&source, CommentType::Reformat, "r-1");
    vault
        .append_ai_comment(&path, &reformat, "Clean text, nicely wrapped.")
        .unwrap();

    vault
        .apply_reformat(&path, "r-1", "Clean text, nicely wrapped.")
        .unwrap();

    let (fm, body) = vault.read_note(&path).unwrap();
    assert_eq!(Vault::main_body(&body), "Clean text, nicely wrapped.");
    assert_eq!(fm.ai_comments.len(), 2, "comments survive a reformat");
    assert!(Vault::comment_body(&body, "s-1").is_some());

    // Applying a non-reformat comment is refused.
    assert!(vault.apply_reformat(&path, "s-1", "whatever").is_err());
}

#[test]
fn stale_detection_follows_the_content_hash() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());
    let path = vault.write_post(&sample_post("original content")).unwrap();

    let (_, body) = vault.read_note(&path).unwrap();
    let source = Vault::main_body(&body).to_string();
    let meta = meta_for(&source, CommentType::Summary, "s-1");
    vault.append_ai_comment(&path, &meta, "summary").unwrap();
    assert!(vault.stale_comments(&path).unwrap().is_empty());

    // Editing the main body (via reformat) invalidates the fingerprint.
    let reformat = meta_for(&source, CommentType::Reformat, "r-1");
    vault.append_ai_comment(&path, &reformat, "edited content").unwrap();
    vault.apply_reformat(&path, "r-1", "edited content").unwrap();

    let stale = vault.stale_comments(&path).unwrap();
    assert!(stale.contains(&"s-1".to_string()));
}

#[test]
fn listing_finds_archived_notes() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());
    vault.write_post(&sample_post("first")).unwrap();
    vault.write_post(&sample_post("second")).unwrap();
    let notes = vault.list_notes().unwrap();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|p| p.extension().is_some_and(|e| e == "md")));
}
