//! Archived post data model.
//!
//! A post is a tagged union per platform family sharing a common core, so
//! family invariants (a podcast post has an episode, a video post has a
//! duration) live in the type instead of a pile of optional fields.

pub mod frontmatter;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source platform of an archived post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Threads,
    Bluesky,
    Mastodon,
    Instagram,
    Facebook,
    Reddit,
    Youtube,
    Tiktok,
    Medium,
    Substack,
    Podcast,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Threads => "threads",
            Platform::Bluesky => "bluesky",
            Platform::Mastodon => "mastodon",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Reddit => "reddit",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Medium => "medium",
            Platform::Substack => "substack",
            Platform::Podcast => "podcast",
            Platform::Web => "web",
        }
    }

    /// Static icon lookup for timeline rendering.
    pub fn icon(&self) -> &'static str {
        match self {
            Platform::Twitter => "𝕏",
            Platform::Threads => "@",
            Platform::Bluesky => "🦋",
            Platform::Mastodon => "🐘",
            Platform::Instagram => "📷",
            Platform::Facebook => "👥",
            Platform::Reddit => "👽",
            Platform::Youtube => "▶",
            Platform::Tiktok => "♪",
            Platform::Medium => "Ⓜ",
            Platform::Substack => "✉",
            Platform::Podcast => "🎙",
            Platform::Web => "🌐",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Plain text of the post.
    pub text: String,
    /// Markdown rendering, when the scraper produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// Raw markdown as captured, before cleanup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_markdown: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Gif,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

/// Fields shared by every platform family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCore {
    pub platform: Platform,
    pub author: Author,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(default)]
    pub metadata: PostMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// User note attached at archive time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted: Option<Box<Post>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    #[serde(flatten)]
    pub core: PostCore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPost {
    #[serde(flatten)]
    pub core: PostCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(flatten)]
    pub core: PostCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastPost {
    #[serde(flatten)]
    pub core: PostCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

/// An archived unit of social content, tagged by platform family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum Post {
    Social(SocialPost),
    Video(VideoPost),
    Blog(BlogPost),
    Podcast(PodcastPost),
}

impl Post {
    pub fn core(&self) -> &PostCore {
        match self {
            Post::Social(p) => &p.core,
            Post::Video(p) => &p.core,
            Post::Blog(p) => &p.core,
            Post::Podcast(p) => &p.core,
        }
    }

    pub fn core_mut(&mut self) -> &mut PostCore {
        match self {
            Post::Social(p) => &mut p.core,
            Post::Video(p) => &mut p.core,
            Post::Blog(p) => &mut p.core,
            Post::Podcast(p) => &mut p.core,
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            Post::Social(_) => "social",
            Post::Video(_) => "video",
            Post::Blog(_) => "blog",
            Post::Podcast(_) => "podcast",
        }
    }

    /// Best available body text for rendering and AI prompts.
    pub fn body_markdown(&self) -> &str {
        let content = &self.core().content;
        content
            .markdown
            .as_deref()
            .unwrap_or(content.text.as_str())
    }
}
