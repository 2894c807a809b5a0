use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::markup::is_safe_url;
use crate::media::{Media, MediaSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::YouTube, Platform::Instagram, Platform::TikTok];

    /// Parses the `type` discriminator exactly as the backend sends it.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "youtube" => Some(Platform::YouTube),
            "instagram" => Some(Platform::Instagram),
            "tiktok" => Some(Platform::TikTok),
            _ => None,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Post as the backend pushes it. Both the current (`video`/`image`/`message`)
/// and the older (`media_url`/`media_type`/`content`/`caption`) shapes land here.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RawPost {
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub thumbnail: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,

    pub video: Option<String>,
    pub image: Option<String>,
    pub message: Option<String>,
    pub permalink: Option<String>,

    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content: Option<String>,
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VideoPost {
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialPost {
    pub platform: Platform,
    pub media: Media,
    /// Caption. May contain markup, rendered through the allow-list.
    pub text: Option<String>,
    pub permalink: Option<String>,
}

/// Normalized post. Position in the snapshot is its only identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Post {
    YouTube(VideoPost),
    Social(SocialPost),
    /// Unrecognized `type`. Renders as a bare header.
    Unknown { kind: String },
}

impl Post {
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Post::YouTube(_) => Some(Platform::YouTube),
            Post::Social(post) => Some(post.platform),
            Post::Unknown { .. } => None,
        }
    }

    /// Raw `type` string, as shown in the card header.
    pub fn kind(&self) -> &str {
        match self {
            Post::Unknown { kind } => kind,
            _ => self.platform().map(Platform::wire_name).unwrap_or_default(),
        }
    }
}

const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".mov", ".webm"];

fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Link or media field. Anything but http(s) or relative urls counts as absent.
fn present_url(field: Option<String>) -> Option<String> {
    present(field).filter(|url| {
        let safe = is_safe_url(url);
        if !safe {
            tracing::debug!(url = %url, "dropping unsafe url");
        }
        safe
    })
}

fn looks_like_video(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        let kind = raw.kind.unwrap_or_default();

        let platform = match Platform::from_wire(&kind) {
            Some(platform) => platform,
            None => return Post::Unknown { kind },
        };

        if platform == Platform::YouTube {
            return Post::YouTube(VideoPost {
                thumbnail: present_url(raw.thumbnail).unwrap_or_default(),
                title: raw.title.unwrap_or_default(),
                description: raw.description.unwrap_or_default(),
                url: present_url(raw.url).unwrap_or_default(),
            });
        }

        // older shape: media_url is either the video or another still candidate
        let media_url = present_url(raw.media_url);
        let media_url_is_video = match raw.media_type.as_deref() {
            Some(t) if !t.is_empty() => t.eq_ignore_ascii_case("video"),
            _ => media_url.as_deref().map(looks_like_video).unwrap_or(false),
        };
        let (legacy_video, legacy_image) = if media_url_is_video {
            (media_url, None)
        } else {
            (None, media_url)
        };

        let still = MediaSource::from_candidates([
            present_url(raw.image),
            present_url(raw.thumbnail),
            present_url(raw.thumbnail_url),
            legacy_image,
        ]);

        let media = match present_url(raw.video).or(legacy_video) {
            Some(src) => Media::Video { src, poster: still },
            None => Media::Image(still),
        };

        Post::Social(SocialPost {
            platform,
            media,
            text: present(raw.message)
                .or_else(|| present(raw.content))
                .or_else(|| present(raw.caption)),
            permalink: present_url(raw.permalink),
        })
    }
}

/// Turns a pushed payload into a snapshot.
///
/// The payload must be an array. A malformed element degrades to an
/// untyped post instead of failing the whole snapshot.
pub fn parse_snapshot(payload: Value) -> Result<Vec<Post>> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(Error::Protocol(format!(
                "expected an array of posts, got {}",
                kind_of(&other)
            )))
        }
    };

    Ok(items
        .into_iter()
        .map(|item| match serde_json::from_value::<RawPost>(item) {
            Ok(raw) => raw.into(),
            Err(e) => {
                tracing::debug!("dropping malformed post: {e}");
                Post::Unknown {
                    kind: String::new(),
                }
            }
        })
        .collect())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
