use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_ENDPOINT: &str = "https://hashtag-aggregator-backend.onrender.com";
pub const DEFAULT_EVENT: &str = "newPosts";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Origin of the socket.io backend that pushes snapshots.
    pub endpoint: String,
    /// Name of the pushed event carrying a full snapshot.
    pub event: String,
    /// Where the rendered page is written. Can be redefined by `--output`.
    pub output: String,

    pub page: PageConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub background: String,
    /// Default image used when a post has no media or its media fails to load.
    pub placeholder: String,
    pub instructions_open: bool,
    pub instructions_title: String,
    pub instructions: Vec<InstructionSection>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstructionSection {
    pub heading: String,
    pub body: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            event: DEFAULT_EVENT.into(),
            output: "wall.html".into(),
            page: PageConfig::default(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Chivita 11 Million Ways Social Wall".into(),
            background: "/assets/img/background-11millionsway.jpg".into(),
            placeholder: "/assets/img/default-thumbnail.jpg".into(),
            instructions_open: false,
            instructions_title: "🎉 Join the #11MillionWays with Chivita Challenge!".into(),
            instructions: default_instructions(),
        }
    }
}

fn default_instructions() -> Vec<InstructionSection> {
    [
        (
            "Create Your Chivita Recipe 🧃",
            "Come up with a fun, delicious, or unexpected recipe using any Chivita product (e.g. smoothies, mocktails, desserts, etc.).",
        ),
        (
            "Record a Video 🎬",
            "Film yourself making the recipe. Show us your ingredients, your process, and the final result! Make it fun, clear, and personal.",
        ),
        (
            "Post Your Video 📲",
            "Upload your video to <strong>Instagram</strong> or <strong>YouTube</strong>.<br>🔖 <strong>IMPORTANT:</strong> In your caption or title, use the hashtag <strong>#11MillionWays</strong> and tag <strong>Chivita</strong> to make sure we see it!",
        ),
        (
            "Inspire Others 💥",
            "Share your video with friends, family, or followers. You never know who you'll inspire!",
        ),
        (
            "🌟 Bonus Tips:",
            "<ul><li>Keep your video under 60-90 seconds if posting on Instagram Reels or YouTube Shorts.</li><li>Show your face and talk us through the recipe!</li><li>Get creative with ingredients or presentation. This is your moment to shine.</li></ul>",
        ),
    ]
    .into_iter()
    .map(|(heading, body)| InstructionSection {
        heading: heading.into(),
        body: body.into(),
    })
    .collect()
}

impl Config {
    /// Reads a toml config. A missing file is not an error: defaults are used.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let bytes = std::fs::read(path)?;
        let cfg = String::from_utf8_lossy(&bytes);
        Ok(toml::from_str(&cfg)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            output = "out/index.html"

            [page]
            instructions_open = true
            "#,
        )
        .unwrap();

        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.event, "newPosts");
        assert_eq!(cfg.output, "out/index.html");
        assert!(cfg.page.instructions_open);
        assert_eq!(cfg.page.placeholder, "/assets/img/default-thumbnail.jpg");
        assert_eq!(cfg.page.instructions.len(), 5);
    }

    #[test]
    fn custom_instructions_replace_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [[page.instructions]]
            heading = "Post"
            body = "Use the tag"
            "#,
        )
        .unwrap();

        assert_eq!(
            cfg.page.instructions,
            vec![InstructionSection {
                heading: "Post".into(),
                body: "Use the tag".into()
            }]
        );
    }

    #[test]
    fn bonus_tips_are_a_list() {
        let tips = default_instructions().pop().unwrap();
        assert_eq!(tips.heading, "🌟 Bonus Tips:");
        assert!(tips.body.starts_with("<ul><li>"));
        assert!(tips.body.contains("<li>Show your face and talk us through the recipe!</li>"));
        assert_eq!(tips.body.matches("<li>").count(), 3);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = Config::load("definitely/not/here/socialwall.toml").unwrap();
        assert_eq!(cfg.output, "wall.html");
    }
}
