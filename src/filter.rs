use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::post::{Platform, Post};

/// Platform restriction picked by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Only(Platform),
}

impl Filter {
    /// Buttons in the order they appear on the wall.
    pub const BUTTONS: [Filter; 4] = [
        Filter::All,
        Filter::Only(Platform::YouTube),
        Filter::Only(Platform::Instagram),
        Filter::Only(Platform::TikTok),
    ];

    pub fn matches(self, post: &Post) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(platform) => post.platform() == Some(platform),
        }
    }

    /// Ordered subsequence of `posts` this filter lets through.
    pub fn apply(self, posts: &[Post]) -> Vec<&Post> {
        posts.iter().filter(|post| self.matches(post)).collect()
    }

    pub fn value(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Only(platform) => platform.wire_name(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Only(platform) => platform.label(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "all" {
            return Ok(Filter::All);
        }
        Platform::from_wire(&s)
            .map(Filter::Only)
            .ok_or_else(|| Error::Command(format!("unknown filter `{s}`")))
    }
}
