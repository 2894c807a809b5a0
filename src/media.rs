/// Image source of a card element with its one-shot fallback.
///
/// A source starts at `Primary` and moves to `Fallback` (the default
/// placeholder) on its first load failure. A failure while already on the
/// placeholder is not handled again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSource {
    Primary(String),
    Fallback,
}

/// Media shown by an Instagram or TikTok card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Media {
    /// Playable video. The poster follows the fallback chain.
    Video { src: String, poster: MediaSource },
    /// Still image, used when a post has no video.
    Image(MediaSource),
}

impl MediaSource {
    /// First non-empty candidate, or the placeholder when there is none.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
            .map(MediaSource::Primary)
            .unwrap_or(MediaSource::Fallback)
    }

    pub fn src<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self {
            MediaSource::Primary(url) => url,
            MediaSource::Fallback => placeholder,
        }
    }

    /// Whether a load failure would still trigger a substitution.
    pub fn is_armed(&self) -> bool {
        matches!(self, MediaSource::Primary(_))
    }

    /// Handles a load failure. Returns `true` if the placeholder was swapped in.
    pub fn on_error(&mut self) -> bool {
        match self {
            MediaSource::Primary(_) => {
                *self = MediaSource::Fallback;
                true
            }
            MediaSource::Fallback => false,
        }
    }
}

impl Media {
    /// The image-carrying part of the media: the poster of a video or the image itself.
    pub fn still(&self) -> &MediaSource {
        match self {
            Media::Video { poster, .. } => poster,
            Media::Image(source) => source,
        }
    }

    pub fn on_error(&mut self) -> bool {
        match self {
            Media::Video { poster, .. } => poster.on_error(),
            Media::Image(source) => source.on_error(),
        }
    }
}
