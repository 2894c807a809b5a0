use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::PageConfig;
use crate::error::Result;
use crate::filter::Filter;
use crate::markup::{escape, rich_text};
use crate::media::{Media, MediaSource};
use crate::post::{Platform, Post, SocialPost, VideoPost};

lazy_static! {
    static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("page.html", include_str!("../templates/page.html")),
            ("card.html", include_str!("../templates/card.html")),
        ])
        .expect("embedded templates parse");
        tera.autoescape_on(vec![".html"]);
        tera.set_escape_fn(escape);
        tera
    };
}

/// Layout utilities the page relies on, so it renders without a css framework.
const STYLE: &str = r#"
body{margin:0;font-family:system-ui,sans-serif}
.hidden{display:none}.block{display:block}.flex{display:flex}.flex-col{flex-direction:column}.flex-wrap{flex-wrap:wrap}
.items-center{align-items:center}.justify-between{justify-content:space-between}.justify-start{justify-content:flex-start}
.gap-4{gap:1rem}.gap-6{gap:1.5rem}.w-full{width:100%}.h-auto{height:auto}.min-h-screen{min-height:100vh}
.p-4{padding:1rem}.px-6{padding-left:1.5rem;padding-right:1.5rem}.px-4{padding-left:1rem;padding-right:1rem}.py-2{padding-top:.5rem;padding-bottom:.5rem}
.px-10{padding-left:2.5rem;padding-right:2.5rem}.py-6{padding-top:1.5rem;padding-bottom:1.5rem}
.px-2{padding-left:.5rem;padding-right:.5rem}.py-1{padding-top:.25rem;padding-bottom:.25rem}
.mb-2{margin-bottom:.5rem}.mb-4{margin-bottom:1rem}.mb-6{margin-bottom:1.5rem}.mt-2{margin-top:.5rem}
.space-y-4>*+*{margin-top:1rem}
.bg-white{background:#fff}.rounded{border-radius:.25rem}.shadow{box-shadow:0 1px 3px rgba(0,0,0,.2)}.border{border:1px solid}
.text-center{text-align:center}.underline{text-decoration:underline}.font-bold{font-weight:700}.font-semibold{font-weight:600}
.text-xs{font-size:.75rem}.text-sm{font-size:.875rem}.text-md{font-size:1rem}.text-2xl{font-size:1.5rem}.inline-block{display:inline-block}
.columns-1{columns:1}.break-inside-avoid{break-inside:avoid}.whitespace-pre-wrap{white-space:pre-wrap}.break-words{overflow-wrap:break-word}
.bg-red-600{background:#dc2626}.text-black{color:#000}.text-red-600{color:#dc2626}.bg-red-100{background:#fee2e2}
.bg-pink-100{background:#fce7f3}.text-pink-600{color:#db2777}.bg-black{background:#000}.text-white{color:#fff}
.text-gray-600{color:#4b5563}.text-gray-700{color:#374151}.text-gray-800{color:#1f2937}.text-blue-950{color:#172554}
@media (min-width:640px){.sm\:columns-2{columns:2}}
@media (min-width:1024px){.lg\:block{display:block}.lg\:hidden{display:none}.lg\:flex-row{flex-direction:row}
.lg\:w-1\/3{width:33.333%}.lg\:w-2\/3{width:66.667%}.lg\:sticky{position:sticky}.lg\:top-6{top:1.5rem}
.lg\:justify-center{justify-content:center}.lg\:columns-2{columns:2}}
"#;

#[derive(Serialize)]
struct CardView<'a> {
    kind: &'a str,
    header: String,
    badge: &'static str,
    label: &'static str,
    youtube: Option<&'a VideoPost>,
    social: Option<SocialView<'a>>,
}

#[derive(Serialize)]
struct SocialView<'a> {
    video: Option<&'a str>,
    still: &'a str,
    /// One-shot `onerror` script, present while the still can still fall back.
    onerror: Option<String>,
    /// Already sanitized caption markup.
    text: Option<String>,
    permalink: Option<&'a str>,
    label: &'static str,
}

#[derive(Serialize)]
struct ButtonView {
    value: &'static str,
    label: &'static str,
    active: bool,
}

#[derive(Serialize)]
struct SectionView<'a> {
    heading: &'a str,
    body: String,
}

#[derive(Serialize)]
struct PageView<'a> {
    title: &'a str,
    style: &'static str,
    background: &'a str,
    panel_open: bool,
    instructions_title: &'a str,
    instructions: Vec<SectionView<'a>>,
    buttons: Vec<ButtonView>,
    cards: String,
}

/// Header text: the raw type with its first letter upper-cased.
pub fn capitalize(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn badge_class(platform: Option<Platform>) -> &'static str {
    match platform {
        Some(Platform::Instagram) => "bg-pink-100 text-pink-600",
        Some(Platform::YouTube) => "bg-red-100 text-red-600",
        _ => "bg-black text-white",
    }
}

/// Script swapping `attr` to the placeholder once, then detaching itself.
fn fallback_script(attr: &str, placeholder: &str) -> String {
    let js_string = placeholder.replace('\\', "\\\\").replace('\'', "\\'");
    format!("this.onerror=null;this.{attr}='{js_string}'")
}

fn social_view<'a>(post: &'a SocialPost, placeholder: &'a str) -> SocialView<'a> {
    let (video, attr, still): (_, _, &MediaSource) = match &post.media {
        Media::Video { src, poster } => (Some(src.as_str()), "poster", poster),
        Media::Image(source) => (None, "src", source),
    };

    SocialView {
        video,
        still: still.src(placeholder),
        onerror: still.is_armed().then(|| fallback_script(attr, placeholder)),
        text: post.text.as_deref().map(rich_text),
        permalink: post.permalink.as_deref(),
        label: post.platform.label(),
    }
}

/// One masonry card. Unknown post types get the header row only.
pub fn card(post: &Post, placeholder: &str) -> Result<String> {
    let platform = post.platform();
    let view = CardView {
        kind: post.kind(),
        header: capitalize(post.kind()),
        badge: badge_class(platform),
        label: platform.map(Platform::label).unwrap_or_default(),
        youtube: match post {
            Post::YouTube(video) => Some(video),
            _ => None,
        },
        social: match post {
            Post::Social(social) => Some(social_view(social, placeholder)),
            _ => None,
        },
    };

    Ok(TEMPLATES.render("card.html", &Context::from_serialize(&view)?)?)
}

/// Full wall page for the given view state.
pub fn page(posts: &[&Post], filter: Filter, panel_open: bool, page: &PageConfig) -> Result<String> {
    let cards = posts
        .iter()
        .map(|post| card(post, &page.placeholder))
        .collect::<Result<Vec<_>>>()?
        .join("\n");

    let view = PageView {
        title: &page.title,
        style: STYLE,
        background: &page.background,
        panel_open,
        instructions_title: &page.instructions_title,
        instructions: page
            .instructions
            .iter()
            .map(|section| SectionView {
                heading: &section.heading,
                body: rich_text(&section.body),
            })
            .collect(),
        buttons: Filter::BUTTONS
            .iter()
            .map(|&button| ButtonView {
                value: button.value(),
                label: button.label(),
                active: button == filter,
            })
            .collect(),
        cards,
    };

    Ok(TEMPLATES.render("page.html", &Context::from_serialize(&view)?)?)
}
