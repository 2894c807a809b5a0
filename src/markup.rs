use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)\b[^<>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"^&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap();
    static ref SCRIPT: Regex = Regex::new(r"(?is)<\s*script\b.*?(</\s*script\s*>|$)").unwrap();
    static ref STYLE: Regex = Regex::new(r"(?is)<\s*style\b.*?(</\s*style\s*>|$)").unwrap();
    static ref SCHEME: Regex = Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*):").unwrap();
}

/// Tags a caption may keep. Attributes are always stripped.
const ALLOWED: [&str; 9] = ["b", "strong", "i", "em", "u", "br", "p", "ul", "li"];

/// Schemes a link or media url may carry. Relative urls have none and pass.
const SAFE_SCHEMES: [&str; 2] = ["http", "https"];

/// Whether `url` may go into an `href` or `src`.
///
/// Browsers drop control characters and surrounding blanks before reading
/// the scheme, so any control character rejects the url outright.
pub fn is_safe_url(url: &str) -> bool {
    if url.chars().any(char::is_control) {
        return false;
    }
    match SCHEME.captures(url.trim()) {
        Some(caps) => SAFE_SCHEMES.iter().any(|s| caps[1].eq_ignore_ascii_case(s)),
        None => true,
    }
}

/// Escapes text for both element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Like `escape`, but leaves well-formed character references alone so
/// captions the backend already encoded are not double-escaped.
fn escape_text(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(pos) = rest.find(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(entity) = ENTITY.find(tail) {
            out.push_str(entity.as_str());
            rest = &tail[entity.end()..];
            continue;
        }
        let c = tail.chars().next().unwrap_or_default();
        out.push_str(&escape(&c.to_string()));
        rest = &tail[c.len_utf8()..];
    }
    out.push_str(rest);
}

/// Renders caption markup through a small allow-list.
///
/// Allowed tags survive without attributes, script and style blocks are
/// removed with their content, any other tag is dropped while its inner
/// text is kept. Unclosed allowed tags are closed at the end.
pub fn rich_text(input: &str) -> String {
    let input = SCRIPT.replace_all(input, "");
    let input = STYLE.replace_all(&input, "");

    let mut out = String::with_capacity(input.len());
    let mut open: Vec<String> = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(&input) {
        let whole = caps.get(0).unwrap();
        escape_text(&input[last..whole.start()], &mut out);
        last = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        if !ALLOWED.contains(&name.as_str()) {
            continue;
        }

        if name == "br" {
            out.push_str("<br>");
        } else if !closing {
            out.push_str(&format!("<{name}>"));
            open.push(name);
        } else if let Some(idx) = open.iter().rposition(|tag| *tag == name) {
            // close everything opened inside it too
            for tag in open.drain(idx..).rev() {
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
    escape_text(&input[last..], &mut out);

    for tag in open.drain(..).rev() {
        out.push_str(&format!("</{tag}>"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_specials() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(rich_text("hi #11MillionWays 🧃"), "hi #11MillionWays 🧃");
    }

    #[test]
    fn allowed_tags_lose_attributes() {
        assert_eq!(
            rich_text(r#"<b onclick="steal()">bold</b> and <EM>em</EM><br/>next"#),
            "<b>bold</b> and <em>em</em><br>next"
        );
    }

    #[test]
    fn injection_is_neutralized() {
        let out = rich_text(r#"<img src=x onerror="alert(1)">caption<script>alert(2)</script> <a href="javascript:x">link</a>"#);
        assert_eq!(out, "caption link");
    }

    #[test]
    fn unterminated_script_is_removed() {
        assert_eq!(rich_text("ok<script>alert(1)"), "ok");
    }

    #[test]
    fn entities_are_not_double_escaped() {
        assert_eq!(rich_text("Fish &amp; chips &#169; & more"), "Fish &amp; chips &#169; &amp; more");
    }

    #[test]
    fn stray_brackets_are_escaped() {
        assert_eq!(rich_text("1 < 2 > 0"), "1 &lt; 2 &gt; 0");
    }

    #[test]
    fn lists_survive() {
        assert_eq!(
            rich_text(r#"<ul class="x"><li>one</li><li>two</ul>"#),
            "<ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn only_web_urls_are_safe() {
        assert!(is_safe_url("https://cdn.example/a.jpg"));
        assert!(is_safe_url("HTTP://example.com"));
        assert!(is_safe_url("/media/a.mp4"));
        assert!(is_safe_url("//cdn.example/a.jpg"));
        assert!(is_safe_url("clip.mp4?t=1:30"));

        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("  JavaScript:alert(1)"));
        assert!(!is_safe_url("java\nscript:alert(1)"));
        assert!(!is_safe_url("data:text/html;base64,PHNjcmlwdD4="));
        assert!(!is_safe_url("vbscript:msgbox(1)"));
    }

    #[test]
    fn unbalanced_tags_are_closed() {
        assert_eq!(rich_text("<b>open <i>nested"), "<b>open <i>nested</i></b>");
        assert_eq!(rich_text("</strong>stray"), "stray");
        assert_eq!(rich_text("<b>a <i>b</b> c"), "<b>a <i>b</i></b> c");
    }
}
