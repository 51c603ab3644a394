use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|iframe|object|embed)\b[^>]*>.*?</(script|style|iframe|object|embed)\s*>")
        .expect("script block pattern compiles")
});

static TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</?[a-zA-Z!][^>]*>").expect("tag pattern compiles"));

/// Strip markup from user supplied text before it is stored.
///
/// The basic entities are decoded first, so encoded markup is stripped like
/// literal markup. Dangerous elements are then dropped together with their
/// content and every other tag is removed with its text kept. Stripping
/// repeats until nothing changes, so removing one tag cannot assemble another.
pub fn sanitize(input: &str) -> String {
    let mut text = decode_entities(input);
    loop {
        let without_blocks = SCRIPT_BLOCKS.replace_all(&text, "");
        let stripped = TAGS.replace_all(&without_blocks, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text.trim().to_string()
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
