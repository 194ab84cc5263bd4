//! Tweet text normalisation ahead of FinBERT scoring.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid regex"));
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").expect("valid regex"));
static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[0-9#*]\x{FE0F}?\x{20E3}|[\p{Extended_Pictographic}\p{Emoji_Modifier}\p{Regional_Indicator}\x{FE0E}\x{FE0F}\x{20E3}\x{E0020}-\x{E007F}]",
    )
    .expect("valid regex")
});
static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid regex"));
static NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").expect("valid regex"));
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Zero-width and bidi controls plus the no-break space.
const INVISIBLE_CHARS: &[char] = &[
    '\u{200B}', '\u{200D}', '\u{FEFF}', '\u{00A0}', '\u{2066}', '\u{2069}',
];

/// Clean one tweet for sentiment scoring.
///
/// Applies, in order: lowercase, URL removal, @-mention removal, emoji
/// removal, `#` stripping (word kept), collapsing runs of one repeated ASCII
/// punctuation character, HTML-entity unescaping, invisible-character
/// removal, newline flattening, and whitespace trimming/collapsing. The pass
/// is repeated until the output stops changing, so
/// `clean_tweet(&clean_tweet(t)) == clean_tweet(t)`.
#[must_use]
pub fn clean_tweet(text: &str) -> String {
    // Unescaping can reintroduce text an earlier step removes (`&lt;&lt;`,
    // `&amp;amp;`). After the first pass every changing pass shortens the text.
    let mut current = clean_pass(text);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// [`clean_tweet`] for a possibly-missing field; absent text cleans to `""`.
#[must_use]
pub fn clean_optional(text: Option<&str>) -> String {
    text.map(clean_tweet).unwrap_or_default()
}

fn clean_pass(text: &str) -> String {
    let text = text.to_lowercase();
    let text = URL_RE.replace_all(&text, "");
    let text = MENTION_RE.replace_all(&text, "");
    let text = EMOJI_RE.replace_all(&text, "");
    let text = HASHTAG_RE.replace_all(&text, "$1");
    let text = collapse_repeated_punctuation(&text);
    let text = html_escape::decode_html_entities(&text);
    let text: String = text.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect();
    let text = NEWLINES_RE.replace_all(&text, " ");
    MULTI_SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// `"!!!"` becomes `"!"`; mixed runs such as `"?!"` are left alone.
fn collapse_repeated_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c.is_ascii_punctuation() && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
