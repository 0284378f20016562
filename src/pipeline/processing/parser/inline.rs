use once_cell::sync::Lazy;
use regex::Regex;

static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(`+)([^`]*?)`+").expect("valid code span pattern"));
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("valid image pattern"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid link pattern"));
static REFERENCE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").expect("valid reference link pattern"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid tag pattern"));
static STRONG_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid strong pattern"));
static EMPHASIS_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").expect("valid emphasis pattern"));
// Underscores only count as emphasis at word boundaries, so `process_name` survives
static STRONG_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])__([^_]+?)__([^\w]|$)").expect("valid strong pattern"));
static EMPHASIS_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_\s](?:[^_]*[^_\s])?)_([^\w]|$)").expect("valid emphasis pattern"));

/// Reduce inline markdown to its visible text
pub fn strip_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in CODE_SPAN.captures_iter(text) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        out.push_str(&strip_markup(&text[last..whole.start()]));
        out.push_str(code.as_str().trim());
        last = whole.end();
    }
    out.push_str(&strip_markup(&text[last..]));
    out.trim().to_string()
}

fn strip_markup(text: &str) -> String {
    let text = IMAGE.replace_all(text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = REFERENCE_LINK.replace_all(&text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    let text = STRONG_STAR.replace_all(&text, "$1");
    let text = EMPHASIS_STAR.replace_all(&text, "$1");
    let text = STRONG_UNDERSCORE.replace_all(&text, "$1$2$3");
    let text = EMPHASIS_UNDERSCORE.replace_all(&text, "$1$2$3");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_links_and_emphasis() {
        assert_eq!(
            strip_inline("See the **[process](../process.md)** entity"),
            "See the process entity"
        );
        assert_eq!(strip_inline("*italic* and _also_"), "italic and also");
    }

    #[test]
    fn test_keeps_snake_case_names() {
        assert_eq!(strip_inline("process_file_name"), "process_file_name");
        assert_eq!(strip_inline("_time"), "_time");
    }

    #[test]
    fn test_code_span_content_is_literal() {
        assert_eq!(strip_inline("`**not bold**`"), "**not bold**");
    }

    #[test]
    fn test_html_tags_and_entities() {
        assert_eq!(strip_inline("ATT&amp;CK<br>Data Source"), "ATT&CKData Source");
        assert_eq!(strip_inline("ATT&CK Data Source"), "ATT&CK Data Source");
    }
}
