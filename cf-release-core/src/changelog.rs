//! Changelog conversion: the mod-hosting API serves changelogs as HTML
//! fragments; release notes want Markdown.
//!
//! The converter is deliberately minimal: anchors become Markdown links,
//! headings/lists/paragraphs get their Markdown prefixes, every remaining
//! tag is stripped and the common entities are unescaped. Anything fancier
//! belongs to the upstream changelog author.

use regex::Regex;

/// Convert an HTML changelog fragment to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let mut md = String::from(html);

    // Anchors first, while their tags are still intact.
    let anchor = Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#)
        .expect("anchor pattern is valid");
    md = anchor
        .replace_all(&md, |caps: &regex::Captures<'_>| {
            format!("[{}]({})", caps[2].trim(), &caps[1])
        })
        .into_owned();

    for level in (1..=6).rev() {
        let open = Regex::new(&format!(r"(?i)<h{level}\b[^>]*>")).expect("heading pattern");
        md = open
            .replace_all(&md, format!("\n{} ", "#".repeat(level)))
            .into_owned();
        md = md.replace(&format!("</h{level}>"), "\n");
    }

    let open_tag = |name: &str| Regex::new(&format!(r"(?i)<{name}\b[^>]*>")).expect("tag pattern");
    md = open_tag("p").replace_all(&md, "\n\n").into_owned();
    md = md.replace("</p>", "\n");
    md = open_tag("br").replace_all(&md, "\n").into_owned();
    md = open_tag("ul").replace_all(&md, "\n").into_owned();
    md = md.replace("</ul>", "\n");
    md = open_tag("ol").replace_all(&md, "\n").into_owned();
    md = md.replace("</ol>", "\n");
    md = open_tag("li").replace_all(&md, "- ").into_owned();
    md = md.replace("</li>", "\n");

    // Strip whatever tags remain.
    md = Regex::new(r"<[^>]+>")
        .expect("strip pattern is valid")
        .replace_all(&md, "")
        .into_owned();

    md = md
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    md.trim().to_string()
}

/// Join per-artifact changelogs into one release body.
pub fn join_changelogs(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
