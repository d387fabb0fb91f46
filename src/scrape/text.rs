use scraper::Html;

/// Plain text of a cooked post body, trimmed.
#[must_use]
pub fn cooked_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}
