use crate::models::GlossaryTerm;
use scraper::{Html, Selector};

/// Attribute that marks a glossary element and carries its tooltip text.
pub const TOOLTIP_ATTR: &str = "data-tooltip";
pub const IMAGE_ATTR: &str = "data-img";
pub const IMAGE_ALT_ATTR: &str = "data-img-alt";

/// Finds glossary elements in rendered chapter markup, in document order.
pub fn scan_glossary(html: &str) -> Vec<GlossaryTerm> {
    let fragment = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse(&format!("[{TOOLTIP_ATTR}]")) else {
        return Vec::new();
    };

    fragment
        .select(&selector)
        .enumerate()
        .map(|(id, element)| {
            let value = element.value();
            GlossaryTerm {
                id,
                text: element.text().collect::<String>().trim().to_string(),
                tooltip: value.attr(TOOLTIP_ATTR).unwrap_or_default().trim().to_string(),
                image: non_blank(value.attr(IMAGE_ATTR)),
                image_alt: non_blank(value.attr(IMAGE_ALT_ATTR)),
            }
        })
        .collect()
}

/// Every `<img src>` in rendered content, for opening in the viewer.
pub fn content_images(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let Ok(img_selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    fragment
        .select(&img_selector)
        .filter_map(|element| element.value().attr("src"))
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
