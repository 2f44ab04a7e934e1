use crate::error::LoadError;
use crate::host::Renderer;
use eyre::Result;
use html2text::config;
use pulldown_cmark::{Options, Parser, html};

/// Markdown chapters to HTML. Inline HTML such as glossary spans passes
/// through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, source: &str) -> std::result::Result<String, LoadError> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(source, options);
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Ok(out)
    }
}

/// Plain-text rendition of chapter HTML for terminal output.
pub fn html_to_plain_text(html: &str, width: usize) -> Result<String> {
    let text = config::plain()
        .link_footnotes(false)
        .string_from_read(html.as_bytes(), width)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_keeps_glossary_markup() {
        let source = "# Harbour\n\nThe <span data-tooltip=\"A small boat\" data-img=\"skiff.png\">skiff</span> left.\n";
        let html = MarkdownRenderer.render(source).unwrap();
        assert!(html.contains("<h1>Harbour</h1>"));
        assert!(html.contains(r#"data-tooltip="A small boat""#));
        assert!(html.contains(r#"data-img="skiff.png""#));
    }

    #[test]
    fn test_markdown_tables() {
        let html = MarkdownRenderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_plain_text() {
        let text = html_to_plain_text("<h1>Title</h1><p>Body text.</p>", 40).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Body text."));
        assert!(!text.contains("<p>"));
    }
}
