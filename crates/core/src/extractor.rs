use crate::error::IndexError;
use crate::models::SourceFile;
use lopdf::Document;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::path::Path;
use tracing::{debug, info, warn};

/// Converts a document on disk into plain text.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, path: &Path) -> Result<String, IndexError>;
}

/// Converts raw HTML bytes into plain text.
pub trait HtmlConverter: Send + Sync {
    fn html_to_text(&self, html: &[u8]) -> String;
}

const PLAIN_TEXT_EXTENSIONS: [&str; 10] = [
    "txt", "text", "md", "markdown", "csv", "tsv", "log", "json", "xml", "rtf",
];

/// PDFs through lopdf, plain-text formats read as lossy UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeConverter;

impl DocumentConverter for NativeConverter {
    fn convert(&self, path: &Path) -> Result<String, IndexError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            return extract_pdf_text(path);
        }

        if PLAIN_TEXT_EXTENSIONS.contains(&extension.as_str()) {
            let bytes = std::fs::read(path)?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        Err(IndexError::UnsupportedFormat(path.display().to_string()))
    }
}

fn extract_pdf_text(path: &Path) -> Result<String, IndexError> {
    let document = Document::load(path).map_err(|error| IndexError::PdfParse(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| IndexError::PdfParse(error.to_string()))?;

        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    Ok(pages.join("\n"))
}

/// Concatenates visible text, skipping scripts, styles and the document head.
/// Inline markup joins its text directly; other elements separate words.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperHtmlConverter;

const INVISIBLE_ELEMENTS: [&str; 5] = ["head", "script", "style", "noscript", "template"];

const INLINE_ELEMENTS: [&str; 27] = [
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "del", "dfn", "em", "font", "i",
    "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time",
    "u", "var",
];

impl HtmlConverter for ScraperHtmlConverter {
    fn html_to_text(&self, html: &[u8]) -> String {
        let document = Html::parse_document(&String::from_utf8_lossy(html));
        let mut text = String::new();
        collect_visible_text(document.root_element(), &mut text);

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if INVISIBLE_ELEMENTS.contains(&name) {
        return;
    }

    let separates = !INLINE_ELEMENTS.contains(&name);
    if separates {
        out.push(' ');
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            collect_visible_text(child, out);
        }
    }
    if separates {
        out.push(' ');
    }
}

/// Primary conversion with an HTML fallback for HTML-family extensions.
pub struct TextExtractor {
    converter: Box<dyn DocumentConverter>,
    html: Box<dyn HtmlConverter>,
    html_extensions: Regex,
}

impl TextExtractor {
    pub fn new(
        converter: Box<dyn DocumentConverter>,
        html: Box<dyn HtmlConverter>,
        html_extension_pattern: &str,
    ) -> Result<Self, IndexError> {
        Ok(Self {
            converter,
            html,
            html_extensions: Regex::new(html_extension_pattern)?,
        })
    }

    pub fn native(html_extension_pattern: &str) -> Result<Self, IndexError> {
        Self::new(
            Box::new(NativeConverter),
            Box::new(ScraperHtmlConverter),
            html_extension_pattern,
        )
    }

    /// Returns trimmed text, or `None` when neither path produced any.
    pub fn extract(&self, source: &SourceFile) -> Option<String> {
        match self.converter.convert(&source.path) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
                debug!(path = %source.path.display(), "converter returned no text");
            }
            Err(error) => {
                info!(path = %source.path.display(), %error, "can't convert file");
            }
        }

        if !self.html_extensions.is_match(&source.file_type) {
            return None;
        }

        let bytes = match std::fs::read(&source.path) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(path = %source.path.display(), %error, "can't read html file");
                return None;
            }
        };

        let text = self.html.html_to_text(&bytes);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct FailingConverter;

    impl DocumentConverter for FailingConverter {
        fn convert(&self, path: &Path) -> Result<String, IndexError> {
            Err(IndexError::Extraction(path.display().to_string()))
        }
    }

    struct FixedConverter(&'static str);

    impl DocumentConverter for FixedConverter {
        fn convert(&self, _path: &Path) -> Result<String, IndexError> {
            Ok(self.0.to_string())
        }
    }

    fn extractor(converter: Box<dyn DocumentConverter>) -> TextExtractor {
        TextExtractor::new(converter, Box::new(ScraperHtmlConverter), "htm?")
            .expect("html pattern compiles")
    }

    #[test]
    fn primary_text_is_trimmed() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("a.pdf");
        fs::write(&path, b"ignored")?;
        let source = SourceFile::new(&path).expect("file name");

        let text = extractor(Box::new(FixedConverter("  body text \n"))).extract(&source);
        assert_eq!(text.as_deref(), Some("body text"));
        Ok(())
    }

    #[test]
    fn html_fallback_runs_after_failure() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            b"<html><head><title>T</title><style>p{}</style></head>\
              <body><p>Hello</p><p>world <b>again</b></p><script>var x;</script></body></html>",
        )?;
        let source = SourceFile::new(&path).expect("file name");

        let text = extractor(Box::new(FailingConverter)).extract(&source);
        assert_eq!(text.as_deref(), Some("Hello world again"));
        Ok(())
    }

    #[test]
    fn html_fallback_runs_after_empty_primary() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("page.htm");
        fs::write(&path, b"<p>fallback</p>")?;
        let source = SourceFile::new(&path).expect("file name");

        let text = extractor(Box::new(FixedConverter("   "))).extract(&source);
        assert_eq!(text.as_deref(), Some("fallback"));
        Ok(())
    }

    #[test]
    fn no_fallback_for_other_extensions() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"<p>looks like html</p>")?;
        let source = SourceFile::new(&path).expect("file name");

        assert_eq!(extractor(Box::new(FailingConverter)).extract(&source), None);
        Ok(())
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        let text = ScraperHtmlConverter.html_to_text(
            b"<p>Hel<b>lo</b> wor<span>ld</span></p><p>next</p><ul><li>one</li><li>two</li></ul>",
        );
        assert_eq!(text, "Hello world next one two");
    }

    #[test]
    fn empty_html_yields_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.html");
        fs::write(&path, b"<html><head><script>x()</script></head><body> </body></html>")?;
        let source = SourceFile::new(&path).expect("file name");

        assert_eq!(extractor(Box::new(FailingConverter)).extract(&source), None);
        Ok(())
    }

    #[test]
    fn native_converter_reads_plain_text() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.TXT");
        fs::write(&path, "plain notes")?;

        assert_eq!(NativeConverter.convert(&path)?, "plain notes");
        Ok(())
    }

    #[test]
    fn native_converter_rejects_unknown_formats() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("letter.docx");
        fs::write(&path, b"PK")?;

        assert!(matches!(
            NativeConverter.convert(&path),
            Err(IndexError::UnsupportedFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn broken_pdf_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        assert!(matches!(NativeConverter.convert(&path), Err(IndexError::PdfParse(_))));
        Ok(())
    }
}
