//! Page fetching and readable-text extraction.
//!
//! [`fetch_page_content`] downloads a page and hands the HTML to
//! [`extract_content`], which walks the DOM under the main content root,
//! skipping boilerplate subtrees (scripts, navigation, sidebars, footers),
//! and returns clean text plus the page's title, author, site name and
//! language. PDF documents go to [`extract_pdf`] instead, which reports the
//! document title and page count alongside the text.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::config::SearchConfig;
use crate::deadline::Deadline;
use crate::engines::request_error;
use crate::error::{Result, SearchError};
use crate::http;
use crate::types::PageContent;

/// Default maximum characters of text returned for one page.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Elements whose whole subtree is never readable content.
const SKIPPED: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
    "template", "button", "select",
];

/// Elements that break the text flow into separate lines.
const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "main", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5",
    "h6", "br", "tr", "table", "blockquote", "pre", "figure", "figcaption", "dd", "dt", "hr",
];

/// Content roots tried in order; `body` is the last resort.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=\"main\"]", "body"];

/// How a response body is turned into [`PageContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Html,
    Pdf,
}

/// A downloaded body, decoded according to its [`BodyKind`].
enum Body {
    Html(String),
    Pdf(Vec<u8>),
}

/// Fetch `url` and extract its readable content.
///
/// Redirects are followed; the returned [`PageContent::url`] is the address
/// the page was finally served from. `language` shapes the Accept-Language
/// header and falls back to the configured default.
///
/// # Errors
///
/// - [`SearchError::InvalidInput`] for anything but an absolute http(s) URL
/// - [`SearchError::Http`] / [`SearchError::Timeout`] on network failure or
///   a non-success status
/// - [`SearchError::Parse`] for unsupported content types, unreadable PDFs,
///   or pages with no extractable text
pub async fn fetch_page_content(
    url: &str,
    language: Option<&str>,
    config: &SearchConfig,
) -> Result<PageContent> {
    let target = Url::parse(url.trim())
        .map_err(|e| SearchError::InvalidInput(format!("invalid URL '{url}': {e}")))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(SearchError::InvalidInput(format!(
            "only http and https URLs can be fetched, got '{}'",
            target.scheme()
        )));
    }

    let language = config.effective_language(language);
    let user_agent = http::user_agent_for(config);
    let client = http::build_client(config, &user_agent)?;
    let deadline = Deadline::after_millis(config.http_timeout_ms);

    tracing::trace!(%target, "fetching page");
    let (served_from, body) = deadline
        .run("page fetch", async {
            let response = client
                .get(target.clone())
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml,application/pdf;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, http::accept_language(language))
                .send()
                .await
                .map_err(|e| request_error("page request failed", e))?
                .error_for_status()
                .map_err(|e| request_error("page HTTP error", e))?;

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();
            let served_from = response.url().to_string();

            let body = match body_kind(&content_type)? {
                BodyKind::Html => Body::Html(
                    response
                        .text()
                        .await
                        .map_err(|e| request_error("page read failed", e))?,
                ),
                BodyKind::Pdf => Body::Pdf(
                    response
                        .bytes()
                        .await
                        .map_err(|e| request_error("PDF read failed", e))?
                        .to_vec(),
                ),
            };
            Ok::<_, SearchError>((served_from, body))
        })
        .await??;

    let page = match body {
        Body::Html(html) => extract_content(&html, &served_from)?,
        Body::Pdf(bytes) => pdf_off_thread(bytes, served_from).await?,
    };
    tracing::debug!(url = %page.url, words = page.word_count, pages = ?page.page_count, "page extracted");
    Ok(page)
}

/// PDF parsing is CPU-bound and the parser may panic on malformed files,
/// so it runs on the blocking pool.
async fn pdf_off_thread(bytes: Vec<u8>, url: String) -> Result<PageContent> {
    tokio::task::spawn_blocking(move || extract_pdf(&bytes, &url))
        .await
        .map_err(|e| SearchError::Parse(format!("PDF parser crashed: {e}")))?
}

fn body_kind(content_type: &str) -> Result<BodyKind> {
    if content_type.contains("pdf") {
        return Ok(BodyKind::Pdf);
    }
    let textual = content_type.is_empty()
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.starts_with("text/");
    if textual {
        Ok(BodyKind::Html)
    } else {
        Err(SearchError::Parse(format!(
            "unsupported content type '{content_type}'"
        )))
    }
}

/// Extract text, title and page count from a PDF document.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the document cannot be read or holds
/// no extractable text (for example a scanned document without a text
/// layer).
pub fn extract_pdf(bytes: &[u8], url: &str) -> Result<PageContent> {
    extract_pdf_with_limit(bytes, url, DEFAULT_MAX_CHARS)
}

/// [`extract_pdf`] with a custom character limit for the text.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the document cannot be read or holds
/// no extractable text.
pub fn extract_pdf_with_limit(bytes: &[u8], url: &str, max_chars: usize) -> Result<PageContent> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| SearchError::Parse(format!("unreadable PDF: {e}")))?;
    let page_count = u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX);

    let raw = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| SearchError::Parse(format!("PDF text extraction failed: {e}")))?;
    let text = tidy_lines(&raw);
    if text.is_empty() {
        return Err(SearchError::Parse("no extractable text in PDF".into()));
    }
    let text = truncate_chars(text, max_chars);
    let word_count = text.split_whitespace().count();

    Ok(PageContent {
        url: url.to_owned(),
        title: pdf_title(&document).unwrap_or_default(),
        byline: pdf_info_text(&document, b"Author"),
        site_name: None,
        lang: None,
        text,
        word_count,
        page_count: Some(page_count),
    })
}

fn pdf_title(document: &lopdf::Document) -> Option<String> {
    pdf_info_text(document, b"Title")
}

/// A text entry of the document information dictionary.
fn pdf_info_text(document: &lopdf::Document, key: &[u8]) -> Option<String> {
    let info = match document.trailer.get(b"Info").ok()? {
        lopdf::Object::Reference(id) => document.get_object(*id).ok()?,
        inline => inline,
    };
    let raw = info.as_dict().ok()?.get(key).ok()?.as_str().ok()?;
    Some(collapse_spaces(&decode_pdf_text(raw))).filter(|t| !t.is_empty())
}

/// PDF text strings are UTF-16BE when they start with a byte order mark and
/// PDFDocEncoding otherwise, which agrees with Latin-1 for printable text.
fn decode_pdf_text(raw: &[u8]) -> String {
    match raw.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => raw.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Extract readable text and metadata from raw HTML.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no extractable content is found.
pub fn extract_content(html: &str, url: &str) -> Result<PageContent> {
    extract_content_with_limit(html, url, DEFAULT_MAX_CHARS)
}

/// [`extract_content`] with a custom character limit for the text.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no extractable content is found.
pub fn extract_content_with_limit(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let text = main_text(&document);
    if text.is_empty() {
        return Err(SearchError::Parse("no extractable content found".into()));
    }
    let text = truncate_chars(text, max_chars);
    let word_count = text.split_whitespace().count();

    Ok(PageContent {
        url: url.to_owned(),
        title: page_title(&document),
        byline: meta_content(&document, "meta[name=\"author\"]"),
        site_name: meta_content(&document, "meta[property=\"og:site_name\"]"),
        lang: document_lang(&document),
        text,
        word_count,
        page_count: None,
    })
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| collapse_spaces(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// `<title>`, then `og:title`, then the first `<h1>`.
fn page_title(document: &Html) -> String {
    first_text(document, "title")
        .or_else(|| meta_content(document, "meta[property=\"og:title\"]"))
        .or_else(|| first_text(document, "h1"))
        .unwrap_or_default()
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_spaces)
        .find(|v| !v.is_empty())
}

fn document_lang(document: &Html) -> Option<String> {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
}

/// Text of the first content root that has any.
fn main_text(document: &Html) -> String {
    for css in CONTENT_ROOTS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(root) = document.select(&selector).next() {
            let mut raw = String::new();
            collect_text(root, &mut raw);
            let text = tidy_lines(&raw);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                let hidden = el.attr("hidden").is_some() || el.attr("aria-hidden") == Some("true");
                if hidden || SKIPPED.contains(&name) {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child_el, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One line per block, whitespace collapsed, blank lines dropped.
fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(collapse_spaces)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = text[..cut].trim_end().to_owned();
            truncated.push_str("\n\n[Content truncated]");
            truncated
        }
        None => text,
    }
}
