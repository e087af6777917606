//! Wikipedia page summaries via the REST API.
//!
//! A missing article is not an error: the caller gets a minimal summary
//! holding the canonical article URL, which it can still fetch or show.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::deadline::Deadline;
use crate::engines::request_error;
use crate::error::{Result, SearchError};
use crate::http;

/// Summary of one encyclopedia article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiSummary {
    /// Language edition the summary came from.
    pub lang: String,
    pub title: String,
    /// Desktop URL of the article.
    pub url: String,
    /// Short description, e.g. "General-purpose programming language".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plain-text lead section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestSummary {
    title: Option<String>,
    description: Option<String>,
    extract: Option<String>,
    content_urls: Option<ContentUrls>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrls>,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

/// Fetch the summary of `title` from the `lang` edition (default: the
/// configured default language).
///
/// # Errors
///
/// - [`SearchError::InvalidInput`] for a blank title or a language code
///   that is not lowercase ASCII letters and hyphens
/// - [`SearchError::Http`] / [`SearchError::Timeout`] when the API cannot
///   be reached
/// - [`SearchError::Parse`] when the API answers with malformed JSON
pub async fn wiki_summary(
    title: &str,
    lang: Option<&str>,
    config: &SearchConfig,
) -> Result<WikiSummary> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SearchError::InvalidInput("title must not be blank".into()));
    }
    let lang = config.effective_language(lang).to_ascii_lowercase();
    if !is_language_code(&lang) {
        return Err(SearchError::InvalidInput(format!(
            "invalid language code '{lang}'"
        )));
    }

    let site = config.wiki_endpoint.trim_end_matches('/').replace("{lang}", &lang);
    let slug = urlencoding::encode(&title.replace(' ', "_")).into_owned();
    let article_url = format!("{site}/wiki/{slug}");
    let summary_url = format!("{site}/api/rest_v1/page/summary/{slug}");

    let user_agent = http::user_agent_for(config);
    let client = http::build_client(config, &user_agent)?;
    let deadline = Deadline::after_millis(config.http_timeout_ms);

    tracing::trace!(title, lang = %lang, "fetching wiki summary");
    let body = deadline
        .run("wiki summary", async {
            let response = client
                .get(&summary_url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| request_error("wiki request failed", e))?;
            if !response.status().is_success() {
                tracing::debug!(status = %response.status(), title, "no wiki summary, using article URL");
                return Ok(None);
            }
            let body = response
                .text()
                .await
                .map_err(|e| request_error("wiki response read failed", e))?;
            Ok::<_, SearchError>(Some(body))
        })
        .await??;

    let Some(body) = body else {
        return Ok(WikiSummary {
            lang,
            title: title.to_owned(),
            url: article_url,
            description: None,
            extract: None,
            thumbnail_url: None,
        });
    };

    let raw: RestSummary = serde_json::from_str(&body)
        .map_err(|e| SearchError::Parse(format!("malformed wiki summary: {e}")))?;
    Ok(WikiSummary {
        lang,
        title: raw.title.unwrap_or_else(|| title.to_owned()),
        url: raw
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page)
            .unwrap_or(article_url),
        description: raw.description,
        extract: raw.extract,
        thumbnail_url: raw.thumbnail.and_then(|t| t.source),
    })
}

fn is_language_code(lang: &str) -> bool {
    !lang.is_empty()
        && lang.len() <= 16
        && lang.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        && !lang.starts_with('-')
}
