//! Shared headless browser session for the deep engine.
//!
//! A [`BrowserSession`] is a cheaply cloneable handle. The Chromium process
//! behind it is launched on first use, and concurrent first users wait on
//! the same launch instead of starting their own. Every search borrows a
//! fresh tab through a [`PageLease`], so one request failing or timing out
//! never disturbs another request's tab or the browser itself. Only
//! [`BrowserSession::shutdown`] tears the process down.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::BrowserSettings;
use crate::error::SearchError;

/// A lazily-filled slot holding at most one shared value.
///
/// Initialisation runs under the slot's lock, so callers racing to fill
/// an empty slot all observe the one launch in flight.
pub(crate) struct SharedSlot<T> {
    current: Mutex<Option<Arc<T>>>,
    launches: AtomicUsize,
}

impl<T> SharedSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            current: Mutex::new(None),
            launches: AtomicUsize::new(0),
        }
    }

    /// Return the live value, running `launch` only if the slot is empty.
    ///
    /// A failed launch leaves the slot empty so a later call can retry.
    pub(crate) async fn get_or_launch<F, Fut>(&self, launch: F) -> Result<Arc<T>, SearchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut current = self.current.lock().await;
        if let Some(live) = current.as_ref() {
            return Ok(Arc::clone(live));
        }
        let launched = Arc::new(launch().await?);
        self.launches.fetch_add(1, Ordering::SeqCst);
        *current = Some(Arc::clone(&launched));
        Ok(launched)
    }

    /// Empty the slot if it still holds `stale`.
    pub(crate) async fn invalidate(&self, stale: &Arc<T>) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|live| Arc::ptr_eq(live, stale)) {
            *current = None;
        }
    }

    /// Remove and return the live value, if any.
    pub(crate) async fn take(&self) -> Option<Arc<T>> {
        self.current.lock().await.take()
    }

    pub(crate) async fn is_filled(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// How many successful launches this slot has performed.
    pub(crate) fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

/// A running Chromium process plus the task pumping its CDP connection.
struct LaunchedBrowser {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl Drop for LaunchedBrowser {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

struct SessionInner {
    settings: BrowserSettings,
    launch_timeout: Duration,
    slot: SharedSlot<LaunchedBrowser>,
}

/// Reference-counted handle to the shared headless browser.
///
/// Clone it into every engine that needs a browser; all clones share one
/// process.
#[derive(Clone)]
pub struct BrowserSession {
    inner: Arc<SessionInner>,
}

impl BrowserSession {
    /// Create a session handle. No process is started until the first page
    /// is requested.
    pub fn new(settings: BrowserSettings, launch_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                settings,
                launch_timeout,
                slot: SharedSlot::new(),
            }),
        }
    }

    /// Open a new blank tab, launching the browser first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EngineUnavailable`] if Chromium is missing or
    /// fails to launch, and [`SearchError::Browser`] if the running browser
    /// refuses to open a tab.
    pub async fn open_page(&self) -> Result<PageLease, SearchError> {
        let inner = &self.inner;
        let launched = inner
            .slot
            .get_or_launch(|| launch_chromium(&inner.settings, inner.launch_timeout))
            .await?;

        let opened = launched.browser.lock().await.new_page("about:blank").await;
        match opened {
            Ok(page) => Ok(PageLease::new(page)),
            Err(e) => {
                // A browser that cannot open tabs has most likely crashed;
                // let the next request launch a fresh one.
                tracing::warn!(error = %e, "browser failed to open a tab; discarding it");
                inner.slot.invalidate(&launched).await;
                Err(SearchError::Browser(format!("failed to open tab: {e}")))
            }
        }
    }

    /// Close the browser process, if one is running.
    ///
    /// Tabs still leased by in-flight requests fail on their next command.
    /// A later [`open_page`](Self::open_page) launches a new process.
    pub async fn shutdown(&self) {
        let Some(launched) = self.inner.slot.take().await else {
            return;
        };
        let mut browser = launched.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "browser close failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "browser process wait failed");
        }
        tracing::info!("headless browser shut down");
    }

    /// Whether a browser process is currently live.
    pub async fn is_running(&self) -> bool {
        self.inner.slot.is_filled().await
    }

    /// Number of browser processes this session has launched so far.
    pub fn launch_count(&self) -> usize {
        self.inner.slot.launch_count()
    }

    /// Number of live handles sharing this session.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("settings", &self.inner.settings)
            .field("launches", &self.launch_count())
            .finish()
    }
}

async fn launch_chromium(
    settings: &BrowserSettings,
    launch_timeout: Duration,
) -> Result<LaunchedBrowser, SearchError> {
    let mut builder = chromiumoxide::BrowserConfig::builder()
        .window_size(settings.viewport_width, settings.viewport_height)
        .viewport(Viewport {
            width: settings.viewport_width,
            height: settings.viewport_height,
            ..Viewport::default()
        })
        .launch_timeout(launch_timeout)
        .request_timeout(launch_timeout);
    if !settings.headless {
        builder = builder.with_head();
    }
    if let Some(ref executable) = settings.executable {
        builder = builder.chrome_executable(executable);
    }

    let config = builder
        .build()
        .map_err(|e| SearchError::EngineUnavailable(format!("no usable Chromium: {e}")))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| SearchError::EngineUnavailable(format!("failed to launch Chromium: {e}")))?;

    let handler = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!(error = %e, "browser connection event error");
            }
        }
        tracing::debug!("browser connection closed");
    });

    tracing::info!(headless = settings.headless, "headless browser launched");
    Ok(LaunchedBrowser {
        browser: Mutex::new(browser),
        handler,
    })
}

/// One tab borrowed from the shared browser.
///
/// Call [`release`](Self::release) to close it. If the lease is dropped
/// without release (the owning request was cancelled) the tab is closed
/// on a background task.
pub struct PageLease {
    page: Option<Page>,
}

impl PageLease {
    fn new(page: Page) -> Self {
        Self { page: Some(page) }
    }

    /// The leased tab.
    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// Close the tab. The shared browser stays up.
    pub async fn release(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "closing leased tab failed");
            }
        }
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::debug!(error = %e, "closing abandoned tab failed");
                }
            });
        }
    }
}
