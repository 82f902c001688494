//! Offline backend that serves registered HTML documents.
//!
//! [`StaticBrowser`] answers every [`Browser`] call from HTML parsed with
//! `scraper`, so scrape logic can be replayed against saved pages without a
//! driver. Clicking an element with an `href` or `data-href` attribute
//! navigates to that address; selectors registered with
//! [`StaticBrowser::with_broken`] make every element they match fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scraper::{ElementRef, Html, Selector};
use url::Url;

use leetscribe_shared::{LeetscribeError, Result};

use crate::{Browser, Locator};

/// Handle to an element of one particular page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticElement {
    load: u64,
    index: usize,
}

#[derive(Debug, Clone)]
struct Loaded {
    url: String,
    load: u64,
}

/// Observations shared with a [`StaticBrowser`], readable after it is closed.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    closed: Arc<AtomicBool>,
    visits: Arc<Mutex<Vec<String>>>,
    keystrokes: Arc<Mutex<Vec<String>>>,
    scripts: Arc<Mutex<Vec<String>>>,
    clicks: Arc<AtomicUsize>,
}

impl StaticProbe {
    /// Whether [`Browser::close`] ran.
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, in order (including click navigations).
    pub fn visits(&self) -> Vec<String> {
        lock(&self.visits).clone()
    }

    /// Concatenation of every `send_keys` payload.
    pub fn typed(&self) -> String {
        lock(&self.keystrokes).concat()
    }

    /// Number of `send_keys` calls.
    pub fn keystroke_calls(&self) -> usize {
        lock(&self.keystrokes).len()
    }

    /// Scripts passed to [`Browser::execute`].
    pub fn scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }

    /// Number of clicks that landed on a live element.
    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`Browser`] over a fixed set of HTML documents keyed by URL.
#[derive(Debug, Default)]
pub struct StaticBrowser {
    pages: HashMap<String, String>,
    broken: Vec<String>,
    failing_scripts: bool,
    current: Mutex<Option<Loaded>>,
    loads: Mutex<u64>,
    probe: StaticProbe,
}

impl StaticBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the document served at `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Make every operation on elements matching `css` fail.
    pub fn with_broken(mut self, css: impl Into<String>) -> Self {
        self.broken.push(css.into());
        self
    }

    /// Make every [`Browser::execute`] call fail after it is recorded.
    pub fn with_failing_scripts(mut self) -> Self {
        self.failing_scripts = true;
        self
    }

    /// Shared observation handle.
    pub fn probe(&self) -> StaticProbe {
        self.probe.clone()
    }

    fn navigate(&self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            return Err(LeetscribeError::Browser(format!(
                "no page registered for {url}"
            )));
        }
        let load = {
            let mut loads = lock(&self.loads);
            *loads += 1;
            *loads
        };
        *lock(&self.current) = Some(Loaded {
            url: url.to_string(),
            load,
        });
        lock(&self.probe.visits).push(url.to_string());
        Ok(())
    }

    fn loaded(&self) -> Result<Loaded> {
        lock(&self.current)
            .clone()
            .ok_or_else(|| LeetscribeError::Browser("no page loaded".into()))
    }

    /// Parse the current document.
    fn document(&self) -> Result<(Loaded, Html)> {
        let loaded = self.loaded()?;
        let html = self
            .pages
            .get(&loaded.url)
            .map(|raw| Html::parse_document(raw))
            .ok_or_else(|| LeetscribeError::Browser(format!("page vanished: {}", loaded.url)))?;
        Ok((loaded, html))
    }

    /// Run `f` against the live element behind `handle`.
    fn with_element<T>(
        &self,
        handle: &StaticElement,
        f: impl FnOnce(ElementRef<'_>, &Loaded) -> Result<T>,
    ) -> Result<T> {
        let (loaded, doc) = self.document()?;
        if handle.load != loaded.load {
            return Err(LeetscribeError::StaleElement(format!(
                "element #{} belongs to a previous page",
                handle.index
            )));
        }
        let element = all_elements(&doc)
            .into_iter()
            .nth(handle.index)
            .ok_or_else(|| LeetscribeError::StaleElement(format!("element #{}", handle.index)))?;
        self.check_not_broken(element)?;
        f(element, &loaded)
    }

    fn check_not_broken(&self, element: ElementRef<'_>) -> Result<()> {
        for css in &self.broken {
            if parse_selector(css)?.matches(&element) {
                return Err(LeetscribeError::Browser(format!(
                    "element matching '{css}' is not interactable"
                )));
            }
        }
        Ok(())
    }

    fn select(
        &self,
        doc: &Html,
        load: u64,
        scope: Option<ElementRef<'_>>,
        locator: &Locator,
    ) -> Result<Vec<StaticElement>> {
        let selector = parse_selector(locator.selector())?;
        let all = all_elements(doc);

        let matches: Vec<ElementRef<'_>> = match scope {
            Some(parent) => parent.select(&selector).collect(),
            None => doc.select(&selector).collect(),
        };

        Ok(matches
            .into_iter()
            .filter(|el| locator.accepts_text(&element_text(*el)))
            .filter_map(|el| all.iter().position(|candidate| candidate.id() == el.id()))
            .map(|index| StaticElement { load, index })
            .collect())
    }

    /// Follow an element's `href`/`data-href`, if it has one.
    fn follow_link(&self, element: ElementRef<'_>, loaded: &Loaded) -> Result<()> {
        let target = element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("data-href"));

        let Some(target) = target else {
            return Ok(());
        };

        let resolved = Url::parse(&loaded.url)
            .and_then(|base| base.join(target))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| target.to_string());
        self.navigate(&resolved)
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| LeetscribeError::validation(format!("invalid selector '{css}': {e}")))
}

fn all_elements(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

impl Browser for StaticBrowser {
    type Element = StaticElement;

    async fn goto(&self, url: &str) -> Result<()> {
        self.navigate(url)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.loaded()?.url)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<StaticElement>> {
        let (loaded, doc) = self.document()?;
        self.select(&doc, loaded.load, None, locator)
    }

    async fn find_within(
        &self,
        parent: &StaticElement,
        locator: &Locator,
    ) -> Result<Vec<StaticElement>> {
        let (loaded, doc) = self.document()?;
        if parent.load != loaded.load {
            return Err(LeetscribeError::StaleElement(format!(
                "element #{} belongs to a previous page",
                parent.index
            )));
        }
        let scope = all_elements(&doc)
            .into_iter()
            .nth(parent.index)
            .ok_or_else(|| LeetscribeError::StaleElement(format!("element #{}", parent.index)))?;
        self.check_not_broken(scope)?;
        self.select(&doc, loaded.load, Some(scope), locator)
    }

    async fn text(&self, element: &StaticElement) -> Result<String> {
        self.with_element(element, |el, _| Ok(element_text(el)))
    }

    async fn attr(&self, element: &StaticElement, name: &str) -> Result<Option<String>> {
        self.with_element(element, |el, _| Ok(el.value().attr(name).map(str::to_string)))
    }

    async fn click(&self, element: &StaticElement) -> Result<()> {
        self.with_element(element, |el, loaded| {
            self.probe.clicks.fetch_add(1, Ordering::SeqCst);
            self.follow_link(el, loaded)
        })
    }

    async fn script_click(&self, element: &StaticElement) -> Result<()> {
        self.click(element).await
    }

    async fn scroll_into_view(&self, element: &StaticElement) -> Result<()> {
        self.with_element(element, |_, _| Ok(()))
    }

    async fn send_keys(&self, element: &StaticElement, keys: &str) -> Result<()> {
        self.with_element(element, |_, _| {
            lock(&self.probe.keystrokes).push(keys.to_string());
            Ok(())
        })
    }

    async fn execute(&self, script: &str) -> Result<()> {
        lock(&self.probe.scripts).push(script.to_string());
        if self.failing_scripts {
            return Err(LeetscribeError::Browser("script rejected".into()));
        }
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
