//! Where results live in the markup
//!
//! Upstream markup drifts, so every selector the extractor depends on lives
//! here as data. Strategies are tried in order and the first one whose
//! container selector matches anything wins.

use crate::dom::{DomNode, DomTree};
use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for one known layout of the results page
#[derive(Debug)]
pub struct LocatorStrategy {
    pub name: &'static str,
    pub container: Selector,
    pub title: Selector,
    pub snippet: Selector,
    pub display_url: Selector,
    /// Elements that may hold a machine timestamp
    pub timestamp: Option<Selector>,
    /// Container classes marking sponsored results
    pub ad_classes: &'static [&'static str],
}

impl LocatorStrategy {
    fn build(
        name: &'static str,
        container: &str,
        title: &str,
        snippet: &str,
        display_url: &str,
        timestamp: Option<&str>,
        ad_classes: &'static [&'static str],
    ) -> Self {
        let compile = |css: &str| Selector::parse(css).expect("valid locator selector");
        Self {
            name,
            container: compile(container),
            title: compile(title),
            snippet: compile(snippet),
            display_url: compile(display_url),
            timestamp: timestamp.map(compile),
            ad_classes,
        }
    }

    pub fn is_ad(&self, container: &DomNode<'_>) -> bool {
        self.ad_classes.iter().any(|class| container.has_class(class))
    }
}

/// Known layouts, most common first
pub static STRATEGIES: LazyLock<Vec<LocatorStrategy>> = LazyLock::new(|| {
    vec![
        // JavaScript-free endpoint (html.duckduckgo.com/html/)
        LocatorStrategy::build(
            "html-endpoint",
            "div.result",
            "a.result__a",
            ".result__snippet",
            "a.result__url",
            Some(".result__extras__url span, .result__timestamp"),
            &["result--ad", "result--ad--small"],
        ),
        // Client-rendered results page
        LocatorStrategy::build(
            "react-serp",
            "article[data-testid='result']",
            "a[data-testid='result-title-a']",
            "[data-result='snippet']",
            "a[data-testid='result-extras-url-link']",
            None,
            &["result--ad"],
        ),
    ]
});

static NAV_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.nav-link form").expect("valid nav form selector"));

static SUBMIT_INPUT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input[type='submit'], button[type='submit'], button")
        .expect("valid submit selector")
});

static VQD_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[name='vqd']").expect("valid vqd selector"));

static OFFSET_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[name='s']").expect("valid offset selector"));

/// Finds the first strategy with at least one container in the page
///
/// # Returns
///
/// The strategy and its containers in document order, or `None` when no
/// strategy matches.
pub fn locate_containers<'a>(dom: &'a DomTree) -> Option<(&'static LocatorStrategy, Vec<DomNode<'a>>)> {
    for strategy in STRATEGIES.iter() {
        let containers: Vec<DomNode<'a>> = dom.select(&strategy.container).collect();
        if containers.is_empty() {
            tracing::debug!("No containers with strategy '{}'", strategy.name);
            continue;
        }

        tracing::debug!(
            "Found {} containers with strategy '{}'",
            containers.len(),
            strategy.name
        );
        return Some((strategy, containers));
    }

    None
}

/// Paging state carried by the "more results" control
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NextPage {
    pub token: Option<String>,
    pub offset: Option<u32>,
}

/// Reads the token and offset of the "Next" form, if the page has one
///
/// Later pages carry both a "Previous" and a "Next" form; only the latter
/// counts. When no form is labelled, the last one is taken.
pub fn locate_next_page(dom: &DomTree) -> NextPage {
    let forms: Vec<DomNode<'_>> = dom.select(&NAV_FORM).collect();

    let labelled: Vec<(DomNode<'_>, String)> = forms
        .iter()
        .filter_map(|form| submit_label(form).map(|label| (*form, label)))
        .collect();

    let next_form = if labelled.is_empty() {
        forms.last().copied()
    } else {
        labelled
            .into_iter()
            .find(|(_, label)| label.contains("next") || label.contains('>'))
            .map(|(form, _)| form)
    };

    let Some(form) = next_form else {
        return NextPage::default();
    };

    let token = form
        .select_first(&VQD_INPUT)
        .and_then(|input| input.attr("value"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let offset = form
        .select_first(&OFFSET_INPUT)
        .and_then(|input| input.attr("value"))
        .and_then(|value| value.trim().parse().ok());

    NextPage { token, offset }
}

/// Lowercased label of a form's submit control
fn submit_label(form: &DomNode<'_>) -> Option<String> {
    let submit = form.select_first(&SUBMIT_INPUT)?;
    let label = submit
        .attr("value")
        .map(str::to_string)
        .unwrap_or_else(|| submit.text());
    let label = label.trim().to_lowercase();
    (!label.is_empty()).then_some(label)
}
