//! DOM classification for hierarchy pages
//!
//! A hierarchy page renders the site tree with the current node marked
//! `selected`. The element adjacent to that marker decides what the node
//! is: a `children` list makes it a branch, its absence makes it a leaf.
//! Classification happens on the fetched page itself, never from the
//! parent's listing, whose CSS classes can be stale relative to the
//! destination page's real structure.
//!
//! All parsing here is synchronous over `&str` bodies, so no parsed DOM is
//! ever held across an await point.

use scraper::{ElementRef, Html, Selector};

/// Marker anchor of the hierarchy node the page is positioned on
pub const SELECTED_ANCHOR_SELECTOR: &str = "li.hierarchy-item > a.selected";

/// Class of the list that holds a branch's immediate children
pub const CHILDREN_CONTAINER_CLASS: &str = "children";

/// Class marking a child whose own page carries further children
pub const HAS_CHILDREN_CLASS: &str = "with-children";

/// One immediate child from a branch's children container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Display text of the child's anchor (diagnostics only)
    pub title: String,

    /// The child's href, if its anchor carries a non-empty one
    pub href: Option<String>,

    /// Whether the listing claims the child has children of its own.
    /// Advisory: re-verified when the child page is fetched.
    pub has_children: bool,

    /// Href of a collapsed expand toggle, when one is present
    pub collapsed_toggle_href: Option<String>,
}

/// Classification of a fetched hierarchy page
#[derive(Debug)]
pub enum PageView {
    /// The selected marker is absent; the page did not render the expected
    /// hierarchy position
    MissingSelectedMarker,

    /// No children container adjacent to the marker: a leaf, subject to
    /// record extraction
    Leaf,

    /// A branch with its immediate children, in DOM listing order
    Branch { children: Vec<ChildEntry> },
}

/// Classifies a page body as branch, leaf, or structurally unexpected
pub fn classify_page(body: &str) -> PageView {
    let document = Html::parse_document(body);

    let selected = match find_selected(&document) {
        Some(element) => element,
        None => return PageView::MissingSelectedMarker,
    };

    match children_container(selected) {
        Some(container) => PageView::Branch {
            children: child_entries(container),
        },
        None => PageView::Leaf,
    }
}

/// True when the body contains any children container
///
/// Used as the wait condition after triggering an expand toggle: a
/// collapsed branch only materializes its children list once the server
/// has registered the expansion.
pub fn has_children_container(body: &str) -> bool {
    let document = Html::parse_document(body);
    let selector = match Selector::parse(&format!("ul.{}", CHILDREN_CONTAINER_CLASS)) {
        Ok(s) => s,
        Err(_) => return false,
    };
    document.select(&selector).next().is_some()
}

fn find_selected(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse(SELECTED_ANCHOR_SELECTOR).ok()?;
    document.select(&selector).next()
}

/// The children container is the next element sibling of the selected
/// anchor, inside the same hierarchy item.
fn children_container(selected: ElementRef<'_>) -> Option<ElementRef<'_>> {
    selected
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "ul" && has_class(*e, CHILDREN_CONTAINER_CLASS))
}

/// Enumerates the container's immediate `li` children only; deeper levels
/// are reached through the work queue, not by recursing here.
fn child_entries(container: ElementRef<'_>) -> Vec<ChildEntry> {
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "li")
        .map(child_entry)
        .collect()
}

fn child_entry(item: ElementRef<'_>) -> ChildEntry {
    let anchor = direct_children(item).find(|e| e.value().name() == "a" && !has_class(*e, "toggle"));

    let title = anchor
        .map(|a| a.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let href = anchor
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
        .filter(|h| !h.is_empty());

    let collapsed_toggle_href = direct_children(item)
        .find(|e| {
            e.value().name() == "a" && has_class(*e, "toggle") && has_class(*e, "collapsed")
        })
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    ChildEntry {
        title,
        href,
        has_children: has_class(item, HAS_CHILDREN_CLASS),
        collapsed_toggle_href,
    }
}

fn direct_children(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}
