//! Leaf-page compendium extraction
//!
//! A leaf page carries its structured facts in a fixed, deeply nested
//! content region (the compendium): a defining list whose items lead with
//! an emphasized field name followed by the value text, with one level of
//! nested sub-lists for multi-valued fields. Extraction parses that list
//! into a [`Record`], adds the derived `title` and `region` fields from
//! the page chrome outside the region, and normalizes every key and value
//! through [`normalize_text`].

mod text;

pub use text::normalize_text;

use crate::crawler::page::SELECTED_ANCHOR_SELECTOR;
use crate::sink::Record;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Structural path of the compendium region on a leaf page
const COMPENDIUM_SELECTOR: &str = "div.fragment div.fragment-content div.compendium";

/// Extracts the compendium record from a leaf page body
///
/// Returns `None` when the page carries no compendium region or no
/// defining list inside it. That is a legitimate state for some leaves,
/// not an error; the caller decides whether absence is still worth a
/// retry (the region can render late).
pub fn extract_record(body: &str) -> Option<Record> {
    let document = Html::parse_document(body);

    let region = find_compendium(&document)?;
    let list = find_defining_list(region)?;

    let mut record = Record::new();

    for item in top_level_items(list) {
        match parse_item(item) {
            Some((name, ItemValue::Scalar(value))) => record.set_scalar(name, value),
            Some((name, ItemValue::List(values))) => record.set_list(name, values),
            None => {
                debug!("Compendium item without an emphasized field name, skipping");
            }
        }
    }

    // Derived fields read from page chrome outside the content region,
    // added unconditionally.
    record.set_scalar("title", page_title(&document).unwrap_or_default());
    record.set_scalar("region", region_label(&document).unwrap_or_default());

    Some(record)
}

enum ItemValue {
    Scalar(String),
    List(Vec<String>),
}

fn find_compendium(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse(COMPENDIUM_SELECTOR).ok()?;
    document.select(&selector).next()
}

fn find_defining_list(region: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("ul").ok()?;
    region.select(&selector).next()
}

/// Immediate `li` children of the defining list; nested sub-list items are
/// handled inside their parent item
fn top_level_items(list: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "li")
}

/// Parses one defining-list item into a normalized field
///
/// The item's leading emphasized text is the field name (trailing colon
/// stripped). A nested list turns the value into the ordered sequence of
/// its item texts (one level only); otherwise the value is the item text
/// with the field-name text removed.
fn parse_item(item: ElementRef<'_>) -> Option<(String, ItemValue)> {
    let lead_selector = Selector::parse("em, strong").ok()?;
    let lead = item.select(&lead_selector).next()?;

    let raw_name = lead.text().collect::<String>();
    let name = normalize_text(raw_name.trim().trim_end_matches(':'));
    if name.is_empty() {
        return None;
    }

    let nested_selector = Selector::parse("ul").ok()?;
    if let Some(nested) = item.select(&nested_selector).next() {
        let values: Vec<String> = nested
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "li")
            .map(|li| normalize_text(&li.text().collect::<String>()))
            .filter(|v| !v.is_empty())
            .collect();
        return Some((name, ItemValue::List(values)));
    }

    let full = item.text().collect::<String>();
    let remainder = full.replacen(&raw_name, "", 1);
    let value = normalize_text(remainder.trim_start_matches(|c: char| c == ':' || c.is_whitespace()));

    Some((name, ItemValue::Scalar(value)))
}

/// Page heading from the chrome, normalized
fn page_title(document: &Html) -> Option<String> {
    let h1 = Selector::parse("h1").ok()?;
    let heading = document
        .select(&h1)
        .next()
        .map(|e| e.text().collect::<String>());

    let raw = match heading {
        Some(text) => text,
        None => {
            let title = Selector::parse("title").ok()?;
            document
                .select(&title)
                .next()
                .map(|e| e.text().collect::<String>())?
        }
    };

    let normalized = normalize_text(&raw);
    (!normalized.is_empty()).then_some(normalized)
}

/// Category label of the selected node's nearest ancestor in the
/// hierarchy chrome
///
/// Walks up from the selected anchor to the enclosing branch item and
/// takes its own anchor text. A node at the hierarchy root has no
/// ancestor category; its own label is used instead.
fn region_label(document: &Html) -> Option<String> {
    let selector = Selector::parse(SELECTED_ANCHOR_SELECTOR).ok()?;
    let selected = document.select(&selector).next()?;

    let mut items = selected
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "li");

    let own = items.next();
    let labeled = items.next().or(own)?;

    let anchor = labeled
        .children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a")?;

    let normalized = normalize_text(&anchor.text().collect::<String>());
    (!normalized.is_empty()).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::FieldValue;

    fn leaf_page(compendium: &str) -> String {
        format!(
            r#"<html>
            <head><title>Study Guide</title></head>
            <body>
                <ul class="hierarchy">
                    <li class="hierarchy-item with-children"><a href="/burgundy">Burgundy</a>
                        <ul class="children">
                            <li class="hierarchy-item"><a class="selected" href="/burgundy/chablis">Chablis</a></li>
                        </ul>
                    </li>
                </ul>
                <h1>Chablis AOC</h1>
                <div class="fragment"><div class="fragment-content">{}</div></div>
            </body>
            </html>"#,
            compendium
        )
    }

    #[test]
    fn test_scalar_and_nested_list_fields() {
        let body = leaf_page(
            r#"<div class="compendium"><ul>
                <li><em>Grape:</em> Chardonnay</li>
                <li><em>Climate:</em><ul><li>Cool</li><li>Maritime</li></ul></li>
            </ul></div>"#,
        );

        let record = extract_record(&body).unwrap();
        assert_eq!(
            record.get("grape"),
            Some(&FieldValue::Scalar("chardonnay".to_string()))
        );
        assert_eq!(
            record.get("climate"),
            Some(&FieldValue::List(vec![
                "cool".to_string(),
                "maritime".to_string()
            ]))
        );
    }

    #[test]
    fn test_derived_title_and_region() {
        let body = leaf_page(r#"<div class="compendium"><ul><li><em>Grape:</em> Gamay</li></ul></div>"#);

        let record = extract_record(&body).unwrap();
        assert_eq!(
            record.get("title"),
            Some(&FieldValue::Scalar("chablis aoc".to_string()))
        );
        assert_eq!(
            record.get("region"),
            Some(&FieldValue::Scalar("burgundy".to_string()))
        );
    }

    #[test]
    fn test_no_compendium_region_yields_none() {
        let body = leaf_page(r#"<div class="prose"><p>No structured data here.</p></div>"#);
        assert!(extract_record(&body).is_none());
    }

    #[test]
    fn test_no_defining_list_yields_none() {
        let body = leaf_page(r#"<div class="compendium"><p>Prose only.</p></div>"#);
        assert!(extract_record(&body).is_none());
    }

    #[test]
    fn test_item_without_emphasis_skipped() {
        let body = leaf_page(
            r#"<div class="compendium"><ul>
                <li>Unstructured note</li>
                <li><em>Soil:</em> Kimmeridgian</li>
            </ul></div>"#,
        );

        let record = extract_record(&body).unwrap();
        assert_eq!(
            record.get("soil"),
            Some(&FieldValue::Scalar("kimmeridgian".to_string()))
        );
        // The unstructured item contributes nothing; derived fields plus
        // one parsed field remain.
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_values_and_keys_are_normalized() {
        let body = leaf_page(
            r#"<div class="compendium"><ul>
                <li><em>Élevage:</em> 12&nbsp;months   in
                oak</li>
            </ul></div>"#,
        );

        let record = extract_record(&body).unwrap();
        assert_eq!(
            record.get("elevage"),
            Some(&FieldValue::Scalar("12 months in oak".to_string()))
        );
    }

    #[test]
    fn test_strong_lead_accepted() {
        let body = leaf_page(
            r#"<div class="compendium"><ul>
                <li><strong>Style</strong>: Blanc de Blancs</li>
            </ul></div>"#,
        );

        let record = extract_record(&body).unwrap();
        assert_eq!(
            record.get("style"),
            Some(&FieldValue::Scalar("blanc de blancs".to_string()))
        );
    }

    #[test]
    fn test_root_leaf_falls_back_to_own_label_for_region() {
        let body = r#"<html><body>
            <ul class="hierarchy">
                <li class="hierarchy-item"><a class="selected" href="/champagne">Champagne</a></li>
            </ul>
            <h1>Champagne</h1>
            <div class="fragment"><div class="fragment-content">
                <div class="compendium"><ul><li><em>Grape:</em> Pinot Noir</li></ul></div>
            </div></div>
        </body></html>"#;

        let record = extract_record(body).unwrap();
        assert_eq!(
            record.get("region"),
            Some(&FieldValue::Scalar("champagne".to_string()))
        );
    }
}
