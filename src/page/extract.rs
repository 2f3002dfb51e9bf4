//! CSS selector extraction from fetched markup.

use crate::error::WatchError;
use scraper::{Html, Selector};

/// Raw element text pulled out of the page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub raw_price: String,
    pub raw_name: String,
}

/// Extracts the price and name element text from `markup`.
///
/// When a selector matches more than one element, the first match in
/// document order wins. A selector matching nothing is
/// `ElementNotFound`; an expression the selector engine rejects is
/// `SelectorSyntax`. No side effects.
pub fn extract(
    markup: &str,
    price_selector: &str,
    name_selector: &str,
) -> Result<Extracted, WatchError> {
    let document = Html::parse_document(markup);

    let raw_price = select_first(&document, price_selector)?;
    let raw_name = select_first(&document, name_selector)?;

    Ok(Extracted { raw_price, raw_name })
}

fn select_first(document: &Html, selector: &str) -> Result<String, WatchError> {
    let parsed = Selector::parse(selector).map_err(|e| WatchError::SelectorSyntax {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;

    document
        .select(&parsed)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or_else(|| WatchError::ElementNotFound { selector: selector.to_string() })
}
