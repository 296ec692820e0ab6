use crate::matching::outcome::{LineItemDetails, Quantity};
use crate::model::PackingGroup;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:[.,]\d+)?)\s*(kgs?|g|t|tonnes?|ml|l|ltrs?|litres?|liters?|m3|pcs|pieces|units?|packages?|pkgs?)\b",
    )
    .expect("valid quantity regex")
});

/// "1,000" or "12,500.5": commas group thousands.
static GROUPED_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(?:,\d{3})+(?:\.\d+)?$").expect("valid grouped amount regex")
});

static PACKAGING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(drums?|ibcs?|jerricans?|boxes|box|cartons?|cylinders?|bags?|crates?|pallets?|tanks?|bottles?|cans?)\b",
    )
    .expect("valid packaging regex")
});

static PACKING_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:PG|packing\s+group)\s*(III|II|I|[123])\b").expect("valid packing group regex")
});

/// Pull quantity, packaging and a stated packing group out of manifest text.
///
/// The first occurrence of each wins. A comma followed by exactly three
/// digits groups thousands ("1,000 kg"); any other comma is a decimal
/// separator ("1,5 kg").
pub fn extract_details(text: &str) -> LineItemDetails {
    LineItemDetails {
        quantity: extract_quantity(text),
        packaging: extract_packaging(text),
        stated_packing_group: extract_packing_group(text),
    }
}

fn extract_quantity(text: &str) -> Option<Quantity> {
    QUANTITY_RE.captures_iter(text).find_map(|caps| {
        let amount = parse_amount(&caps[1])?;
        Some(Quantity {
            amount,
            unit: caps[2].to_lowercase(),
        })
    })
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized = if GROUPED_AMOUNT_RE.is_match(raw) {
        raw.replace(',', "")
    } else {
        raw.replace(',', ".")
    };
    Decimal::from_str(&normalized).ok()
}

fn extract_packaging(text: &str) -> Option<String> {
    let word = PACKAGING_RE.captures(text)?.get(1)?.as_str().to_lowercase();
    let singular = match word.as_str() {
        "boxes" => "box".to_string(),
        "ibcs" => "ibc".to_string(),
        w => w.strip_suffix('s').unwrap_or(w).to_string(),
    };
    Some(singular)
}

fn extract_packing_group(text: &str) -> Option<PackingGroup> {
    let caps = PACKING_GROUP_RE.captures(text)?;
    PackingGroup::from_str_loose(&caps[1])
}
