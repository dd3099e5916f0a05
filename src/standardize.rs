//! Record standardization: raw storage records → canonical content model.
//!
//! Upstream systems (the CRUD product, imports, the API) hand over catalogue,
//! profile, product and category records as plain JSON with inconsistent key
//! spellings — some tables are snake_case, older exports are camelCase, and a
//! few fields drifted names over time (`title` vs `name`, `company` vs
//! `company_name`). This stage flattens all of that into one
//! [`StandardizedContent`] so the rest of the pipeline never sees a storage
//! schema.
//!
//! ## Resolution priority
//!
//! Each canonical field is resolved independently from an alias list; the
//! first present, non-blank value wins:
//!
//! ```text
//! product name:   name → title
//! company name:   company_name → companyName → company
//! ```
//!
//! Unknown or extra keys are dropped. Missing optional fields become `None`.
//! Standardization never fails — a record with nothing usable still yields a
//! structurally complete model.
//!
//! ## Derived fields
//!
//! - `price_display`: folds price, currency and display mode into the one
//!   string templates reference. `hidden` (or a catalogue-wide
//!   `show_prices = false` with no contact label override) yields `None`, so
//!   fallback chains fire.
//! - `category` on a product: the resolved name of its category
//!   back-reference.
//! - `product_count` on a category.
//!
//! ## Validation
//!
//! [`validate`] cross-checks the standardized model against the
//! `supported_fields` declarations of every registered template. Failures
//! are warnings, not errors — rendering proceeds regardless, substituting
//! fallback defaults where content is missing.

use crate::content::{
    Category, CatalogueInfo, CatalogueSettings, PriceDisplayMode, Product, ProfileInfo,
    RecordKind, SocialLink, StandardizedContent,
};
use crate::definition::TemplateConfig;
use crate::render::is_present;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A non-fatal finding from [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Template the finding applies to, if any.
    pub template: Option<String>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.template {
            Some(id) => write!(f, "[{}] {}", id, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Standardize a content bundle — one JSON document carrying all four
/// record sets, the shape the CLI reads from disk:
///
/// ```json
/// { "catalogue": {…}, "profile": {…}, "products": […], "categories": […] }
/// ```
///
/// Like everything here, tolerant: missing sections standardize to empty.
pub fn standardize_bundle(bundle: &Value) -> StandardizedContent {
    let empty = Value::Object(serde_json::Map::new());
    let records = |aliases: &[&str]| -> Vec<Value> {
        field(bundle, aliases)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    standardize(
        field(bundle, &["catalogue", "catalog"]).unwrap_or(&empty),
        field(bundle, &["profile", "business"]).unwrap_or(&empty),
        &records(&["products", "items"]),
        &records(&["categories"]),
    )
}

/// Normalize raw records into the canonical content model.
///
/// Never fails: missing fields become `None`, unknown fields are dropped,
/// and products without an id are assigned a positional one so downstream
/// identity stays stable within the render request.
pub fn standardize(
    catalogue: &Value,
    profile: &Value,
    products: &[Value],
    categories: &[Value],
) -> StandardizedContent {
    let catalogue = standardize_catalogue(catalogue);
    let categories: Vec<Category> = categories
        .iter()
        .enumerate()
        .map(|(i, record)| standardize_category(record, i))
        .collect();

    let names: BTreeMap<&str, Option<&str>> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_deref()))
        .collect();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let products: Vec<Product> = products
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let product = standardize_product(record, i, &catalogue.settings, &names);
            if let Some(id) = &product.category_id {
                *counts.entry(id.clone()).or_default() += 1;
            }
            product
        })
        .collect();

    let categories = categories
        .into_iter()
        .map(|mut c| {
            c.product_count = counts.get(&c.id).copied().unwrap_or(0);
            c
        })
        .collect();

    StandardizedContent {
        catalogue,
        profile: standardize_profile(profile),
        products,
        categories,
    }
}

/// Check the standardized model against every registered template's
/// `supported_fields` declaration.
///
/// Two kinds of finding, both warnings:
/// - a template declares a field the model does not carry (likely a typo or
///   a template authored against a newer model);
/// - a carried field is empty across the entire content (a content gap —
///   every reference to it will render its fallback default).
pub fn validate(content: &StandardizedContent, templates: &[&TemplateConfig]) -> Vec<Warning> {
    let scope = content.scope();
    let mut warnings = Vec::new();

    for template in templates {
        let declared = [
            (RecordKind::Products, "products", &template.supported_fields.products),
            (RecordKind::Categories, "categories", &template.supported_fields.categories),
            (RecordKind::Profile, "profile", &template.supported_fields.profile),
        ];

        for (kind, kind_name, fields) in declared {
            let known = StandardizedContent::known_fields(kind);
            for field in fields {
                if !known.contains(&field.as_str()) {
                    warnings.push(Warning {
                        template: Some(template.id.clone()),
                        message: format!(
                            "declares {kind_name} field \"{field}\" which standardized content does not carry"
                        ),
                    });
                } else if field_is_gap(&scope, kind, field) {
                    warnings.push(Warning {
                        template: Some(template.id.clone()),
                        message: format!(
                            "{kind_name} field \"{field}\" is empty everywhere; references will render their fallback defaults"
                        ),
                    });
                }
            }
        }
    }

    warnings
}

/// A carried field counts as a gap when no record in the content has a
/// present value for it. Vacuously false for empty collections — an empty
/// catalogue is a pagination concern, not a content gap.
fn field_is_gap(scope: &Value, kind: RecordKind, field: &str) -> bool {
    match kind {
        RecordKind::Profile => !is_present(&scope["profile"][field]),
        RecordKind::Products | RecordKind::Categories => {
            let key = if kind == RecordKind::Products { "products" } else { "categories" };
            match scope[key].as_array() {
                Some(records) if !records.is_empty() => {
                    records.iter().all(|r| !is_present(&r[field]))
                }
                _ => false,
            }
        }
    }
}

// ============================================================================
// Per-record standardization
// ============================================================================

fn standardize_catalogue(record: &Value) -> CatalogueInfo {
    let settings_record = field(record, &["settings", "options"]);
    let defaults = CatalogueSettings::default();
    let settings = match settings_record {
        Some(s) => CatalogueSettings {
            show_prices: bool_field(s, &["show_prices", "showPrices"]).unwrap_or(defaults.show_prices),
            show_categories: bool_field(s, &["show_categories", "showCategories"])
                .unwrap_or(defaults.show_categories),
            contact_label: string_field(s, &["contact_label", "contactLabel"])
                .unwrap_or(defaults.contact_label),
        },
        None => defaults,
    };

    CatalogueInfo {
        name: string_field(record, &["name", "title"]),
        description: string_field(record, &["description", "about"]),
        tagline: string_field(record, &["tagline", "subtitle"]),
        quote: string_field(record, &["quote", "motto"]),
        settings,
    }
}

fn standardize_profile(record: &Value) -> ProfileInfo {
    let social_links = field(record, &["social_links", "socialLinks", "social"])
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let url = string_field(entry, &["url", "link", "href"])?;
                    Some(SocialLink {
                        platform: string_field(entry, &["platform", "name"])
                            .unwrap_or_else(|| "link".to_string()),
                        url,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ProfileInfo {
        company_name: string_field(record, &["company_name", "companyName", "company"]),
        email: string_field(record, &["email", "contact_email", "contactEmail"]),
        phone: string_field(record, &["phone", "phone_number", "phoneNumber"]),
        address: string_field(record, &["address", "location"]),
        website: string_field(record, &["website", "url", "homepage"]),
        social_links,
    }
}

fn standardize_product(
    record: &Value,
    index: usize,
    settings: &CatalogueSettings,
    category_names: &BTreeMap<&str, Option<&str>>,
) -> Product {
    let id = string_field(record, &["id", "sku"]).unwrap_or_else(|| format!("product-{}", index + 1));
    let price = number_field(record, &["price", "amount"]);
    let currency = string_field(record, &["currency"]);
    let price_mode = string_field(record, &["price_mode", "priceDisplayMode", "price_display_mode"])
        .map(|mode| match mode.as_str() {
            "contact" => PriceDisplayMode::Contact,
            "hidden" => PriceDisplayMode::Hidden,
            _ => PriceDisplayMode::Show,
        })
        .unwrap_or_default();

    let category_id = string_field(record, &["category_id", "categoryId", "category"]);
    let category = category_id
        .as_deref()
        .and_then(|id| category_names.get(id))
        .and_then(|name| name.map(String::from));

    let price_display = price_display(price, currency.as_deref(), price_mode, settings);

    Product {
        id,
        name: string_field(record, &["name", "title"]),
        description: string_field(record, &["description", "details"]),
        price,
        price_mode,
        currency,
        image_url: string_field(record, &["image_url", "imageUrl", "image"]),
        category_id,
        category,
        price_display,
    }
}

fn standardize_category(record: &Value, index: usize) -> Category {
    Category {
        id: string_field(record, &["id", "slug"]).unwrap_or_else(|| format!("category-{}", index + 1)),
        name: string_field(record, &["name", "title"]),
        description: string_field(record, &["description"]),
        product_count: 0,
    }
}

/// Fold price, currency and display mode into the display string.
///
/// - `show` with a price and prices enabled → formatted amount
/// - `contact`, or `show` with prices disabled catalogue-wide → contact label
/// - `hidden`, or `show` with no price value → `None` (fallbacks fire)
fn price_display(
    price: Option<f64>,
    currency: Option<&str>,
    mode: PriceDisplayMode,
    settings: &CatalogueSettings,
) -> Option<String> {
    match mode {
        PriceDisplayMode::Hidden => None,
        PriceDisplayMode::Contact => Some(settings.contact_label.clone()),
        PriceDisplayMode::Show if !settings.show_prices => Some(settings.contact_label.clone()),
        PriceDisplayMode::Show => price.map(|amount| format_price(amount, currency)),
    }
}

/// Format an amount with its currency. Common codes get their symbol; the
/// rest keep the code as a prefix.
fn format_price(amount: f64, currency: Option<&str>) -> String {
    match currency {
        Some("USD") | Some("$") => format!("${amount:.2}"),
        Some("EUR") | Some("€") => format!("€{amount:.2}"),
        Some("GBP") | Some("£") => format!("£{amount:.2}"),
        Some(code) => format!("{code} {amount:.2}"),
        None => format!("{amount:.2}"),
    }
}

// ============================================================================
// Field extraction helpers
// ============================================================================

/// First alias that exists on the record, regardless of value.
fn field<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| record.get(key))
}

/// First alias resolving to a non-blank string. Trims surrounding
/// whitespace; numbers are accepted and stringified (imports sometimes
/// carry numeric ids).
fn string_field(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match record.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First alias resolving to a number. Numeric strings are parsed — exports
/// routinely quote decimals.
fn number_field(record: &Value, aliases: &[&str]) -> Option<f64> {
    aliases.iter().find_map(|key| match record.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn bool_field(record: &Value, aliases: &[&str]) -> Option<bool> {
    aliases.iter().find_map(|key| record.get(key)?.as_bool())
}
