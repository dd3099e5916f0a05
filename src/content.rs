//! Canonical content model shared by every pipeline stage.
//!
//! [`StandardizedContent`] is the template-agnostic representation of one
//! catalogue: identity fields, the owner's profile, the ordered product list
//! and its categories. It is produced by [`crate::standardize`] and consumed
//! by the page generator and the renderer; nothing downstream ever touches a
//! raw storage record.
//!
//! ## Field presence
//!
//! Every field a template may reference exists in the structure — optional
//! scalars are `Option`s, collections are (possibly empty) `Vec`s. When the
//! model is turned into a lookup scope ([`StandardizedContent::scope`]),
//! every known key is emitted, `None` as JSON `null`, so fallback chains
//! distinguish "empty" from "typo in the field path" only by validation
//! warnings, never by a render-time error.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// How a product's price is surfaced to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDisplayMode {
    /// Formatted price with currency symbol.
    #[default]
    Show,
    /// Replace the price with the catalogue's contact label.
    Contact,
    /// No price value at all — fallback chains see an absent field.
    Hidden,
}

/// Catalogue-level presentation switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueSettings {
    /// Master switch for price display (overrides per-product `show`).
    pub show_prices: bool,
    /// Whether category groupings are surfaced to templates.
    pub show_categories: bool,
    /// Label substituted for prices in `contact` mode.
    pub contact_label: String,
}

impl Default for CatalogueSettings {
    fn default() -> Self {
        Self {
            show_prices: true,
            show_categories: true,
            contact_label: "Price on request".to_string(),
        }
    }
}

/// Catalogue identity fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tagline: Option<String>,
    pub quote: Option<String>,
    pub settings: CatalogueSettings,
}

/// A single social link on the owner's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// The catalogue owner's business profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub social_links: Vec<SocialLink>,
}

/// One product, immutable once loaded into a page.
///
/// `price_display` and `category` are derived by the standardizer:
/// the former folds `price`, `currency` and [`PriceDisplayMode`] into the
/// single string templates actually reference, the latter resolves the
/// `category_id` back-reference to a display name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub price_mode: PriceDisplayMode,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    /// Resolved category name (derived).
    pub category: Option<String>,
    /// Display-ready price string (derived, absent in `hidden` mode).
    pub price_display: Option<String>,
}

/// A product grouping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Number of products referencing this category (derived).
    pub product_count: usize,
}

/// The canonical, template-agnostic representation of one catalogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardizedContent {
    pub catalogue: CatalogueInfo,
    pub profile: ProfileInfo,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

impl StandardizedContent {
    /// Build the renderer lookup scope over the full product list.
    pub fn scope(&self) -> Value {
        self.scope_for(&self.products)
    }

    /// Build the renderer lookup scope with `products` narrowed to a
    /// page-local slice.
    ///
    /// This is the one place the global product list is deliberately
    /// narrowed before the renderer sees it — the renderer itself stays
    /// page-agnostic.
    pub fn scope_for(&self, products: &[Product]) -> Value {
        json!({
            "catalogue": {
                "name": self.catalogue.name,
                "description": self.catalogue.description,
                "tagline": self.catalogue.tagline,
                "quote": self.catalogue.quote,
                "settings": {
                    "show_prices": self.catalogue.settings.show_prices,
                    "show_categories": self.catalogue.settings.show_categories,
                    "contact_label": self.catalogue.settings.contact_label,
                },
            },
            "profile": {
                "company_name": self.profile.company_name,
                "email": self.profile.email,
                "phone": self.profile.phone,
                "address": self.profile.address,
                "website": self.profile.website,
                "social_links": self.profile.social_links.iter().map(|link| json!({
                    "platform": link.platform,
                    "url": link.url,
                })).collect::<Vec<_>>(),
            },
            "products": products.iter().map(product_scope).collect::<Vec<_>>(),
            "categories": self.categories.iter().map(|c| json!({
                "id": c.id,
                "name": c.name,
                "description": c.description,
                "product_count": c.product_count,
            })).collect::<Vec<_>>(),
        })
    }

    /// Field names the model carries per record kind, used by validation to
    /// cross-check template `supported_fields` declarations.
    pub fn known_fields(kind: RecordKind) -> &'static [&'static str] {
        match kind {
            RecordKind::Products => &[
                "id",
                "name",
                "description",
                "price",
                "price_display",
                "currency",
                "image_url",
                "category",
            ],
            RecordKind::Categories => &["id", "name", "description", "product_count"],
            RecordKind::Profile => &[
                "company_name",
                "email",
                "phone",
                "address",
                "website",
                "social_links",
            ],
        }
    }
}

/// Record kinds a template can declare `supported_fields` for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Products,
    Categories,
    Profile,
}

fn product_scope(p: &Product) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "description": p.description,
        "price": p.price,
        "price_display": p.price_display,
        "currency": p.currency,
        "image_url": p.image_url,
        "category": p.category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: Some(format!("Product {id}")),
            ..Product::default()
        }
    }

    #[test]
    fn scope_carries_every_known_key_even_when_none() {
        let content = StandardizedContent::default();
        let scope = content.scope();

        assert!(scope["catalogue"]["name"].is_null());
        assert!(scope["catalogue"]["tagline"].is_null());
        assert!(scope["profile"]["company_name"].is_null());
        assert!(scope["profile"]["social_links"].as_array().unwrap().is_empty());
        assert!(scope["products"].as_array().unwrap().is_empty());
    }

    #[test]
    fn scope_for_narrows_products_only() {
        let content = StandardizedContent {
            products: vec![product("a"), product("b"), product("c")],
            ..StandardizedContent::default()
        };

        let narrowed = content.scope_for(&content.products[1..2]);
        let products = narrowed["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["id"], "b");

        // Full scope is untouched by the narrowed view.
        assert_eq!(content.scope()["products"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn product_scope_includes_derived_fields() {
        let mut p = product("a");
        p.price_display = Some("$12.00".to_string());
        p.category = Some("Chairs".to_string());

        let scope = product_scope(&p);
        assert_eq!(scope["price_display"], "$12.00");
        assert_eq!(scope["category"], "Chairs");
    }

    #[test]
    fn known_fields_cover_the_product_scope_keys() {
        let scope = product_scope(&product("a"));
        for field in StandardizedContent::known_fields(RecordKind::Products) {
            assert!(
                scope.get(*field).is_some(),
                "product scope is missing declared field {field}"
            );
        }
    }
}
