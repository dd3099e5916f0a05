//! Template and theme definitions.
//!
//! A *template* decides what a catalogue page says (markup with fallback
//! chains, page structure, pagination capacity); a *theme* decides how it
//! looks (colors, typography, spacing). The two are authored and versioned
//! independently, so each declares what it needs from the other —
//! allow-lists and required features — and the [`crate::compat`] module
//! scores every pairing.
//!
//! ## Definition Files
//!
//! Definitions are plain TOML records:
//!
//! ```toml
//! # templates/modern/template.toml
//! id = "modern"
//! name = "Modern"
//! category = "minimal"
//! products_per_page = 6
//! features = ["cover-page", "category-index"]
//! required_theme_features = ["accent-color"]
//! compatible_themes = ["*"]
//!
//! [supported_fields]
//! products = ["name", "description", "price_display", "image_url"]
//! profile = ["company_name", "email"]
//!
//! [[pages]]
//! id = "cover"
//! name = "Cover"
//! source = "pages/cover.html"
//!
//! [[pages]]
//! id = "products"
//! name = "Products"
//! source = "pages/products.html"
//! repeating = true
//! ```
//!
//! Forward compatibility is schema-less: unknown fields are ignored,
//! missing fields take their defaults. The one structured escape hatch is
//! `extensions` — a tagged union of known kinds plus an opaque passthrough
//! variant, so newer definitions survive older binaries without becoming an
//! untyped bag.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::render::Template;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("definition validation error: {0}")]
    Validation(String),
}

/// Allow-list over peer definition ids. `"*"` anywhere means "no exclusion".
///
/// An omitted list defaults to the wildcard (missing fields are defaulted);
/// an explicitly empty list excludes every peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(pub Vec<String>);

impl AllowList {
    pub fn wildcard() -> Self {
        Self(vec!["*".to_string()])
    }

    pub fn only<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.iter().any(|entry| entry == "*")
    }

    pub fn allows(&self, id: &str) -> bool {
        self.is_wildcard() || self.0.iter().any(|entry| entry == id)
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::wildcard()
    }
}

/// Content fields a template references, per record kind. Validation warns
/// when a declared field is missing from the standardized model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportedFields {
    pub products: Vec<String>,
    pub categories: Vec<String>,
    pub profile: Vec<String>,
}

/// Structured extension slot on both config kinds.
///
/// Known kinds deserialize into typed variants; anything else passes
/// through opaquely so round-tripping a newer definition never loses data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extension {
    Known(KnownExtension),
    Opaque(toml::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum KnownExtension {
    /// Page footer numbering, e.g. `style = "page-x-of-y"`.
    PageNumbering { style: String },
    /// Diagonal watermark text on every page.
    Watermark { text: String },
}

/// Template configuration — immutable at render time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub author: Option<String>,
    pub version: Option<String>,
    pub is_premium: bool,
    /// Declared page count; checked against the actual page list at load.
    pub page_count: usize,
    /// Products per repeating-page clone.
    pub products_per_page: usize,
    /// Capabilities this template provides (checked against themes'
    /// `required_features`).
    pub features: Vec<String>,
    pub supported_fields: SupportedFields,
    pub compatible_themes: AllowList,
    pub required_theme_features: Vec<String>,
    pub tags: Vec<String>,
    pub extensions: Vec<Extension>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: None,
            category: "general".to_string(),
            author: None,
            version: None,
            is_premium: false,
            page_count: 0,
            products_per_page: default_products_per_page(),
            features: Vec::new(),
            supported_fields: SupportedFields::default(),
            compatible_themes: AllowList::default(),
            required_theme_features: Vec::new(),
            tags: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

fn default_products_per_page() -> usize {
    6
}

impl TemplateConfig {
    /// Validate config values. Duplicate-id and page-level rules live on
    /// [`TemplateDef::validate`]; this covers the scalar fields.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::Validation("template id must not be empty".into()));
        }
        if self.products_per_page == 0 {
            return Err(DefinitionError::Validation(format!(
                "template \"{}\": products_per_page must be at least 1",
                self.id
            )));
        }
        Ok(())
    }
}

/// Theme configuration — immutable at render time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub author: Option<String>,
    pub version: Option<String>,
    pub is_premium: bool,
    pub colors: ThemeColors,
    pub typography: Typography,
    pub spacing: Spacing,
    /// Capabilities this theme provides (checked against templates'
    /// `required_theme_features`).
    pub features: Vec<String>,
    pub compatible_templates: AllowList,
    pub required_features: Vec<String>,
    pub tags: Vec<String>,
    pub extensions: Vec<Extension>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: None,
            category: "general".to_string(),
            author: None,
            version: None,
            is_premium: false,
            colors: ThemeColors::default(),
            typography: Typography::default(),
            spacing: Spacing::default(),
            features: Vec::new(),
            compatible_templates: AllowList::default(),
            required_features: Vec::new(),
            tags: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

impl ThemeConfig {
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::Validation("theme id must not be empty".into()));
        }
        Ok(())
    }

    /// Theme values as a lookup scope, mounted under `theme.*` for style
    /// templates.
    pub fn scope(&self) -> Value {
        json!({
            "colors": {
                "primary": self.colors.primary,
                "primary_light": self.colors.primary_light,
                "primary_soft": self.colors.primary_soft,
                "secondary": self.colors.secondary,
                "accent": self.colors.accent,
                "background": self.colors.background,
                "text": self.colors.text,
                "text_muted": self.colors.text_muted,
            },
            "typography": {
                "font_family": self.typography.font_family,
                "heading_family": self.typography.heading_family,
                "base_size": self.typography.base_size,
            },
            "spacing": {
                "page_margin": self.spacing.page_margin,
                "item_gap": self.spacing.item_gap,
            },
        })
    }
}

/// Theme color palette. Base colors are authored; `primary_light` and
/// `primary_soft` are derived shades the scaffold computes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    pub primary: String,
    pub primary_light: String,
    pub primary_soft: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
    pub text_muted: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: "#1a1a2e".to_string(),
            primary_light: "#48486b".to_string(),
            primary_soft: "rgba(26, 26, 46, 0.12)".to_string(),
            secondary: "#16213e".to_string(),
            accent: "#e94560".to_string(),
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
        }
    }
}

/// Typography settings (CSS values).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub font_family: String,
    pub heading_family: Option<String>,
    pub base_size: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "Georgia, serif".to_string(),
            heading_family: None,
            base_size: "16px".to_string(),
        }
    }
}

/// Page-level spacing (CSS values).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub page_margin: String,
    pub item_gap: String,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            page_margin: "2rem".to_string(),
            item_gap: "1rem".to_string(),
        }
    }
}

/// One visual page inside a loaded template: compiled markup plus an
/// optional compiled style sheet.
#[derive(Debug, Clone)]
pub struct PageDef {
    pub id: String,
    pub name: String,
    /// The product-listing page, cloned once per capacity slice.
    pub repeating: bool,
    pub markup: Template,
    pub style: Option<Template>,
}

/// A fully loaded template: config plus compiled pages.
#[derive(Debug, Clone)]
pub struct TemplateDef {
    pub config: TemplateConfig,
    pub pages: Vec<PageDef>,
}

impl TemplateDef {
    /// Structural validation applied at load/registration time.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        self.config.validate()?;

        if self.pages.is_empty() {
            return Err(DefinitionError::Validation(format!(
                "template \"{}\" declares no pages",
                self.config.id
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        for page in &self.pages {
            if !seen.insert(page.id.as_str()) {
                return Err(DefinitionError::Validation(format!(
                    "template \"{}\": duplicate page id \"{}\"",
                    self.config.id, page.id
                )));
            }
        }

        let repeating: Vec<&str> = self
            .pages
            .iter()
            .filter(|p| p.repeating)
            .map(|p| p.id.as_str())
            .collect();
        if repeating.len() > 1 {
            return Err(DefinitionError::Validation(format!(
                "template \"{}\": more than one repeating page ({})",
                self.config.id,
                repeating.join(", ")
            )));
        }

        if self.config.page_count != 0 && self.config.page_count != self.pages.len() {
            return Err(DefinitionError::Validation(format!(
                "template \"{}\": page_count is {} but {} pages are declared",
                self.config.id,
                self.config.page_count,
                self.pages.len()
            )));
        }

        Ok(())
    }
}

/// Common registry surface for both definition kinds.
pub trait Definition {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    /// Text the registry's substring search runs over.
    fn search_text(&self) -> String;
}

fn search_text(name: &str, description: Option<&str>, tags: &[String]) -> String {
    let mut text = name.to_string();
    if let Some(d) = description {
        text.push(' ');
        text.push_str(d);
    }
    for tag in tags {
        text.push(' ');
        text.push_str(tag);
    }
    text
}

impl Definition for TemplateDef {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn category(&self) -> &str {
        &self.config.category
    }

    fn search_text(&self) -> String {
        search_text(
            &self.config.name,
            self.config.description.as_deref(),
            &self.config.tags,
        )
    }
}

impl Definition for ThemeConfig {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn search_text(&self) -> String {
        search_text(&self.name, self.description.as_deref(), &self.tags)
    }
}
