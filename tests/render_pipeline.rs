//! End-to-end pipeline test: scaffold definitions on disk, load them
//! through the store, standardize a content bundle, paginate and render —
//! the same path the `render` command walks.

use catagen::compat::CompatibilityMatrix;
use catagen::registry::Registry;
use catagen::{paginate, scaffold, standardize, store};
use serde_json::{Value, json};
use tempfile::TempDir;

fn scaffold_project(tmp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let templates_root = tmp.path().join("templates");
    let themes_root = tmp.path().join("themes");

    scaffold::generate_template(
        &scaffold::TemplateSpec {
            id: "modern".to_string(),
            name: "Modern".to_string(),
            category: "minimal".to_string(),
            is_premium: false,
            author: None,
            page_count: 3,
            features: vec!["cover-page".to_string()],
        },
        &templates_root,
    )
    .unwrap();

    scaffold::generate_theme(
        &scaffold::ThemeSpec {
            id: "ocean".to_string(),
            name: "Ocean".to_string(),
            category: "nature".to_string(),
            author: None,
            primary_color: "#1a6b8a".to_string(),
            secondary_color: "#0f3d52".to_string(),
            accent_color: "#e94560".to_string(),
            background_color: "#ffffff".to_string(),
            text_color: "#112233".to_string(),
            font_family: "Georgia, serif".to_string(),
        },
        &themes_root,
    )
    .unwrap();

    (templates_root, themes_root)
}

fn bundle(product_count: usize) -> Value {
    let products: Vec<Value> = (1..=product_count)
        .map(|i| {
            json!({
                "id": format!("p{i}"),
                "name": format!("Product {i}"),
                "description": format!("Solid oak piece number {i}"),
                "price": 10.0 * i as f64,
                "currency": "USD",
                "image_url": format!("https://img.example/p{i}.jpg"),
            })
        })
        .collect();
    json!({
        "catalogue": {"name": "Autumn Collection", "tagline": "Warm things"},
        "profile": {
            "companyName": "Acme Oak",
            "email": "hello@acme.example",
            "phone": "+1 555 0100",
            "address": "1 Forest Road",
            "website": "https://acme.example",
        },
        "products": products,
        "categories": [],
    })
}

#[test]
fn scaffolded_project_renders_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let (templates_root, themes_root) = scaffold_project(&tmp);

    let templates = Registry::new();
    let themes = Registry::new();
    store::populate(&templates_root, &themes_root, &templates, &themes).unwrap();

    // Scaffolded pair scores clean.
    let matrix = CompatibilityMatrix::new(&templates, &themes);
    let result = matrix.pair("modern", "ocean").unwrap();
    assert!(result.compatible);
    assert_eq!(result.score, 100);

    let template = templates.get("modern").unwrap();
    let theme = themes.get("ocean").unwrap();
    let content = standardize::standardize_bundle(&bundle(7));

    // No validation warnings against the scaffolded supported fields.
    let warnings = standardize::validate(&content, &[&template.config]);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    // 7 products at capacity 3: cover + three listing clones + contact.
    let bound = paginate::generate(&template.pages, content.products.len(), 3).unwrap();
    let ids: Vec<&str> = bound.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, ["cover", "products-1", "products-2", "products-3", "contact"]);

    // The cover page resolves the catalogue name through its fallback chain.
    let cover = &bound[0];
    let cover_scope = content.scope_for(&content.products[cover.products.clone()]);
    let cover_markup = template.pages[cover.page].markup.render(&cover_scope);
    assert!(cover_markup.contains("Autumn Collection"));
    assert!(cover_markup.contains("Warm things"));

    // The middle clone sees exactly products 4..6.
    let middle = &bound[2];
    let scope = content.scope_for(&content.products[middle.products.clone()]);
    let markup = template.pages[middle.page].markup.render(&scope);
    for present in ["Product 4", "Product 5", "Product 6"] {
        assert!(markup.contains(present), "missing {present} in {markup}");
    }
    for absent in ["Product 3", "Product 7"] {
        assert!(!markup.contains(absent), "unexpected {absent}");
    }
    assert!(markup.contains("$40.00"));

    // The cover style sheet resolves theme tokens.
    let mut styled_scope = cover_scope.clone();
    styled_scope
        .as_object_mut()
        .unwrap()
        .insert("theme".to_string(), theme.scope());
    let css = template.pages[cover.page]
        .style
        .as_ref()
        .unwrap()
        .render(&styled_scope);
    assert!(css.contains("#1a6b8a"));
    assert!(css.contains("Georgia"));
}

#[test]
fn empty_catalogue_still_renders_one_listing_page() {
    let tmp = TempDir::new().unwrap();
    let (templates_root, themes_root) = scaffold_project(&tmp);

    let templates = Registry::new();
    let themes = Registry::new();
    store::populate(&templates_root, &themes_root, &templates, &themes).unwrap();
    let template = templates.get("modern").unwrap();

    let content = standardize::standardize_bundle(&bundle(0));
    let bound =
        paginate::generate(&template.pages, 0, template.config.products_per_page).unwrap();
    let listing: Vec<_> = bound.iter().filter(|b| b.id.starts_with("products-")).collect();
    assert_eq!(listing.len(), 1);

    let scope = content.scope_for(&[]);
    let markup = template.pages[listing[0].page].markup.render(&scope);
    assert!(markup.contains("No products in this catalogue yet."));
}

#[test]
fn fallback_chain_prefers_profile_when_catalogue_name_missing() {
    let tmp = TempDir::new().unwrap();
    let (templates_root, themes_root) = scaffold_project(&tmp);

    let templates = Registry::new();
    let themes = Registry::new();
    store::populate(&templates_root, &themes_root, &templates, &themes).unwrap();
    let template = templates.get("modern").unwrap();

    let content = standardize::standardize_bundle(&json!({
        "profile": {"company_name": "Acme Oak"},
    }));
    let cover = &template.pages[0];
    let markup = cover.markup.render(&content.scope());
    assert!(markup.contains("Acme Oak"));

    // Nothing at all: the literal default holds the line.
    let blank = standardize::standardize_bundle(&json!({}));
    let markup = cover.markup.render(&blank.scope());
    assert!(markup.contains("Product Catalogue"));
}
