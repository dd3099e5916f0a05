//! Definition scaffolding: the `new-template` and `new-theme` commands.
//!
//! The scaffold is the producer side of the engine: it emits the same
//! on-disk artifacts the store loads — a documented `template.toml` with
//! stub page markup, or a `theme.toml` with derived color shades — plus a
//! companion README. Everything is assembled in memory first and staged
//! through a temporary directory, so a failed run never leaves a
//! half-written definition that could be mistaken for a finished one.
//!
//! Runs are idempotent: re-generating over an identical existing
//! definition succeeds without touching it; an existing definition with
//! *different* content is a hard error, never an overwrite.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} already exists with different content — refusing to overwrite")]
    Conflict(PathBuf),
    #[error("invalid color \"{0}\": expected #rgb or #rrggbb")]
    InvalidColor(String),
    #[error("scaffold validation error: {0}")]
    Validation(String),
}

/// Inputs for a new template definition.
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    pub id: String,
    pub name: String,
    pub category: String,
    pub is_premium: bool,
    pub author: Option<String>,
    /// Total pages, cover and product listing included. Minimum 2.
    pub page_count: usize,
    pub features: Vec<String>,
}

/// Inputs for a new theme definition.
#[derive(Debug, Clone)]
pub struct ThemeSpec {
    pub id: String,
    pub name: String,
    pub category: String,
    pub author: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
}

/// Result of a scaffold run.
#[derive(Debug)]
pub struct GeneratedArtifact {
    /// The definition directory.
    pub dir: PathBuf,
    /// Files inside it, relative paths in emission order.
    pub files: Vec<PathBuf>,
    /// True when an identical definition already existed.
    pub up_to_date: bool,
}

const COVER_STUB: &str = "\
<section class=\"cover\">
  <h1>{{catalogue.name | profile.company_name | 'Product Catalogue'}}</h1>
  {{#catalogue.tagline}}<p class=\"tagline\">{{catalogue.tagline}}</p>{{/catalogue.tagline}}
  {{#catalogue.quote}}<blockquote>{{catalogue.quote}}</blockquote>{{/catalogue.quote}}
</section>
";

const COVER_STYLE_STUB: &str = "\
.cover h1 {
  color: {{theme.colors.primary | '#1a1a2e'}};
  font-family: {{theme.typography.heading_family | theme.typography.font_family | 'Georgia, serif'}};
}
.cover .tagline {
  color: {{theme.colors.text_muted | '#666666'}};
}
";

const PRODUCTS_STUB: &str = "\
<section class=\"products\">
  {{#products}}
  <article class=\"product\">
    {{#image_url}}<img src=\"{{image_url}}\" alt=\"{{name | 'Product'}}\">{{/image_url}}
    <h2>{{name | 'Untitled product'}}</h2>
    {{#description}}<p>{{description}}</p>{{/description}}
    <p class=\"price\">{{price_display | 'Price on request'}}</p>
  </article>
  {{else}}
  <p class=\"empty\">No products in this catalogue yet.</p>
  {{/products}}
</section>
";

const CONTACT_STUB: &str = "\
<section class=\"contact\">
  <h2>{{profile.company_name | catalogue.name | 'Get in touch'}}</h2>
  <ul>
    {{#profile.email}}<li>{{profile.email}}</li>{{/profile.email}}
    {{#profile.phone}}<li>{{profile.phone}}</li>{{/profile.phone}}
    {{#profile.address}}<li>{{profile.address}}</li>{{/profile.address}}
    {{#profile.website}}<li>{{profile.website}}</li>{{/profile.website}}
  </ul>
  {{#profile.social_links}}<a href=\"{{url}}\">{{platform}}</a>{{/profile.social_links}}
</section>
";

/// Emit a template definition directory.
pub fn generate_template(
    spec: &TemplateSpec,
    out_root: &Path,
) -> Result<GeneratedArtifact, ScaffoldError> {
    validate_id(&spec.id)?;
    if spec.page_count < 2 {
        return Err(ScaffoldError::Validation(
            "page_count must be at least 2 (cover + product listing)".into(),
        ));
    }
    write_artifact(out_root, &spec.id, template_files(spec))
}

/// Emit a theme definition directory.
pub fn generate_theme(spec: &ThemeSpec, out_root: &Path) -> Result<GeneratedArtifact, ScaffoldError> {
    validate_id(&spec.id)?;
    write_artifact(out_root, &spec.id, theme_files(spec)?)
}

fn validate_id(id: &str) -> Result<(), ScaffoldError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ScaffoldError::Validation(format!(
            "id \"{id}\" must be lowercase alphanumeric with dashes"
        )))
    }
}

// ============================================================================
// File assembly
// ============================================================================

fn template_files(spec: &TemplateSpec) -> Vec<(PathBuf, String)> {
    let mut pages: Vec<(String, String, bool, Option<String>)> = vec![
        (
            "cover".to_string(),
            "Cover".to_string(),
            false,
            Some("pages/cover.css".to_string()),
        ),
        ("products".to_string(), "Products".to_string(), true, None),
    ];
    if spec.page_count >= 3 {
        pages.push(("contact".to_string(), "Contact".to_string(), false, None));
    }
    for k in 4..=spec.page_count {
        pages.push((format!("section-{}", k - 3), format!("Section {}", k - 3), false, None));
    }

    let mut manifest = format!(
        "# Template definition for \"{name}\". Generated by `catagen new-template`;\n\
         # edit freely — the generator never overwrites a changed definition.\n\
         id = \"{id}\"\n\
         name = \"{name}\"\n\
         category = \"{category}\"\n\
         is_premium = {premium}\n\
         page_count = {page_count}\n\
         # Products per repeating-page clone.\n\
         products_per_page = 6\n\
         features = [{features}]\n\
         # Themes this template pairs with; \"*\" means no restriction.\n\
         compatible_themes = [\"*\"]\n\
         # Theme features this template needs to look right.\n\
         required_theme_features = []\n",
        id = toml_escape(&spec.id),
        name = toml_escape(&spec.name),
        category = toml_escape(&spec.category),
        premium = spec.is_premium,
        page_count = pages.len(),
        features = toml_list(&spec.features),
    );
    if let Some(author) = &spec.author {
        manifest.push_str(&format!("author = \"{}\"\n", toml_escape(author)));
    }
    manifest.push_str(
        "\n# Content fields the pages reference, for validation.\n\
         [supported_fields]\n\
         products = [\"name\", \"description\", \"price_display\", \"image_url\"]\n\
         profile = [\"company_name\", \"email\", \"phone\", \"address\", \"website\"]\n",
    );
    for (id, name, repeating, style) in &pages {
        manifest.push_str(&format!(
            "\n[[pages]]\nid = \"{id}\"\nname = \"{name}\"\nsource = \"pages/{id}.html\"\n"
        ));
        if let Some(style) = style {
            manifest.push_str(&format!("style = \"{style}\"\n"));
        }
        if *repeating {
            manifest.push_str("repeating = true\n");
        }
    }

    let mut files = vec![
        (PathBuf::from("template.toml"), manifest),
        (PathBuf::from("README.md"), template_readme(spec, &pages)),
        (PathBuf::from("pages/cover.html"), COVER_STUB.to_string()),
        (PathBuf::from("pages/cover.css"), COVER_STYLE_STUB.to_string()),
        (PathBuf::from("pages/products.html"), PRODUCTS_STUB.to_string()),
    ];
    for (id, name, repeating, _) in &pages {
        if *repeating || id == "cover" {
            continue;
        }
        let content = if id == "contact" {
            CONTACT_STUB.to_string()
        } else {
            format!("<section class=\"{id}\">\n  <h2>{name}</h2>\n</section>\n")
        };
        files.push((PathBuf::from(format!("pages/{id}.html")), content));
    }
    files
}

fn template_readme(spec: &TemplateSpec, pages: &[(String, String, bool, Option<String>)]) -> String {
    let mut doc = format!(
        "# {name}\n\n\
         Catalogue template `{id}` ({category}{premium}).\n\n\
         ## Pages\n\n",
        name = spec.name,
        id = spec.id,
        category = spec.category,
        premium = if spec.is_premium { ", premium" } else { "" },
    );
    for (id, name, repeating, _) in pages {
        let note = if *repeating {
            " — repeats once per slice of the product list"
        } else {
            ""
        };
        doc.push_str(&format!("- `{id}` — {name}{note}\n"));
    }
    if !spec.features.is_empty() {
        doc.push_str("\n## Features\n\n");
        for feature in &spec.features {
            doc.push_str(&format!("- {feature}\n"));
        }
    }
    doc.push_str(&format!(
        "\n## Usage\n\n```\ncatagen render --template {id} --theme <theme-id> --content content.json\n```\n",
        id = spec.id,
    ));
    if let Some(author) = &spec.author {
        doc.push_str(&format!("\nAuthored by {author}.\n"));
    }
    doc
}

fn theme_files(spec: &ThemeSpec) -> Result<Vec<(PathBuf, String)>, ScaffoldError> {
    let primary_light = lighten(&spec.primary_color, 0.35)?;
    let primary_soft = with_alpha(&spec.primary_color, 0.12)?;
    let text_muted = with_alpha(&spec.text_color, 0.65)?;

    let mut manifest = format!(
        "# Theme definition for \"{name}\". Generated by `catagen new-theme`.\n\
         id = \"{id}\"\n\
         name = \"{name}\"\n\
         category = \"{category}\"\n\
         # Capabilities templates can require from this theme.\n\
         features = []\n\
         compatible_templates = [\"*\"]\n\
         required_features = []\n",
        id = toml_escape(&spec.id),
        name = toml_escape(&spec.name),
        category = toml_escape(&spec.category),
    );
    if let Some(author) = &spec.author {
        manifest.push_str(&format!("author = \"{}\"\n", toml_escape(author)));
    }
    manifest.push_str(&format!(
        "\n[colors]\n\
         primary = \"{primary}\"\n\
         # Derived shades — regenerate or adjust by hand.\n\
         primary_light = \"{primary_light}\"\n\
         primary_soft = \"{primary_soft}\"\n\
         secondary = \"{secondary}\"\n\
         accent = \"{accent}\"\n\
         background = \"{background}\"\n\
         text = \"{text}\"\n\
         text_muted = \"{text_muted}\"\n\
         \n[typography]\n\
         font_family = \"{font}\"\n\
         base_size = \"16px\"\n\
         \n[spacing]\n\
         page_margin = \"2rem\"\n\
         item_gap = \"1rem\"\n",
        primary = spec.primary_color,
        secondary = spec.secondary_color,
        accent = spec.accent_color,
        background = spec.background_color,
        text = spec.text_color,
        font = toml_escape(&spec.font_family),
    ));

    let readme = format!(
        "# {name}\n\n\
         Catalogue theme `{id}` ({category}).\n\n\
         | Role | Value |\n|---|---|\n\
         | Primary | `{primary}` |\n\
         | Primary (light) | `{primary_light}` |\n\
         | Secondary | `{secondary}` |\n\
         | Accent | `{accent}` |\n\
         | Background | `{background}` |\n\
         | Text | `{text}` |\n\
         | Font | {font} |\n",
        name = spec.name,
        id = spec.id,
        category = spec.category,
        primary = spec.primary_color,
        secondary = spec.secondary_color,
        accent = spec.accent_color,
        background = spec.background_color,
        text = spec.text_color,
        font = spec.font_family,
    );

    Ok(vec![
        (PathBuf::from("theme.toml"), manifest),
        (PathBuf::from("README.md"), readme),
    ])
}

fn toml_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn toml_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", toml_escape(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Staged writes
// ============================================================================

/// Write the assembled files under `out_root/<id>`, staging through a
/// sibling temp directory so the final path appears atomically.
fn write_artifact(
    out_root: &Path,
    id: &str,
    files: Vec<(PathBuf, String)>,
) -> Result<GeneratedArtifact, ScaffoldError> {
    let target = out_root.join(id);

    if target.exists() {
        return if matches_existing(&target, &files)? {
            Ok(GeneratedArtifact {
                dir: target,
                files: files.into_iter().map(|(path, _)| path).collect(),
                up_to_date: true,
            })
        } else {
            Err(ScaffoldError::Conflict(target))
        };
    }

    fs::create_dir_all(out_root)?;
    let stage = out_root.join(format!(".{id}.staging"));
    if stage.exists() {
        fs::remove_dir_all(&stage)?;
    }

    let result = (|| -> Result<(), ScaffoldError> {
        for (rel, content) in &files {
            let path = stage.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        fs::rename(&stage, &target)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_dir_all(&stage);
    }
    result?;

    Ok(GeneratedArtifact {
        dir: target,
        files: files.into_iter().map(|(path, _)| path).collect(),
        up_to_date: false,
    })
}

/// True when every generated file already exists with identical bytes.
fn matches_existing(target: &Path, files: &[(PathBuf, String)]) -> Result<bool, ScaffoldError> {
    for (rel, content) in files {
        match fs::read_to_string(target.join(rel)) {
            Ok(existing) if existing == *content => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

// ============================================================================
// Color helpers
// ============================================================================

fn parse_hex(color: &str) -> Result<(u8, u8, u8), ScaffoldError> {
    let invalid = || ScaffoldError::InvalidColor(color.to_string());
    let hex = color.strip_prefix('#').ok_or_else(invalid)?;
    match hex.len() {
        3 => {
            let component = |i: usize| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .map(|v| v * 17)
                    .map_err(|_| invalid())
            };
            Ok((component(0)?, component(1)?, component(2)?))
        }
        6 => {
            let component =
                |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            Ok((component(0)?, component(2)?, component(4)?))
        }
        _ => Err(invalid()),
    }
}

/// Mix a hex color toward white by `amount` (0.0 = unchanged, 1.0 = white).
fn lighten(color: &str, amount: f32) -> Result<String, ScaffoldError> {
    let (r, g, b) = parse_hex(color)?;
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
    Ok(format!("#{:02x}{:02x}{:02x}", mix(r), mix(g), mix(b)))
}

/// Hex color as a CSS `rgba()` with the given opacity.
fn with_alpha(color: &str, alpha: f32) -> Result<String, ScaffoldError> {
    let (r, g, b) = parse_hex(color)?;
    Ok(format!("rgba({r}, {g}, {b}, {alpha:.2})"))
}
