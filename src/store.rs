//! Definition storage: template and theme directories on disk →
//! registries.
//!
//! ## Directory Layout
//!
//! ```text
//! templates/
//! ├── modern/
//! │   ├── template.toml            # TemplateConfig + page list
//! │   ├── README.md                # Scaffold-generated doc (ignored here)
//! │   └── pages/
//! │       ├── cover.html           # Markup with fallback chains
//! │       └── products.html
//! └── classic/
//!     └── ...
//! themes/
//! ├── ocean/
//! │   ├── theme.toml               # ThemeConfig
//! │   └── README.md
//! └── slate/
//!     └── ...
//! ```
//!
//! Every page's markup (and optional style sheet) is compiled while
//! loading, so malformed templates fail here — at registration, with the
//! offending file in the message — and never at render time. A definition
//! that fails to load fails the whole load: half a catalog is worse than a
//! loud error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::definition::{DefinitionError, PageDef, TemplateConfig, TemplateDef, ThemeConfig};
use crate::registry::{Registry, RegistryError};
use crate::render::{CompileError, Template};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] Box<toml::de::Error>),
    #[error("invalid markup in {0}: {1}")]
    Compile(PathBuf, #[source] CompileError),
    #[error("page source {0} does not exist")]
    MissingPageSource(PathBuf),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// On-disk shape of `template.toml`: the config fields at top level plus
/// the page list.
#[derive(Deserialize)]
struct TemplateFile {
    #[serde(flatten)]
    config: TemplateConfig,
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Deserialize)]
struct PageEntry {
    id: String,
    name: Option<String>,
    /// Markup file, relative to the template directory.
    source: String,
    /// Style sheet file, relative to the template directory.
    style: Option<String>,
    #[serde(default)]
    repeating: bool,
}

/// Load one template directory: parse `template.toml`, read and compile
/// every page source, validate the result.
pub fn load_template_dir(dir: &Path) -> Result<TemplateDef, StoreError> {
    let manifest_path = dir.join("template.toml");
    let manifest = fs::read_to_string(&manifest_path)?;
    let file: TemplateFile = toml::from_str(&manifest)
        .map_err(|e| StoreError::Parse(manifest_path, Box::new(e)))?;

    let mut pages = Vec::new();
    for entry in file.pages {
        let markup = compile_source(dir, &entry.source)?;
        let style = entry
            .style
            .as_deref()
            .map(|source| compile_source(dir, source))
            .transpose()?;
        pages.push(PageDef {
            name: entry.name.unwrap_or_else(|| entry.id.clone()),
            id: entry.id,
            repeating: entry.repeating,
            markup,
            style,
        });
    }

    let def = TemplateDef {
        config: file.config,
        pages,
    };
    def.validate()?;
    Ok(def)
}

fn compile_source(dir: &Path, source: &str) -> Result<Template, StoreError> {
    let path = dir.join(source);
    if !path.is_file() {
        return Err(StoreError::MissingPageSource(path));
    }
    let raw = fs::read_to_string(&path)?;
    Template::compile(&raw).map_err(|e| StoreError::Compile(path, e))
}

/// Load one theme directory: parse and validate `theme.toml`.
pub fn load_theme_dir(dir: &Path) -> Result<ThemeConfig, StoreError> {
    let manifest_path = dir.join("theme.toml");
    let manifest = fs::read_to_string(&manifest_path)?;
    let theme: ThemeConfig = toml::from_str(&manifest)
        .map_err(|e| StoreError::Parse(manifest_path, Box::new(e)))?;
    theme.validate()?;
    Ok(theme)
}

/// Load every template under a root directory, sorted by directory name.
/// A missing root is an empty catalog, not an error.
pub fn load_templates(root: &Path) -> Result<Vec<TemplateDef>, StoreError> {
    definition_dirs(root, "template.toml")?
        .iter()
        .map(|dir| load_template_dir(dir))
        .collect()
}

/// Load every theme under a root directory, sorted by directory name.
pub fn load_themes(root: &Path) -> Result<Vec<ThemeConfig>, StoreError> {
    definition_dirs(root, "theme.toml")?
        .iter()
        .map(|dir| load_theme_dir(dir))
        .collect()
}

/// Load both definition roots and swap them into the registries. Each
/// registry reload is atomic; a load failure leaves both untouched.
pub fn populate(
    templates_root: &Path,
    themes_root: &Path,
    templates: &Registry<TemplateDef>,
    themes: &Registry<ThemeConfig>,
) -> Result<(), StoreError> {
    let loaded_templates = load_templates(templates_root)?;
    let loaded_themes = load_themes(themes_root)?;
    templates.reload(loaded_templates)?;
    themes.reload(loaded_themes)?;
    Ok(())
}

/// Subdirectories of `root` containing `manifest`, sorted by name for
/// deterministic registration order.
fn definition_dirs(root: &Path, manifest: &str) -> Result<Vec<PathBuf>, StoreError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(manifest).is_file())
        .collect();
    dirs.sort();
    Ok(dirs)
}
