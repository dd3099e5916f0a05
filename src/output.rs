//! CLI output formatting for all commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**: the primary line
//! for every entity (template, theme, rendered page) is its semantic
//! identity — positional index and display name — with ids, file paths and
//! metadata as indented context lines underneath. Compatibility output
//! leads with the pairing and its score; issues follow indented.
//!
//! # Output Format
//!
//! ## Listings
//!
//! ```text
//! Templates
//! 001 Modern (3 pages)
//!     Id: modern  Category: minimal
//!     Features: cover-page, category-index
//! ```
//!
//! ## Compatibility
//!
//! ```text
//! modern × ocean: 85 compatible
//!     theme "ocean" lacks required feature "gradients"
//! ```
//!
//! ## Render
//!
//! ```text
//! 001 Cover → 001-cover.html
//!     Style: 001-cover.css
//! 002 Products (3 products) → 002-products-1.html
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects. Warnings go to stderr via
//! [`print_warnings`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compat::CompatibilityResult;
use crate::definition::{TemplateDef, ThemeConfig};
use crate::standardize::Warning;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

const INDENT: &str = "    ";

fn verdict(result: &CompatibilityResult) -> &'static str {
    if result.compatible { "compatible" } else { "incompatible" }
}

// ============================================================================
// Listings
// ============================================================================

pub fn format_template_list(templates: &[Arc<TemplateDef>]) -> Vec<String> {
    let mut lines = vec!["Templates".to_string()];
    if templates.is_empty() {
        lines.push(format!("{INDENT}(none registered)"));
        return lines;
    }
    for (pos, template) in templates.iter().enumerate() {
        let config = &template.config;
        lines.push(format!(
            "{} {} ({} pages{})",
            format_index(pos + 1),
            config.name,
            template.pages.len(),
            if config.is_premium { ", premium" } else { "" },
        ));
        lines.push(format!(
            "{INDENT}Id: {}  Category: {}{}{}",
            config.id,
            config.category,
            config
                .author
                .as_deref()
                .map(|a| format!("  Author: {a}"))
                .unwrap_or_default(),
            config
                .version
                .as_deref()
                .map(|v| format!("  Version: {v}"))
                .unwrap_or_default(),
        ));
        if !config.features.is_empty() {
            lines.push(format!("{INDENT}Features: {}", config.features.join(", ")));
        }
    }
    lines
}

pub fn format_theme_list(themes: &[Arc<ThemeConfig>]) -> Vec<String> {
    let mut lines = vec!["Themes".to_string()];
    if themes.is_empty() {
        lines.push(format!("{INDENT}(none registered)"));
        return lines;
    }
    for (pos, theme) in themes.iter().enumerate() {
        lines.push(format!(
            "{} {}{}",
            format_index(pos + 1),
            theme.name,
            if theme.is_premium { " (premium)" } else { "" },
        ));
        lines.push(format!(
            "{INDENT}Id: {}  Category: {}{}{}",
            theme.id,
            theme.category,
            theme
                .author
                .as_deref()
                .map(|a| format!("  Author: {a}"))
                .unwrap_or_default(),
            theme
                .version
                .as_deref()
                .map(|v| format!("  Version: {v}"))
                .unwrap_or_default(),
        ));
        lines.push(format!(
            "{INDENT}Colors: primary {}, accent {}, background {}",
            theme.colors.primary, theme.colors.accent, theme.colors.background,
        ));
        lines.push(format!("{INDENT}Font: {}", theme.typography.font_family));
        if !theme.features.is_empty() {
            lines.push(format!("{INDENT}Features: {}", theme.features.join(", ")));
        }
    }
    lines
}

// ============================================================================
// Compatibility
// ============================================================================

pub fn format_pair(template_id: &str, theme_id: &str, result: &CompatibilityResult) -> Vec<String> {
    let mut lines = vec![format!(
        "{template_id} × {theme_id}: {} {}",
        result.score,
        verdict(result),
    )];
    for issue in &result.issues {
        lines.push(format!("{INDENT}{issue}"));
    }
    lines
}

pub fn format_compatible_themes(
    template_id: &str,
    scored: &[(Arc<ThemeConfig>, CompatibilityResult)],
) -> Vec<String> {
    let mut lines = vec![format!("Themes compatible with template {template_id}")];
    if scored.is_empty() {
        lines.push(format!("{INDENT}(none)"));
    }
    for (pos, (theme, result)) in scored.iter().enumerate() {
        lines.push(format!(
            "{} {} (score {})",
            format_index(pos + 1),
            theme.id,
            result.score,
        ));
    }
    lines
}

pub fn format_compatible_templates(
    theme_id: &str,
    scored: &[(Arc<TemplateDef>, CompatibilityResult)],
) -> Vec<String> {
    let mut lines = vec![format!("Templates compatible with theme {theme_id}")];
    if scored.is_empty() {
        lines.push(format!("{INDENT}(none)"));
    }
    for (pos, (template, result)) in scored.iter().enumerate() {
        lines.push(format!(
            "{} {} (score {})",
            format_index(pos + 1),
            template.config.id,
            result.score,
        ));
    }
    lines
}

pub fn format_matrix(matrix: &BTreeMap<(String, String), CompatibilityResult>) -> Vec<String> {
    if matrix.is_empty() {
        return vec!["(empty matrix — register templates and themes first)".to_string()];
    }
    matrix
        .iter()
        .map(|((template_id, theme_id), result)| {
            format!(
                "{template_id} × {theme_id}: {} {}",
                result.score,
                verdict(result),
            )
        })
        .collect()
}

// ============================================================================
// Validation and render reports
// ============================================================================

pub fn format_warnings(warnings: &[Warning]) -> Vec<String> {
    warnings.iter().map(|w| format!("Warning: {w}")).collect()
}

/// One rendered page, as reported by the render command.
pub struct PageReport {
    pub name: String,
    pub file: String,
    pub style_file: Option<String>,
    /// Product count on this page, shown for repeating pages only.
    pub products: Option<usize>,
}

pub fn format_render_output(reports: &[PageReport]) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, report) in reports.iter().enumerate() {
        let detail = match report.products {
            Some(1) => " (1 product)".to_string(),
            Some(n) => format!(" ({n} products)"),
            None => String::new(),
        };
        lines.push(format!(
            "{} {}{} → {}",
            format_index(pos + 1),
            report.name,
            detail,
            report.file,
        ));
        if let Some(style) = &report.style_file {
            lines.push(format!("{INDENT}Style: {style}"));
        }
    }
    lines.push(format!("Rendered {} pages", reports.len()));
    lines
}

// ============================================================================
// Print wrappers
// ============================================================================

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// Warnings go to stderr so piped stdout stays clean.
pub fn print_warnings(warnings: &[Warning]) {
    for line in format_warnings(warnings) {
        eprintln!("{line}");
    }
}
