//! Template × theme compatibility scoring.
//!
//! Templates and themes are authored and versioned independently, so the
//! product catalog of combinations has to stay internally consistent
//! without either side knowing about the other's releases. Each pairing is
//! scored 0–100 from two inputs:
//!
//! 1. **Allow-lists** — an explicit `compatible_themes` /
//!    `compatible_templates` set excludes everything outside it (the
//!    wildcard `"*"` contributes no exclusion). An exclusion in *either*
//!    direction is a hard incompatibility, score 0.
//! 2. **Feature requirements** — each required feature missing from the
//!    other side's declared feature set costs a fixed penalty. Feature
//!    names are opaque labels; there is no ontology.
//!
//! Mismatches are not errors: the result is a first-class value callers use
//! to filter choices.
//!
//! [`CompatibilityMatrix`] wraps the two registries and serves per-pair
//! scores, compatible-set enumeration (sorted by descending score, then id,
//! for deterministic output) and the full id×id matrix, computed lazily and
//! cached until either registry mutates.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::definition::{TemplateConfig, TemplateDef, ThemeConfig};
use crate::registry::Registry;

/// Score deduction per missing required feature. One gap leaves a pairing
/// usable; seven sink it.
pub const MISSING_FEATURE_PENALTY: u32 = 15;

#[derive(Error, Debug)]
pub enum CompatError {
    #[error("no template registered with id \"{0}\"")]
    UnknownTemplate(String),
    #[error("no theme registered with id \"{0}\"")]
    UnknownTheme(String),
}

/// Outcome of scoring one pairing. Derived, never persisted — recomputed
/// on demand from the two configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    pub compatible: bool,
    /// 0–100; 100 means no issues at all.
    pub score: u8,
    /// Human-readable findings, in evaluation order.
    pub issues: Vec<String>,
}

/// Score one template/theme pairing.
pub fn score(template: &TemplateConfig, theme: &ThemeConfig) -> CompatibilityResult {
    let mut issues = Vec::new();
    let mut excluded = false;

    if !template.compatible_themes.allows(&theme.id) {
        excluded = true;
        issues.push(format!(
            "theme \"{}\" is not in template \"{}\"'s allow-list",
            theme.id, template.id
        ));
    }
    if !theme.compatible_templates.allows(&template.id) {
        excluded = true;
        issues.push(format!(
            "template \"{}\" is not in theme \"{}\"'s allow-list",
            template.id, theme.id
        ));
    }
    if excluded {
        return CompatibilityResult {
            compatible: false,
            score: 0,
            issues,
        };
    }

    let mut penalty: u32 = 0;
    for feature in &template.required_theme_features {
        if !theme.features.contains(feature) {
            penalty += MISSING_FEATURE_PENALTY;
            issues.push(format!(
                "theme \"{}\" lacks required feature \"{}\"",
                theme.id, feature
            ));
        }
    }
    for feature in &theme.required_features {
        if !template.features.contains(feature) {
            penalty += MISSING_FEATURE_PENALTY;
            issues.push(format!(
                "template \"{}\" lacks required feature \"{}\"",
                template.id, feature
            ));
        }
    }

    let score = 100u32.saturating_sub(penalty) as u8;
    CompatibilityResult {
        compatible: score > 0,
        score,
        issues,
    }
}

struct MatrixCache {
    template_generation: u64,
    theme_generation: u64,
    results: Arc<BTreeMap<(String, String), CompatibilityResult>>,
}

/// Compatibility view over the two registries.
pub struct CompatibilityMatrix<'a> {
    templates: &'a Registry<TemplateDef>,
    themes: &'a Registry<ThemeConfig>,
    cache: RwLock<Option<MatrixCache>>,
}

impl<'a> CompatibilityMatrix<'a> {
    pub fn new(templates: &'a Registry<TemplateDef>, themes: &'a Registry<ThemeConfig>) -> Self {
        Self {
            templates,
            themes,
            cache: RwLock::new(None),
        }
    }

    /// Score one pair by id.
    pub fn pair(&self, template_id: &str, theme_id: &str) -> Result<CompatibilityResult, CompatError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| CompatError::UnknownTemplate(template_id.to_string()))?;
        let theme = self
            .themes
            .get(theme_id)
            .ok_or_else(|| CompatError::UnknownTheme(theme_id.to_string()))?;
        Ok(score(&template.config, &theme))
    }

    /// All themes compatible with a template, best first (descending score,
    /// ascending id as the stable tie-break).
    pub fn compatible_themes(
        &self,
        template_id: &str,
    ) -> Result<Vec<(Arc<ThemeConfig>, CompatibilityResult)>, CompatError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| CompatError::UnknownTemplate(template_id.to_string()))?;

        let mut scored: Vec<(Arc<ThemeConfig>, CompatibilityResult)> = self
            .themes
            .all()
            .into_iter()
            .map(|theme| {
                let result = score(&template.config, &theme);
                (theme, result)
            })
            .filter(|(_, result)| result.compatible)
            .collect();
        sort_scored(&mut scored, |theme| &theme.id);
        Ok(scored)
    }

    /// All templates compatible with a theme, best first.
    pub fn compatible_templates(
        &self,
        theme_id: &str,
    ) -> Result<Vec<(Arc<TemplateDef>, CompatibilityResult)>, CompatError> {
        let theme = self
            .themes
            .get(theme_id)
            .ok_or_else(|| CompatError::UnknownTheme(theme_id.to_string()))?;

        let mut scored: Vec<(Arc<TemplateDef>, CompatibilityResult)> = self
            .templates
            .all()
            .into_iter()
            .map(|template| {
                let result = score(&template.config, &theme);
                (template, result)
            })
            .filter(|(_, result)| result.compatible)
            .collect();
        sort_scored(&mut scored, |template| &template.config.id);
        Ok(scored)
    }

    /// The complete (template id, theme id) → result mapping. Computed
    /// lazily, cached until either registry's generation moves.
    pub fn full_matrix(&self) -> Arc<BTreeMap<(String, String), CompatibilityResult>> {
        let template_generation = self.templates.generation();
        let theme_generation = self.themes.generation();

        if let Some(cache) = self.cache.read().as_ref() {
            if cache.template_generation == template_generation
                && cache.theme_generation == theme_generation
            {
                return cache.results.clone();
            }
        }

        let mut results = BTreeMap::new();
        let themes = self.themes.snapshot();
        for template in self.templates.snapshot().values() {
            for theme in themes.values() {
                results.insert(
                    (template.config.id.clone(), theme.id.clone()),
                    score(&template.config, theme),
                );
            }
        }
        let results = Arc::new(results);

        *self.cache.write() = Some(MatrixCache {
            template_generation,
            theme_generation,
            results: results.clone(),
        });
        results
    }
}

fn sort_scored<T>(scored: &mut [(Arc<T>, CompatibilityResult)], id: impl Fn(&T) -> &str) {
    scored.sort_by(|(a, ra), (b, rb)| {
        rb.score
            .cmp(&ra.score)
            .then_with(|| id(a).cmp(id(b)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AllowList, PageDef, TemplateConfig, ThemeConfig};
    use crate::render::Template;

    fn template(id: &str) -> TemplateConfig {
        TemplateConfig {
            id: id.to_string(),
            name: id.to_string(),
            ..TemplateConfig::default()
        }
    }

    fn theme(id: &str) -> ThemeConfig {
        ThemeConfig {
            id: id.to_string(),
            name: id.to_string(),
            ..ThemeConfig::default()
        }
    }

    fn def(config: TemplateConfig) -> TemplateDef {
        TemplateDef {
            config,
            pages: vec![PageDef {
                id: "cover".to_string(),
                name: "Cover".to_string(),
                repeating: false,
                markup: Template::compile("x").unwrap(),
                style: None,
            }],
        }
    }

    #[test]
    fn wildcard_both_sides_scores_100() {
        let result = score(&template("t"), &theme("h"));
        assert!(result.compatible);
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn template_allow_list_excludes_unlisted_theme() {
        let mut t = template("t");
        t.compatible_themes = AllowList::only(["ocean"]);
        let result = score(&t, &theme("desert"));
        assert!(!result.compatible);
        assert_eq!(result.score, 0);
        assert!(result.issues[0].contains("allow-list"));
    }

    #[test]
    fn theme_allow_list_excludes_unlisted_template_even_with_template_wildcard() {
        // One-sided wildcard: the template allows everything, the theme
        // does not — exclusion still fires.
        let mut h = theme("h");
        h.compatible_templates = AllowList::only(["classic"]);
        let result = score(&template("modern"), &h);
        assert!(!result.compatible);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn template_allow_list_excludes_even_with_theme_wildcard() {
        let mut t = template("modern");
        t.compatible_themes = AllowList::only(["ocean"]);
        let result = score(&t, &theme("desert"));
        assert!(!result.compatible);
    }

    #[test]
    fn missing_feature_reduces_score_without_excluding() {
        // Worked example: ocean is allow-listed, so the explicit list does
        // not exclude; the missing feature only costs its penalty.
        let mut t = template("t");
        t.compatible_themes = AllowList::only(["ocean"]);
        t.required_theme_features = vec!["gradients".to_string()];
        let result = score(&t, &theme("ocean"));
        assert!(result.compatible);
        assert_eq!(result.score, 85);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("gradients"));
    }

    #[test]
    fn satisfied_features_cost_nothing() {
        let mut t = template("t");
        t.required_theme_features = vec!["gradients".to_string()];
        let mut h = theme("h");
        h.features = vec!["gradients".to_string()];
        let result = score(&t, &h);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn penalties_accumulate_in_both_directions() {
        let mut t = template("t");
        t.required_theme_features = vec!["a".to_string(), "b".to_string()];
        let mut h = theme("h");
        h.required_features = vec!["c".to_string()];
        let result = score(&t, &h);
        assert_eq!(result.score, 100 - 45);
        assert_eq!(result.issues.len(), 3);
    }

    #[test]
    fn score_clamps_to_zero_and_flips_compatible() {
        let mut t = template("t");
        t.required_theme_features = (0..7).map(|i| format!("f{i}")).collect();
        let result = score(&t, &theme("h"));
        assert_eq!(result.score, 0);
        assert!(!result.compatible);
    }

    #[test]
    fn compatible_themes_sorted_by_score_then_id() {
        let templates = Registry::new();
        let themes = Registry::new();

        let mut t = template("t");
        t.required_theme_features = vec!["gradients".to_string()];
        templates.register(def(t)).unwrap();

        // beta/delta both miss the feature (85); alpha has it (100);
        // omega is excluded by its own allow-list.
        let mut alpha = theme("alpha");
        alpha.features = vec!["gradients".to_string()];
        let mut omega = theme("omega");
        omega.compatible_templates = AllowList::only(Vec::<String>::new());
        for h in [alpha, theme("delta"), theme("beta"), omega] {
            themes.register(h).unwrap();
        }

        let matrix = CompatibilityMatrix::new(&templates, &themes);
        let scored = matrix.compatible_themes("t").unwrap();
        let ids: Vec<&str> = scored.iter().map(|(h, _)| h.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "beta", "delta"]);

        // Stable across repeated calls absent registry mutation.
        let again = matrix.compatible_themes("t").unwrap();
        let ids_again: Vec<&str> = again.iter().map(|(h, _)| h.id.as_str()).collect();
        assert_eq!(ids, ids_again);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let templates = Registry::new();
        let themes = Registry::new();
        let matrix = CompatibilityMatrix::new(&templates, &themes);
        assert!(matches!(
            matrix.pair("ghost", "also-ghost"),
            Err(CompatError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn full_matrix_covers_every_pair_and_caches_until_mutation() {
        let templates = Registry::new();
        let themes = Registry::new();
        templates.register(def(template("t1"))).unwrap();
        templates.register(def(template("t2"))).unwrap();
        themes.register(theme("h1")).unwrap();

        let matrix = CompatibilityMatrix::new(&templates, &themes);
        let first = matrix.full_matrix();
        assert_eq!(first.len(), 2);
        assert!(first.contains_key(&("t1".to_string(), "h1".to_string())));

        // Same Arc while nothing mutated.
        let second = matrix.full_matrix();
        assert!(Arc::ptr_eq(&first, &second));

        themes.register(theme("h2")).unwrap();
        let third = matrix.full_matrix();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 4);
    }
}
