//! Page synthesis: a template's declared pages → the concrete page run for
//! one catalogue.
//!
//! Most pages (cover, about, contact) pass through unchanged, in declared
//! order. The one *repeating* page — the product listing — is cloned once
//! per capacity-sized slice of the product list, and the clones stand as a
//! contiguous run exactly where the placeholder stood:
//!
//! ```text
//! [cover, products, back]  ×  7 products, capacity 3
//!   → [cover, products-1 (0..3), products-2 (3..6), products-3 (6..7), back]
//! ```
//!
//! An empty catalogue still emits exactly one clone bound to the empty
//! slice, so the listing page renders its "no products" branch instead of
//! vanishing from the document. That is policy, not an accident of the
//! arithmetic.
//!
//! Bindings reference pages by index and products by range; nothing here
//! clones markup or content. Rendering happens downstream, one bound page
//! at a time.

use std::ops::Range;
use thiserror::Error;

use crate::definition::PageDef;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaginateError {
    #[error("page capacity must be at least 1")]
    ZeroCapacity,
}

/// One concrete output page: a template page plus the product slice it is
/// bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPage {
    /// Output identity. Repeating clones are suffixed `-1`, `-2`, … so
    /// names stay stable regardless of product count.
    pub id: String,
    pub name: String,
    /// Index into the template's declared page list.
    pub page: usize,
    /// The product slice this page sees. Non-repeating pages are bound to
    /// the full list.
    pub products: Range<usize>,
}

/// Expand a template's page list against a product count.
///
/// Emits `max(1, ceil(product_count / capacity))` clones per repeating
/// page; everything else passes through bound to the full product range.
pub fn generate(
    pages: &[PageDef],
    product_count: usize,
    capacity: usize,
) -> Result<Vec<BoundPage>, PaginateError> {
    if capacity == 0 {
        return Err(PaginateError::ZeroCapacity);
    }

    let clone_count = product_count.div_ceil(capacity).max(1);
    let mut bound = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        if page.repeating {
            for k in 1..=clone_count {
                let start = (k - 1) * capacity;
                let end = (start + capacity).min(product_count);
                bound.push(BoundPage {
                    id: format!("{}-{}", page.id, k),
                    name: page.name.clone(),
                    page: index,
                    products: start..end,
                });
            }
        } else {
            bound.push(BoundPage {
                id: page.id.clone(),
                name: page.name.clone(),
                page: index,
                products: 0..product_count,
            });
        }
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Template;

    fn page(id: &str, repeating: bool) -> PageDef {
        PageDef {
            id: id.to_string(),
            name: id.to_string(),
            repeating,
            markup: Template::compile("x").unwrap(),
            style: None,
        }
    }

    fn standard_pages() -> Vec<PageDef> {
        vec![page("cover", false), page("products", true), page("back", false)]
    }

    #[test]
    fn seven_products_capacity_three_gives_slices_3_3_1() {
        let bound = generate(&standard_pages(), 7, 3).unwrap();
        let clones: Vec<&BoundPage> =
            bound.iter().filter(|b| b.id.starts_with("products-")).collect();
        assert_eq!(clones.len(), 3);
        let sizes: Vec<usize> = clones.iter().map(|b| b.products.len()).collect();
        assert_eq!(sizes, [3, 3, 1]);
    }

    #[test]
    fn clone_count_is_max_1_ceil_n_over_c() {
        for (n, c, expected) in [(0, 3, 1), (1, 3, 1), (3, 3, 1), (4, 3, 2), (9, 3, 3), (10, 3, 4)]
        {
            let bound = generate(&standard_pages(), n, c).unwrap();
            let clones = bound.iter().filter(|b| b.page == 1).count();
            assert_eq!(clones, expected, "n={n} c={c}");
        }
    }

    #[test]
    fn slices_concatenate_to_the_original_order() {
        let bound = generate(&standard_pages(), 10, 4).unwrap();
        let mut covered = Vec::new();
        for b in bound.iter().filter(|b| b.page == 1) {
            assert!(b.products.len() <= 4);
            covered.extend(b.products.clone());
        }
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_catalogue_emits_exactly_one_empty_clone() {
        let bound = generate(&standard_pages(), 0, 6).unwrap();
        let clones: Vec<&BoundPage> = bound.iter().filter(|b| b.page == 1).collect();
        assert_eq!(clones.len(), 1);
        assert_eq!(clones[0].id, "products-1");
        assert!(clones[0].products.is_empty());
    }

    #[test]
    fn clones_replace_the_placeholder_in_position() {
        let bound = generate(&standard_pages(), 7, 3).unwrap();
        let ids: Vec<&str> = bound.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["cover", "products-1", "products-2", "products-3", "back"]);
    }

    #[test]
    fn non_repeating_pages_see_the_full_product_range() {
        let bound = generate(&standard_pages(), 7, 3).unwrap();
        assert_eq!(bound[0].products, 0..7);
        assert_eq!(bound[4].products, 0..7);
    }

    #[test]
    fn template_without_repeating_page_passes_through() {
        let pages = vec![page("cover", false), page("about", false)];
        let bound = generate(&pages, 12, 3).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].id, "cover");
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let bound = generate(&standard_pages(), 6, 3).unwrap();
        let sizes: Vec<usize> = bound
            .iter()
            .filter(|b| b.page == 1)
            .map(|b| b.products.len())
            .collect();
        assert_eq!(sizes, [3, 3]);
    }

    #[test]
    fn capacity_one_gives_one_product_per_page() {
        let bound = generate(&standard_pages(), 3, 1).unwrap();
        let sizes: Vec<usize> = bound
            .iter()
            .filter(|b| b.page == 1)
            .map(|b| b.products.len())
            .collect();
        assert_eq!(sizes, [1, 1, 1]);
    }

    #[test]
    fn zero_capacity_is_a_generation_error() {
        assert_eq!(
            generate(&standard_pages(), 5, 0),
            Err(PaginateError::ZeroCapacity)
        );
    }
}
