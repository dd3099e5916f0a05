//! # Catagen
//!
//! Template rendering and compatibility engine for product catalogues.
//! Catalogue data lives elsewhere (a database, an export, an API); catagen
//! takes already-validated records and turns them into finished catalogue
//! pages through reusable visual templates and independently-authored
//! themes.
//!
//! # Architecture: Three-Stage Render Pipeline
//!
//! A render is a pure function composition over immutable inputs:
//!
//! ```text
//! 1. Standardize   raw records      →  StandardizedContent
//! 2. Paginate      template pages   →  bound pages (one per product slice)
//! 3. Render        bound pages      →  markup, one file per page
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Schema isolation**: only the standardizer knows storage spellings;
//!   templates reference one canonical model.
//! - **Parallelism**: each bound page depends only on its own product
//!   slice plus shared read-only definitions, so pages render in parallel.
//! - **Testability**: every stage is a pure function — unit tests exercise
//!   pagination arithmetic and fallback resolution without touching disk.
//!
//! Independently of the pipeline, the template and theme registries feed a
//! compatibility matrix that scores every pairing, so the catalog of
//! combinations stays consistent while both sides version freely.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`content`] | Canonical content model (`StandardizedContent`, `Product`, …) |
//! | [`standardize`] | Raw JSON records → canonical model, plus validation warnings |
//! | [`definition`] | Template/theme configs, page definitions, typed extensions |
//! | [`registry`] | Id-keyed definition catalogs with atomic reload |
//! | [`compat`] | Template × theme scoring and the cached full matrix |
//! | [`paginate`] | Product list → fixed-capacity page clones |
//! | [`render`] | Fallback-chain grammar: compile once, render pure |
//! | [`store`] | Definition directories on disk → registries |
//! | [`scaffold`] | `new-template` / `new-theme` generators |
//! | [`output`] | CLI output formatting — pure `format_*`, thin `print_*` |
//!
//! # Design Decisions
//!
//! ## Fallback Chains Over Strict Bindings
//!
//! Catalogue data is ragged: half-filled profiles, products without
//! images, imports that renamed fields twice. Every field reference in a
//! template is therefore an ordered fallback chain with a literal default,
//! and missing content is a *warning*, never a render failure. The only
//! fatal errors are configuration mistakes — duplicate ids, malformed
//! markup — and those surface at load time, not mid-render.
//!
//! ## Compiled Templates, Not String Re-Interpretation
//!
//! Markup is parsed exactly once into an immutable instruction tree when a
//! definition loads. Rendering walks that tree against a JSON scope; by the
//! time content arrives there is nothing left to go wrong syntactically.
//!
//! ## Registries as Values, Not Globals
//!
//! Both catalogs are constructed and passed by reference. Readers work on
//! copy-on-write snapshots, so a hot reload swaps the whole catalog in one
//! atomic step and concurrent readers never observe a half-populated one.

pub mod compat;
pub mod content;
pub mod definition;
pub mod output;
pub mod paginate;
pub mod registry;
pub mod render;
pub mod scaffold;
pub mod standardize;
pub mod store;
