use catagen::compat::CompatibilityMatrix;
use catagen::content::StandardizedContent;
use catagen::definition::{TemplateDef, ThemeConfig};
use catagen::registry::Registry;
use catagen::{compat, output, paginate, scaffold, standardize, store};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde_json::{Value, json};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catagen")]
#[command(about = "Template rendering engine for product catalogues")]
#[command(long_about = "\
Template rendering engine for product catalogues

Catalogue records go in as JSON, finished pages come out as markup.
Templates decide what pages say, themes decide how they look, and the
compatibility matrix keeps the two catalogs honest.

Project layout:

  templates/
  ├── modern/
  │   ├── template.toml            # Config + page list
  │   └── pages/
  │       ├── cover.html           # Markup with fallback chains
  │       └── products.html        # Repeating page, cloned per slice
  themes/
  └── ocean/
      └── theme.toml               # Colors, typography, spacing
  content.json                     # catalogue, profile, products, categories

Field references fall back left to right, then to the literal default:

  {{catalogue.name | profile.company_name | 'Product Catalogue'}}

The product listing page repeats once per products_per_page slice; an
empty catalogue still renders one listing page through its {{else}}
branch.

Run 'catagen new-template' and 'catagen new-theme' to scaffold
documented starter definitions.")]
#[command(version)]
struct Cli {
    /// Template definitions directory
    #[arg(long, default_value = "templates", global = true)]
    templates: PathBuf,

    /// Theme definitions directory
    #[arg(long, default_value = "themes", global = true)]
    themes: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a catalogue through a template (and optionally a theme)
    Render(RenderArgs),
    /// Validate content against registered templates without rendering
    Check {
        /// Content bundle (catalogue, profile, products, categories) as JSON
        #[arg(long)]
        content: PathBuf,
    },
    /// Score template × theme compatibility
    Compat {
        /// Template id; with --theme scores the pair, alone lists compatible themes
        #[arg(long)]
        template: Option<String>,
        /// Theme id; alone lists compatible templates
        #[arg(long)]
        theme: Option<String>,
    },
    /// List registered templates
    Templates(ListArgs),
    /// List registered themes
    Themes(ListArgs),
    /// Scaffold a new template definition
    NewTemplate(NewTemplateArgs),
    /// Scaffold a new theme definition
    NewTheme(NewThemeArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Content bundle (catalogue, profile, products, categories) as JSON
    #[arg(long)]
    content: PathBuf,

    /// Template id
    #[arg(long)]
    template: String,

    /// Theme id (style templates render without theme values if omitted)
    #[arg(long)]
    theme: Option<String>,

    /// Output directory
    #[arg(long, default_value = "out")]
    output: PathBuf,

    /// Override the template's products-per-page capacity
    #[arg(long)]
    page_capacity: Option<usize>,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Case-insensitive substring match on name, description and tags
    #[arg(long)]
    search: Option<String>,

    /// Exact category filter
    #[arg(long)]
    category: Option<String>,
}

#[derive(clap::Args)]
struct NewTemplateArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "general")]
    category: String,
    #[arg(long)]
    premium: bool,
    #[arg(long)]
    author: Option<String>,
    /// Total pages, cover and product listing included
    #[arg(long, default_value_t = 3)]
    page_count: usize,
    /// Feature labels (repeatable)
    #[arg(long = "feature")]
    features: Vec<String>,
}

#[derive(clap::Args)]
struct NewThemeArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "general")]
    category: String,
    #[arg(long)]
    author: Option<String>,
    #[arg(long, default_value = "#1a1a2e")]
    primary_color: String,
    #[arg(long, default_value = "#16213e")]
    secondary_color: String,
    #[arg(long, default_value = "#e94560")]
    accent_color: String,
    #[arg(long, default_value = "#ffffff")]
    background_color: String,
    #[arg(long, default_value = "#111111")]
    text_color: String,
    #[arg(long, default_value = "Georgia, serif")]
    font_family: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Scaffold commands write new definitions and must not require the
    // existing catalogs to load cleanly first; every other command starts
    // by populating the registries from disk.
    match cli.command {
        Command::Render(args) => {
            let (templates, themes) = load_registries(&cli.templates, &cli.themes)?;
            render(&args, &templates, &themes)?;
        }
        Command::Check { content } => {
            let (templates, _) = load_registries(&cli.templates, &cli.themes)?;
            let content = load_content(&content)?;
            let all = templates.all();
            let configs: Vec<_> = all.iter().map(|t| &t.config).collect();
            let warnings = standardize::validate(&content, &configs);
            output::print_warnings(&warnings);
            println!(
                "Checked {} products against {} templates",
                content.products.len(),
                configs.len()
            );
            if warnings.is_empty() {
                println!("Content is valid");
            } else {
                println!("{} warnings (rendering would proceed)", warnings.len());
            }
        }
        Command::Compat { template, theme } => {
            let (templates, themes) = load_registries(&cli.templates, &cli.themes)?;
            let matrix = CompatibilityMatrix::new(&templates, &themes);
            let lines = match (&template, &theme) {
                (Some(t), Some(h)) => output::format_pair(t, h, &matrix.pair(t, h)?),
                (Some(t), None) => {
                    output::format_compatible_themes(t, &matrix.compatible_themes(t)?)
                }
                (None, Some(h)) => {
                    output::format_compatible_templates(h, &matrix.compatible_templates(h)?)
                }
                (None, None) => output::format_matrix(&matrix.full_matrix()),
            };
            output::print_lines(&lines);
        }
        Command::Templates(args) => {
            let (templates, _) = load_registries(&cli.templates, &cli.themes)?;
            let listed = filtered(&templates, &args);
            output::print_lines(&output::format_template_list(&listed));
        }
        Command::Themes(args) => {
            let (_, themes) = load_registries(&cli.templates, &cli.themes)?;
            let listed = filtered(&themes, &args);
            output::print_lines(&output::format_theme_list(&listed));
        }
        Command::NewTemplate(args) => {
            let spec = scaffold::TemplateSpec {
                id: args.id,
                name: args.name,
                category: args.category,
                is_premium: args.premium,
                author: args.author,
                page_count: args.page_count,
                features: args.features,
            };
            let artifact = scaffold::generate_template(&spec, &cli.templates)?;
            print_artifact(&artifact);
        }
        Command::NewTheme(args) => {
            let spec = scaffold::ThemeSpec {
                id: args.id,
                name: args.name,
                category: args.category,
                author: args.author,
                primary_color: args.primary_color,
                secondary_color: args.secondary_color,
                accent_color: args.accent_color,
                background_color: args.background_color,
                text_color: args.text_color,
                font_family: args.font_family,
            };
            let artifact = scaffold::generate_theme(&spec, &cli.themes)?;
            print_artifact(&artifact);
        }
    }

    Ok(())
}

/// Construct both registries and populate them from disk.
fn load_registries(
    templates_root: &PathBuf,
    themes_root: &PathBuf,
) -> Result<(Registry<TemplateDef>, Registry<ThemeConfig>), store::StoreError> {
    let templates = Registry::new();
    let themes = Registry::new();
    store::populate(templates_root, themes_root, &templates, &themes)?;
    Ok((templates, themes))
}

/// The full pipeline: standardize → report compatibility → paginate →
/// render each page (in parallel) → write one file per page.
fn render(
    args: &RenderArgs,
    templates: &Registry<TemplateDef>,
    themes: &Registry<ThemeConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    let template = templates
        .get(&args.template)
        .ok_or_else(|| format!("no template registered with id \"{}\"", args.template))?;
    let theme = match &args.theme {
        Some(id) => Some(
            themes
                .get(id)
                .ok_or_else(|| format!("no theme registered with id \"{id}\""))?,
        ),
        None => None,
    };

    let content = load_content(&args.content)?;
    let warnings = standardize::validate(&content, &[&template.config]);
    output::print_warnings(&warnings);

    if let Some(theme) = &theme {
        let result = compat::score(&template.config, theme);
        output::print_lines(&output::format_pair(&template.config.id, &theme.id, &result));
    }

    let capacity = args.page_capacity.unwrap_or(template.config.products_per_page);
    let bound = paginate::generate(&template.pages, content.products.len(), capacity)?;
    let total = bound.len();

    // Pure per-page rendering in parallel; all I/O happens afterwards so a
    // failed write can't interleave with rendering.
    let rendered: Vec<(output::PageReport, String, Option<String>)> = bound
        .par_iter()
        .enumerate()
        .map(|(position, page)| {
            let def = &template.pages[page.page];
            let scope = page_scope(&content, page, position + 1, total, theme.as_deref());
            let markup = def.markup.render(&scope);
            let style = def.style.as_ref().map(|s| s.render(&scope));
            let base = format!("{:03}-{}", position + 1, page.id);
            let report = output::PageReport {
                name: page.name.clone(),
                file: format!("{base}.html"),
                style_file: style.as_ref().map(|_| format!("{base}.css")),
                products: def.repeating.then(|| page.products.len()),
            };
            (report, markup, style)
        })
        .collect();

    std::fs::create_dir_all(&args.output)?;
    for (report, markup, style) in &rendered {
        std::fs::write(args.output.join(&report.file), markup)?;
        if let (Some(file), Some(css)) = (&report.style_file, style) {
            std::fs::write(args.output.join(file), css)?;
        }
    }

    let reports: Vec<output::PageReport> = rendered.into_iter().map(|(r, _, _)| r).collect();
    output::print_lines(&output::format_render_output(&reports));
    println!("Catalogue rendered to {}", args.output.display());
    Ok(())
}

/// Build one page's lookup scope: content narrowed to the page slice, plus
/// `theme.*` values and `page.number` / `page.total`.
fn page_scope(
    content: &StandardizedContent,
    page: &paginate::BoundPage,
    number: usize,
    total: usize,
    theme: Option<&ThemeConfig>,
) -> Value {
    let mut scope = content.scope_for(&content.products[page.products.clone()]);
    if let Value::Object(map) = &mut scope {
        map.insert("page".to_string(), json!({ "number": number, "total": total }));
        if let Some(theme) = theme {
            map.insert("theme".to_string(), theme.scope());
        }
    }
    scope
}

fn load_content(path: &PathBuf) -> Result<StandardizedContent, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let bundle: Value = serde_json::from_str(&raw)?;
    Ok(standardize::standardize_bundle(&bundle))
}

fn filtered<T: catagen::definition::Definition>(
    registry: &Registry<T>,
    args: &ListArgs,
) -> Vec<std::sync::Arc<T>> {
    match (&args.search, &args.category) {
        (Some(query), _) => registry.search(query),
        (None, Some(category)) => registry.by_category(category),
        (None, None) => registry.all(),
    }
}

fn print_artifact(artifact: &scaffold::GeneratedArtifact) {
    if artifact.up_to_date {
        println!("{} is up to date", artifact.dir.display());
        return;
    }
    for file in &artifact.files {
        println!("Generated {}", artifact.dir.join(file).display());
    }
}
