//! Marten CLI
//!
//! Loads a document tree (JSON, as written by an external markup parser),
//! resolves it against its stylesheets and prints the styled render tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use marten_css::{extract_style_content, preprocess, stylesheet_hrefs};
use marten_dom::{DomTree, SourceNode};
use marten_style::{NodeKind, NodeRef, StyleEngine, Viewport};
use owo_colors::OwoColorize;

/// Marten: cascade and box-model resolution for a document tree
#[derive(Parser, Debug)]
#[command(name = "marten")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r"EXAMPLES:
    # Print the styled tree, using <style> and <link> sheets of the document
    marten page.json

    # Add a stylesheet and resolve for a narrow viewport
    marten --css mobile.css --width 400 page.json

    # Dump the resolved tree as JSON
    marten --json page.json

    # Print the visible text
    marten --content page.json
")]
struct Cli {
    /// Document tree as JSON
    #[arg(value_name = "FILE")]
    document: PathBuf,

    /// Extra stylesheet, applied after the document's own (repeatable)
    #[arg(long = "css", value_name = "FILE")]
    stylesheets: Vec<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, default_value = "1280")]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value = "1080")]
    height: f64,

    /// Base font size in pixels
    #[arg(long, default_value = "11")]
    font_size: f64,

    /// Skip the built-in add-on stylesheet
    #[arg(long)]
    no_ua: bool,

    /// Print the resolved tree as JSON
    #[arg(long, conflicts_with = "content")]
    json: bool,

    /// Print the visible text content
    #[arg(long)]
    content: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    let doc = load_document(&cli.document)?;
    let sheets = collect_stylesheets(&doc, &cli)?;

    let engine = StyleEngine::new()
        .with_viewport(Viewport {
            width: cli.width,
            height: cli.height,
        })
        .with_base_font_size(cli.font_size)
        .with_add_on_stylesheet(!cli.no_ua);
    let tree = engine
        .resolve(&doc, &sheets)
        .with_context(|| format!("resolving {}", cli.document.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else if cli.content {
        println!("{}", tree.root().content_string(false));
    } else {
        print_node(tree.root(), 0);
    }
    Ok(())
}

fn load_document(path: &Path) -> Result<DomTree> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let source: SourceNode =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    Ok(DomTree::from_source(&source))
}

/// `<style>` content, then local `<link rel="stylesheet">` files, then
/// `--css` files.
fn collect_stylesheets(doc: &DomTree, cli: &Cli) -> Result<Vec<String>> {
    let mut sheets = Vec::new();

    let inline = extract_style_content(doc);
    if !inline.trim().is_empty() {
        sheets.push(inline);
    }

    let base = cli.document.parent().unwrap_or_else(|| Path::new("."));
    for href in stylesheet_hrefs(doc) {
        let path = base.join(&href);
        match fs::read_to_string(&path) {
            Ok(css) => sheets.push(css),
            Err(err) => log::warn!("skipping stylesheet {href}: {err}"),
        }
    }

    for path in &cli.stylesheets {
        let css = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        sheets.push(css);
    }

    for sheet in &sheets {
        match preprocess(sheet) {
            Ok(preprocessed) => {
                for import in preprocessed.imports {
                    log::info!("not following @import {}", import.url);
                }
            }
            Err(err) => log::warn!("cannot scan stylesheet for imports: {err}"),
        }
    }
    Ok(sheets)
}

fn print_node(node: NodeRef<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let style = node.resolved_style();

    match node.kind() {
        NodeKind::Text => {
            let display = node.text().replace('\n', "\\n");
            println!("{indent}{}", format!("\"{display}\"").green());
        }
        NodeKind::Element => {
            let mut line = format!("{indent}{}", format!("<{}>", node.tag()).cyan());
            if let Some(id) = node.attr("id") {
                line.push_str(&format!(" {}", format!("#{id}").yellow()));
            }
            if !style.is_empty() {
                let declarations: Vec<String> = style
                    .iter()
                    .map(|d| {
                        let important = if d.important { " !important" } else { "" };
                        format!("{}: {}{important}", d.property, d.value)
                    })
                    .collect();
                line.push_str(&format!(" {}", declarations.join("; ").dimmed()));
            }
            println!("{line}");
        }
    }

    for child in node.children() {
        print_node(child, depth + 1);
    }
}
