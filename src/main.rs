use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use email_builder::{
    download_filename, BuilderConfig, EmailDocument, EmailRenderer, ImageStyles, SectionStyles,
    Sections, TemplateBundle, TemplateRecord, DEFAULT_LAYOUT,
};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new email template project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Export a template as a standalone HTML file
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output file or directory (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Refuse to export when the title or a section is empty
        #[arg(long)]
        strict: bool,
    },
    /// Print the live-preview fragment of a template
    Preview {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Check that a template has a title and all three sections
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the default email layout
    Layout,
}

#[derive(Args)]
struct InputArgs {
    /// Path to the JSON template bundle
    input: PathBuf,

    /// The input is a saved template record rather than a bare bundle
    #[arg(long)]
    record: bool,

    /// Title to use instead of the one in the template
    #[arg(long)]
    title: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            BuilderConfig::load(path).context("Failed to load config")?
        }
        None => BuilderConfig::default(),
    };

    match cli.command {
        Commands::Init { path } => init_project(&path, cli.dry_run)?,
        Commands::Export {
            input,
            output,
            strict,
        } => export(&input, output, strict, &config, cli.dry_run)?,
        Commands::Preview { input } => {
            let doc = load_document(&input, &config)?;
            let html = EmailRenderer::new().render_preview(&doc)?;
            println!("{}", html);
        }
        Commands::Check { input } => {
            let doc = load_document(&input, &config)?;
            if let Err(e) = doc.validate() {
                error!("{:?}: {}", input.input, e);
                return Err(e.into());
            }
            info!("{:?}: ok", input.input);
        }
        Commands::Layout => print!("{}", DEFAULT_LAYOUT),
    }

    Ok(())
}

fn load_document(input: &InputArgs, config: &BuilderConfig) -> Result<EmailDocument> {
    info!("Loading template from {:?}", input.input);
    let json = fs::read_to_string(&input.input)
        .with_context(|| format!("Failed to read template file {:?}", input.input))?;

    let mut doc = if input.record {
        TemplateRecord::from_json(&json)?.to_document(config)?
    } else {
        TemplateBundle::decode(&json)?.into_document("", None, config)
    };
    if let Some(title) = &input.title {
        doc.title = title.clone();
    }
    Ok(doc)
}

fn export(
    input: &InputArgs,
    output: Option<PathBuf>,
    strict: bool,
    config: &BuilderConfig,
    dry_run: bool,
) -> Result<()> {
    let doc = load_document(input, config)?;
    if strict {
        doc.validate()?;
    }
    let html = EmailRenderer::new().render(&doc)?;
    let output_path = resolve_output(output, config, &doc.title);

    if dry_run {
        info!("[DRY RUN] Would write: {:?}", output_path);
        return Ok(());
    }
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    fs::write(&output_path, html)
        .with_context(|| format!("Failed to write export to {:?}", output_path))?;
    info!("{:?}", output_path);
    Ok(())
}

/// An explicit file wins; a directory (explicit or configured) gets the
/// title-derived download name.
fn resolve_output(output: Option<PathBuf>, config: &BuilderConfig, title: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(download_filename(title)),
        Some(path) => path,
        None => config
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(download_filename(title)),
    }
}

fn init_project(path: &Path, dry_run: bool) -> Result<()> {
    info!("Initializing email template project at {:?}", path);

    let config_content = r##"title: "Email Template"
output: "exports"

# Styles applied to templates that carry none
styles:
  header:
    fontSize: "24px"
    color: "#000000"
    backgroundColor: "transparent"
    padding: "10px"
    textAlign: "left"
    fontFamily: "Arial"

image_styles:
  width: "100%"
  maxHeight: "300px"
  alignment: "center"
"##;

    let example = EmailDocument {
        title: "Welcome".to_string(),
        sections: Sections {
            header: r#"<h1 class="ql-align-center">Welcome aboard</h1>"#.to_string(),
            content: concat!(
                r#"<p>Thanks for joining. <span class="ql-size-large">We're glad you're here.</span></p>"#,
                r#"<p style="color: #1d4ed8;">Reply to this email if you have any questions.</p>"#
            )
            .to_string(),
            footer: r#"<p class="ql-size-small">You are receiving this because you signed up.</p>"#
                .to_string(),
        },
        styles: SectionStyles::default(),
        image_url: String::new(),
        image_styles: ImageStyles::default(),
    };
    let record_content = TemplateRecord::from_document(&example, None)?.to_json()?;

    if dry_run {
        info!("[DRY RUN] Would write: {:?}", path.join("config.yaml"));
        info!("[DRY RUN] Would write: {:?}", path.join("template.json"));
        return Ok(());
    }

    fs::create_dir_all(path.join("exports"))?;
    fs::write(path.join("config.yaml"), config_content)?;
    fs::write(path.join("template.json"), record_content)?;

    info!("✓ Project initialized successfully!");
    info!("  Run: email-builder -c config.yaml export --record template.json");

    Ok(())
}
