use clap::{Parser, Subcommand};
use forms_core::{
    CoreConfig, DocumentId, DocumentKind, FormDocument, FormService, GeneratedDocument,
    ListQuery, NomncNotice, OutputSpool, PatientConsent, SocPacket,
};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forms")]
#[command(about = "Home health forms CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a form from a JSON file
    Render {
        /// Form kind: soc, nomnc or consent
        kind: String,
        /// JSON file with the form fields
        input: PathBuf,
        /// Output PDF path (default: download name in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also store the document
        #[arg(long)]
        save: bool,
    },
    /// Import a JSON array of forms
    Import {
        /// Form kind: soc, nomnc or consent
        kind: String,
        /// JSON file holding an array of form objects
        input: PathBuf,
    },
    /// List stored documents, newest first
    List {
        /// Form kind: soc, nomnc or consent
        kind: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a stored document as JSON
    Show {
        /// Form kind: soc, nomnc or consent
        kind: String,
        /// Document id
        id: String,
    },
    /// Re-render a stored document
    Pdf {
        /// Form kind: soc, nomnc or consent
        kind: String,
        /// Document id
        id: String,
        /// Output PDF path (default: download name in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a blank placeholder template with the pages a form needs
    BlankTemplate {
        /// Form kind: soc, nomnc or consent
        kind: String,
        /// Output path (default: the configured template location)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete expired files from the output directory
    Sweep,
}

/// Binds `$t` to the model type for `$kind` and evaluates `$body`.
macro_rules! for_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            DocumentKind::Soc => {
                type $t = SocPacket;
                $body
            }
            DocumentKind::Nomnc => {
                type $t = NomncNotice;
                $body
            }
            DocumentKind::Consent => {
                type $t = PatientConsent;
                $body
            }
        }
    };
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("forms=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'forms --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(CoreConfig::from_env()?);

    match command {
        Commands::Render {
            kind,
            input,
            output,
            save,
        } => {
            let kind: DocumentKind = kind.parse()?;
            let path = for_kind!(kind, T => render_file::<T>(&cfg, &input, output, save))?;
            println!("Wrote {}", path.display());
        }
        Commands::Import { kind, input } => {
            let kind: DocumentKind = kind.parse()?;
            let rows: Vec<serde_json::Value> = serde_json::from_str(&fs::read_to_string(&input)?)?;
            let report = for_kind!(kind, T => FormService::<T>::new(cfg.clone()).bulk_create(rows))?;
            println!("Created {} document(s)", report.created.len());
            for id in &report.created {
                println!("  {}", id);
            }
            for error in &report.errors {
                eprintln!("Row {}: {}", error.row, error.message);
            }
        }
        Commands::List {
            kind,
            search,
            page,
            limit,
        } => {
            let kind: DocumentKind = kind.parse()?;
            let query = ListQuery {
                page,
                limit,
                search,
            };
            for_kind!(kind, T => list::<T>(&cfg, &query));
        }
        Commands::Show { kind, id } => {
            let kind: DocumentKind = kind.parse()?;
            let id = DocumentId::parse(&id)?;
            let json = for_kind!(kind, T => {
                let document = FormService::<T>::new(cfg.clone()).get(id)?;
                serde_json::to_string_pretty(&document)?
            });
            println!("{}", json);
        }
        Commands::Pdf { kind, id, output } => {
            let kind: DocumentKind = kind.parse()?;
            let id = DocumentId::parse(&id)?;
            let path = for_kind!(kind, T => {
                let generated = FormService::<T>::new(cfg.clone()).render(id)?;
                write_generated(generated, output)?
            });
            println!("Wrote {}", path.display());
        }
        Commands::BlankTemplate { kind, output } => {
            let kind: DocumentKind = kind.parse()?;
            let path = output.unwrap_or_else(|| cfg.template_path(kind));
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let pages = kind.layout().required_pages();
            fs::write(&path, forms_pdf::blank_template(pages)?)?;
            println!("Wrote {}-page template {}", pages, path.display());
        }
        Commands::Sweep => {
            let removed = OutputSpool::from_config(&cfg).sweep_expired();
            println!("Removed {} expired file(s)", removed);
        }
    }

    Ok(())
}

/// Renders `input` without storing it, unless `save` is set.
fn render_file<T: FormDocument>(
    cfg: &Arc<CoreConfig>,
    input: &Path,
    output: Option<PathBuf>,
    save: bool,
) -> Result<PathBuf, Box<dyn Error>> {
    let data: T = serde_json::from_str(&fs::read_to_string(input)?)?;

    if save {
        let generated = FormService::<T>::new(cfg.clone()).generate(data)?;
        println!("Stored document {}", generated.document.id);
        return write_generated(generated, output);
    }

    data.validate()?;
    let template = fs::read(cfg.template_path(T::KIND))?;
    let pdf = forms_pdf::render(&template, T::layout(), &data.field_values())?;
    let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.pdf", data.file_stem())));
    fs::write(&path, pdf)?;
    Ok(path)
}

fn write_generated<T>(
    generated: GeneratedDocument<T>,
    output: Option<PathBuf>,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = output.unwrap_or_else(|| PathBuf::from(&generated.file_name));
    fs::write(&path, &generated.pdf)?;
    Ok(path)
}

fn list<T: FormDocument>(cfg: &Arc<CoreConfig>, query: &ListQuery) {
    let page = FormService::<T>::new(cfg.clone()).list(query);
    if page.items.is_empty() {
        println!("No documents found.");
        return;
    }
    for document in &page.items {
        println!(
            "ID: {}, Patient: {}, Created: {}",
            document.id,
            document.data.patient_name(),
            document.created_at.to_rfc3339()
        );
    }
    println!(
        "Page {} of {} ({} total)",
        page.page, page.total_pages, page.total
    );
}
