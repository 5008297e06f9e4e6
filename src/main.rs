use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use billed::config::{self, load_config, load_session};
use billed::models::{FormattedBillRow, SelectedFile};
use billed::services::state::AppState;
use billed::ui::dom::ERROR_MESSAGE;
use billed::ui::events::{
    FIELD_AMOUNT, FIELD_COMMENTARY, FIELD_DATE, FIELD_NAME, FIELD_PCT, FIELD_TYPE, FIELD_VAT,
};
use billed::ui::{
    DisplayMode, DocumentModal, FileChangeEvent, FormData, HeadlessDocument, Navigator, Route,
    SubmitEvent,
};
use billed::utils::file_extension;

#[derive(Parser)]
#[command(name = "billed")]
#[command(version, about = "Employee expense reports", long_about = None)]
struct Cli {
    /// Path to config directory (default: <config dir>/billed)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Session file holding the signed-in user
    #[arg(long, global = true, env = "BILLED_SESSION")]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your bills, newest first
    Bills,

    /// Submit a new bill with its receipt
    New {
        /// Receipt image (jpg, jpeg or png)
        #[arg(long)]
        file: PathBuf,

        /// Expense type, e.g. "Transports" or "Restaurants et bars"
        #[arg(long = "type", default_value = "Transports")]
        bill_type: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        amount: String,

        /// Expense date as YYYY-MM-DD
        #[arg(long)]
        date: String,

        #[arg(long)]
        vat: Option<String>,

        #[arg(long)]
        pct: Option<String>,

        #[arg(long)]
        commentary: Option<String>,
    },

    /// Print the route table
    Routes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = match cli.config_dir.clone() {
        Some(dir) => dir,
        None => config::config_dir()?,
    };
    let config = load_config(&config_dir)?.with_env_overrides()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Routes = cli.command {
        for route in Route::ALL {
            println!("{:<10} {}", format!("{:?}", route), route.path());
        }
        return Ok(());
    }

    let session_path = cli
        .session
        .clone()
        .unwrap_or_else(|| config.session_path(&config_dir));
    let session = load_session(&session_path)?;
    let state = AppState::from_config(&config, &config_dir, session)?;

    let navigator: Arc<dyn Navigator> = Arc::new(|path: &str| info!(path, "navigate"));

    match cli.command {
        Commands::Bills => {
            let document = Arc::new(HeadlessDocument::bills_page());
            let modal = Arc::new(DocumentModal::new(document.clone()));
            let controller = state.bills_controller(navigator, document, modal);
            let rows = controller
                .fetch_bills()
                .await
                .context("Could not load your bills")?;
            print_bills(&rows);
        }
        Commands::New {
            file,
            bill_type,
            name,
            amount,
            date,
            vat,
            pct,
            commentary,
        } => {
            let document = Arc::new(HeadlessDocument::new_bill_page());
            let controller = state.new_bill_controller(navigator, document.clone());

            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| anyhow!("Invalid receipt path: {}", file.display()))?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut selected = SelectedFile::new(file_name.clone(), bytes);
            if let Some(content_type) = content_type_for(&file_name) {
                selected = selected.with_content_type(content_type);
            }

            controller
                .on_file_changed(&mut FileChangeEvent::selected(selected))
                .await;
            if document.display(ERROR_MESSAGE) == Some(DisplayMode::Block) {
                bail!("Receipt must be a jpg, jpeg or png image: {}", file_name);
            }
            if controller.current_upload().is_none() {
                bail!("Receipt upload failed, see the log for details");
            }

            let form = FormData::new()
                .field(FIELD_TYPE, bill_type)
                .field(FIELD_NAME, name)
                .field(FIELD_AMOUNT, amount)
                .field(FIELD_DATE, date)
                .field(FIELD_VAT, vat.unwrap_or_default())
                .field(FIELD_PCT, pct.unwrap_or_default())
                .field(FIELD_COMMENTARY, commentary.unwrap_or_default());
            controller
                .on_form_submitted(&mut SubmitEvent::with_form(form))
                .await
                .context("Could not submit the bill")?;
            println!("Bill submitted.");
        }
        Commands::Routes => {}
    }

    Ok(())
}

fn print_bills(rows: &[FormattedBillRow]) {
    if rows.is_empty() {
        println!("No bills yet.");
        return;
    }
    println!(
        "{:<24} {:<20} {:<10} {:>10} {:<12} {}",
        "Type", "Nom", "Date", "Montant", "Statut", "Justificatif"
    );
    for row in rows {
        println!(
            "{:<24} {:<20} {:<10} {:>8.2} € {:<12} {}",
            row.bill_type.label(),
            row.name,
            row.date,
            row.amount,
            row.status_label,
            row.file_url.as_deref().unwrap_or("-")
        );
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    match file_extension(file_name)?.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}
