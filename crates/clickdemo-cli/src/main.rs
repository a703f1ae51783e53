use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use clickdemo_contracts::demos::{
    demo_url, now_utc_iso, remove_inputs, DemoReceipt, DemoStore, StageReceipt,
    RECEIPT_SCHEMA_VERSION,
};
use clickdemo_contracts::events::EventWriter;
use clickdemo_contracts::region::RegionCode;
use clickdemo_contracts::widget::{render_widget, WidgetConfig};
use clickdemo_engine::{client_from_config, EngineConfig, Pipeline, PipelineInputs, Stage};
use serde_json::json;

const MAX_CONTEXT_IMAGES: usize = 5;

#[derive(Debug, Parser)]
#[command(
    name = "clickdemo",
    version,
    about = "Turn a screenshot into a clickthrough demo page"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Create(CreateArgs),
    Widget(WidgetArgs),
}

#[derive(Debug, Parser)]
struct CreateArgs {
    /// Screenshot to recreate.
    #[arg(long)]
    image: PathBuf,
    /// Additional screenshots used only for style inference.
    #[arg(long = "context")]
    contexts: Vec<PathBuf>,
    #[arg(long)]
    contract_id: String,
    #[arg(long)]
    region: RegionCode,
    #[arg(long, default_value = "demos")]
    out: PathBuf,
    /// Event log file (defaults to `{events_dir}/{demo_id}.jsonl`).
    #[arg(long)]
    events: Option<PathBuf>,
    /// Directory for default event logs, outside `--out`.
    #[arg(long, default_value = "events")]
    events_dir: PathBuf,
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Public prefix for demo links (defaults to $BASE_URL).
    #[arg(long)]
    base_url: Option<String>,
    /// Delete the input images after the demo has been written.
    #[arg(long)]
    cleanup_inputs: bool,
}

#[derive(Debug, Parser)]
struct WidgetArgs {
    #[arg(long)]
    contract_id: String,
    #[arg(long)]
    region: RegionCode,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("clickdemo error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Create(args) => run_create(args),
        Command::Widget(args) => run_widget(args),
    }
}

fn run_create(args: CreateArgs) -> Result<i32> {
    if args.contexts.len() > MAX_CONTEXT_IMAGES {
        bail!(
            "at most {MAX_CONTEXT_IMAGES} context images are supported (got {})",
            args.contexts.len()
        );
    }
    let mut config = EngineConfig::from_env();
    if let Some(provider) = args.provider.as_deref() {
        config.provider = provider.trim().to_ascii_lowercase();
    }
    if let Some(model) = args.model.as_deref() {
        config.model = model.trim().to_string();
    }
    if let Some(base_url) = args.base_url.as_deref() {
        config.public_base_url = base_url.trim().to_string();
    }

    let widget = WidgetConfig::new(&args.contract_id, args.region)?;
    let client = client_from_config(&config)?;
    let store = DemoStore::new(&args.out);
    let demo_id = DemoStore::new_demo_id();
    let events = EventWriter::new(events_path(&args, &demo_id), demo_id.clone());

    println!(
        "Creating demo {demo_id} ({} context images, region {}, {} via {})",
        args.contexts.len(),
        args.region,
        client.model(),
        client.name()
    );
    let started_at = now_utc_iso();
    let inputs = PipelineInputs::from_paths(&args.image, &args.contexts, widget)?;
    let pipeline = Pipeline::new(&*client, config.retry_backoff, events);
    let outcome = pipeline.run(&inputs);
    for error in pipeline.event_log_errors() {
        eprintln!("warning: {error}");
    }
    let result = outcome?;
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }

    let receipt = DemoReceipt {
        schema_version: RECEIPT_SCHEMA_VERSION,
        demo_id: demo_id.clone(),
        contract_id: inputs.widget.contract_id().to_string(),
        region: args.region,
        provider: client.name().to_string(),
        model: client.model().to_string(),
        context_images: inputs.contexts.len(),
        stages: vec![
            StageReceipt {
                stage: Stage::Extraction.as_str().to_string(),
                attempts: result.extraction_attempts,
            },
            StageReceipt {
                stage: Stage::Synthesis.as_str().to_string(),
                attempts: result.synthesis_attempts,
            },
        ],
        warnings: result.warnings.clone(),
        html_bytes: result.page.as_str().len(),
        started_at,
        finished_at: now_utc_iso(),
    };
    let stored = store.write(result.page.as_str(), &receipt)?;

    if args.cleanup_inputs {
        let mut inputs_to_remove = vec![args.image.clone()];
        inputs_to_remove.extend(args.contexts.iter().cloned());
        remove_inputs(&inputs_to_remove)?;
    }

    println!(
        "Wrote {} after {} model calls",
        stored.index_path.display(),
        receipt.total_attempts()
    );
    let response = json!({
        "success": true,
        "demoId": stored.demo_id,
        "demoUrl": demo_url(&config.public_base_url, &stored.demo_id),
        "message": "Demo created successfully",
    });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(0)
}

fn events_path(args: &CreateArgs, demo_id: &str) -> PathBuf {
    args.events
        .clone()
        .unwrap_or_else(|| args.events_dir.join(format!("{demo_id}.jsonl")))
}

fn run_widget(args: WidgetArgs) -> Result<i32> {
    let widget = WidgetConfig::new(&args.contract_id, args.region)?;
    let snippet = render_widget(&widget);
    println!("<!-- before </head> -->\n{}\n", snippet.loader_tag);
    println!("<!-- in <body> -->\n{}\n", snippet.container);
    println!("<!-- before </body> -->\n{}", snippet.bootstrap_script);
    Ok(0)
}
