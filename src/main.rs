use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use action_recorder::browser::{build_document, BrowserSession, RawCdpTrees, Viewport};
use action_recorder::{create_action, ActionFields, ActionType, Document, DomView, NodeId, SelectorSettings};

#[derive(Debug, Parser)]
#[command(name = "action-recorder", version, about = "Generate a recorded action for one element of a page")]
#[command(group(ArgGroup::new("source").required(true).args(["html", "snapshot", "url"])))]
#[command(group(ArgGroup::new("element").required(true).args(["target", "backend_node_id"])))]
struct Cli {
    /// HTML file to load
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,
    /// Stored CDP capture (JSON with domRoot and snapshot)
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
    /// Page to load in Chrome
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// XPath selecting the target element (first match is used)
    #[arg(long, value_name = "XPATH")]
    target: Option<String>,
    /// CDP backend node id of the target element
    #[arg(long, value_name = "ID")]
    backend_node_id: Option<i64>,
    /// Action to record
    #[arg(long, default_value = "click")]
    action: ActionType,
    /// Text for `type` actions
    #[arg(long)]
    text: Option<String>,
    /// Option value for `select` actions; repeatable
    #[arg(long = "value")]
    values: Vec<String>,
    /// Settings JSON file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Write the CDP capture of --url to this file
    #[arg(long, value_name = "FILE", requires = "url")]
    save_snapshot: Option<PathBuf>,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
    /// Verbose selector generation logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug && std::env::var_os("RUST_LOG").is_none() {
        EnvFilter::new("action_recorder=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    dotenvy::dotenv().ok();

    let mut settings = match &cli.settings {
        Some(path) => SelectorSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?
            .with_env_overrides(),
        None => SelectorSettings::from_env(),
    };
    if cli.debug {
        settings.debug_mode = true;
    }

    let doc = load_document(&cli).await?;
    let element = resolve_target(&doc, &cli)?;
    tracing::info!("Target element: <{}>", doc.tag_name(element));

    let fields = ActionFields {
        text: cli.text.clone(),
        values: (!cli.values.is_empty()).then(|| cli.values.clone()),
        ..Default::default()
    };
    let action = create_action(&doc, element, cli.action, &settings, fields);
    println!("{}", serde_json::to_string_pretty(&action)?);
    Ok(())
}

async fn load_document(cli: &Cli) -> Result<Document> {
    if let Some(path) = &cli.html {
        let source = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Document::parse_html(&source));
    }

    if let Some(path) = &cli.snapshot {
        let source = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let raw: RawCdpTrees =
            serde_json::from_str(&source).with_context(|| format!("Invalid CDP capture in {}", path.display()))?;
        return build_document(&raw);
    }

    let url = cli.url.as_deref().ok_or_else(|| anyhow!("No document source given"))?;
    let session = BrowserSession::launch(!cli.headed, Viewport::default()).await?;
    let captured = async {
        session.navigate(url).await?;
        session.capture_raw().await
    }
    .await;
    session.close().await?;
    let raw = captured?;

    if let Some(path) = &cli.save_snapshot {
        std::fs::write(path, serde_json::to_string_pretty(&raw)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Saved capture to {}", path.display());
    }
    build_document(&raw)
}

fn resolve_target(doc: &Document, cli: &Cli) -> Result<NodeId> {
    if let Some(backend_id) = cli.backend_node_id {
        return doc
            .node_by_backend_id(backend_id)
            .filter(|&n| doc.is_element(n))
            .ok_or_else(|| anyhow!("No element with backend node id {}", backend_id));
    }

    let xpath = cli.target.as_deref().ok_or_else(|| anyhow!("No target given"))?;
    let matches = doc
        .evaluate_xpath(doc.root(), xpath)
        .map_err(|e| anyhow!("Invalid target XPath {}: {}", xpath, e))?;
    if matches.len() > 1 {
        tracing::warn!("Target XPath matched {} elements, using the first", matches.len());
    }
    matches
        .into_iter()
        .find(|&n| doc.is_element(n))
        .ok_or_else(|| anyhow!("Target XPath {} matched no element", xpath))
}
