use std::path::PathBuf;
use std::sync::Arc;

use claudeotel_core::{
    client::{AnthropicClient, NullClient},
    config::{Config, TelemetryCfg},
    instrumentation::AnthropicInstrumentor,
    model::{CompletionRequest, Message, MessagesRequest},
    providers::anthropic::Anthropic,
};
use clap::{Parser, Subcommand};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about = "Traced Anthropic API smoke tool", long_about = None)]
struct Cli {
    /// JSON or TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the offline null client instead of the Anthropic API
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a legacy text completion request
    Complete {
        #[arg(long)]
        model: String,
        #[arg(short, long, help = "Prompt text")]
        prompt: String,
        #[arg(long, default_value_t = 256)]
        max_tokens: u32,
    },
    /// Send a messages request
    Message {
        #[arg(long)]
        model: String,
        #[arg(short, long, help = "Message from the user")]
        message: String,
        #[arg(long, default_value_t = 256)]
        max_tokens: u32,
    },
    /// Count tokens for a piece of text
    Count {
        #[arg(long)]
        model: String,
        #[arg(short, long, help = "Text to count")]
        text: String,
    },
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn init_tracer_provider(cfg: &TelemetryCfg) -> anyhow::Result<SdkTracerProvider> {
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(cfg.service_name.clone())
        .build();
    let builder = SdkTracerProvider::builder().with_resource(resource);

    let Some(endpoint) = cfg.otlp_endpoint.as_deref() else {
        debug!("no otlp_endpoint configured; spans are not exported");
        return Ok(builder.build());
    };

    use opentelemetry_otlp::WithExportConfig as _;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create OTLP span exporter: {e}"))?;
    info!(endpoint, "exporting spans over OTLP");
    Ok(builder.with_batch_exporter(exporter).build())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let provider = init_tracer_provider(&cfg.telemetry)?;
    opentelemetry::global::set_tracer_provider(provider.clone());

    let instrumentor = AnthropicInstrumentor::with_trace_content(cfg.telemetry.trace_content);
    instrumentor.install_with_provider(&provider)?;

    let inner: Arc<dyn AnthropicClient> = if cli.offline {
        Arc::new(NullClient)
    } else {
        Arc::new(Anthropic::from_config(&cfg)?)
    };
    let client = instrumentor.wrap(inner);

    let outcome = run(&client, cli.command).await;

    instrumentor.remove()?;
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "tracer provider shutdown failed");
    }
    outcome
}

async fn run(client: &dyn AnthropicClient, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Complete {
            model,
            prompt,
            max_tokens,
        } => {
            let resp = client
                .create_completion(CompletionRequest::new(model, prompt, max_tokens))
                .await?;
            println!("{}", resp.completion);
            if let Some(reason) = resp.stop_reason {
                eprintln!("[stop: {reason}]");
            }
        }
        Commands::Message {
            model,
            message,
            max_tokens,
        } => {
            let req = MessagesRequest::new(model, vec![Message::user(message)], max_tokens);
            let resp = client.create_message(req).await?;
            for block in &resp.content {
                if let Some(text) = block.text() {
                    println!("{text}");
                }
            }
            if let Some(usage) = resp.usage {
                eprintln!(
                    "[usage: input={} output={}]",
                    usage.input_tokens, usage.output_tokens
                );
            }
        }
        Commands::Count { model, text } => {
            let n = client.count_tokens(&model, &text).await?;
            println!("{n}");
        }
    }
    Ok(())
}
