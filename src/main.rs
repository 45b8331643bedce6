use clap::{Parser, Subcommand};
use fermentation_monitor::{
    AppState, FermentationPipeline, HttpQueryClient, Settings, TwilioTransport,
    server::handle_request,
    shaping::{render_table, shape},
};
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fermentation-monitor", version, about = "Fermentation process monitoring API")]
struct Args {
    /// Optional YAML settings file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the detail tables of every fermentation process of an entity
    Report {
        #[arg(default_value = "tempeh")]
        name: String,
    },
}

#[derive(Clone)]
// An Executor that uses the tokio runtime.
pub struct TokioExecutor;

impl<F> hyper::rt::Executor<F> for TokioExecutor
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    fn execute(&self, fut: F) {
        tokio::task::spawn(fut);
    }
}

fn load_dotenv() {
    // A missing .env is fine; the environment may already be populated.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    load_dotenv();
    setup_tracing();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    info!(
        endpoint = settings.endpoint.url.as_deref().unwrap_or("<unset>"),
        secret_loaded = settings.endpoint.secret.is_some(),
        "settings loaded"
    );

    let pipeline = FermentationPipeline::new(Box::new(HttpQueryClient::new(&settings.endpoint)))?;

    match args.command {
        Command::Report { name } => report(&pipeline, &name).await,
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            let state = Arc::new(AppState {
                pipeline,
                transport: Box::new(TwilioTransport::new(settings.messaging.api_base.clone())),
                messaging: settings.messaging.clone(),
            });
            serve(&settings, state).await
        }
    }
}

async fn report(pipeline: &FermentationPipeline, name: &str) -> Result<(), Box<dyn Error>> {
    let Some(entity) = pipeline.resolve_entity(name).await else {
        warn!(entity = name, "entity not found");
        return Ok(());
    };
    println!("Entity '{}' id: {}", entity.name, entity.id);

    for process_id in pipeline.list_processes(entity.id).await {
        println!("\nFermentation process {}", process_id);
        let details = pipeline.fetch_details(process_id).await;
        match render_table(&shape(&details)) {
            Some(table) => println!("{}", table),
            None => println!("Sin datos de detalle para este proceso."),
        }
    }
    Ok(())
}

async fn serve(settings: &Settings, state: Arc<AppState>) -> Result<(), Box<dyn Error>> {
    let addr = settings.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Fermentation API listening on http://{}", addr);

    loop {
        let (stream, remote) = listener.accept().await?;
        let io = TokioIo::new(stream);

        let state_clone = Arc::clone(&state);

        let executor = TokioExecutor;

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let state = state_clone.clone();
                handle_request(req, state)
            });

            if let Err(e) = hyper_util::server::conn::auto::Builder::new(executor)
                .serve_connection(io, service)
                .await
            {
                error!(%remote, "Error processing connection: {}", e);
            }
        });
    }
}
