use std::process;

use clap::{Parser, Subcommand};
use hypermap_core::graph::NodeId;
use hypermap_core::pipeline::Payload;
use hypermap_core::{Config, HalFormat};

mod serve;

use serve::catalog::{Catalog, LAYER, SPATIAL_REFERENCE, WEB_MAP};
use serve::{AppState, ServeConfig};

#[derive(Parser)]
#[command(name = "hypermap")]
#[command(about = "HAL hypermedia server for a geospatial catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the catalog API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3333)]
        port: u16,
    },
    /// Print an enriched documentation sample of a resource
    Sample {
        /// Resource name: maps, layers or spatialreferences
        resource: String,
        /// Render one entity instead of the whole collection
        #[arg(long)]
        id: Option<i64>,
        /// Output format: json, xml, or a HAL media type
        #[arg(short, long, default_value = "json")]
        format: HalFormat,
    },
    /// Print the default configuration file
    Config,
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    setup_tracing();
    let cli = Cli::parse();

    if let Commands::Config = cli.command {
        print!("{}", Config::default_config_string());
        return;
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { port } => serve::start_server(ServeConfig { port, config }).await,
        Commands::Sample {
            resource,
            id,
            format,
        } => sample(config, &resource, id, format),
        Commands::Config => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Render the documentation sample for `resource` (or one of its entities).
fn sample(
    config: Config,
    resource: &str,
    id: Option<i64>,
    format: HalFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;
    let catalog = &state.catalog;
    let graph = catalog.graph().clone();

    let (type_name, ids, find): (&str, &[NodeId], fn(&Catalog, i64) -> Option<NodeId>) =
        match resource {
            "maps" => (WEB_MAP, catalog.maps(), Catalog::map),
            "layers" => (LAYER, catalog.layers(), Catalog::layer),
            "spatialreferences" => (
                SPATIAL_REFERENCE,
                catalog.spatial_references(),
                Catalog::spatial_reference,
            ),
            other => return Err(format!("unknown resource: {}", other).into()),
        };

    let mut url = format!(
        "{}/{}/{}",
        state.base_url.trim_end_matches('/'),
        state.pipeline.area(),
        resource
    );
    let payload = match id {
        Some(id) => {
            let node = find(catalog, id).ok_or_else(|| format!("{} {} not found", type_name, id))?;
            url = format!("{}/{}", url, id);
            Payload::entity(graph, node)
        }
        None => Payload::collection(graph, type_name, ids.to_vec()),
    };

    let output = state.pipeline.sample(&url, &payload, format)?;
    println!("{}", String::from_utf8_lossy(&output.body));
    Ok(())
}
