use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;

use cohort_rs::engine::{InferenceEngine, SubjectSelector};
use cohort_rs::server;
use cohort_rs::store::{load_dataset, MemoryStore, SubjectStore};

use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP trigger surface
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Path to the YAML dataset to serve
        #[arg(short, long)]
        data: String,
    },
    /// Run inference once and print the report
    Infer {
        /// Which stage to run
        #[arg(value_enum)]
        stage: Stage,

        /// Path to the YAML dataset
        #[arg(short, long)]
        data: String,

        /// Restrict to one subject, by id or alias
        #[arg(short, long)]
        subject: Option<String>,

        /// Restrict the rule catalog to one domain
        #[arg(long)]
        domain: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Stage {
    /// Stage 1: feature values -> matched states
    States,
    /// Stage 2: persisted states -> matched behaviors
    Behaviors,
    /// Both stages in sequence
    All,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Serve { port, data } => {
            let store = load_dataset(&data).await?;
            log::info!("Loaded dataset from {}", data);
            server::serve(port, store).await?;
        }
        Commands::Infer {
            stage,
            data,
            subject,
            domain,
        } => {
            let store = load_dataset(&data).await?;
            let selector = match subject {
                Some(raw) => SubjectSelector::One(resolve_subject(&store, &raw).await?),
                None => SubjectSelector::All,
            };
            let engine = InferenceEngine::new(Arc::new(store.clone()), Arc::new(store));
            let domain = domain.as_deref();

            if matches!(stage, Stage::States | Stage::All) {
                let report = engine.run_state_inference(selector, domain).await?;
                let body: Vec<_> = report.iter().map(|s| s.to_body("states")).collect();
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            if matches!(stage, Stage::Behaviors | Stage::All) {
                let report = engine.run_behavior_inference(selector, domain).await?;
                let body: Vec<_> = report.iter().map(|s| s.to_body("behaviors")).collect();
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
        }
    }

    Ok(())
}

/// Accept a subject id, or an alias as a convenience for freshly loaded
/// datasets whose ids are minted at load time
async fn resolve_subject(
    store: &MemoryStore,
    raw: &str,
) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }

    let subjects = store.list_subjects(None, None).await?;
    subjects
        .iter()
        .find(|s| s.alias == raw)
        .map(|s| s.id)
        .ok_or_else(|| format!("No subject with id or alias '{}'", raw).into())
}
