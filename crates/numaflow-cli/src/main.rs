//! Unified `numaflow` CLI: dispatches to the ISB buffer lifecycle commands,
//! the pipeline controller, the vertex processor bootstrap, and built-in UDF
//! invocation, in the idiom of the teacher's `sr-oracles` binary (global
//! args + per-subcommand args, `env = "..."` fallbacks, and a final
//! `eprintln!` of the error chain on failure).

use clap::{Parser, Subcommand};
use tracing::info;

use numaflow_cli::commands::{self, BufferOp};

#[derive(Parser)]
#[command(name = "numaflow")]
#[command(about = "Numaflow control plane and data plane entry point", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the buffers for a pipeline's edges, idempotently.
    IsbsvcBufferCreate(BufferArgs),

    /// Delete the buffers for a pipeline's edges, idempotently.
    IsbsvcBufferDelete(BufferArgs),

    /// Validate that a pipeline's buffers exist with the expected configuration.
    IsbsvcBufferValidate(BufferArgs),

    /// Run the Pipeline reconciler manager.
    Controller,

    /// Bootstrap a vertex processor: decode its environment, wire up
    /// readers/writers. Does not enter the processing loop.
    Processor {
        /// Which runtime role this vertex plays.
        #[arg(long, value_enum)]
        r#type: ProcessorType,
    },

    /// Invoke a built-in UDF directly against a JSON-encoded batch, useful
    /// for local testing of a built-in without standing up a pipeline.
    BuiltinUdf {
        /// Built-in UDF name (currently only `cat` is implemented).
        #[arg(long)]
        name: String,

        /// JSON array of `{header, body}` messages, body as a UTF-8 string.
        #[arg(long)]
        args: String,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ProcessorType {
    Source,
    Udf,
    Sink,
}

#[derive(clap::Args)]
struct BufferArgs {
    /// Which ISB service backend to target.
    #[arg(long = "isbsvc-type")]
    isbsvc_type: String,

    /// Comma-separated buffer names.
    #[arg(long)]
    buffers: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Commands::IsbsvcBufferCreate(args) => {
            commands::isbsvc_buffer_command(&args.isbsvc_type, &args.buffers, BufferOp::Create).await
        }
        Commands::IsbsvcBufferDelete(args) => {
            commands::isbsvc_buffer_command(&args.isbsvc_type, &args.buffers, BufferOp::Delete).await
        }
        Commands::IsbsvcBufferValidate(args) => {
            commands::isbsvc_buffer_command(&args.isbsvc_type, &args.buffers, BufferOp::Validate).await
        }
        Commands::Controller => {
            let config = numaflow_controller::ControllerConfig::from_env();
            numaflow_controller::run(config).await
        }
        Commands::Processor { r#type } => {
            let (processor_env, wiring) = numaflow_processor::bootstrap().await?;
            info!(
                vertex = %processor_env.vertex.name,
                readers = wiring.readers.len(),
                writers = wiring.writers.len(),
                requested_type = ?r#type,
                "processor bootstrap complete"
            );
            Ok(())
        }
        Commands::BuiltinUdf { name, args } => {
            let result = commands::builtin_udf_command(&name, &args)?;
            println!("{result}");
            Ok(())
        }
    }
}
