#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    AskInput, AskStrategy, ChatInput, ChatStrategy, CommandStrategy, HistoryAction, HistoryInput,
    HistoryStrategy, InfoStrategy, InitStrategy, ReplFeature, ReplStrategy, ServeInput,
    ServeStrategy, VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tutorbot_core::{Feature, GradeLevel, LearningSpeed, ToneProfile};

#[derive(Parser)]
#[command(name = "tutorbot")]
#[command(about = "tutorbot learning assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show configuration information
    Info,
    /// Show version
    Version,
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one feature once and print the result
    Ask {
        /// tutor, rewriter, leveler, proofreader, five-question, real-world,
        /// sentence-starters, study-habits or summarizer
        feature: Feature,
        #[arg(short, long)]
        grade: Option<GradeLevel>,
        /// Topic, goal or prompt
        #[arg(short, long)]
        topic: Option<String>,
        /// Text to transform
        #[arg(long)]
        text: Option<String>,
        /// PDF document to read instead of --text
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Learning speed: slow, average or fast
        #[arg(long)]
        speed: Option<LearningSpeed>,
        /// Proofreading tone: academic, casual or concise
        #[arg(long)]
        tone: Option<ToneProfile>,
        /// Summary conditions
        #[arg(long)]
        conditions: Option<String>,
        /// Additional tutor context
        #[arg(long)]
        context: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Multi-turn conversation with stored history
    Chat {
        #[arg(short, long)]
        feature: Feature,
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        thread: String,
        #[arg(short, long)]
        grade: GradeLevel,
        #[arg(long, default_value = "")]
        topic: String,
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Interactive loop for the leveler, rewriter or summarizer
    Repl {
        #[arg(value_enum)]
        feature: ReplFeature,
    },
    /// Inspect or clear stored conversations
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Print the turns of one conversation
    Show {
        feature: Feature,
        user: String,
        thread: String,
    },
    /// Delete the turns of one conversation
    Clear {
        feature: Feature,
        user: String,
        thread: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await?,
        Commands::Info => InfoStrategy.execute(()).await?,
        Commands::Version => VersionStrategy.execute(()).await?,
        Commands::Serve { host, port } => {
            ServeStrategy.execute(ServeInput { host, port }).await?;
        }
        Commands::Ask {
            feature,
            grade,
            topic,
            text,
            pdf,
            speed,
            tone,
            conditions,
            context,
            json,
        } => {
            AskStrategy
                .execute(AskInput {
                    feature,
                    grade,
                    topic,
                    text,
                    pdf,
                    speed,
                    tone,
                    conditions,
                    context,
                    json,
                })
                .await?;
        }
        Commands::Chat {
            feature,
            user,
            thread,
            grade,
            topic,
            message,
        } => {
            ChatStrategy
                .execute(ChatInput {
                    feature,
                    user_id: user,
                    thread_id: thread,
                    grade,
                    topic,
                    message,
                })
                .await?;
        }
        Commands::Repl { feature } => ReplStrategy.execute(feature).await?,
        Commands::History { action } => {
            let (action, feature, user_id, thread_id) = match action {
                HistoryCommand::Show {
                    feature,
                    user,
                    thread,
                } => (HistoryAction::Show, feature, user, thread),
                HistoryCommand::Clear {
                    feature,
                    user,
                    thread,
                } => (HistoryAction::Clear, feature, user, thread),
            };
            HistoryStrategy
                .execute(HistoryInput {
                    action,
                    feature,
                    user_id,
                    thread_id,
                })
                .await?;
        }
    }

    Ok(())
}
