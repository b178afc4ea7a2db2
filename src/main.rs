use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use meteo_agent::adk::agent::AgentEvent;
use meteo_agent::adk::model::gemini::KNOWN_MODELS;
use meteo_agent::meteo::config::{SessionConfig, DEFAULT_MODEL};
use meteo_agent::meteo::session::{Reply, Session, GREETING};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Gemini model id
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(short, long, global = true)]
    temperature: Option<f32>,

    /// Maximum model calls per question
    #[arg(long, global = true)]
    max_iterations: Option<u32>,

    /// Print thoughts, tool calls and observations as they happen
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question to send
        #[arg(short, long)]
        prompt: String,
    },
    /// Start an interactive conversation
    Chat,
    /// List the known model ids
    Models,
}

fn load_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let config = match &args.config {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let mut config = config.apply_env()?;

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::Thought(thought) => println!("  [thought] {}", thought),
        AgentEvent::ToolCall { name, input } => println!("  [action] {}({})", name, input),
        AgentEvent::ToolResult { name, observation } => {
            println!("  [observation from {}] {}", name, observation)
        }
        // Printed by the caller
        AgentEvent::Answer(_) | AgentEvent::Error(_) => {}
    }
}

async fn run_turn(session: &mut Session, input: &str, verbose: bool) -> Reply {
    if !verbose {
        return session.ask(input).await;
    }

    let (tx, mut rx) = mpsc::channel(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });
    let reply = session.ask_stream(input, tx).await;
    // The sender is gone once the turn ends, so the printer drains and stops
    let _ = printer.await;
    reply
}

async fn chat(session: &mut Session, verbose: bool) -> anyhow::Result<()> {
    println!("{}", GREETING);
    println!("(type /clear to forget the conversation, /quit to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("Conversation cleared.");
                println!("{}", GREETING);
            }
            _ => {
                let reply = run_turn(session, input, verbose).await;
                println!("{}", reply.text);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match &args.command {
        Commands::Models => {
            for model in KNOWN_MODELS {
                let marker = if *model == DEFAULT_MODEL { " (default)" } else { "" };
                println!("{}{}", model, marker);
            }
        }
        Commands::Ask { prompt } => {
            let config = load_config(&args)?;
            let mut session = Session::connect(&config)?;
            let reply = run_turn(&mut session, prompt, args.verbose).await;
            println!("{}", reply.text);
            if let Some(e) = reply.error {
                return Err(anyhow::Error::new(e).context("the question could not be answered"));
            }
        }
        Commands::Chat => {
            let config = load_config(&args)?;
            let mut session = Session::connect(&config)?;
            log::info!("Chat session {}", session.id());
            chat(&mut session, args.verbose).await?;
        }
    }

    Ok(())
}
