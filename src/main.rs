//! progreval CLI: ontology-backed exercise design assistant.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use progreval::config::DesignConfig;
use progreval::design::{
    DesignSession, DesignView, DisplayRecord, SkillMatrix, SlotId, SlotOption, SlotPrompt,
};
use progreval::graph::ready::OntologyReady;
use progreval::graph::store::OntologyStore;
use progreval::graph::{GraphNode, vocab};
use progreval::paths::ProgrevalPaths;
use progreval::query::client::with_default_prefixes;
use progreval::query::GraphQueryClient;

#[derive(Parser)]
#[command(name = "progreval", version, about = "Programming exercise design assistant")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/progreval/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ontology file; overrides the configured one.
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    /// Ontology media type or short name (rdfxml, turtle, ntriples).
    #[arg(long, global = true)]
    media_type: Option<String>,

    /// Fixed shuffle seed for reproducible results.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List concepts, performances, audiences, correction-effort buckets and
    /// the formats in each bucket.
    Options,

    /// List competency levels for a concept.
    Competencies {
        /// Concept IRI or local name.
        #[arg(long)]
        concept: String,
    },

    /// Show the concept x performance prerequisite skill matrix.
    Matrix,

    /// Fill all five slots and fetch example exercises.
    Design {
        /// Concept IRI or local name.
        #[arg(long)]
        concept: String,
        /// Competency level IRI or local name.
        #[arg(long)]
        competency: String,
        /// Performance IRI or local name.
        #[arg(long)]
        performance: String,
        /// Target audience IRI or local name.
        #[arg(long)]
        audience: String,
        /// Activity format IRI or local name.
        #[arg(long)]
        format: String,
        /// Skill the learners already have (repeatable).
        #[arg(long)]
        possess: Vec<String>,
        /// Learners have every skill in the matrix.
        #[arg(long)]
        possess_all: bool,
        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run an ad-hoc SELECT query; standard prefixes are added when missing.
    Query {
        /// Read the query from a file.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Query text.
        #[arg(long)]
        text: Option<String>,
    },
}

/// Prints slot lists as they arrive; quiet unless asked to list.
struct TerminalView {
    list_slots: bool,
}

impl DesignView for TerminalView {
    fn slot_populated(&mut self, slot: SlotId, options: &[SlotOption]) {
        if !self.list_slots {
            return;
        }
        println!("{} ({}):", capitalized(slot.name()), options.len());
        for option in options {
            print_option("  ", option);
        }
    }

    fn slot_prompt(&mut self, slot: SlotId, prompt: SlotPrompt) {
        if let SlotPrompt::Failed(message) = prompt {
            eprintln!("{slot}: {message}");
        }
    }

    fn matrix_ready(&mut self, matrix: &SkillMatrix) {
        tracing::debug!(skills = matrix.populated(), "skill matrix ready");
    }

    fn results(&mut self, _rows: &[DisplayRecord]) {}

    fn validity(&mut self, can_submit: bool) {
        tracing::debug!(can_submit, "validity changed");
    }
}

fn print_option(indent: &str, option: &SlotOption) {
    match &option.description {
        Some(desc) => println!("{indent}{} <{}> - {}", option.label, option.uri, desc),
        None => println!("{indent}{} <{}>", option.label, option.uri),
    }
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Full IRI, or a local name in the progreval namespace.
fn resolve_node(arg: &str) -> Result<GraphNode> {
    if arg.contains(':') {
        Ok(GraphNode::parse(arg)?)
    } else {
        Ok(vocab::progreval(arg))
    }
}

fn load_config(cli: &Cli) -> Result<DesignConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => ProgrevalPaths::resolve()?.config_file(),
    };
    let mut config = DesignConfig::load_or_default(&path)?;
    if let Some(ontology) = &cli.ontology {
        config.ontology_path = Some(ontology.clone());
    }
    if let Some(media_type) = &cli.media_type {
        config.media_type = media_type.clone();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

type Session = DesignSession<OntologyStore, TerminalView>;

/// Load the ontology and bring up an initialized session.
async fn open_session(config: &DesignConfig, list_slots: bool) -> Result<Session> {
    let Some(path) = &config.ontology_path else {
        miette::bail!(
            help = "pass --ontology or set `ontology_path` in the config file",
            "no ontology configured"
        );
    };

    let (ready, mut listener) = OntologyReady::new();
    let store = OntologyStore::in_memory()?;
    store.load_file(path, &config.base_iri, &config.media_type)?;
    ready.mark_loaded();

    let client = match config.seed {
        Some(seed) => GraphQueryClient::with_seed(store, seed),
        None => GraphQueryClient::new(store),
    };
    let mut session = DesignSession::new(client, config.catalog()?, TerminalView { list_slots })
        .with_max_results(config.max_results);
    session.start(&mut listener).await?;
    Ok(session)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Options => {
            let session = open_session(&config, true).await?;
            let state = session.state();
            println!("Format ({}):", state.formats().len());
            for effort in state.slot(SlotId::Effort).options() {
                println!("  {}:", effort.label);
                for format in state.formats().iter().filter(|f| f.group.as_ref() == Some(&effort.uri)) {
                    print_option("    ", format);
                }
            }
            let efforts = state.slot(SlotId::Effort).options();
            let ungrouped: Vec<&SlotOption> = state
                .formats()
                .iter()
                .filter(|f| !f.group.as_ref().is_some_and(|g| efforts.iter().any(|e| &e.uri == g)))
                .collect();
            if !ungrouped.is_empty() {
                println!("  (no correction effort):");
                for format in ungrouped {
                    print_option("    ", format);
                }
            }
        }

        Commands::Competencies { concept } => {
            let concept = resolve_node(&concept)?;
            let mut session = open_session(&config, false).await?;
            session.view_mut().list_slots = true;
            session.select_concept(Some(concept)).await?;
        }

        Commands::Matrix => {
            let session = open_session(&config, false).await?;
            let matrix = session.state().matrix();
            if matrix.is_empty() {
                println!("No concepts or performances in the ontology.");
            } else {
                let header: Vec<&str> = matrix.concepts().iter().map(|c| c.label.as_str()).collect();
                println!("performance \\ concept\t{}", header.join("\t"));
                for (p, performance) in matrix.performances().iter().enumerate() {
                    let cells: Vec<&str> = (0..matrix.concepts().len())
                        .map(|c| matrix.cell(p, c).map_or("-", |skill| skill.local_name()))
                        .collect();
                    println!("{}\t{}", performance.label, cells.join("\t"));
                }
                println!("\n{} prerequisite skills", matrix.populated());
            }
        }

        Commands::Design {
            concept,
            competency,
            performance,
            audience,
            format,
            possess,
            possess_all,
            json,
        } => {
            let format = resolve_node(&format)?;
            let mut session = open_session(&config, false).await?;

            session.select_concept(Some(resolve_node(&concept)?)).await?;
            session
                .select(SlotId::Competency, Some(resolve_node(&competency)?))
                .await?;
            session
                .select(SlotId::Performance, Some(resolve_node(&performance)?))
                .await?;
            session
                .select(SlotId::Audience, Some(resolve_node(&audience)?))
                .await?;

            // Formats are listed per correction-effort bucket.
            let effort = session
                .state()
                .formats()
                .iter()
                .find(|f| f.uri == format)
                .and_then(|f| f.group.clone());
            let Some(effort) = effort else {
                miette::bail!(
                    help = "run `progreval options` to see the available formats",
                    "format {} not found or has no correction effort",
                    format
                );
            };
            session.select_effort(Some(effort))?;
            session.select(SlotId::Format, Some(format)).await?;

            if let Some(description) = session.competency_description() {
                println!("Competency level: {description}\n");
            }

            let checklist = session.checklist_mut();
            if possess_all {
                checklist.set_all(true);
            }
            for skill in &possess {
                let skill = resolve_node(skill)?;
                if checklist.set_skill(&skill, true) == 0 {
                    tracing::warn!(skill = %skill, "skill not in the prerequisite matrix");
                }
            }

            let rows = session.submit().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
            } else if rows.is_empty() {
                println!("No example exercises match.");
            } else {
                for (i, row) in rows.iter().enumerate() {
                    println!("Exercise {}:", i + 1);
                    for field in &row.fields {
                        println!("  {}: {}", field.label, field.value.text());
                    }
                }
            }
        }

        Commands::Query { file, text } => {
            let raw = match (file, text) {
                (Some(path), _) => std::fs::read_to_string(&path).into_diagnostic()?,
                (None, Some(text)) => text,
                (None, None) => miette::bail!("provide --file or --text"),
            };
            let session = open_session(&config, false).await?;
            let output = session.client().run(&with_default_prefixes(&raw)).await?;

            println!("{}", output.variables.join("\t"));
            for row in &output.rows {
                let values: Vec<&str> = output
                    .variables
                    .iter()
                    .map(|v| row.value(v).unwrap_or(""))
                    .collect();
                println!("{}", values.join("\t"));
            }
            println!("\n{} rows", output.rows.len());
        }
    }

    Ok(())
}
