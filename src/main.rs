//! StitchFlow - merchandising tracker for garment production.
//!
//! Tracks styles through the 16-stage workflow, shows which teammates are
//! on a project, and relays questions to the advisory model.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stitchflow::core::{system_clock, Clock, Config, SharedClock};
use stitchflow::model::{NewProject, Project, ProjectPatch, StepPatch, StepStatus};
use stitchflow::presence::{PresenceSession, PresenceTiming, StorageMedium};
use stitchflow::store::{FileStore, ProfileStore, ProjectStore, SharedStorage};

/// Merchandising tracker for garment production workflows
#[derive(Parser)]
#[command(name = "stitchflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding profile, project and presence documents
    #[arg(long, global = true, env = "STITCHFLOW_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tracked styles (default)
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a style's workflow, todos and notes
    Show {
        /// Project id
        id: String,
    },

    /// Add a new style with a fresh workflow
    Add(AddArgs),

    /// Update a workflow step
    Step {
        /// Project id
        id: String,

        /// Step index (0-15)
        index: usize,

        /// New status (pending, in_progress, completed, rejected, approved)
        #[arg(short, long)]
        status: Option<StepStatus>,

        /// New due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,

        /// Comment on the step
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Append a note to a step's record log
    Record {
        /// Project id
        id: String,

        /// Step index (0-15)
        index: usize,

        /// Note text
        note: String,

        /// Image URL to attach
        #[arg(long)]
        image: Option<String>,
    },

    /// Move a style's current stage pointer
    Advance {
        /// Project id
        id: String,

        /// Step index (0-15)
        index: usize,
    },

    /// Manage a style's todo planner
    Todo {
        #[command(subcommand)]
        operation: TodoOperation,
    },

    /// Flag or unflag a style as urgent
    Urgent {
        /// Project id
        id: String,

        /// Clear the urgent flag instead
        #[arg(long)]
        off: bool,
    },

    /// Replace a style's merchandiser notes
    Notes {
        /// Project id
        id: String,

        /// Note text
        text: String,
    },

    /// Show or edit the local profile
    Profile {
        #[command(subcommand)]
        operation: Option<ProfileOperation>,
    },

    /// Announce presence on a style and watch who else is there
    Presence {
        /// Project id
        id: String,

        /// Section being edited (general_notes, tech_remarks, records_input)
        #[arg(short, long)]
        section: Option<String>,

        /// How long to stay present
        #[arg(long, default_value = "30")]
        seconds: u64,
    },

    /// Ask the advisory model
    Ai {
        #[command(subcommand)]
        operation: AiOperation,
    },

    /// Show the effective configuration
    Config {
        /// Write the loaded configuration to the global config file
        #[arg(long)]
        save: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
struct AddArgs {
    /// Style name
    #[arg(long)]
    style: String,

    /// Style number
    #[arg(long)]
    number: String,

    /// Buyer name
    #[arg(long)]
    buyer: String,

    /// Season (e.g. "Autumn 24")
    #[arg(long, default_value = "")]
    season: String,

    /// Order quantity
    #[arg(long, default_value = "0")]
    quantity: u32,

    /// Ship date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    ship_date: String,

    /// Product image URL
    #[arg(long)]
    image: Option<String>,
}

#[derive(Subcommand)]
enum TodoOperation {
    /// Add a task
    Add {
        /// Project id
        id: String,

        /// Task text
        task: String,
    },

    /// Toggle a task's completion
    Toggle {
        /// Project id
        id: String,

        /// Todo id
        todo: String,
    },
}

#[derive(Subcommand)]
enum ProfileOperation {
    /// Show the profile
    Show,

    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        role: Option<String>,

        /// Display colour (#RRGGBB)
        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        admin: Option<bool>,
    },
}

#[derive(Subcommand)]
enum AiOperation {
    /// Free-form question about the portfolio
    Advise {
        /// The question
        prompt: String,
    },

    /// Interactive advisor chat on stdin
    Chat,

    /// Production risk analysis for a style
    Risks { id: String },

    /// Analysis for a step (costing help at the costing stage, risks otherwise)
    Analyze { id: String, index: usize },

    /// Follow-up message drafts for a delayed step
    FollowUp { id: String, index: usize },

    /// FOB costing breakdown
    Costing { id: String },

    /// Action plan for an urgent style
    Urgency { id: String },

    /// Trend feed for the active styles
    Feed,

    /// Evaluate merchandising activity
    Evaluate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let _ = dotenvy::dotenv();

    let loaded = Config::load()?;
    let mut config = loaded.clone();
    if let Some(dir) = cli.data_dir {
        config.general.data_dir = Some(dir);
    }

    match cli.command {
        None => cmd_list(&config, "text")?,
        Some(Commands::List { format }) => cmd_list(&config, &format)?,
        Some(Commands::Show { id }) => cmd_show(&config, &id)?,
        Some(Commands::Add(args)) => cmd_add(&config, args)?,
        Some(Commands::Step { id, index, status, due, comment }) => {
            let patch = StepPatch { status, due_date: due, comment, ..StepPatch::default() };
            with_project(&config, &id, |store| store.update_step(&id, index, patch))?;
            cmd_show(&config, &id)?;
        }
        Some(Commands::Record { id, index, note, image }) => {
            with_project(&config, &id, |store| store.add_step_record(&id, index, &note, image))?;
        }
        Some(Commands::Advance { id, index }) => {
            with_project(&config, &id, |store| store.set_current_step(&id, index))?;
        }
        Some(Commands::Todo { operation }) => cmd_todo(&config, operation)?,
        Some(Commands::Urgent { id, off }) => {
            with_project(&config, &id, |store| store.update_project(&id, ProjectPatch::urgent(!off)))?;
        }
        Some(Commands::Notes { id, text }) => {
            with_project(&config, &id, |store| store.update_project(&id, ProjectPatch::notes(text)))?;
        }
        Some(Commands::Profile { operation }) => cmd_profile(&config, operation)?,
        Some(Commands::Presence { id, section, seconds }) => {
            cmd_presence(&config, &id, section.as_deref(), seconds)?;
        }
        Some(Commands::Ai { operation }) => cmd_ai(&config, operation)?,
        Some(Commands::Config { save }) => {
            if save {
                let path = loaded.save()?;
                println!("Saved configuration to {}", path.display());
                return Ok(());
            }
            let mut shown = config.clone();
            if shown.ai.api_key.is_some() {
                shown.ai.api_key = Some("********".to_string());
            }
            println!("{}", toml::to_string_pretty(&shown)?);
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "stitchflow", &mut io::stdout());
        }
    }

    Ok(())
}

/// Open the file-backed storage in the configured data directory.
fn open_storage(config: &Config) -> Result<SharedStorage> {
    let dir = config.data_dir().context("Could not determine data directory")?;
    let store = FileStore::open(&dir)
        .with_context(|| format!("Could not open data directory {}", dir.display()))?;
    tracing::debug!(dir = %dir.display(), "Opened storage");
    Ok(Arc::new(store))
}

fn load_projects(config: &Config, clock: SharedClock) -> Result<ProjectStore> {
    Ok(ProjectStore::load(open_storage(config)?, clock))
}

/// Run an update against an existing project, failing if it does not exist.
fn with_project(config: &Config, id: &str, update: impl FnOnce(&mut ProjectStore)) -> Result<()> {
    let mut store = load_projects(config, system_clock())?;
    if store.get(id).is_none() {
        anyhow::bail!("No project with id '{id}'");
    }
    update(&mut store);
    Ok(())
}

fn find<'a>(store: &'a ProjectStore, id: &str) -> Result<&'a Project> {
    store.get(id).with_context(|| format!("No project with id '{id}'"))
}

fn cmd_list(config: &Config, format: &str) -> Result<()> {
    let store = load_projects(config, system_clock())?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(store.projects())?);
        return Ok(());
    }

    let stats = store.stats();
    println!(
        "Tracking {} styles ({} urgent, {} overdue steps, {} open todos)\n",
        stats.projects, stats.urgent, stats.overdue_steps, stats.open_todos
    );
    for p in store.projects() {
        println!(
            "{:<16} {:<22} {:<18} {:>6} pcs  ship {:<10}  {:>3}%  {}{}",
            p.id,
            p.style_name,
            p.buyer_name,
            p.quantity,
            p.ship_date,
            p.progress_percent(),
            p.current_stage_label(),
            if p.is_urgent { "  [URGENT]" } else { "" }
        );
    }
    Ok(())
}

fn cmd_show(config: &Config, id: &str) -> Result<()> {
    let clock = system_clock();
    let today = clock.today();
    let store = load_projects(config, clock)?;
    let p = find(&store, id)?;

    println!("{} ({}) for {}", p.style_name, p.style_number, p.buyer_name);
    println!("Season {}, {} pcs, ship {}", p.season, p.quantity, p.ship_date);
    if p.is_urgent {
        println!("URGENT");
    }
    println!("Progress {}%\n", p.progress_percent());

    for (idx, step) in p.workflow.iter().enumerate() {
        let marker = if idx == p.current_step_index { ">" } else { " " };
        let overdue = if step.is_overdue(today) { " OVERDUE" } else { "" };
        println!(
            "{marker} {idx:>2}. {:<28} {:<12} due {}{overdue}",
            step.label,
            step.status.as_str(),
            step.due_date.as_deref().unwrap_or("-"),
        );
        for record in &step.records {
            println!("        [{}] {}", record.timestamp, record.note);
        }
    }

    if !p.todo_items.is_empty() {
        println!("\nTodos:");
        for todo in &p.todo_items {
            let check = if todo.completed { "x" } else { " " };
            println!("  [{check}] {} ({}) {}", todo.task, todo.priority, todo.id);
        }
    }
    if !p.merchandiser_notes.is_empty() {
        println!("\nNotes:\n  {}", p.merchandiser_notes);
    }
    Ok(())
}

fn cmd_add(config: &Config, args: AddArgs) -> Result<()> {
    let mut store = load_projects(config, system_clock())?;
    let id = store.add_project(NewProject {
        style_name: args.style,
        style_number: args.number,
        buyer_name: args.buyer,
        season: args.season,
        quantity: args.quantity,
        ship_date: args.ship_date,
        product_image_url: args.image,
    });
    println!("{id}");
    Ok(())
}

fn cmd_todo(config: &Config, operation: TodoOperation) -> Result<()> {
    match operation {
        TodoOperation::Add { id, task } => {
            let mut store = load_projects(config, system_clock())?;
            find(&store, &id)?;
            match store.add_todo(&id, &task) {
                Some(todo) => println!("{todo}"),
                None => anyhow::bail!("Task text is empty"),
            }
        }
        TodoOperation::Toggle { id, todo } => {
            with_project(config, &id, |store| store.toggle_todo(&id, &todo))?;
        }
    }
    Ok(())
}

fn cmd_profile(config: &Config, operation: Option<ProfileOperation>) -> Result<()> {
    let profiles = ProfileStore::new(open_storage(config)?);

    let profile = match operation {
        None | Some(ProfileOperation::Show) => profiles.load(),
        Some(ProfileOperation::Set { name, email, phone, role, color, admin }) => {
            profiles.update(|p| {
                if let Some(v) = name {
                    p.name = v;
                }
                if let Some(v) = email {
                    p.email = v;
                }
                if let Some(v) = phone {
                    p.phone = v;
                }
                if let Some(v) = role {
                    p.company_role = v;
                }
                if let Some(v) = color {
                    p.color = Some(v);
                }
                if let Some(v) = admin {
                    p.is_admin = v;
                }
            })?
        }
    };

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

/// Handle the presence command.
fn cmd_presence(config: &Config, id: &str, section: Option<&str>, seconds: u64) -> Result<()> {
    let storage = open_storage(config)?;
    find(&ProjectStore::load(Arc::clone(&storage), system_clock()), id)?;
    let profile = ProfileStore::new(Arc::clone(&storage)).load();
    let session = PresenceSession::new(
        id,
        &profile,
        Arc::new(StorageMedium::new(storage)),
        system_clock(),
        PresenceTiming::from(&config.presence),
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let handle = session.start().await;
        if let Some(section) = section {
            handle.focus_section(section).await;
        }
        println!("Present on {id} as {} for {seconds}s (Ctrl-C to leave)", profile.name);

        let mut updates = handle.subscribe();
        print_collaborators(&updates.borrow_and_update());

        let deadline = tokio::time::sleep(Duration::from_secs(seconds));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = &mut deadline => break,
                _ = tokio::signal::ctrl_c() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_collaborators(&updates.borrow_and_update());
                }
            }
        }

        // The entry stays on the board until it expires
        handle.stop();
    });

    Ok(())
}

fn print_collaborators(collaborators: &stitchflow::presence::Collaborators) {
    if collaborators.is_empty() {
        println!("  nobody else here");
        return;
    }
    let line = collaborators
        .values()
        .map(|c| {
            if c.active_section.is_empty() {
                format!("{} (viewing)", c.user_name)
            } else {
                format!("{} (editing {})", c.user_name, c.active_section.replace('_', " "))
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    println!("  {line}");
}

/// Handle AI commands.
#[cfg(feature = "ai")]
fn cmd_ai(config: &Config, operation: AiOperation) -> Result<()> {
    use std::io::{BufRead, Write};

    use stitchflow::ai::{portfolio_context, AdvisoryRelay, SkillStats};
    use stitchflow::AdvisorChat;

    let clock = system_clock();
    let store = load_projects(config, Arc::clone(&clock))?;
    let relay = AdvisoryRelay::from_config(&config.ai);
    if !relay.is_available() {
        eprintln!("No advisory provider configured; set GEMINI_API_KEY. Showing fallback output.\n");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match operation {
            AiOperation::Advise { prompt } => {
                let context = portfolio_context(store.projects());
                println!("{}", relay.advice(&prompt, &context).await);
            }
            AiOperation::Chat => {
                let mut chat = AdvisorChat::new(relay, Arc::clone(&clock));
                println!("{}\n", chat.messages()[0].content);
                let stdin = io::stdin();
                loop {
                    print!("> ");
                    io::stdout().flush()?;
                    let mut line = String::new();
                    if stdin.lock().read_line(&mut line)? == 0 {
                        break;
                    }
                    if let Some(reply) = chat.send(line.trim(), store.projects()).await {
                        println!("\n{reply}\n");
                    }
                }
            }
            AiOperation::Risks { id } => {
                println!("{}", relay.production_risks(find(&store, &id)?).await);
            }
            AiOperation::Analyze { id, index } => {
                let p = find(&store, &id)?;
                let step = p.workflow.get(index).context("Step index out of range")?;
                println!("{}", relay.step_analysis(p, step).await);
            }
            AiOperation::FollowUp { id, index } => {
                let p = find(&store, &id)?;
                let step = p.workflow.get(index).context("Step index out of range")?;
                println!("{}", relay.follow_up(p, step).await);
            }
            AiOperation::Costing { id } => {
                println!("{}", relay.costing_assistant(find(&store, &id)?).await);
            }
            AiOperation::Urgency { id } => {
                println!("{}", relay.urgency_action_plan(find(&store, &id)?).await);
            }
            AiOperation::Feed => {
                let feed = relay.feed_suggestions(store.projects()).await;
                if feed.is_empty() {
                    println!("No insights available right now.");
                }
                for insight in feed {
                    println!("[{:?}] {}\n  {}\n  ({})\n", insight.kind, insight.title, insight.description, insight.style_context);
                }
            }
            AiOperation::Evaluate => {
                let stats = SkillStats::from_projects(store.projects(), clock.today(), 0);
                println!("{}", relay.evaluate_skills(&stats).await);
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

#[cfg(not(feature = "ai"))]
fn cmd_ai(_config: &Config, _operation: AiOperation) -> Result<()> {
    anyhow::bail!("Advisory features are disabled in this build (enable the `ai` feature)")
}
