//! # Encounterforge Command Line
//!
//! Loads the monster catalog and party, restores the saved encounter state, runs one
//! command against it and persists the result.

use clap::{Args as ClapArgs, Parser, Subcommand};
use encounterforge::{
    CatalogFilter, Difficulty, EncounterContext, EncounterError, EncounterResult, EncounterState,
    Filters, GenerationConfig, JsonFileStore, LogNotifier, MonsterCatalog, Party,
};
use log::{error, info, warn};
use rand::rngs::StdRng;
use std::path::Path;

/// Command line arguments for Encounterforge.
#[derive(Parser, Debug)]
#[command(name = "encounterforge")]
#[command(about = "Builds tabletop encounters that fit a party's experience budget")]
#[command(version)]
struct Args {
    /// Bestiary JSON file (array of monster records)
    #[arg(long, default_value = "monsters.json")]
    catalog: String,

    /// Party JSON file (player groups and difficulty thresholds)
    #[arg(long, default_value = "party.json")]
    party: String,

    /// File the encounter state is persisted to
    #[arg(long, default_value = "encounterforge-state.json")]
    state: String,

    /// JSON file with extra template modes
    #[arg(long)]
    modes_file: Option<String>,

    /// Random seed for generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Catalog filter options shared by the commands that pick monsters.
///
/// There are no challenge rating bounds: budget matching picks the rating itself.
#[derive(ClapArgs, Debug, Default)]
struct FilterArgs {
    /// Only monsters of these types
    #[arg(long = "type")]
    types: Vec<String>,

    /// Only monsters with one of these tags
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Free-text search
    #[arg(long)]
    search: Option<String>,

    /// Leave unique monsters out
    #[arg(long)]
    hide_unique: bool,
}

impl From<FilterArgs> for Filters {
    fn from(args: FilterArgs) -> Self {
        Filters::new(CatalogFilter {
            types: args.types,
            tags: args.tags,
            search: args.search,
            hide_unique: args.hide_unique,
            ..Default::default()
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new encounter
    Generate {
        /// easy, medium, hard or deadly
        #[arg(short, long)]
        difficulty: Option<String>,
        /// Template mode name
        #[arg(short, long)]
        mode: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Add one copy of a monster by slug
    Add { slug: String },
    /// Add one copy to a group
    Inc { index: usize },
    /// Remove one copy from a group
    Dec { index: usize },
    /// Swap a group's monster for another of the same challenge rating
    Reroll {
        index: usize,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Save the current encounter
    Save,
    /// List generation history and saved encounters
    History,
    /// Load a saved encounter, or a history entry with --history
    Load {
        index: usize,
        #[arg(long)]
        history: bool,
    },
    /// Delete a saved encounter
    Delete { index: usize },
    /// Clear the current encounter
    Clear,
    /// Show the current encounter and its difficulty
    Show,
    /// List the available template modes
    Modes,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = initialize_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting Encounterforge v{}", encounterforge::VERSION);

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> EncounterResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .map_err(|e| EncounterError::InvalidState(e.to_string()))?;

        tracing::debug!("Tracing initialized with filter {}", log_level);
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_target(false)
            .try_init()
            .map_err(|e| EncounterError::InvalidState(e.to_string()))?;
    }

    Ok(())
}

fn load_party(path: &str) -> EncounterResult<Party> {
    if Path::new(path).exists() {
        Party::load(path)
    } else {
        warn!("Party file {} not found, using an empty party", path);
        Ok(Party::default())
    }
}

fn run(mut args: Args) -> EncounterResult<()> {
    let mut config = GenerationConfig::new(args.seed.unwrap_or_else(rand::random));
    if let Some(path) = &args.modes_file {
        config.load_modes(path)?;
    }
    let mut rng = encounterforge::generation::utils::create_rng(&config);

    if let Command::Modes = args.command {
        for (name, mode) in &config.modes {
            println!("{:<14} {} ({} templates)", name, mode.name, mode.samples.len());
        }
        return Ok(());
    }

    let catalog = MonsterCatalog::load(&args.catalog)?;
    let mut party = load_party(&args.party)?;
    let mut store = JsonFileStore::open(&args.state)?;
    let mut state = EncounterState::restore(&mut store, &catalog)?;
    let notifier = LogNotifier;

    let filters: Filters = match &mut args.command {
        Command::Generate { filters, .. } | Command::Reroll { filters, .. } => {
            std::mem::take(filters).into()
        }
        _ => Filters::default(),
    };

    let mut ctx = EncounterContext {
        party: &mut party,
        catalog: &catalog,
        filters: &filters,
        notifier: &notifier,
        config: &config,
    };

    match args.command {
        Command::Generate {
            difficulty, mode, ..
        } => {
            if let Some(difficulty) = difficulty {
                state.difficulty = difficulty.parse::<Difficulty>()?;
            }
            if let Some(mode) = mode {
                config.mode(&mode)?;
                state.mode = mode;
            }
            // Selections stick even when generation fails.
            state.persist(&mut store)?;
            state.generate(&mut ctx, &mut rng)?;
            print_encounter(&state, ctx.party, &mut rng);
        }
        Command::Add { slug } => {
            let monster = catalog
                .lookup(&slug)
                .ok_or_else(|| EncounterError::UnknownMonster(slug.clone()))?;
            state.add_monster(&mut ctx, monster);
            print_encounter(&state, ctx.party, &mut rng);
        }
        Command::Inc { index } => {
            state.increment(index)?;
            print_encounter(&state, ctx.party, &mut rng);
        }
        Command::Dec { index } => {
            state.decrement(index)?;
            print_encounter(&state, ctx.party, &mut rng);
        }
        Command::Reroll { index, .. } => {
            if !state.reroll(&ctx, index, &mut rng)? {
                println!("No other monster of that challenge rating is available.");
            }
            print_encounter(&state, ctx.party, &mut rng);
        }
        Command::Save => {
            state.save(&notifier);
            match state.loaded_index() {
                Some(index) => println!("Saved as #{}", index),
                None => println!("Nothing to save."),
            }
        }
        Command::History => print_history(&state),
        Command::Load { index, history } => {
            let loaded = if history {
                state.load_from_history(&mut ctx, index)?
            } else {
                state.load_from_saved(&mut ctx, index)?
            };
            if !loaded {
                println!("None of the monsters in that encounter exist any more.");
            }
            print_encounter(&state, ctx.party, &mut rng);
        }
        Command::Delete { index } => {
            state.delete_saved(&notifier, index)?;
            println!("Deleted saved encounter #{}", index);
        }
        Command::Clear => state.clear(),
        Command::Show => print_encounter(&state, ctx.party, &mut rng),
        Command::Modes => {}
    }

    state.persist(&mut store)?;
    Ok(())
}

fn print_encounter(state: &EncounterState, party: &Party, rng: &mut StdRng) {
    if state.encounter.is_empty() {
        println!("No encounter.");
        return;
    }

    let level = party.level();
    for (index, group) in state.encounter.groups.iter().enumerate() {
        println!(
            "[{}] {} x{}  (CR {}, {} exp each)",
            index,
            group.monster.name,
            group.count,
            group.monster.cr.string,
            encounterforge::experience_of(&group.monster, level)
        );
    }

    println!(
        "Total: {} monsters, {} exp ({})",
        state.total_monsters(),
        state.total_exp(party),
        state.actual_difficulty(party)
    );

    let feel = state.difficulty_feel(party, rng);
    if !feel.is_empty() {
        println!("Feels {}", feel);
    }

    let threat = state.threat(party);
    println!(
        "Threat per monster: deadly {} / hard {} / medium {} / easy {}; pair {}, group {}, swarm {}",
        threat.deadly, threat.hard, threat.medium, threat.easy, threat.pair, threat.group, threat.trivial
    );
}

fn print_history(state: &EncounterState) {
    let describe = |snapshot: &encounterforge::EncounterSnapshot| {
        snapshot
            .groups
            .iter()
            .map(|group| format!("{} x{}", group.monster.name, group.count))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("History (oldest first):");
    for (index, snapshot) in state.history.iter().enumerate() {
        println!("  [{}] {}", index, describe(snapshot));
    }

    println!("Saved:");
    for (index, snapshot) in state.saved.iter().enumerate() {
        let marker = if state.loaded_index() == Some(index) { "*" } else { " " };
        println!(" {}[{}] {}", marker, index, describe(snapshot));
    }
}
