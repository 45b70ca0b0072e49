use anyhow::{anyhow, Context, Result};
use antidupl::app::UserData;
use antidupl::core::{
    FileType, GlobalActionType, GroupId, LocalActionType, RenameCurrentType, ResultRecord,
    SelectionType, SortType, TargetType,
};
use antidupl::options::{document, PathEntry, PathRole, ProfileStore};
use antidupl::{EngineSession, LocalEngine};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type Session = EngineSession<LocalEngine>;

#[derive(Parser, Debug)]
#[command(name = "antidupl", version, about = "Find duplicate and defective images")]
struct Cli {
    /// Directory holding options, profiles and saved results
    #[arg(short = 's', long = "state-dir", value_name = "DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for duplicates and defects
    Search {
        /// Replace the search paths before searching
        #[arg(short, long, value_name = "DIR")]
        path: Vec<PathBuf>,
    },

    /// List results
    Results {
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long, default_value_t = 50)]
        count: usize,
    },

    /// List duplicate groups
    Groups {
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long, default_value_t = 50)]
        count: usize,
    },

    /// List the images of one group
    Images { group: u64 },

    /// Apply an action to the current result, or to the given results
    Apply {
        #[arg(value_enum)]
        action: Action,
        /// Result index to act on (repeatable)
        #[arg(short, long = "index", value_name = "N")]
        indices: Vec<usize>,
        /// Act on every result
        #[arg(long, conflicts_with = "indices")]
        all: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename one image of a result
    Rename {
        index: usize,
        #[arg(value_enum)]
        which: Which,
        new_path: PathBuf,
    },

    /// Recompute hints from the current valid/delete paths
    Hint,
    /// Rebuild duplicate groups
    Regroup,
    /// Drop results whose files are gone
    Refresh,
    /// Undo the last action
    Undo,
    /// Redo the last undone action
    Redo,

    /// Sort results
    Sort {
        #[arg(value_enum)]
        key: SortKey,
        #[arg(long)]
        decreasing: bool,
    },

    /// Show or set a path list
    Paths {
        #[arg(value_enum)]
        role: Role,
        /// New entries; prints the list when empty
        paths: Vec<PathBuf>,
    },

    /// Clear saved results or the mistake database
    Clear {
        #[arg(value_enum)]
        what: ClearTarget,
    },

    Options {
        #[command(subcommand)]
        command: OptionsCmd,
    },

    Profile {
        #[command(subcommand)]
        command: ProfileCmd,
    },
}

#[derive(Subcommand, Debug)]
enum OptionsCmd {
    /// Print the current options document
    Show,
    /// Restore engine defaults
    Reset,
}

#[derive(Subcommand, Debug)]
enum ProfileCmd {
    List,
    Save { name: String },
    Load { name: String },
    Remove { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Action {
    DeleteDefect,
    DeleteFirst,
    DeleteSecond,
    DeleteBoth,
    RenameFirstToSecond,
    RenameSecondToFirst,
    PerformHint,
    Mistake,
}

impl From<Action> for LocalActionType {
    fn from(action: Action) -> Self {
        match action {
            Action::DeleteDefect => LocalActionType::DeleteDefect,
            Action::DeleteFirst => LocalActionType::DeleteFirst,
            Action::DeleteSecond => LocalActionType::DeleteSecond,
            Action::DeleteBoth => LocalActionType::DeleteBoth,
            Action::RenameFirstToSecond => LocalActionType::RenameFirstToSecond,
            Action::RenameSecondToFirst => LocalActionType::RenameSecondToFirst,
            Action::PerformHint => LocalActionType::PerformHint,
            Action::Mistake => LocalActionType::Mistake,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Which {
    First,
    Second,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortKey {
    Type,
    Difference,
    Hint,
    Group,
    FirstPath,
    SecondPath,
    FirstSize,
    SecondSize,
    FirstArea,
    SecondArea,
}

impl From<SortKey> for SortType {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Type => SortType::Type,
            SortKey::Difference => SortType::Difference,
            SortKey::Hint => SortType::Hint,
            SortKey::Group => SortType::Group,
            SortKey::FirstPath => SortType::FirstPath,
            SortKey::SecondPath => SortType::SecondPath,
            SortKey::FirstSize => SortType::FirstSize,
            SortKey::SecondSize => SortType::SecondSize,
            SortKey::FirstArea => SortType::FirstArea,
            SortKey::SecondArea => SortType::SecondArea,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Role {
    Search,
    Ignore,
    Valid,
    Delete,
}

impl From<Role> for PathRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Search => PathRole::Search,
            Role::Ignore => PathRole::Ignore,
            Role::Valid => PathRole::Valid,
            Role::Delete => PathRole::Delete,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClearTarget {
    Results,
    Mistakes,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data = UserData::resolve(cli.state_dir.clone());
    data.ensure()
        .with_context(|| format!("Failed to create {}", data.dir().display()))?;

    let engine = LocalEngine::new(data.engine_config()).context("Failed to start engine")?;
    let mut session = EngineSession::open(engine)?;

    let defaults = session.default_options()?;
    let options = document::load_or_else(&data.options_file(), || defaults);
    if let Err(e) = session.commit_options(&options) {
        eprintln!("⚠️  Stored options rejected ({}), using defaults", e);
    }

    let results_file = data.results_file();
    if results_file.exists() {
        if let Err(e) = session.load(FileType::Result, &results_file) {
            eprintln!("⚠️  Could not load previous results: {}", e);
        }
    }

    // a failed action may still have moved some files, so results are saved either way
    let outcome = run(&mut session, &data, cli.command);

    session
        .save(FileType::Result, &results_file)
        .with_context(|| format!("Failed to save {}", results_file.display()))?;
    session.close()?;
    outcome
}

fn run(session: &mut Session, data: &UserData, command: Command) -> Result<()> {
    match command {
        Command::Search { path } => {
            if !path.is_empty() {
                let mut options = session.options_bundle()?;
                options.search_paths = path.into_iter().map(PathEntry::new).collect();
                session.commit_options(&options)?;
                save_options(session, data)?;
            }
            search(session)?;
            println!(
                "✨ {} result(s) in {} group(s)",
                session.result_size()?,
                session.group_count()?
            );
        }

        Command::Results { start, count } => {
            let total = session.result_size()?;
            if total == 0 {
                println!("No results.");
            }
            let current = session.current()?;
            for (offset, record) in session.results(start, count)?.iter().enumerate() {
                print_record(start + offset, record, current);
            }
            if total > start + count {
                println!("… {} more", total - start - count);
            }
        }

        Command::Groups { start, count } => {
            for group in session.groups(start, count)? {
                println!("Group {}: {} image(s)", group.id, group.size);
            }
        }

        Command::Images { group } => {
            let group = GroupId(group);
            let total = session.image_info_count(group)?;
            for image in session.image_infos(group, 0, total)? {
                println!(
                    "   ▶ {} ({}x{}, {} bytes)",
                    image.path.display(),
                    image.width,
                    image.height,
                    image.size
                );
            }
        }

        Command::Apply {
            action,
            indices,
            all,
            yes,
        } => {
            let target = if all {
                session.select(SelectionType::SelectAll)?;
                TargetType::Selected
            } else if !indices.is_empty() {
                session.select(SelectionType::UnselectAll)?;
                for index in &indices {
                    session.set_selection(*index, 1, true)?;
                }
                TargetType::Selected
            } else {
                TargetType::Current
            };

            let action = LocalActionType::from(action);
            let count = if all {
                session.result_size()?
            } else {
                indices.len().max(1)
            };
            if action.is_destructive() && !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Apply {:?} to {} result(s)?", action, count))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            session.apply_local(action, target)?;
            println!("✔ {:?} applied; {} result(s) left", action, session.result_size()?);
        }

        Command::Rename {
            index,
            which,
            new_path,
        } => {
            session.set_current(index)?;
            let which = match which {
                Which::First => RenameCurrentType::First,
                Which::Second => RenameCurrentType::Second,
            };
            session.rename_current(which, &new_path)?;
            println!("✔ Renamed to {}", new_path.display());
        }

        Command::Hint => session.apply_global(GlobalActionType::SetHint)?,
        Command::Regroup => session.apply_global(GlobalActionType::SetGroup)?,
        Command::Refresh => {
            let before = session.result_size()?;
            session.apply_global(GlobalActionType::Refresh)?;
            let dropped = before.saturating_sub(session.result_size()?);
            println!("🔄 {} result(s) dropped", dropped);
        }
        Command::Undo => session.apply_global(GlobalActionType::Undo)?,
        Command::Redo => session.apply_global(GlobalActionType::Redo)?,

        Command::Sort { key, decreasing } => session.sort(key.into(), !decreasing)?,

        Command::Paths { role, paths } => {
            let role = PathRole::from(role);
            let mut options = session.options_bundle()?;
            if paths.is_empty() {
                for entry in options.paths(role) {
                    println!("{}", entry.path.display());
                }
                return Ok(());
            }
            let mut list = options.path_list(role);
            for path in paths {
                list.add(PathEntry::new(path));
            }
            options.set_path_list(list);
            session.commit_options(&options)?;
            save_options(session, data)?;
        }

        Command::Clear { what } => {
            let file = match what {
                ClearTarget::Results => FileType::Result,
                ClearTarget::Mistakes => FileType::MistakeDatabase,
            };
            session.clear(file)?;
        }

        Command::Options { command } => match command {
            OptionsCmd::Show => {
                println!("{}", document::to_xml(&session.options_bundle()?)?);
            }
            OptionsCmd::Reset => {
                session.default_options()?;
                save_options(session, data)?;
                println!("✔ Options reset to defaults");
            }
        },

        Command::Profile { command } => {
            let store = ProfileStore::new(data.profiles_dir());
            match command {
                ProfileCmd::List => {
                    for name in store.list()? {
                        println!("{}", name);
                    }
                }
                ProfileCmd::Save { name } => {
                    store.save(&name, &session.options_bundle()?)?;
                    println!("✔ Saved profile {}", name);
                }
                ProfileCmd::Load { name } => {
                    let options = store.load(&name)?;
                    session.commit_options(&options)?;
                    save_options(session, data)?;
                    println!("✔ Loaded profile {}", name);
                }
                ProfileCmd::Remove { name } => {
                    store.remove(&name)?;
                    println!("✔ Removed profile {}", name);
                }
            }
        }
    }
    Ok(())
}

fn save_options(session: &Session, data: &UserData) -> Result<()> {
    let path = data.options_file();
    document::save(&session.options_bundle()?, &path)
        .with_context(|| format!("Failed to save {}", path.display()))
}

/// Run the search on a worker thread while the status board drives a progress bar.
fn search(session: &mut Session) -> Result<()> {
    let mut poller = session.poller();
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    poller.restart();
    let outcome = thread::scope(|scope| {
        let handle = scope.spawn(|| session.search());
        while !handle.is_finished() {
            if let Ok(progress) = poller.poll() {
                bar.set_length(progress.main.total as u64);
                bar.set_position(progress.main.current as u64);
                let eta = progress
                    .eta()
                    .map(|eta| format!(" eta {}s", eta.as_secs()))
                    .unwrap_or_default();
                bar.set_message(format!(
                    "{:?} {} worker(s){}",
                    progress.main.state,
                    progress.collect.len() + progress.compare.len(),
                    eta
                ));
            }
            thread::sleep(Duration::from_millis(100));
        }
        handle.join()
    });
    bar.finish_and_clear();

    outcome.map_err(|_| anyhow!("search thread panicked"))??;
    if poller.poll().map(|p| p.was_stopped()).unwrap_or(false) {
        eprintln!("⏹ Search was stopped early");
    }
    Ok(())
}

fn print_record(index: usize, record: &ResultRecord, current: Option<usize>) {
    let marker = if current == Some(index) { '>' } else { ' ' };
    match record {
        ResultRecord::Defect(defect) => {
            println!(
                "{}[{:>4}] defect {:?}  hint {:?}",
                marker, index, defect.defect, defect.hint
            );
            println!("         {}", defect.image.path.display());
        }
        ResultRecord::DuplPair(pair) => {
            println!(
                "{}[{:>4}] pair   diff {:.2}  {:?}  group {}  hint {:?}",
                marker, index, pair.difference, pair.transform, pair.group, pair.hint
            );
            for image in [&pair.first, &pair.second] {
                println!(
                    "         {} ({}x{}, {} bytes)",
                    image.path.display(),
                    image.width,
                    image.height,
                    image.size
                );
            }
        }
    }
}
