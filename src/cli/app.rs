//! Main CLI application

use crate::config::{discover_task_file, load_task_file, validate_registry, TaskRegistry};
use crate::error::TaskrError;
use crate::runner::Runner;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::Colorize;
use log::{Level, LevelFilter};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Environment variable that refines the log filter
pub const LOG_ENV: &str = "TASKR_LOG";

/// Verbosity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Verbosity {
    /// Log level shown at this verbosity
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::Off,
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
        }
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("taskr")
        .version(crate::VERSION)
        .about("Run tasks from a Taskfile, dependencies first, skipping up-to-date work")
        .arg(
            Arg::new("tasks")
                .value_name("TASK")
                .help("Tasks to run, in order")
                .num_args(1..)
                .required_unless_present_any(["list", "completions"]),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the task file (default: Taskfile.{yml,yaml,json,toml})"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List the available tasks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print a shell completion script"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print only command output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Set up the logger for the given verbosity
pub fn init_logging(verbosity: Verbosity) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(verbosity.level_filter())
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "ERROR".red().bold(),
                Level::Warn => "WARN".yellow().bold(),
                Level::Info => "INFO".green(),
                Level::Debug => "DEBUG".blue(),
                Level::Trace => "TRACE".dimmed(),
            };
            writeln!(buf, "[{}] {}", level, record.args())
        });

    if verbosity > Verbosity::Silent {
        builder.parse_env(env_logger::Env::new().filter(LOG_ENV));
    }

    // A logger may already be installed (tests)
    let _ = builder.try_init();
}

/// Load the task file named on the command line, or discover one in `dir`
pub fn load_registry(file: Option<&Path>, dir: &Path) -> Result<TaskRegistry, TaskrError> {
    let registry = match file {
        Some(path) => load_task_file(path)?,
        None => discover_task_file(dir)?.0,
    };
    validate_registry(&registry)?;
    Ok(registry)
}

/// Write the task listing: one task per line with its dependencies
pub fn write_task_list<W: Write>(registry: &TaskRegistry, out: &mut W) -> io::Result<()> {
    for (name, task) in registry.iter() {
        if task.deps.is_empty() {
            writeln!(out, "{}", name)?;
        } else {
            writeln!(out, "{} (deps: {})", name, task.deps.join(", "))?;
        }
    }
    Ok(())
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), TaskrError> {
    run_from(env::args_os())
}

/// Run the CLI application with explicit arguments
pub fn run_from<I, T>(args: I) -> Result<(), TaskrError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    init_logging(get_verbosity(&matches));

    if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
        let mut cmd = build_command();
        clap_complete::generate(shell, &mut cmd, "taskr", &mut io::stdout());
        return Ok(());
    }

    let cwd = env::current_dir()?;
    let file = matches.get_one::<PathBuf>("file").map(PathBuf::as_path);
    let registry = load_registry(file, &cwd)?;

    if matches.get_flag("list") {
        write_task_list(&registry, &mut io::stdout().lock())?;
        return Ok(());
    }

    let tasks: Vec<String> = matches
        .get_many::<String>("tasks")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    log::debug!("Running {} task(s) from {} defined", tasks.len(), registry.len());
    Runner::new(registry).with_root(cwd).run(tasks.as_slice())
}
