//! roster-manager binary entry point.
//!
//! Parses the command line, sets up logging, then either runs the TUI
//! (restoring the terminal on exit) or a one-shot roster command.
//!
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roster_manager::app::{self, AppState, Theme};
use roster_manager::payroll::{Employee, PolicyKind};
use roster_manager::store::RosterStore;
use roster_manager::{GroupId, MemberId, Roster};

#[derive(Parser)]
#[command(name = "roster-manager")]
#[command(version, about = "Manage members, groups and their memberships", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Members file (`code:name` per line)
    #[arg(long, env = "ROSTER_MEMBERS", default_value = "members.roster", global = true)]
    members: PathBuf,

    /// Groups file (`name:code,code` per line)
    #[arg(long, env = "ROSTER_GROUPS", default_value = "groups.roster", global = true)]
    groups: PathBuf,

    /// Theme file for the TUI; created with defaults when missing
    #[arg(long, env = "ROSTER_THEME", default_value = "theme.conf", global = true)]
    theme: String,

    /// Append logs to this file
    #[arg(long, env = "ROSTER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and edit the roster interactively (default)
    Tui,
    /// Print every group with its members
    Show,
    /// List the groups of a member
    Groups { code: String },
    /// List the members of a group
    Members { group: String },
    /// Register a member
    AddMember { code: String, name: String },
    /// Create a group
    AddGroup { name: String },
    /// Enroll a member in a group
    Enroll { code: String, group: String },
    /// Remove a member from a group
    Withdraw { code: String, group: String },
    /// Compute an employee's bonus, optionally after a raise
    Bonus {
        #[arg(long)]
        name: String,
        #[arg(long)]
        salary: f64,
        /// Raise in percent applied before the bonus
        #[arg(long, default_value_t = 0.0)]
        raise: f64,
        #[arg(long, value_enum, default_value_t = PolicyKind::Standard)]
        policy: PolicyKind,
    },
}

fn init_tracing(cli: &Cli, interactive: bool) -> Result<()> {
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("ROSTER_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // The TUI owns the screen.
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn run_tui(store: RosterStore, roster: Roster, theme_path: &str) -> Result<()> {
    let mut app_state = AppState::new(roster, Some(store), Theme::load_or_init(theme_path));
    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut app_state);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
    }
    Ok(())
}

fn member_by_code(roster: &Roster, code: &str) -> Result<MemberId> {
    roster.find_member(code).ok_or_else(|| anyhow!("no member with code '{code}'"))
}

fn group_by_name(roster: &Roster, name: &str) -> Result<GroupId> {
    roster.find_group(name).ok_or_else(|| anyhow!("no group named '{name}'"))
}

fn show(roster: &Roster) -> Result<()> {
    for gid in roster.group_ids() {
        let members = roster.list_members(gid)?;
        if let Some(group) = roster.group(gid) {
            println!("{group}");
        }
        for m in members {
            println!("  {m}");
        }
    }
    Ok(())
}

/// Program entry point: dispatch the requested command.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    init_tracing(&cli, interactive)?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let store = RosterStore::new(&cli.members, &cli.groups);
    match cli.command {
        // Bonus computations never touch the roster files.
        Some(Commands::Bonus { name, salary, raise, policy }) => {
            let mut employee = Employee::new(name, salary, policy);
            employee.raise_salary(raise)?;
            println!("{employee}");
            Ok(())
        }
        None | Some(Commands::Tui) => {
            let roster = store.load().map_err(|e| anyhow!(e))?;
            run_tui(store, roster, &cli.theme)
        }
        Some(command) => run_command(&store, command),
    }
}

/// One-shot commands working on the roster files.
fn run_command(store: &RosterStore, command: Commands) -> Result<()> {
    let mut roster = store.load().map_err(|e| anyhow!(e))?;
    match command {
        Commands::Show => show(&roster)?,
        Commands::Groups { code } => {
            let member = member_by_code(&roster, &code)?;
            for g in roster.list_groups(member)? {
                println!("{g}");
            }
        }
        Commands::Members { group } => {
            let group = group_by_name(&roster, &group)?;
            for m in roster.list_members(group)? {
                println!("{m}");
            }
        }
        Commands::AddMember { code, name } => {
            roster.add_member(name, code)?;
            store.save(&roster).map_err(|e| anyhow!(e))?;
        }
        Commands::AddGroup { name } => {
            roster.add_group(name);
            store.save(&roster).map_err(|e| anyhow!(e))?;
        }
        Commands::Enroll { code, group } => {
            let member = member_by_code(&roster, &code)?;
            let group = group_by_name(&roster, &group)?;
            if !roster.join(member, group)? {
                info!(code = %code, "already enrolled");
            }
            store.save(&roster).map_err(|e| anyhow!(e))?;
        }
        Commands::Withdraw { code, group } => {
            let member = member_by_code(&roster, &code)?;
            let group = group_by_name(&roster, &group)?;
            if !roster.withdraw(member, group)? {
                info!(code = %code, "was not enrolled");
            }
            store.save(&roster).map_err(|e| anyhow!(e))?;
        }
        // Dispatched by `run`.
        Commands::Tui | Commands::Bonus { .. } => {}
    }
    Ok(())
}
