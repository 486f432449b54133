use std::io::{self, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::warn;

use lpr_monitor::api::http::HttpApi;
use lpr_monitor::api::types::DepartureFilters;
use lpr_monitor::config::MonitorConfig;
use lpr_monitor::error::ApiError;
use lpr_monitor::monitor::{Monitor, normalize_plate};
use lpr_monitor::runner::{self, Event, Paint, USAGE};
use lpr_monitor::state::{Notice, NoticeLevel};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0} is not on the board; pass --station")]
    NotOnBoard(String),
}

#[derive(Parser, Debug)]
#[command(name = "lpr-monitor", about = "Live station monitor for the LPR backend")]
struct Cli {
    #[arg(long, env = "LPR_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "LPR_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the board and accept operator commands on stdin.
    Watch,
    /// Print the current board once.
    Board,
    /// Recent stations of a plate on the board.
    Detail {
        plate: String,
        #[arg(long)]
        station: Option<String>,
    },
    /// Correct a misread plate.
    Correct { old: String, new: String },
    /// Departed vehicles, ten per page.
    Departures(DeparturesArgs),
    /// Every session of a plate with its station visits.
    History { plate: String },
    /// Manage vehicles excluded from tracking.
    Excluded(ExcludedCommand),
    /// Show the authenticated user and role.
    Whoami,
}

#[derive(Args, Debug)]
struct DeparturesArgs {
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    #[arg(long)]
    desde: Option<String>,
    #[arg(long)]
    hasta: Option<String>,
    #[arg(long)]
    placa: Option<String>,
}

#[derive(Args, Debug)]
struct ExcludedCommand {
    #[command(subcommand)]
    command: ExcludedSubcommand,
}

#[derive(Subcommand, Debug)]
enum ExcludedSubcommand {
    List,
    Add {
        plate: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Remove {
        plate: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = MonitorConfig::from_env().with_overrides(cli.base_url, cli.token);
    let api = Arc::new(HttpApi::new(&config)?);
    let mut monitor = Monitor::new(api);

    match cli.command {
        Command::Watch => run_watch(monitor, &config).await,
        Command::Board => {
            monitor.refresh().await?;
            print!("{}", monitor.board());
            Ok(())
        }
        Command::Detail { plate, station } => {
            let plate = normalize_plate(&plate);
            let station = match station {
                Some(station) => station,
                None => {
                    monitor.refresh().await?;
                    monitor
                        .state()
                        .station_of(&plate)
                        .map(ToOwned::to_owned)
                        .ok_or_else(|| CliError::NotOnBoard(plate.clone()))?
                }
            };
            let view = monitor.open_vehicle_detail(&station, &plate).await?;
            print_notice(monitor.take_notice());
            print!("{view}");
            Ok(())
        }
        Command::Correct { old, new } => {
            monitor.correct_plate(&old, &new).await?;
            print_notice(monitor.take_notice());
            Ok(())
        }
        Command::Departures(args) => {
            let filters = DepartureFilters { page: args.page, from: args.desde, to: args.hasta, plate: args.placa };
            print!("{}", monitor.list_departures(&filters).await?);
            Ok(())
        }
        Command::History { plate } => {
            print!("{}", monitor.list_full_history(&normalize_plate(&plate)).await?);
            Ok(())
        }
        Command::Excluded(excluded) => run_excluded(&mut monitor, excluded).await,
        Command::Whoami => {
            let user = monitor.current_user().await?;
            println!("{} ({})", user.name, user.role);
            println!("exclusion management: {}", if user.can_manage_exclusions() { "allowed" } else { "not allowed" });
            Ok(())
        }
    }
}

async fn run_excluded(monitor: &mut Monitor, excluded: ExcludedCommand) -> Result<(), CliError> {
    let view = match excluded.command {
        ExcludedSubcommand::List => Some(monitor.open_excluded().await?),
        ExcludedSubcommand::Add { plate, description } => Some(monitor.add_excluded_vehicle(&plate, &description).await?),
        ExcludedSubcommand::Remove { plate, yes } => {
            let confirmed =
                yes || (monitor.can_manage_exclusions().await? && confirm_on_stdin(&normalize_plate(&plate)).await);
            monitor.remove_excluded_vehicle(&plate, |_| confirmed).await?
        }
    };
    print_notice(monitor.take_notice());
    if let Some(view) = view {
        print!("{view}");
    }
    Ok(())
}

async fn run_watch(monitor: Monitor, config: &MonitorConfig) -> Result<(), CliError> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let event = runner::parse_command(&line).unwrap_or_else(|reason| {
                eprintln!("{reason}");
                Event::Help
            });
            let quit = event == Event::Quit;
            if tx.send(event).await.is_err() || quit {
                break;
            }
        }
    });

    runner::run(monitor, config.poll_interval(), rx, paint).await?;
    Ok(())
}

fn paint(frame: Paint) {
    match frame {
        Paint::Board(view) => print!("{view}"),
        Paint::Detail(view) => print!("{view}"),
        Paint::Departures(view) => print!("{view}"),
        Paint::FullHistory(view) => print!("{view}"),
        Paint::Excluded(view) => print!("{view}"),
        Paint::Prompt(text) => println!("{text}"),
        Paint::Notice(notice) => print_notice(Some(notice)),
        Paint::Help => println!("{USAGE}"),
    }
    flush_stdout();
}

fn print_notice(notice: Option<Notice>) {
    let Some(notice) = notice else {
        return;
    };
    match notice.level {
        NoticeLevel::Info => println!("-- {}", notice.text),
        NoticeLevel::Error => println!("!! {}", notice.text),
    }
}

async fn confirm_on_stdin(plate: &str) -> bool {
    print!("Remove {plate} from the excluded list? [y/N] ");
    flush_stdout();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    match lines.next_line().await {
        Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Ok(None) => false,
        Err(err) => {
            warn!(error = %err, "could not read confirmation");
            false
        }
    }
}

fn flush_stdout() {
    if let Err(err) = io::stdout().flush() {
        warn!(error = %err, "stdout flush failed");
    }
}
