use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use consultations::{
    ActionOutcome, AssumeYes, Config, Console, DayBucket, FilterCriteria, HttpApi, PromptConfirm, render_table,
    shell,
};
use eyre::Result;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "consultations")]
#[command(about = "View, filter, export and delete consultation records")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/consultations/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Consultation API endpoint
    #[arg(short, long, env = "CONSULTATIONS_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch consultations and print them as a table
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Fetch consultations and write them to a spreadsheet
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (default: consultations.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a consultation by id
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive session with refresh, filter, export and delete
    Shell {
        /// Default export file for the session
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DayArg {
    Today,
    Yesterday,
}

#[derive(Args)]
struct FilterArgs {
    /// Only records created today or yesterday
    #[arg(long, value_enum)]
    day: Option<DayArg>,

    /// Start of an inclusive date range (ignored without --to)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of an inclusive date range (ignored without --from)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            day_bucket: match self.day {
                None => DayBucket::None,
                Some(DayArg::Today) => DayBucket::Today,
                Some(DayArg::Yesterday) => DayBucket::Yesterday,
            },
            from_date: self.from,
            to_date: self.to,
        }
    }
}

fn exit_code(outcome: ActionOutcome) -> ExitCode {
    match outcome {
        ActionOutcome::Failed => ExitCode::FAILURE,
        ActionOutcome::Done | ActionOutcome::Cancelled => ExitCode::SUCCESS,
    }
}

fn main() -> Result<ExitCode> {
    // Setup tracing on stderr so tables on stdout stay clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    colored::control::set_override(io::stdout().is_terminal());

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    let api = HttpApi::new(&config.endpoint, config.timeout())?;
    let mut console = Console::new(api, config.formats());

    let code = match cli.command {
        Commands::List { filters } => {
            let fetched = console.refresh();
            *console.criteria_mut() = filters.criteria();
            console.apply_filters(&Local::now());
            print!("{}", render_table(console.store().filtered(), console.formats(), &Local));
            exit_code(fetched)
        }
        Commands::Export { filters, output } => {
            *console.criteria_mut() = filters.criteria();
            let path = output.unwrap_or(config.output);
            match console.fetch_and_export(&Local::now(), &path)? {
                Some(rows) => {
                    println!("Wrote {} rows to {}", rows, path.display());
                    ExitCode::SUCCESS
                }
                None => exit_code(ActionOutcome::Failed),
            }
        }
        Commands::Delete { id, yes } => {
            let outcome = if yes {
                console.delete(&id, &mut AssumeYes)
            } else {
                let mut confirm = PromptConfirm::new(io::stdin().lock(), io::stderr());
                console.delete(&id, &mut confirm)
            };
            match outcome {
                ActionOutcome::Done => println!("Deleted {}", id),
                ActionOutcome::Cancelled => println!("Cancelled"),
                ActionOutcome::Failed => {}
            }
            exit_code(outcome)
        }
        Commands::Shell { output } => {
            console
                .store_mut()
                .subscribe(|event| debug!(?event, "Store changed"));
            console.refresh();
            let default_output = output.unwrap_or(config.output);
            shell::run(
                &mut console,
                io::stdin().lock(),
                io::stdout().lock(),
                default_output,
                shell::local_clock,
            )?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
