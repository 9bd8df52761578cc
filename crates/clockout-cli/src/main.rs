use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "clockout", version, about = "Work-shift countdown with lunch, break and clock-out reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Shift(commands::shift::ShiftAction),
    /// Break control
    Break {
        #[command(subcommand)]
        action: commands::shift::BreakAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Custom time-of-day reminders
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Custom reminder sound
    Sound {
        #[command(subcommand)]
        action: commands::sound::SoundAction,
    },
    /// Try out reminder delivery
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Developer shortcuts (needs enableDevMode)
    Dev {
        #[command(subcommand)]
        action: commands::dev::DevAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    // Logs go to stderr so JSON on stdout stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Shift(action) => commands::shift::run(action),
        Commands::Break { action } => commands::shift::run_break(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Sound { action } => commands::sound::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Dev { action } => commands::dev::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "clockout", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
