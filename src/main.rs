use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use envprof::{
    commands, logging,
    paths::Paths,
    shell::Shell,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "envprof")]
#[command(about = "Environment profile manager - activate isolated runtime installations in your shell")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Log diagnostics (skipped config lines, restored variables) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a script that activates a profile in the current shell
    Activate {
        /// Profile directory (defaults to the parent of envprof's own bin directory)
        dir: Option<String>,

        /// Prompt prefix (defaults to the config `prompt` key, then the directory name)
        #[arg(long)]
        prompt: Option<String>,

        /// Shell to write the script for: bash, zsh, fish, powershell
        #[arg(long)]
        shell: Option<Shell>,
    },

    /// Print a script that restores the environment from before activation
    Deactivate {
        /// Keep the `deactivate` function defined afterwards
        #[arg(long)]
        non_destructive: bool,

        /// Shell to write the script for: bash, zsh, fish, powershell
        #[arg(long)]
        shell: Option<Shell>,
    },

    /// Show the active profile and the values it overrides
    Status,

    /// Show the parsed profile.cfg of a profile directory
    Config {
        /// Profile directory (defaults to the parent of envprof's own bin directory)
        dir: Option<String>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let ui = Ui::new(cli.color, cli.no_color);

    match cli.command {
        Commands::Activate { dir, prompt, shell } => {
            let paths = Paths::new();
            commands::activate(&paths, &ui, shell, dir.as_deref(), prompt.as_deref())
        }
        Commands::Deactivate {
            non_destructive,
            shell,
        } => commands::deactivate_profile(&ui, shell, non_destructive),
        Commands::Status => commands::status(&ui),
        Commands::Config { dir } => commands::show_config(&Paths::new(), &ui, dir.as_deref()),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "envprof", &mut std::io::stdout());
            Ok(())
        }
    }
}
