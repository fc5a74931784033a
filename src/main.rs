//! tracklane - play several audio tracks in lock-step from the terminal.
//!
//! Every loaded track gets its own lane showing the file's amplitude envelope
//! (RMS over 100 ms windows). While playing, a shared playhead sweeps across
//! all lanes; clicking a lane or using the arrow keys seeks every track to the
//! same relative position. Each track keeps its own volume and name.
//!
//! The interactive player needs the `player` feature (on by default). The
//! `envelope` command prints the envelope of a single file without opening
//! the TUI, which is handy for scripting.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracklane::config::CONFIG_KEYS;

mod cli;

#[cfg(feature = "player")]
mod player;

#[derive(Parser)]
#[command(name = "tracklane")]
#[command(about = "Terminal multi-track player with amplitude envelope lanes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the player, optionally loading tracks right away
    Play {
        /// Audio files to load on startup
        files: Vec<PathBuf>,
    },
    /// Print the amplitude envelope of an audio file
    Envelope {
        /// Audio file to analyze
        file: PathBuf,
        /// Emit JSON instead of a bar chart
        #[arg(long)]
        json: bool,
    },
    /// Create the configuration file
    Init,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(CONFIG_KEYS.iter().copied()))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { files } => {
            cli::play::handle_play(&files)?;
        }
        Commands::Envelope { file, json } => {
            cli::envelope::handle_envelope(&file, json)?;
        }
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_play_with_files() {
        let cli = Cli::try_parse_from(["tracklane", "play", "a.wav", "b.flac"]).unwrap();
        match cli.command {
            Commands::Play { files } => {
                assert_eq!(files, vec![PathBuf::from("a.wav"), PathBuf::from("b.flac")])
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_config_set_rejects_unknown_key() {
        let result = Cli::try_parse_from(["tracklane", "config", "set", "bogus", "1"]);
        assert!(result.is_err());
    }
}
