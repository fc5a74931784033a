use std::error::Error;
use std::path::PathBuf;

pub fn handle_play(files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "player")]
    {
        crate::player::run(files)
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = files;
        use owo_colors::OwoColorize;
        println!("{} {}", "🎵".cyan(), "tracklane player".bold());
        println!();
        println!(
            "{} The player requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, install with:");
        println!("  {}", "cargo install tracklane --features player".cyan());
        println!();
        println!("Or if building from source:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}
