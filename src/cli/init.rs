use dialoguer::{Input, Select, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::error::Error;
use tracklane::config::{Config, Theme};

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    // Check if already initialized
    if Config::exists()? {
        return Err("tracklane is already initialized. Use 'tracklane config set <key> <value>' to change settings.".into());
    }

    let mut config = Config::new();
    let theme = ColorfulTheme::default();

    let themes = [Theme::Light, Theme::Dark];
    let selected = Select::with_theme(&theme)
        .with_prompt("Lane color theme")
        .items(&themes.map(|t| t.to_string()))
        .default(0)
        .interact()?;
    config.theme = themes[selected];

    let frame_rate: String = Input::with_theme(&theme)
        .with_prompt("Lane refresh rate (frames per second)")
        .default(config.frame_rate.to_string())
        .interact_text()?;
    config.set_value("frame_rate", &frame_rate)?;

    let scan_dir: String = Input::with_theme(&theme)
        .with_prompt("Directory the track picker opens in")
        .default(config.scan_dir.clone())
        .interact_text()?;
    config.set_value("scan_dir", &scan_dir)?;

    config.save()?;

    println!("{}", "tracklane initialized successfully!".green());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display().to_string().cyan()
    );

    Ok(())
}
