use owo_colors::OwoColorize;
use std::error::Error;
use std::path::Path;
use tracklane::constants::ENVELOPE_BAR_CHARS;

/// Width of one printed row of the bar chart
const CHART_WIDTH: usize = 64;

pub fn handle_envelope(path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "player")]
    {
        use serde::Serialize;
        use tracklane::envelope::Envelope;
        use tracklane::loader::load_file;
        use tracklane::media::FileDecoder;
        use tracklane::utils::progress::create_progress_spinner;

        #[derive(Serialize)]
        struct Report<'a> {
            file: String,
            channels: u16,
            sample_rate: u32,
            peak: f32,
            envelope: &'a Envelope,
        }

        let spinner = create_progress_spinner();
        spinner.set_message(format!("Analyzing {}...", path.display()));
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        let result = load_file(&FileDecoder, path);
        spinner.finish_and_clear();
        let loaded = result?;

        if json {
            let report = Report {
                file: path.display().to_string(),
                channels: loaded.audio.channels,
                sample_rate: loaded.audio.sample_rate,
                peak: loaded.envelope.max_bin(),
                envelope: &loaded.envelope,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let envelope = &loaded.envelope;
        println!("{} {}", "Track:".bright_black(), loaded.name.cyan().bold());
        println!(
            "{} {:.2}s, {} ch, {} Hz",
            "Audio:".bright_black(),
            envelope.total_duration_seconds(),
            loaded.audio.channels,
            loaded.audio.sample_rate
        );
        println!(
            "{} {} bins of {:.3}s, peak RMS {:.4}",
            "Envelope:".bright_black(),
            envelope.len(),
            envelope.window_seconds(),
            envelope.max_bin()
        );
        println!();
        for (row, line) in chart_rows(envelope.bins(), CHART_WIDTH).iter().enumerate() {
            let start = row as f64 * CHART_WIDTH as f64 * envelope.window_seconds();
            println!("{} {}", format!("{start:>7.1}s").bright_black(), line.blue());
        }
        Ok(())
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = (path, json, chart_rows, CHART_WIDTH);
        println!(
            "{} Decoding audio requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        Ok(())
    }
}

/// Render bins as rows of bar glyphs scaled to the loudest bin
fn chart_rows(bins: &[f32], width: usize) -> Vec<String> {
    let max = bins.iter().copied().fold(0.0f32, f32::max);
    let top = ENVELOPE_BAR_CHARS.len() - 1;
    let glyphs: Vec<char> = bins
        .iter()
        .map(|&bin| {
            if max > 0.0 {
                let level = ((bin / max) * top as f32).round() as usize;
                ENVELOPE_BAR_CHARS[level.min(top)]
            } else {
                ENVELOPE_BAR_CHARS[0]
            }
        })
        .collect();
    glyphs
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
