pub mod app;
pub mod audio;
pub mod browser;
pub mod lane;
pub mod ui;

use std::error::Error;
use std::path::PathBuf;

pub fn run(files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    app::run(files)
}
