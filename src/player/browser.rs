//! Fuzzy file picker for adding tracks.
//!
//! Scans a directory tree for audio files and filters them as the user types,
//! ranking matches with the skim algorithm against each file's path relative
//! to the scan root. Hidden directories and a few well-known build/VCS
//! directories are skipped.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use log::warn;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::fs;
use std::path::{Path, PathBuf};
use tracklane::constants::{AUDIO_EXTENSIONS, SKIP_DIRECTORIES};

#[derive(Clone, Debug, PartialEq)]
pub struct AudioFile {
    pub path: PathBuf,
    /// Path relative to the scan root, used for matching and display
    pub label: String,
}

pub struct Browser {
    pub is_active: bool,
    pub items: Vec<AudioFile>,
    /// (index into items, matched char positions in the label)
    pub filtered: Vec<(usize, Vec<usize>)>,
    pub selected: usize,
    pub query: String,
    matcher: SkimMatcherV2,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser {
    pub fn new() -> Self {
        Self {
            is_active: false,
            items: Vec::new(),
            filtered: Vec::new(),
            selected: 0,
            query: String::new(),
            matcher: SkimMatcherV2::default(),
        }
    }

    pub fn open(&mut self, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.scan_directory(root)?;
        self.is_active = true;
        Ok(())
    }

    pub fn close(&mut self) {
        self.is_active = false;
    }

    pub fn scan_directory(&mut self, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.items.clear();
        self.scan_recursive(root, root)?;
        self.items.sort_by(|a, b| a.label.cmp(&b.label));
        log::debug!("Found {} audio files under {}", self.items.len(), root.display());
        self.filter_items();
        Ok(())
    }

    fn scan_recursive(&mut self, root: &Path, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            if path.is_dir() {
                if name.starts_with('.') || SKIP_DIRECTORIES.contains(&name.as_str()) {
                    continue;
                }
                if let Err(e) = self.scan_recursive(root, &path) {
                    warn!("Could not scan directory {path:?}: {e}");
                }
            } else if path.is_file() && is_supported_audio_file(&path) {
                let label = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string();
                self.items.push(AudioFile { path, label });
            }
        }
        Ok(())
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.filter_items();
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.filter_items();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.filter_items();
    }

    fn filter_items(&mut self) {
        if self.query.is_empty() {
            self.filtered = (0..self.items.len()).map(|idx| (idx, Vec::new())).collect();
        } else {
            let mut scored: Vec<(usize, i64, Vec<usize>)> = self
                .items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| {
                    self.matcher
                        .fuzzy_indices(&item.label, &self.query)
                        .map(|(score, indices)| (idx, score, indices))
                })
                .collect();

            // Highest score first, ties keep alphabetical order
            scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            self.filtered = scored
                .into_iter()
                .map(|(idx, _, indices)| (idx, indices))
                .collect();
        }

        if self.selected >= self.filtered.len() {
            self.selected = 0;
        }
    }

    pub fn select_next(&mut self) {
        if !self.filtered.is_empty() {
            self.selected = (self.selected + 1) % self.filtered.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.filtered.is_empty() {
            if self.selected == 0 {
                self.selected = self.filtered.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.filtered
            .get(self.selected)
            .and_then(|(idx, _)| self.items.get(*idx))
            .map(|item| item.path.as_path())
    }
}

fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Label with matched characters highlighted
fn highlighted_label<'a>(label: &'a str, indices: &[usize]) -> Line<'a> {
    let spans: Vec<Span> = label
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if indices.contains(&i) {
                Span::styled(
                    c.to_string(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(c.to_string())
            }
        })
        .collect();
    Line::from(spans)
}

pub fn draw_browser(f: &mut Frame, area: Rect, browser: &Browser) {
    let popup = centered_rect(area, 80, 70);
    f.render_widget(Clear, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(popup);

    let search = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(browser.query.as_str()),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Add track ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(search, chunks[0]);

    let items: Vec<ListItem> = browser
        .filtered
        .iter()
        .filter_map(|(idx, indices)| {
            browser
                .items
                .get(*idx)
                .map(|item| ListItem::new(highlighted_label(&item.label, indices)))
        })
        .collect();

    let title = format!(" {}/{} files ", browser.filtered.len(), browser.items.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !browser.filtered.is_empty() {
        state.select(Some(browser.selected));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn browser_with(labels: &[&str]) -> Browser {
        let mut browser = Browser::new();
        browser.items = labels
            .iter()
            .map(|l| AudioFile {
                path: PathBuf::from("/music").join(l),
                label: l.to_string(),
            })
            .collect();
        browser.filter_items();
        browser
    }

    #[test]
    fn test_new_browser() {
        let browser = Browser::new();
        assert!(!browser.is_active);
        assert!(browser.items.is_empty());
        assert!(browser.filtered.is_empty());
        assert_eq!(browser.selected, 0);
        assert!(browser.query.is_empty());
    }

    #[test]
    fn test_is_supported_audio_file() {
        assert!(is_supported_audio_file(Path::new("test.wav")));
        assert!(is_supported_audio_file(Path::new("test.FLAC")));
        assert!(is_supported_audio_file(Path::new("test.mp3")));
        assert!(is_supported_audio_file(Path::new("test.ogg")));
        assert!(!is_supported_audio_file(Path::new("test.txt")));
        assert!(!is_supported_audio_file(Path::new("test")));
    }

    #[test]
    fn test_fuzzy_filter() {
        let mut browser = browser_with(&["bass.wav", "drums/kick.wav", "drums/snare.flac"]);
        assert_eq!(browser.filtered.len(), 3);

        for c in "drsn".chars() {
            browser.push_char(c);
        }
        assert_eq!(browser.filtered.len(), 1);
        assert_eq!(
            browser.selected_path(),
            Some(Path::new("/music/drums/snare.flac"))
        );

        browser.clear_query();
        assert_eq!(browser.filtered.len(), 3);
    }

    #[test]
    fn test_no_match_has_no_selection() {
        let mut browser = browser_with(&["bass.wav"]);
        browser.push_char('z');
        assert!(browser.filtered.is_empty());
        assert!(browser.selected_path().is_none());
        browser.pop_char();
        assert_eq!(browser.filtered.len(), 1);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut browser = browser_with(&["1.wav", "2.wav", "3.wav"]);

        browser.select_next();
        browser.select_next();
        assert_eq!(browser.selected, 2);
        browser.select_next();
        assert_eq!(browser.selected, 0);
        browser.select_previous();
        assert_eq!(browser.selected, 2);
    }

    #[test]
    fn test_scan_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("stems")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(root.join("mix.wav"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::write(root.join("stems").join("vox.flac"), b"").unwrap();
        fs::write(root.join(".git").join("hidden.wav"), b"").unwrap();
        fs::write(root.join("target").join("build.wav"), b"").unwrap();

        let mut browser = Browser::new();
        browser.open(root).unwrap();

        assert!(browser.is_active);
        let labels: Vec<&str> = browser.items.iter().map(|i| i.label.as_str()).collect();
        let vox = Path::new("stems").join("vox.flac");
        assert_eq!(labels, vec!["mix.wav", vox.to_str().unwrap()]);
    }

    #[test]
    fn test_highlighted_label() {
        let line = highlighted_label("abc", &[1]);
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert_eq!(line.spans[1].style.fg, Some(Color::Yellow));
    }
}
