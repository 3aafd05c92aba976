//! Interactive views
//!
//! Each view is its own module with a `run()` function.

pub mod coastline;
pub mod globe;

use crate::colors::SCHEME_COUNT;
use crate::help::render_help_overlay;
use crate::terminal::Terminal;
use crossterm::event::{KeyCode, KeyModifiers};

/// Runtime state for interactive controls shared by the views
pub struct VizState {
    pub speed: f32,        // Current speed (time per frame)
    pub color_scheme: u8,  // Graticule/coastline scheme
    pub paused: bool,
    pub show_help: bool,
    help_text: &'static str,
}

impl VizState {
    pub fn new(initial_speed: f32, help_text: &'static str) -> Self {
        Self {
            speed: initial_speed,
            color_scheme: 0,
            paused: false,
            show_help: false,
            help_text,
        }
    }

    /// Handle keypress, returns true if should quit
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char('c') => self.color_scheme = (self.color_scheme + 1) % SCHEME_COUNT,
            // Number keys: frame delay (1=fastest, 9=slowest)
            KeyCode::Char(c @ '1'..='9') => {
                self.speed = match c {
                    '1' => 0.005,
                    '2' => 0.01,
                    '3' => 0.02,
                    '4' => 0.03,
                    '5' => 0.05,
                    '6' => 0.07,
                    '7' => 0.1,
                    '8' => 0.15,
                    _ => 0.2,
                };
            }
            _ => {}
        }
        false
    }

    pub fn color_scheme(&self) -> u8 {
        self.color_scheme
    }

    pub fn render_help(&self, term: &mut Terminal, width: u16, height: u16) {
        if self.show_help {
            render_help_overlay(term, width, height, self.help_text);
        }
    }
}
