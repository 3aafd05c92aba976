use crate::terminal::Terminal;
use crossterm::style::Color;

/// One line of panel content with its own color.
pub struct PanelLine {
    pub text: String,
    pub color: Color,
}

impl PanelLine {
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self { text: text.into(), color }
    }
}

/// Render a centered help overlay box with the provided text.
pub fn render_help_overlay(term: &mut Terminal, width: u16, height: u16, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let lines: Vec<PanelLine> = help_text.lines().map(|l| PanelLine::new(l, Color::Grey)).collect();
    let (box_w, box_h) = panel_size(&lines);
    let x = (width as usize).saturating_sub(box_w) / 2;
    let y = (height as usize).saturating_sub(box_h) / 2;
    draw_box(term, x as i32, y as i32, &lines, Color::White);
}

/// Centered panel, wrapped to `max_width` columns and truncated to fit the screen.
pub fn render_panel(term: &mut Terminal, width: u16, height: u16, lines: &[PanelLine], border: Color) {
    let max_text = (width as usize).saturating_sub(8).max(10);
    let mut wrapped: Vec<PanelLine> = lines
        .iter()
        .flat_map(|line| {
            wrap(&line.text, max_text)
                .into_iter()
                .map(move |text| PanelLine::new(text, line.color))
        })
        .collect();
    wrapped.truncate((height as usize).saturating_sub(4));

    let (box_w, box_h) = panel_size(&wrapped);
    let x = (width as usize).saturating_sub(box_w) / 2;
    let y = (height as usize).saturating_sub(box_h) / 2;
    draw_box(term, x as i32, y as i32, &wrapped, border);
}

/// Small label box next to a screen cell, kept on screen.
pub fn render_tooltip(term: &mut Terminal, anchor_x: i32, anchor_y: i32, lines: &[PanelLine]) {
    let (width, height) = term.size();
    let (box_w, box_h) = panel_size(lines);
    let mut x = anchor_x + 2;
    if x + box_w as i32 > width as i32 {
        x = anchor_x - box_w as i32 - 1;
    }
    let y = (anchor_y - 1).clamp(0, (height as i32 - box_h as i32).max(0));
    draw_box(term, x.max(0), y, lines, Color::DarkGrey);
}

fn panel_size(lines: &[PanelLine]) -> (usize, usize) {
    let max_width = lines.iter().map(|l| l.text.chars().count()).max().unwrap_or(0);
    // 2 chars padding each side, 1 row top and bottom
    (max_width + 4, lines.len() + 2)
}

fn draw_box(term: &mut Terminal, x: i32, y: i32, lines: &[PanelLine], border: Color) {
    let (box_w, box_h) = panel_size(lines);
    let inner = box_w - 4;
    let right = x + box_w as i32 - 1;
    let bottom = y + box_h as i32 - 1;

    term.set(x, y, '┌', Some(border), false);
    term.set(right, y, '┐', Some(border), false);
    term.set(x, bottom, '└', Some(border), false);
    term.set(right, bottom, '┘', Some(border), false);
    for i in 1..box_w as i32 - 1 {
        term.set(x + i, y, '─', Some(border), false);
        term.set(x + i, bottom, '─', Some(border), false);
    }

    for (i, line) in lines.iter().enumerate() {
        let row = y + 1 + i as i32;
        term.set(x, row, '│', Some(border), false);
        let padding = inner.saturating_sub(line.text.chars().count());
        let padded = format!(" {}{} ", line.text, " ".repeat(padding));
        term.set_str(x + 1, row, &padded, Some(line.color), false);
        term.set(right, row, '│', Some(border), false);
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(wrap("route okx via aws tokyo", 10), vec!["route okx", "via aws", "tokyo"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap("abcdefghij xy", 4), vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn panel_size_includes_padding() {
        let lines = [PanelLine::new("abc", Color::Grey), PanelLine::new("abcdef", Color::Grey)];
        assert_eq!(panel_size(&lines), (10, 4));
    }
}
