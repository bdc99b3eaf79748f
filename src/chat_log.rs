//! Visible chat log: the bubbles the terminal draws
//!
//! This is presentation state only. It mirrors what the user sees, which is
//! not the same as the history sent to the API (system notices and the typing
//! placeholder never reach the provider).

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::state::ChatRole;

pub const TYPING_TEXT: &str = "명문장을 다듬는 중입니다...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: ChatRole,
    /// Content split on embedded newlines
    pub lines: Vec<String>,
    pub typing: bool,
    id: u64,
}

impl Bubble {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Greedy word wrap by terminal cell width. Words wider than a row are
/// broken between glyphs. Always returns at least one row.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![line.to_string()];
    }

    let mut rows = Vec::new();
    let mut cur = String::new();
    let mut cur_w = 0usize;

    for word in line.split_whitespace() {
        let word_w = word.width();
        if !cur.is_empty() && cur_w + 1 + word_w <= width {
            cur.push(' ');
            cur.push_str(word);
            cur_w += 1 + word_w;
            continue;
        }
        if !cur.is_empty() {
            rows.push(std::mem::take(&mut cur));
            cur_w = 0;
        }
        if word_w <= width {
            cur.push_str(word);
            cur_w = word_w;
            continue;
        }
        for ch in word.chars() {
            let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
            if !cur.is_empty() && cur_w + cw > width {
                rows.push(std::mem::take(&mut cur));
                cur_w = 0;
            }
            cur.push(ch);
            cur_w += cw;
        }
    }

    if !cur.is_empty() || rows.is_empty() {
        rows.push(cur);
    }
    rows
}

/// Handle returned by `show_typing_indicator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingIndicator(u64);

#[derive(Debug, Default)]
pub struct ChatLog {
    bubbles: Vec<Bubble>,
    next_id: u64,
    pub scroll: u16,
    /// Keep the newest entry in view; cleared when the user scrolls up
    pub follow: bool,
    pub view_height: u16,
    pub view_width: u16,
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            follow: true,
            ..Default::default()
        }
    }

    fn push(&mut self, role: ChatRole, text: &str, typing: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.bubbles.push(Bubble {
            role,
            lines: text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect(),
            typing,
            id,
        });
        self.scroll_to_bottom();
        id
    }

    pub fn append_message(&mut self, role: ChatRole, text: &str) {
        self.push(role, text, false);
    }

    pub fn show_typing_indicator(&mut self) -> TypingIndicator {
        TypingIndicator(self.push(ChatRole::Assistant, TYPING_TEXT, true))
    }

    pub fn remove_typing_indicator(&mut self, indicator: TypingIndicator) {
        self.bubbles.retain(|b| b.id != indicator.0);
        self.clamp_scroll();
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn is_typing(&self) -> bool {
        self.bubbles.iter().any(|b| b.typing)
    }

    pub fn wrap_width(&self) -> usize {
        if self.view_width > 0 {
            self.view_width as usize
        } else {
            50
        }
    }

    /// Rows the renderer draws at the current width: role label, wrapped
    /// content and a blank separator per bubble.
    pub fn total_lines(&self) -> u16 {
        let width = self.wrap_width();
        let total: usize = self
            .bubbles
            .iter()
            .map(|b| 2 + b.lines.iter().map(|l| wrap_line(l, width).len()).sum::<usize>())
            .sum();
        total.min(u16::MAX as usize) as u16
    }

    fn max_scroll(&self) -> u16 {
        let visible = if self.view_height > 0 { self.view_height } else { 20 };
        self.total_lines().saturating_sub(visible)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = self.scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
        self.follow = self.scroll >= self.max_scroll();
    }

    /// Record the drawable area; called by the renderer every frame.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.view_width = width;
        self.view_height = height;
        if self.follow {
            self.scroll = self.max_scroll();
        } else {
            self.clamp_scroll();
        }
    }

    fn clamp_scroll(&mut self) {
        if self.follow {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }
}
