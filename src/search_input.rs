use unicode_width::UnicodeWidthChar;

use crate::model::Query;
use crate::notify::Notice;

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// The search field: a single-line text buffer with a char-indexed cursor.
///
/// Owns its own text. Submitting never touches loading state; it only yields
/// a validated [`Query`] or the local validation notice.
#[derive(Debug, Default)]
pub struct SearchInput {
  text: String,
  cursor: usize,
  scroll: usize,
  clear_on_submit: bool,
}

impl SearchInput {
  pub fn new(clear_on_submit: bool) -> Self {
    Self { clear_on_submit, ..Self::default() }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  pub fn insert(&mut self, c: char) {
    let byte_idx = char_to_byte_index(&self.text, self.cursor);
    self.text.insert(byte_idx, c);
    self.cursor += 1;
  }

  pub fn backspace(&mut self) {
    if self.cursor > 0 {
      self.cursor -= 1;
      let byte_idx = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(byte_idx);
    }
  }

  pub fn delete(&mut self) {
    if self.cursor < self.text.chars().count() {
      let byte_idx = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(byte_idx);
    }
  }

  /// Delete the word before the cursor (Ctrl+W).
  pub fn delete_word(&mut self) {
    let chars: Vec<char> = self.text.chars().collect();
    let mut start = self.cursor;
    while start > 0 && chars[start - 1].is_whitespace() {
      start -= 1;
    }
    while start > 0 && !chars[start - 1].is_whitespace() {
      start -= 1;
    }
    let from = char_to_byte_index(&self.text, start);
    let to = char_to_byte_index(&self.text, self.cursor);
    self.text.replace_range(from..to, "");
    self.cursor = start;
  }

  pub fn left(&mut self) {
    self.cursor = self.cursor.saturating_sub(1);
  }

  pub fn right(&mut self) {
    if self.cursor < self.text.chars().count() {
      self.cursor += 1;
    }
  }

  pub fn home(&mut self) {
    self.cursor = 0;
  }

  pub fn end(&mut self) {
    self.cursor = self.text.chars().count();
  }

  pub fn clear(&mut self) {
    self.text.clear();
    self.cursor = 0;
    self.scroll = 0;
  }

  /// Validate the current text. Blank input yields the validation notice and
  /// nothing is forwarded; otherwise the trimmed query is returned.
  pub fn submit(&mut self) -> Result<Query, Notice> {
    let query = Query::parse(&self.text).ok_or(Notice::EmptyQuery)?;
    if self.clear_on_submit {
      self.clear();
    }
    Ok(query)
  }

  /// The slice of text visible in a field `width` columns wide, and the
  /// cursor's column within it. Scrolls horizontally to keep the cursor in view.
  pub fn viewport(&mut self, width: usize) -> (String, usize) {
    let width = width.max(1);
    let cursor_col = display_width(&self.text, self.cursor);

    if cursor_col < self.scroll {
      self.scroll = cursor_col;
    } else if cursor_col >= self.scroll + width {
      self.scroll = cursor_col.saturating_sub(width) + 1;
    }

    let scroll = self.scroll;
    let visible: String = self
      .text
      .chars()
      .scan(0usize, |col, c| {
        let w = c.width().unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= scroll)
      .take_while(|(start, _, _)| *start < scroll + width)
      .map(|(_, _, c)| c)
      .collect();

    (visible, cursor_col - scroll)
  }
}
