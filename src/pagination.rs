//! Page bar windowing.
//!
//! Shows a window of `range` pages around the current one plus `margin`
//! pages pinned at each end, with gaps collapsed into a single `…`.

use crate::constants::constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
  Page(u32),
  Gap,
}

/// Window layout with the configured range/margin.
pub fn page_slots(current: u32, total: u32) -> Vec<PageSlot> {
  let c = constants();
  page_slots_with(current, total, c.page_range_displayed, c.margin_pages_displayed)
}

/// `current` and the returned page numbers are 1-based. Returns an empty
/// layout when there is nothing to paginate (`total <= 1`).
pub fn page_slots_with(current: u32, total: u32, range: u32, margin: u32) -> Vec<PageSlot> {
  if total <= 1 {
    return Vec::new();
  }
  if total <= range {
    return (1..=total).map(PageSlot::Page).collect();
  }

  // Work 0-based, in half-page units: the window splits `range` evenly
  // around the current page, so an odd range leaves a half page each side.
  let selected = i64::from(current.clamp(1, total) - 1);
  let (range, total_i) = (i64::from(range), i64::from(total));
  let (left2, right2) = if 2 * selected > 2 * total_i - range {
    let right2 = 2 * (total_i - selected);
    (2 * range - right2, right2)
  } else if 2 * selected < range {
    (2 * selected, 2 * range - 2 * selected)
  } else {
    (range, range)
  };
  let right2 = if selected == 0 && range > 1 { right2 - 2 } else { right2 };

  let mut slots = Vec::new();
  for index in 0..total {
    let page = index + 1;
    let doubled = 2 * i64::from(index);
    let in_window = doubled + left2 >= 2 * selected && doubled <= 2 * selected + right2;
    if page <= margin || page > total - margin || in_window {
      slots.push(PageSlot::Page(page));
    } else if slots.last() != Some(&PageSlot::Gap) {
      slots.push(PageSlot::Gap);
    }
  }
  slots
}

#[cfg(test)]
mod tests {
  use super::*;
  use PageSlot::{Gap, Page};

  fn render(slots: &[PageSlot]) -> String {
    slots
      .iter()
      .map(|s| match s {
        Page(n) => n.to_string(),
        Gap => "…".to_string(),
      })
      .collect::<Vec<_>>()
      .join(" ")
  }

  #[test]
  fn single_page_has_no_bar() {
    assert!(page_slots_with(1, 0, 5, 1).is_empty());
    assert!(page_slots_with(1, 1, 5, 1).is_empty());
  }

  #[test]
  fn few_pages_are_all_shown() {
    assert_eq!(render(&page_slots_with(2, 4, 5, 1)), "1 2 3 4");
    assert_eq!(render(&page_slots_with(5, 5, 5, 1)), "1 2 3 4 5");
  }

  #[test]
  fn first_page_window() {
    assert_eq!(render(&page_slots_with(1, 20, 5, 1)), "1 2 3 4 5 … 20");
  }

  #[test]
  fn middle_page_window() {
    assert_eq!(render(&page_slots_with(10, 20, 5, 1)), "1 … 8 9 10 11 12 … 20");
  }

  #[test]
  fn last_page_window() {
    assert_eq!(render(&page_slots_with(20, 20, 5, 1)), "1 … 16 17 18 19 20");
  }

  #[test]
  fn middle_window_holds_exactly_range_pages() {
    assert_eq!(render(&page_slots_with(4, 20, 5, 1)), "1 2 3 4 5 6 … 20");
    assert_eq!(render(&page_slots_with(17, 20, 5, 1)), "1 … 15 16 17 18 19 20");
    assert_eq!(render(&page_slots_with(6, 20, 4, 1)), "1 … 4 5 6 7 8 … 20");
  }

  #[test]
  fn window_touching_margin_has_no_gap() {
    assert_eq!(render(&page_slots_with(3, 20, 5, 1)), "1 2 3 4 5 6 … 20");
  }

  #[test]
  fn out_of_range_current_is_clamped() {
    assert_eq!(render(&page_slots_with(99, 6, 5, 1)), render(&page_slots_with(6, 6, 5, 1)));
  }
}
