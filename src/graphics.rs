use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use std::io::{Cursor, Write};

use crate::display::DisplayMode;

// --- Poster Widget ---

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// Pixel size a poster must be resized to before it fills `area` exactly.
/// Half-block cells carry two pixel rows each.
pub fn target_pixels(area: Rect, mode: DisplayMode) -> (u32, u32) {
  let w = u32::from(area.width).max(1);
  let h = u32::from(area.height).max(1);
  match mode.cell_mode() {
    DisplayMode::Ascii => (w, h),
    _ => (w, h * 2),
  }
}

/// Resize a poster so it covers `area` in the given mode.
pub fn fit_poster(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let (w, h) = target_pixels(area, mode);
  image.resize_to_fill(w, h, FilterType::Triangle)
}

/// Draws a pre-fitted poster, or a placeholder when there is none.
pub struct PosterWidget<'a> {
  pub image: Option<&'a DynamicImage>,
  pub mode: DisplayMode,
  pub placeholder: Style,
}

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match (self.image, self.mode.cell_mode()) {
      (Some(image), DisplayMode::Ascii) => render_ascii(image, area, buf),
      (Some(image), _) => render_half_block(image, area, buf),
      (None, _) => render_placeholder(area, buf, self.placeholder),
    }
  }
}

fn cell(area: Rect, x: u32, y: u32) -> (u16, u16) {
  let x = u16::try_from(x).unwrap_or(u16::MAX);
  let y = u16::try_from(y).unwrap_or(u16::MAX);
  (area.x.saturating_add(x), area.y.saturating_add(y))
}

fn render_half_block(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let cols = rgb.width().min(u32::from(area.width));
  let rows = rgb.height().div_ceil(2).min(u32::from(area.height));

  for y in 0..rows {
    for x in 0..cols {
      let upper = rgb.get_pixel(x, y * 2);
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = match rgb.get_pixel_checked(x, y * 2 + 1) {
        Some(lower) => Color::Rgb(lower[0], lower[1], lower[2]),
        None => Color::Reset,
      };
      let (cx, cy) = cell(area, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let cols = luma.width().min(u32::from(area.width));
  let rows = luma.height().min(u32::from(area.height));
  let top = ASCII_RAMP.len() - 1;

  for y in 0..rows {
    for x in 0..cols {
      let level = usize::from(luma.get_pixel(x, y)[0]) * top / 255;
      let (cx, cy) = cell(area, x, y);
      buf.set_string(cx, cy, ASCII_RAMP[level.min(top)], Style::default());
    }
  }
}

/// Shaded frame with a film glyph in the middle.
fn render_placeholder(area: Rect, buf: &mut Buffer, style: Style) {
  for y in area.top()..area.bottom() {
    for x in area.left()..area.right() {
      buf.set_string(x, y, "░", style);
    }
  }
  let mid_y = area.y + area.height / 2;
  let mid_x = area.x + area.width.saturating_sub(2) / 2;
  buf.set_string(mid_x, mid_y, "▶", style);
}

// --- Kitty Graphics Protocol ---
//
// The overlay poster is transmitted as PNG over the Kitty graphics protocol:
//
//   First:     \x1B_G a=T,f=100,t=d,i=<id>,p=1,c=<cols>,r=<rows>,q=2,m=1;<base64 chunk>\x1B\\
//   Continue:  \x1B_G m=1;<base64 chunk>\x1B\\
//   Last:      \x1B_G m=0;<base64 chunk>\x1B\\
//   Delete:    \x1B_G a=d,d=i,i=<id>,q=2\x1B\\
//
// Re-sending with the same image id replaces the previous placement, so
// switching between selections never flashes an empty frame.

const KITTY_CHUNK_SIZE: usize = 4096;
const KITTY_IMAGE_ID: u32 = 7;

/// Build the full escape sequence that places `image` over `area`.
pub fn kitty_sequence(image: &DynamicImage, area: Rect) -> Result<String> {
  let mut png = Vec::new();
  image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).context("Failed to encode poster as PNG for kitty")?;

  let b64 = BASE64.encode(&png);
  let chunks: Vec<&str> = b64
    .as_bytes()
    .chunks(KITTY_CHUNK_SIZE)
    .map(std::str::from_utf8)
    .collect::<Result<_, _>>()
    .context("base64 chunk was not valid UTF-8")?;
  let last = chunks.len().saturating_sub(1);

  let mut out = format!("\x1B[{};{}H", area.y.saturating_add(1), area.x.saturating_add(1));
  for (i, chunk) in chunks.iter().enumerate() {
    let more = u8::from(i < last);
    if i == 0 {
      out.push_str(&format!(
        "\x1B_Ga=T,f=100,t=d,i={},p=1,c={},r={},q=2,m={};{}\x1B\\",
        KITTY_IMAGE_ID, area.width, area.height, more, chunk
      ));
    } else {
      out.push_str(&format!("\x1B_Gm={};{}\x1B\\", more, chunk));
    }
  }
  Ok(out)
}

/// Render `image` at `area` using the Kitty graphics protocol.
pub fn kitty_render_image(image: &DynamicImage, area: Rect) -> Result<()> {
  if area.is_empty() {
    return Ok(());
  }
  let seq = kitty_sequence(image, area)?;
  let mut stdout = std::io::stdout();
  stdout.write_all(seq.as_bytes()).context("Failed to write kitty image")?;
  stdout.flush().context("Failed to flush kitty image")?;
  Ok(())
}

/// Remove the overlay poster placement.
pub fn kitty_delete_placement() -> Result<()> {
  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B_Ga=d,d=i,i={},q=2\x1B\\", KITTY_IMAGE_ID).context("Failed to write kitty delete")?;
  stdout.flush().context("Failed to flush kitty delete")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
  }

  #[test]
  fn target_pixels_per_mode() {
    let area = Rect::new(0, 0, 18, 13);
    assert_eq!(target_pixels(area, DisplayMode::Direct), (18, 26));
    assert_eq!(target_pixels(area, DisplayMode::Kitty), (18, 26));
    assert_eq!(target_pixels(area, DisplayMode::Ascii), (18, 13));
  }

  #[test]
  fn fit_poster_covers_area() {
    let poster = solid(185, 278, [10, 20, 30]);
    let fitted = fit_poster(&poster, Rect::new(0, 0, 18, 13), DisplayMode::Direct);
    assert_eq!((fitted.width(), fitted.height()), (18, 26));
  }

  #[test]
  fn half_block_uses_upper_and_lower_pixels() {
    let image = solid(4, 4, [200, 10, 10]);
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    PosterWidget { image: Some(&image), mode: DisplayMode::Direct, placeholder: Style::default() }
      .render(area, &mut buf);

    let c = &buf[(3, 1)];
    assert_eq!(c.symbol(), "▀");
    assert_eq!(c.fg, Color::Rgb(200, 10, 10));
    assert_eq!(c.bg, Color::Rgb(200, 10, 10));
  }

  #[test]
  fn ascii_maps_brightness_to_ramp() {
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    let white = solid(2, 1, [255, 255, 255]);
    PosterWidget { image: Some(&white), mode: DisplayMode::Ascii, placeholder: Style::default() }
      .render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "@");

    let black = solid(2, 1, [0, 0, 0]);
    PosterWidget { image: Some(&black), mode: DisplayMode::Ascii, placeholder: Style::default() }
      .render(area, &mut buf);
    assert_eq!(buf[(1, 0)].symbol(), " ");
  }

  #[test]
  fn missing_poster_draws_placeholder() {
    let area = Rect::new(0, 0, 6, 3);
    let mut buf = Buffer::empty(area);
    PosterWidget { image: None, mode: DisplayMode::Direct, placeholder: Style::default() }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "░");
    assert_eq!(buf[(2, 1)].symbol(), "▶");
  }

  #[test]
  fn kitty_sequence_is_chunked() {
    // xorshift noise doesn't compress, so the PNG spans several base64 chunks.
    let mut state: u32 = 0x9E37_79B9;
    let mut noisy = RgbImage::new(128, 128);
    for p in noisy.pixels_mut() {
      state ^= state << 13;
      state ^= state >> 17;
      state ^= state << 5;
      let [r, g, b, _] = state.to_le_bytes();
      *p = Rgb([r, g, b]);
    }
    let seq = kitty_sequence(&DynamicImage::ImageRgb8(noisy), Rect::new(4, 2, 30, 20)).unwrap();

    assert!(seq.starts_with("\x1B[3;5H\x1B_Ga=T,f=100,t=d,i=7,p=1,c=30,r=20,q=2,m=1;"));
    assert!(seq.matches("\x1B_G").count() >= 3);
    assert!(seq.contains("\x1B_Gm=1;"));
    assert_eq!(seq.matches("m=0;").count(), 1);
    assert!(seq.ends_with("\x1B\\"));
  }

  #[test]
  fn kitty_single_chunk_is_final() {
    let seq = kitty_sequence(&solid(2, 2, [1, 2, 3]), Rect::new(0, 0, 2, 2)).unwrap();
    assert!(seq.contains("c=2,r=2,q=2,m=0;"));
    assert_eq!(seq.matches("\x1B_G").count(), 1);
  }
}
