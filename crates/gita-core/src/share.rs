//! Shareable PNG snapshot of a verse card.
//!
//! The card is drawn with `image`/`imageproc` and text is shaped with `swash`,
//! so Devanagari renders correctly given a font that covers it. The finished
//! PNG goes to a configured share command when there is one, otherwise it is
//! saved to the export directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::shape::ShapeContext;
use swash::text::Script;
use swash::zeno::{Format, Vector};
use swash::{CacheKey, FontRef};
use tracing::{debug, info};

use crate::error::ShareError;
use crate::explanation::Explanation;

pub const APP_NAME: &str = "Gita Modern";

const CARD_WIDTH: u32 = 1080;
const MARGIN: i32 = 64;
const BANNER_PADDING: i32 = 44;

/// Fonts tried in order when none is configured. Each covers Devanagari.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansDevanagari-Regular.otf",
    "/usr/share/fonts/truetype/lohit-devanagari/Lohit-Devanagari.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/DevanagariMT.ttc",
    "/System/Library/Fonts/Kohinoor.ttc",
    "C:\\Windows\\Fonts\\Nirmala.ttf",
];

const CREAM: Rgba<u8> = Rgba([253, 251, 247, 255]);
const SAFFRON: Rgba<u8> = Rgba([234, 88, 12, 255]);
const SAFFRON_LIGHT: Rgba<u8> = Rgba([254, 215, 170, 255]);
const DIVIDER: Rgba<u8> = Rgba([253, 186, 116, 255]);
const INK: Rgba<u8> = Rgba([31, 41, 55, 255]);
const MUTED: Rgba<u8> = Rgba([107, 114, 128, 255]);
const BADGE: Rgba<u8> = Rgba([154, 52, 18, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// The verse shown on a share card.
#[derive(Debug, Clone)]
pub struct ShareCard {
    pub chapter: u8,
    pub verse: u16,
    pub explanation: Explanation,
}

impl ShareCard {
    pub fn file_name(&self) -> String {
        file_name(self.chapter, self.verse)
    }

    pub fn title(&self) -> String {
        share_title(self.chapter, self.verse)
    }

    pub fn text(&self) -> String {
        share_text(&self.explanation)
    }
}

pub fn file_name(chapter: u8, verse: u16) -> String {
    format!("gita-chapter-{}-verse-{}.png", chapter, verse)
}

pub fn share_title(chapter: u8, verse: u16) -> String {
    format!("Bhagavad Gita Chapter {}, Verse {}", chapter, verse)
}

pub fn share_text(explanation: &Explanation) -> String {
    format!("\"{}\" - {}", explanation.key_takeaway, APP_NAME)
}

/// Draws share cards with one loaded font.
pub struct CardRenderer {
    font_data: Vec<u8>,
    offset: u32,
    key: CacheKey,
}

impl CardRenderer {
    /// Load `font_path`, or the first available system font when `None`.
    pub fn load(font_path: Option<&Path>) -> Result<Self, ShareError> {
        if let Some(path) = font_path {
            let data = fs::read(path).map_err(|e| {
                debug!(path = %path.display(), error = %e, "configured font unreadable");
                ShareError::FontUnavailable
            })?;
            return Self::from_bytes(data);
        }

        FONT_CANDIDATES
            .iter()
            .filter_map(|candidate| fs::read(candidate).ok())
            .find_map(|data| Self::from_bytes(data).ok())
            .ok_or(ShareError::FontUnavailable)
    }

    pub fn from_bytes(font_data: Vec<u8>) -> Result<Self, ShareError> {
        let font = FontRef::from_index(&font_data, 0).ok_or(ShareError::FontUnavailable)?;
        let (offset, key) = (font.offset, font.key);
        Ok(Self {
            font_data,
            offset,
            key,
        })
    }

    fn font(&self) -> FontRef<'_> {
        FontRef {
            data: &self.font_data,
            offset: self.offset,
            key: self.key,
        }
    }

    pub fn render(&self, card: &ShareCard) -> RgbaImage {
        let mut painter = Painter::new(self.font());
        let explanation = &card.explanation;
        let content_width = CARD_WIDTH as f32 - 2.0 * MARGIN as f32;
        let banner_text_width = content_width - 2.0 * BANNER_PADDING as f32;

        let takeaway = painter.wrap(&format!("\"{}\"", explanation.key_takeaway), 44.0, banner_text_width);
        let sanskrit = painter.wrap(&explanation.sanskrit, 40.0, content_width);
        let transliteration = painter.wrap(&explanation.transliteration, 28.0, content_width);
        let translation = painter.wrap(&explanation.translation, 30.0, content_width);

        let banner_height = 2 * BANNER_PADDING + line_height(20.0) + block_height(&takeaway, 44.0);
        let body_height = line_height(24.0)
            + 24
            + block_height(&sanskrit, 40.0)
            + 24
            + block_height(&transliteration, 28.0)
            + 36
            + block_height(&translation, 30.0);
        let height = MARGIN + banner_height + 48 + body_height + 56 + line_height(22.0) + MARGIN;

        let mut img: RgbaImage = ImageBuffer::from_pixel(CARD_WIDTH, height as u32, CREAM);

        // Key takeaway banner
        let mut y = MARGIN;
        draw_filled_rect_mut(
            &mut img,
            Rect::at(MARGIN, y).of_size(content_width as u32, banner_height as u32),
            SAFFRON,
        );
        y += BANNER_PADDING;
        painter.draw_centered(&mut img, "KEY TAKEAWAY", y, 20.0, SAFFRON_LIGHT);
        y += line_height(20.0);
        for line in &takeaway {
            painter.draw_centered(&mut img, line, y, 44.0, WHITE);
            y += line_height(44.0);
        }
        y = MARGIN + banner_height + 48;

        // Original verse
        let badge = format!("Ch {} : V {}", card.chapter, card.verse);
        painter.draw_centered(&mut img, &badge, y, 24.0, BADGE);
        y += line_height(24.0) + 24;
        for line in &sanskrit {
            painter.draw_centered(&mut img, line, y, 40.0, INK);
            y += line_height(40.0);
        }
        y += 24;
        for line in &transliteration {
            painter.draw_centered(&mut img, line, y, 28.0, MUTED);
            y += line_height(28.0);
        }
        y += 14;
        draw_filled_rect_mut(
            &mut img,
            Rect::at(CARD_WIDTH as i32 / 2 - 32, y).of_size(64, 4),
            DIVIDER,
        );
        y += 22;
        for line in &translation {
            painter.draw_centered(&mut img, line, y, 30.0, INK);
            y += line_height(30.0);
        }
        y += 56;

        let footer = format!(
            "Bhagavad Gita \u{2022} Chapter {}, Verse {} \u{2022} {}",
            card.chapter, card.verse, APP_NAME
        );
        painter.draw_centered(&mut img, &footer, y, 22.0, MUTED);

        img
    }
}

fn line_height(size: f32) -> i32 {
    (size * 1.4).round() as i32
}

fn block_height(lines: &[String], size: f32) -> i32 {
    lines.len() as i32 * line_height(size)
}

/// Devanagari text needs the Devanagari shaper for conjuncts and vowel signs.
fn script_for(text: &str) -> Script {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        Script::Devanagari
    } else {
        Script::Latin
    }
}

struct Painter<'a> {
    font: FontRef<'a>,
    shape: ShapeContext,
    scale: ScaleContext,
}

impl<'a> Painter<'a> {
    fn new(font: FontRef<'a>) -> Self {
        Self {
            font,
            shape: ShapeContext::new(),
            scale: ScaleContext::new(),
        }
    }

    fn measure(&mut self, text: &str, size: f32) -> f32 {
        let mut shaper = self
            .shape
            .builder(self.font)
            .script(script_for(text))
            .size(size)
            .build();
        shaper.add_str(text);

        let mut width = 0.0;
        shaper.shape_with(|cluster| {
            for glyph in cluster.glyphs {
                width += glyph.advance;
            }
        });
        width
    }

    /// Greedy word wrap by shaped width.
    fn wrap(&mut self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if current.is_empty() || self.measure(&candidate, size) <= max_width {
                    current = candidate;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = word.to_string();
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }

        lines
    }

    fn draw_centered(&mut self, img: &mut RgbaImage, text: &str, y: i32, size: f32, color: Rgba<u8>) {
        let width = self.measure(text, size);
        let x = ((img.width() as f32 - width) / 2.0).max(0.0) as i32;
        self.draw(img, text, x, y, size, color);
    }

    fn draw(&mut self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>) {
        let mut shaper = self
            .shape
            .builder(self.font)
            .script(script_for(text))
            .size(size)
            .build();
        shaper.add_str(text);

        let mut scaler = self.scale.builder(self.font).size(size).hint(true).build();

        let mut pen_x = x as f32;
        let baseline = y as f32 + size;

        shaper.shape_with(|cluster| {
            for glyph in cluster.glyphs {
                let rendered = Render::new(&[
                    Source::ColorOutline(0),
                    Source::ColorBitmap(StrikeWith::BestFit),
                    Source::Outline,
                ])
                .format(Format::Alpha)
                .offset(Vector::new(glyph.x, glyph.y))
                .render(&mut scaler, glyph.id);

                if let Some(mask) = rendered {
                    let left = (pen_x + mask.placement.left as f32) as i32;
                    let top = (baseline - mask.placement.top as f32) as i32;
                    blend_mask(img, &mask.data, left, top, mask.placement.width, mask.placement.height, color);
                }

                pen_x += glyph.advance;
            }
        });
    }
}

fn blend_mask(img: &mut RgbaImage, mask: &[u8], left: i32, top: i32, width: u32, height: u32, color: Rgba<u8>) {
    for py in 0..height {
        for px in 0..width {
            let alpha = mask[(py * width + px) as usize];
            if alpha == 0 {
                continue;
            }
            let dest_x = left + px as i32;
            let dest_y = top + py as i32;
            if dest_x < 0 || dest_y < 0 || dest_x as u32 >= img.width() || dest_y as u32 >= img.height() {
                continue;
            }

            let dest = img.get_pixel_mut(dest_x as u32, dest_y as u32);
            let a = alpha as f32 / 255.0;
            let inv_a = 1.0 - a;
            for channel in 0..3 {
                dest[channel] = (color[channel] as f32 * a + dest[channel] as f32 * inv_a) as u8;
            }
            dest[3] = 255;
        }
    }
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ShareError> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img.clone()).write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Where a share ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the share command.
    Shared,
    /// Saved to disk.
    Downloaded(PathBuf),
}

/// Renders and delivers share cards. Cheap to clone into a blocking task.
#[derive(Debug, Clone)]
pub struct Sharer {
    font_path: Option<PathBuf>,
    share_command: Option<String>,
    export_dir: PathBuf,
}

impl Sharer {
    pub fn new(font_path: Option<PathBuf>, share_command: Option<String>, export_dir: PathBuf) -> Self {
        Self {
            font_path,
            share_command,
            export_dir,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(
            config.font_path.clone(),
            config.share_command.clone(),
            config.export_dir(),
        )
    }

    /// Render `card` to PNG and deliver it. Blocking: run off the UI task.
    pub fn share(&self, card: &ShareCard) -> Result<ShareOutcome, ShareError> {
        let renderer = CardRenderer::load(self.font_path.as_deref())?;
        let png = encode_png(&renderer.render(card))?;
        self.deliver(&png, card)
    }

    fn deliver(&self, png: &[u8], card: &ShareCard) -> Result<ShareOutcome, ShareError> {
        match &self.share_command {
            Some(command) => {
                let path = std::env::temp_dir().join(card.file_name());
                fs::write(&path, png)?;

                let status = Command::new(command)
                    .arg(&path)
                    .arg(card.title())
                    .arg(card.text())
                    .status()?;
                if !status.success() {
                    return Err(ShareError::ShareCommand {
                        command: command.clone(),
                        status: status.to_string(),
                    });
                }
                info!(command = %command, "verse card shared");
                Ok(ShareOutcome::Shared)
            }
            None => {
                fs::create_dir_all(&self.export_dir)?;
                let path = self.export_dir.join(card.file_name());
                fs::write(&path, png)?;
                info!(path = %path.display(), "verse card saved");
                Ok(ShareOutcome::Downloaded(path))
            }
        }
    }
}
