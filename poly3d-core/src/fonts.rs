/// Font set and glyph runs
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::canvas::Surface;
use crate::error::{FontError, RenderError};
use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Font {
    #[default]
    Default,
}

impl Font {
    pub const ALL: [Font; 1] = [Font::Default];

    /// File name of the font source under `resources/fonts`
    pub fn source(self) -> &'static str {
        match self {
            Font::Default => "Tahoma.ttf",
        }
    }

    /// Nominal point size
    pub fn point_size(self) -> u32 {
        match self {
            Font::Default => 12,
        }
    }
}

/// Owns the font set from startup until [`FontManager::release`].
///
/// A manager created with [`FontManager::new`] relies on the surface's own
/// glyphs; [`FontManager::load`] additionally requires every font source to
/// be present on disk. Glyph runs handed out by [`FontManager::writer`] are
/// counted until they are released or dropped.
#[derive(Debug, Default)]
pub struct FontManager {
    sources: Option<PathBuf>,
    released: bool,
    live: Arc<AtomicUsize>,
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate every font source under `<base>/resources/fonts`
    pub fn load(base: impl AsRef<Path>) -> Result<Self, FontError> {
        let dir = base.as_ref().join("resources").join("fonts");
        for font in Font::ALL {
            let path = dir.join(font.source());
            if !path.is_file() {
                return Err(FontError::MissingSource(path));
            }
        }
        info!("loaded {} font(s) from {}", Font::ALL.len(), dir.display());
        Ok(Self {
            sources: Some(dir),
            ..Self::default()
        })
    }

    pub fn source_path(&self, font: Font) -> Option<PathBuf> {
        self.sources.as_ref().map(|dir| dir.join(font.source()))
    }

    /// Prepare `text` for rendering in `font`
    pub fn writer(&self, font: Font, text: &str, color: Color) -> Result<GlyphRun, FontError> {
        if self.released {
            return Err(FontError::Released);
        }
        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(GlyphRun {
            font,
            text: text.to_string(),
            color,
            live: Arc::clone(&self.live),
        })
    }

    /// Glyph runs from this manager that have not been released yet
    pub fn live_runs(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            let live = self.live_runs();
            if live > 0 {
                warn!("fonts released with {live} glyph run(s) outstanding");
            }
            debug!("fonts released");
        }
    }
}

/// A rendered line of text that can be blitted repeatedly. Counts as live
/// in its manager until released or dropped.
#[derive(Debug)]
pub struct GlyphRun {
    font: Font,
    text: String,
    color: Color,
    live: Arc<AtomicUsize>,
}

impl Clone for GlyphRun {
    fn clone(&self) -> Self {
        self.live.fetch_add(1, Ordering::Relaxed);
        Self {
            font: self.font,
            text: self.text.clone(),
            color: self.color,
            live: Arc::clone(&self.live),
        }
    }
}

impl PartialEq for GlyphRun {
    fn eq(&self, other: &Self) -> bool {
        self.font == other.font && self.text == other.text && self.color == other.color
    }
}

impl Drop for GlyphRun {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

impl GlyphRun {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> Font {
        self.font
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Draw with the top-left corner at `(x, y)`
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        surface.draw_text(x, y, &self.text, self.font, self.color)
    }

    /// Give the run back to its manager
    pub fn release(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_writer_after_release() {
        let mut fonts = FontManager::new();
        let run = fonts.writer(Font::Default, "hello", Color::WHITE).unwrap();
        assert_eq!(run.text(), "hello");
        assert_eq!(run.color(), Color::WHITE);

        fonts.release();
        fonts.release();
        assert!(fonts.is_released());
        assert_eq!(
            fonts.writer(Font::Default, "hello", Color::WHITE),
            Err(FontError::Released)
        );
    }

    #[test]
    fn test_live_runs() {
        let mut fonts = FontManager::new();
        let first = fonts.writer(Font::Default, "a", Color::WHITE).unwrap();
        let second = fonts.writer(Font::Default, "b", Color::WHITE).unwrap();
        let copy = second.clone();
        assert_eq!(copy, second);
        assert_eq!(fonts.live_runs(), 3);

        first.release();
        assert_eq!(fonts.live_runs(), 2);
        drop(copy);
        drop(second);
        assert_eq!(fonts.live_runs(), 0);

        let leaked = fonts.writer(Font::Default, "c", Color::WHITE).unwrap();
        fonts.release();
        assert_eq!(fonts.live_runs(), 1);
        leaked.release();
        assert_eq!(fonts.live_runs(), 0);
    }

    #[test]
    fn test_load_missing_source() {
        let base = std::env::temp_dir().join("poly3d-fonts-missing");
        let err = FontManager::load(&base).unwrap_err();
        assert_eq!(
            err,
            FontError::MissingSource(base.join("resources").join("fonts").join("Tahoma.ttf"))
        );
    }

    #[test]
    fn test_load_existing_sources() {
        let base = std::env::temp_dir().join(format!("poly3d-fonts-{}", std::process::id()));
        let dir = base.join("resources").join("fonts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Tahoma.ttf"), b"").unwrap();

        let fonts = FontManager::load(&base).unwrap();
        assert_eq!(fonts.source_path(Font::Default), Some(dir.join("Tahoma.ttf")));
        assert_eq!(FontManager::new().source_path(Font::Default), None);
        fs::remove_dir_all(&base).unwrap();
    }
}
