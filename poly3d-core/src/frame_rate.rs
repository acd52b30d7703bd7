/// Frames-per-second overlay
use std::time::{Duration, Instant};

use crate::canvas::Surface;
use crate::error::RenderError;
use crate::fonts::{Font, FontManager, GlyphRun};
use crate::geometry::Color;

/// Counts frames and redraws a "Frame rate: N" label once per second
#[derive(Debug, Default)]
pub struct FrameRate {
    deadline: Option<Instant>,
    frames: u32,
    label: Option<GlyphRun>,
}

impl FrameRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame and draw the current label at `(x, y)`
    pub fn write<S: Surface + ?Sized>(
        &mut self,
        fonts: &FontManager,
        surface: &mut S,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        self.advance(Instant::now(), fonts)?;
        match &self.label {
            Some(label) => label.render(surface, x, y),
            None => Ok(()),
        }
    }

    fn advance(&mut self, now: Instant, fonts: &FontManager) -> Result<(), RenderError> {
        if self.deadline.map_or(true, |deadline| now >= deadline) {
            self.deadline = Some(now + Duration::from_secs(1));
            let text = format!("Frame rate: {}", self.frames);
            let label = fonts.writer(Font::Default, &text, Color::WHITE)?;
            if let Some(old) = self.label.replace(label) {
                old.release();
            }
            self.frames = 0;
        }
        self.frames += 1;
        Ok(())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().map(GlyphRun::text)
    }

    /// Drop the current label; the next frame builds a new one
    pub fn release(&mut self) {
        if let Some(label) = self.label.take() {
            label.release();
        }
        self.deadline = None;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FontError;

    #[test]
    fn test_label_refreshes_each_second() {
        let fonts = FontManager::new();
        let mut rate = FrameRate::new();
        let start = Instant::now();

        rate.advance(start, &fonts).unwrap();
        assert_eq!(rate.label(), Some("Frame rate: 0"));
        for i in 1..30 {
            rate.advance(start + Duration::from_millis(i * 10), &fonts).unwrap();
        }
        assert_eq!(rate.label(), Some("Frame rate: 0"));

        rate.advance(start + Duration::from_secs(1), &fonts).unwrap();
        assert_eq!(rate.label(), Some("Frame rate: 30"));
    }

    #[test]
    fn test_single_label_outstanding() {
        let fonts = FontManager::new();
        let mut rate = FrameRate::new();
        let start = Instant::now();
        for second in 0..5 {
            rate.advance(start + Duration::from_secs(second), &fonts).unwrap();
            assert_eq!(fonts.live_runs(), 1);
        }

        rate.release();
        assert_eq!(rate.label(), None);
        assert_eq!(fonts.live_runs(), 0);
    }

    #[test]
    fn test_released_fonts_fail() {
        let mut fonts = FontManager::new();
        fonts.release();
        let mut rate = FrameRate::new();
        assert!(matches!(
            rate.advance(Instant::now(), &fonts),
            Err(RenderError::Font(FontError::Released))
        ));
    }
}
