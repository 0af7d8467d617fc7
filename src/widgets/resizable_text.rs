//! Font size resolution for text that follows the ambient font scale.
//!
//! This only decides sizes; measuring and drawing the text is left to the
//! host toolkit.

use crate::scale::font_scale;

/// Font size used when neither the element nor its style sets one.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Inherited text style values that feed into size resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextStyle {
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn line_height(mut self, height: f32) -> Self {
        self.line_height = Some(height);
        self
    }
}

/// Final sizes for a text element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTextSize {
    pub font_size: f32,
    /// `None` leaves the line height to the toolkit.
    pub line_height: Option<f32>,
}

/// A text element that can opt into font scaling.
///
/// Scaling is off unless [`font_slider(true)`](Self::font_slider) is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizableText {
    content: String,
    font_size: Option<f32>,
    line_height: Option<f32>,
    style: TextStyle,
    font_slider: bool,
}

impl ResizableText {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: None,
            line_height: None,
            style: TextStyle::default(),
            font_slider: false,
        }
    }

    /// Explicit font size; takes precedence over the style's.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Explicit line height; takes precedence over the style's.
    pub fn line_height(mut self, height: f32) -> Self {
        self.line_height = Some(height);
        self
    }

    pub fn style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    /// Opt in to (or out of) the ambient font scale.
    pub fn font_slider(mut self, enabled: bool) -> Self {
        self.font_slider = enabled;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn scales(&self) -> bool {
        self.font_slider
    }

    pub fn base_font_size(&self) -> f32 {
        self.font_size
            .or(self.style.font_size)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn base_line_height(&self) -> Option<f32> {
        self.line_height.or(self.style.line_height)
    }

    /// Sizes at `scale`; `scale` is ignored unless the element opted in.
    pub fn resolve(&self, scale: f32) -> ResolvedTextSize {
        let factor = if self.font_slider { scale } else { 1.0 };
        ResolvedTextSize {
            font_size: self.base_font_size() * factor,
            line_height: self.base_line_height().map(|height| height * factor),
        }
    }

    /// Sizes at the ambient font scale.
    pub fn resolve_ambient(&self) -> ResolvedTextSize {
        self.resolve(font_scale())
    }
}

/// Create a resizable text element.
///
/// ```ignore
/// resizable_text("Heading").font_size(24.0).font_slider(true)
/// ```
pub fn resizable_text(content: impl Into<String>) -> ResizableText {
    ResizableText::new(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_font_size_precedence() {
        let style = TextStyle::new().font_size(20.0);
        assert_eq!(resizable_text("a").base_font_size(), 14.0);
        assert_eq!(resizable_text("a").style(style).base_font_size(), 20.0);
        assert_eq!(
            resizable_text("a").style(style).font_size(15.0).base_font_size(),
            15.0
        );
    }

    #[test]
    fn scaling_requires_opt_in() {
        let text = resizable_text("a").font_size(10.0).line_height(12.0);
        assert_eq!(
            text.resolve(1.5),
            ResolvedTextSize {
                font_size: 10.0,
                line_height: Some(12.0)
            }
        );

        let text = text.font_slider(true);
        assert_eq!(
            text.resolve(1.5),
            ResolvedTextSize {
                font_size: 15.0,
                line_height: Some(18.0)
            }
        );
    }

    #[test]
    fn unspecified_line_height_stays_unspecified() {
        let text = resizable_text("a").font_slider(true);
        assert_eq!(text.resolve(2.0).line_height, None);
        assert_eq!(text.resolve(2.0).font_size, 28.0);
    }

    #[test]
    fn style_line_height_scales() {
        let text = resizable_text("a")
            .style(TextStyle::new().line_height(20.0))
            .font_slider(true);
        assert_eq!(text.resolve(0.5).line_height, Some(10.0));
    }

    #[test]
    fn ambient_resolution_is_neutral_without_provider() {
        let text = resizable_text("a").font_size(16.0).font_slider(true);
        assert_eq!(text.resolve_ambient().font_size, 16.0);
        assert_eq!(text.content(), "a");
        assert!(text.scales());
    }
}
