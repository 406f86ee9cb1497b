use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Screen corner an overlay is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    /// The corner on the other side of the frame, same edge
    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::TopRight,
            Self::TopRight => Self::TopLeft,
            Self::BottomLeft => Self::BottomRight,
            Self::BottomRight => Self::BottomLeft,
        }
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }
}

/// How text is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_file: Option<PathBuf>,
    pub font_size: u32,
    pub color: String,
}

/// Size of the box drawn behind overlay text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxSize {
    /// Exact box, text centered inside
    Fixed { width: u32, height: u32 },
    /// Box hugs the text with this much padding
    Fit { padding: u32 },
}

/// Translucent box behind overlay text
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub color: String,
    pub opacity: f32,
    pub size: BoxSize,
}

/// One text layer drawn over a base visual
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub text: String,
    pub style: TextStyle,
    pub background: Option<Background>,
    pub anchor: Anchor,

    /// Distance from the anchored edges in pixels
    pub margin: u32,

    /// Seconds into the host clip before the layer appears
    pub delay: f64,
}

impl OverlayLayer {
    pub fn new<S: Into<String>>(text: S, style: TextStyle, anchor: Anchor) -> Self {
        Self {
            text: text.into(),
            style,
            background: None,
            anchor,
            margin: 0,
            delay: 0.0,
        }
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn is_delayed(&self) -> bool {
        self.delay > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_keeps_edge() {
        assert_eq!(Anchor::TopLeft.opposite(), Anchor::TopRight);
        assert_eq!(Anchor::BottomRight.opposite(), Anchor::BottomLeft);
        assert!(!Anchor::TopLeft.opposite().is_bottom());
    }

    #[test]
    fn test_negative_delay_clamped() {
        let style = TextStyle {
            font_file: None,
            font_size: 36,
            color: "white".to_string(),
        };
        let layer = OverlayLayer::new("1", style, Anchor::TopLeft).with_delay(-2.0);
        assert!(!layer.is_delayed());
    }
}
