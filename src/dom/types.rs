use serde::{Deserialize, Serialize};

/// Backend node ID - stable identifier from CDP
pub type BackendNodeId = i64;

/// Index of a node in a [`Document`](super::Document) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Bounding rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Zero width and zero height; a box that is only thin in one
    /// dimension is still rendered.
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The subset of computed style the engine reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: Option<String>,
    pub visibility: Option<String>,
    pub opacity: Option<String>,
}

impl ComputedStyle {
    pub fn is_display_none(&self) -> bool {
        self.display.as_deref() == Some("none")
    }

    pub fn is_visibility_hidden(&self) -> bool {
        matches!(self.visibility.as_deref(), Some("hidden") | Some("collapse"))
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity
            .as_deref()
            .and_then(|o| o.trim().parse::<f64>().ok())
            .map(|o| o == 0.0)
            .unwrap_or(false)
    }

    /// Parse the properties we care about out of an inline `style` attribute
    pub fn from_inline(style: &str) -> Self {
        let mut computed = Self::default();
        for declaration in style.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_lowercase();
            match name.trim().to_lowercase().as_str() {
                "display" => computed.display = Some(value),
                "visibility" => computed.visibility = Some(value),
                "opacity" => computed.opacity = Some(value),
                _ => {}
            }
        }
        computed
    }
}

/// Layout/snapshot data for an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutData {
    pub bounds: DOMRect,
    pub style: ComputedStyle,
}

impl LayoutData {
    pub fn is_visible(&self) -> bool {
        !self.style.is_display_none()
            && !self.style.is_visibility_hidden()
            && !self.bounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_style_parsing() {
        let style = ComputedStyle::from_inline("color: red; DISPLAY: None !important;opacity:0");
        assert!(style.is_display_none());
        assert!(style.is_transparent());
        assert!(!style.is_visibility_hidden());
    }

    #[test]
    fn test_empty_rect_needs_both_dimensions_zero() {
        assert!(DOMRect::default().is_empty());
        assert!(!DOMRect::new(0.0, 0.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn test_layout_visibility() {
        let layout = LayoutData {
            bounds: DOMRect::new(0.0, 0.0, 10.0, 10.0),
            style: ComputedStyle::default(),
        };
        assert!(layout.is_visible());

        let hidden = LayoutData {
            style: ComputedStyle { visibility: Some("hidden".into()), ..Default::default() },
            ..layout.clone()
        };
        assert!(!hidden.is_visible());
    }
}
