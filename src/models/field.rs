/// Which page edge a field's `y` is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// PDF user space: `y` grows upward from the bottom edge.
    #[default]
    Bottom,
    /// `y` is the distance below the top edge.
    Top,
}

/// One piece of text to be drawn at an absolute position on a PDF page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextField {
    pub text: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Zero-based; the stamper clamps it into the document's page range.
    pub page: usize,
    pub font_size: Option<f32>,
    /// Enables greedy word wrapping when set to a positive width.
    pub max_width: Option<f32>,
    pub line_height: Option<f32>,
    pub origin: Origin,
}

impl TextField {
    pub fn at(text: impl Into<String>, x: f32, y: f32) -> Self {
        TextField {
            text: text.into(),
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }

    pub fn wrapped(mut self, max_width: f32, line_height: Option<f32>) -> Self {
        self.max_width = Some(max_width);
        self.line_height = line_height;
        self
    }

    pub fn from_top(mut self) -> Self {
        self.origin = Origin::Top;
        self
    }
}
