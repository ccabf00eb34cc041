use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    // Edges are inclusive on all four sides.
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn lighten(self, percent: i32) -> Self {
        let delta = (f64::from(255 * percent) / 100.0).round() as i32;
        let shift = |c: u8| (c as i32 + delta).clamp(0, 255) as u8;
        Self {
            r: shift(self.r),
            g: shift(self.g),
            b: shift(self.b),
        }
    }

    pub fn to_hex_string(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub family: FontFamily,
    pub bold: bool,
    pub color: Color,
    pub align: TextAlign,
}

impl TextStyle {
    pub const fn sans(size: f32, color: Color) -> Self {
        Self {
            size,
            family: FontFamily::Sans,
            bold: false,
            color,
            align: TextAlign::Left,
        }
    }

    pub const fn mono(size: f32, color: Color) -> Self {
        Self {
            size,
            family: FontFamily::Mono,
            bold: false,
            color,
            align: TextAlign::Left,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

pub trait TextMeasure {
    fn measure_text(&self, text: &str, style: &TextStyle) -> f32;
}

pub trait Canvas: TextMeasure {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color);

    fn fill_gradient(&mut self, rect: Rect, radius: f32, stops: &[GradientStop]);

    fn draw_text(&mut self, text: &str, position: Point, style: &TextStyle);
}

// Wide glyphs (CJK, most emoji) count as two columns.
pub fn approximate_text_width(text: &str, style: &TextStyle) -> f32 {
    let advance = match (style.family, style.bold) {
        (FontFamily::Mono, _) => 0.6,
        (FontFamily::Sans, false) => 0.55,
        (FontFamily::Sans, true) => 0.6,
    };
    UnicodeWidthStr::width(text) as f32 * style.size * advance
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    RoundedRect {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    Gradient {
        rect: Rect,
        radius: f32,
        stops: Vec<GradientStop>,
    },
    Text {
        content: String,
        position: Point,
        style: TextStyle,
    },
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }
}

impl TextMeasure for RecordingCanvas {
    fn measure_text(&self, text: &str, style: &TextStyle) -> f32 {
        approximate_text_width(text, style)
    }
}

impl Canvas for RecordingCanvas {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        self.commands.push(DrawCommand::RoundedRect {
            rect,
            radius,
            color,
        });
    }

    fn fill_gradient(&mut self, rect: Rect, radius: f32, stops: &[GradientStop]) {
        self.commands.push(DrawCommand::Gradient {
            rect,
            radius,
            stops: stops.to_vec(),
        });
    }

    fn draw_text(&mut self, text: &str, position: Point, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            content: text.to_string(),
            position,
            style: *style,
        });
    }
}
