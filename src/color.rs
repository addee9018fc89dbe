//! Named colours for colour-valued patterns.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Display};

// -------------------------------------------------------------------------------------------------

/// An sRGB colour. Colour patterns drive visual layers in editors and video
/// mappers; the core only names and transports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// map of CSS colour names understood by the colour leaf parser
lazy_static! {
    static ref COLOR_TABLE: HashMap<&'static str, Color> = {
        HashMap::from([
            ("black", Color::new(0x00, 0x00, 0x00)),
            ("white", Color::new(0xff, 0xff, 0xff)),
            ("red", Color::new(0xff, 0x00, 0x00)),
            ("green", Color::new(0x00, 0x80, 0x00)),
            ("blue", Color::new(0x00, 0x00, 0xff)),
            ("yellow", Color::new(0xff, 0xff, 0x00)),
            ("cyan", Color::new(0x00, 0xff, 0xff)),
            ("magenta", Color::new(0xff, 0x00, 0xff)),
            ("orange", Color::new(0xff, 0xa5, 0x00)),
            ("purple", Color::new(0x80, 0x00, 0x80)),
            ("pink", Color::new(0xff, 0xc0, 0xcb)),
            ("brown", Color::new(0xa5, 0x2a, 0x2a)),
            ("grey", Color::new(0x80, 0x80, 0x80)),
            ("gray", Color::new(0x80, 0x80, 0x80)),
            ("lime", Color::new(0x00, 0xff, 0x00)),
            ("navy", Color::new(0x00, 0x00, 0x80)),
            ("teal", Color::new(0x00, 0x80, 0x80)),
            ("olive", Color::new(0x80, 0x80, 0x00)),
            ("maroon", Color::new(0x80, 0x00, 0x00)),
            ("silver", Color::new(0xc0, 0xc0, 0xc0)),
            ("gold", Color::new(0xff, 0xd7, 0x00)),
            ("indigo", Color::new(0x4b, 0x00, 0x82)),
            ("violet", Color::new(0xee, 0x82, 0xee)),
            ("coral", Color::new(0xff, 0x7f, 0x50)),
            ("salmon", Color::new(0xfa, 0x80, 0x72)),
            ("khaki", Color::new(0xf0, 0xe6, 0x8c)),
            ("turquoise", Color::new(0x40, 0xe0, 0xd0)),
            ("orchid", Color::new(0xda, 0x70, 0xd6)),
            ("ivory", Color::new(0xff, 0xff, 0xf0)),
            ("beige", Color::new(0xf5, 0xf5, 0xdc)),
        ])
    };
}

/// Looks a colour name up; names are matched case-insensitively.
pub fn named_color(name: &str) -> Option<Color> {
    COLOR_TABLE.get(name.to_ascii_lowercase().as_str()).copied()
}

// -------------------------------------------------------------------------------------------------
