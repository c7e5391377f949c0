//! Active SGR style.
//!
//! A [`Style`] is the set of graphic-rendition attributes in effect at some
//! point of a string. It is updated by interpreting SGR parameters and can be
//! rendered back into the shortest single SGR sequence that reproduces it.
//! Colours are recorded verbatim; no colour-space conversion happens here.

use std::str::FromStr;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::error::ArgumentError;

/// SGR reset: `CSI 0 m`.
pub const SGR_RESET: &[u8] = b"\x1b[0m";

bitflags! {
    /// SGR text attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SgrFlags: u16 {
        const BOLD             = 1 << 0;
        const DIM              = 1 << 1;
        const ITALIC           = 1 << 2;
        const UNDERLINE        = 1 << 3;
        const BLINK            = 1 << 4;
        const RAPID_BLINK      = 1 << 5;
        const INVERSE          = 1 << 6;
        const HIDDEN           = 1 << 7;
        const STRIKETHROUGH    = 1 << 8;
        const FRAKTUR          = 1 << 9;
        const DOUBLE_UNDERLINE = 1 << 10;
        const FRAMED           = 1 << 11;
        const ENCIRCLED        = 1 << 12;
        const OVERLINE         = 1 << 13;
    }
}

bitflags! {
    /// Colour capabilities assumed for the target terminal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TermCaps: u8 {
        /// Bright colours (SGR 90-97, 100-107).
        const BRIGHT    = 1 << 0;
        /// 256-colour palette (`38;5;n`).
        const COLOR_256 = 1 << 1;
        /// 24-bit colour (`38;2;r;g;b`).
        const TRUECOLOR = 1 << 2;
    }
}

impl Default for TermCaps {
    fn default() -> Self {
        Self::BRIGHT | Self::COLOR_256
    }
}

impl TermCaps {
    /// Build a capability set from names (`bright`, `256`, `truecolor`).
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::UnknownCapability`] for unrecognized names.
    pub fn from_names<'a, I>(names: I) -> Result<Self, ArgumentError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().try_fold(Self::empty(), |caps, name| {
            name.parse::<Self>().map(|cap| caps | cap)
        })
    }
}

impl FromStr for TermCaps {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bright" => Ok(Self::BRIGHT),
            "256" => Ok(Self::COLOR_256),
            "truecolor" => Ok(Self::TRUECOLOR),
            other => Err(ArgumentError::UnknownCapability(other.to_string())),
        }
    }
}

/// A foreground or background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// Standard colour 0-7 (SGR 30-37 / 40-47).
    Ansi(u8),
    /// Bright colour 0-7 (SGR 90-97 / 100-107).
    Bright(u8),
    /// 256-colour palette index.
    Indexed(u8),
    /// 24-bit colour.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Push the SGR parameters selecting this colour. `base` is 30 for
    /// foreground and 40 for background.
    fn push_params(self, base: u16, out: &mut SmallVec<[u16; 16]>) {
        match self {
            Self::Default => {}
            Self::Ansi(n) => out.push(base + u16::from(n)),
            Self::Bright(n) => out.push(base + 60 + u16::from(n)),
            Self::Indexed(n) => out.extend([base + 8, 5, u16::from(n)]),
            Self::Rgb(r, g, b) => {
                out.extend([base + 8, 2, u16::from(r), u16::from(g), u16::from(b)]);
            }
        }
    }
}

/// Ordered table of (flag, on code) used when rendering.
const FLAG_TABLE: [(SgrFlags, u16); 14] = [
    (SgrFlags::BOLD, 1),
    (SgrFlags::DIM, 2),
    (SgrFlags::ITALIC, 3),
    (SgrFlags::UNDERLINE, 4),
    (SgrFlags::BLINK, 5),
    (SgrFlags::RAPID_BLINK, 6),
    (SgrFlags::INVERSE, 7),
    (SgrFlags::HIDDEN, 8),
    (SgrFlags::STRIKETHROUGH, 9),
    (SgrFlags::FRAKTUR, 20),
    (SgrFlags::DOUBLE_UNDERLINE, 21),
    (SgrFlags::FRAMED, 51),
    (SgrFlags::ENCIRCLED, 52),
    (SgrFlags::OVERLINE, 53),
];

/// Graphic-rendition state: attribute flags, colours and font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub flags: SgrFlags,
    pub fg: Color,
    pub bg: Color,
    /// Alternative font 1-9 (SGR 11-19); 0 is the primary font.
    pub font: u8,
}

impl Style {
    /// Whether any attribute is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Interpret the parameter bytes of an SGR sequence (the bytes between
    /// `ESC [` and `m`).
    ///
    /// Returns `false` if any parameter was not understood or needs a colour
    /// capability missing from `caps`. Colours beyond `caps` are still
    /// recorded so they are re-emitted verbatim.
    pub fn apply_sgr(&mut self, params: &[u8], caps: TermCaps) -> bool {
        let Some(params) = parse_params(params) else {
            return false;
        };
        let mut supported = true;
        let mut i = 0;
        while i < params.len() {
            let code = params[i];
            i += 1;
            match code {
                0 => *self = Self::default(),
                1 => self.flags.insert(SgrFlags::BOLD),
                2 => self.flags.insert(SgrFlags::DIM),
                3 => self.flags.insert(SgrFlags::ITALIC),
                4 => self.flags.insert(SgrFlags::UNDERLINE),
                5 => self.flags.insert(SgrFlags::BLINK),
                6 => self.flags.insert(SgrFlags::RAPID_BLINK),
                7 => self.flags.insert(SgrFlags::INVERSE),
                8 => self.flags.insert(SgrFlags::HIDDEN),
                9 => self.flags.insert(SgrFlags::STRIKETHROUGH),
                10 => self.font = 0,
                11..=19 => self.font = (code - 10) as u8,
                20 => self.flags.insert(SgrFlags::FRAKTUR),
                21 => self.flags.insert(SgrFlags::DOUBLE_UNDERLINE),
                22 => self.flags.remove(SgrFlags::BOLD | SgrFlags::DIM),
                23 => self.flags.remove(SgrFlags::ITALIC | SgrFlags::FRAKTUR),
                24 => self
                    .flags
                    .remove(SgrFlags::UNDERLINE | SgrFlags::DOUBLE_UNDERLINE),
                25 => self.flags.remove(SgrFlags::BLINK | SgrFlags::RAPID_BLINK),
                27 => self.flags.remove(SgrFlags::INVERSE),
                28 => self.flags.remove(SgrFlags::HIDDEN),
                29 => self.flags.remove(SgrFlags::STRIKETHROUGH),
                30..=37 => self.fg = Color::Ansi((code - 30) as u8),
                39 => self.fg = Color::Default,
                40..=47 => self.bg = Color::Ansi((code - 40) as u8),
                49 => self.bg = Color::Default,
                51 => self.flags.insert(SgrFlags::FRAMED),
                52 => self.flags.insert(SgrFlags::ENCIRCLED),
                53 => self.flags.insert(SgrFlags::OVERLINE),
                54 => self.flags.remove(SgrFlags::FRAMED | SgrFlags::ENCIRCLED),
                55 => self.flags.remove(SgrFlags::OVERLINE),
                90..=97 => {
                    supported &= caps.contains(TermCaps::BRIGHT);
                    self.fg = Color::Bright((code - 90) as u8);
                }
                100..=107 => {
                    supported &= caps.contains(TermCaps::BRIGHT);
                    self.bg = Color::Bright((code - 100) as u8);
                }
                38 | 48 => match parse_extended(&params[i..], caps) {
                    Some((color, used, within_caps)) => {
                        i += used;
                        supported &= within_caps;
                        if code == 38 {
                            self.fg = color;
                        } else {
                            self.bg = color;
                        }
                    }
                    // The remaining parameters cannot be aligned any more.
                    None => return false,
                },
                _ => supported = false,
            }
        }
        supported
    }

    fn params(&self) -> SmallVec<[u16; 16]> {
        let mut out = SmallVec::new();
        for (flag, on) in FLAG_TABLE {
            if self.flags.contains(flag) {
                out.push(on);
            }
        }
        if self.font != 0 {
            out.push(10 + u16::from(self.font));
        }
        self.fg.push_params(30, &mut out);
        self.bg.push_params(40, &mut out);
        out
    }

    /// Byte length of [`Style::write_sgr`] output; zero for an empty style.
    #[must_use]
    pub fn sgr_len(&self) -> usize {
        let params = self.params();
        if params.is_empty() {
            return 0;
        }
        let digits: usize = params.iter().map(|p| dec_len(*p)).sum();
        // ESC [ ... m plus separators
        3 + digits + params.len() - 1
    }

    /// Append the single SGR sequence that reproduces this style.
    pub fn write_sgr(&self, out: &mut Vec<u8>) {
        let params = self.params();
        if params.is_empty() {
            return;
        }
        out.extend_from_slice(b"\x1b[");
        for (idx, param) in params.iter().enumerate() {
            if idx > 0 {
                out.push(b';');
            }
            write_dec(out, *param);
        }
        out.push(b'm');
    }

    /// Rendered SGR sequence as an owned vector.
    #[must_use]
    pub fn to_sgr(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sgr_len());
        self.write_sgr(&mut out);
        out
    }
}

/// Split SGR parameter bytes on `;`. Empty parameters read as 0. Returns
/// `None` for private or sub-parameter syntax this module does not model.
fn parse_params(bytes: &[u8]) -> Option<SmallVec<[u16; 16]>> {
    let mut out = SmallVec::new();
    if bytes.is_empty() {
        out.push(0);
        return Some(out);
    }
    for part in bytes.split(|b| *b == b';') {
        let mut value: u16 = 0;
        for &b in part {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value.saturating_mul(10).saturating_add(u16::from(b - b'0'));
        }
        out.push(value);
    }
    Some(out)
}

/// Parse `5;n` or `2;r;g;b` after a 38/48 code.
///
/// Returns the colour, the number of parameters used, and whether the colour
/// mode is within `caps`.
fn parse_extended(rest: &[u16], caps: TermCaps) -> Option<(Color, usize, bool)> {
    let channel = |v: u16| u8::try_from(v).ok();
    match rest.first()? {
        5 => {
            let n = channel(*rest.get(1)?)?;
            Some((Color::Indexed(n), 2, caps.contains(TermCaps::COLOR_256)))
        }
        2 => {
            let r = channel(*rest.get(1)?)?;
            let g = channel(*rest.get(2)?)?;
            let b = channel(*rest.get(3)?)?;
            Some((Color::Rgb(r, g, b), 4, caps.contains(TermCaps::TRUECOLOR)))
        }
        _ => None,
    }
}

#[inline]
fn dec_len(n: u16) -> usize {
    match n {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}

fn write_dec(out: &mut Vec<u8>, n: u16) {
    let mut buf = [0u8; 5];
    let len = dec_len(n);
    let mut rest = n;
    for slot in buf[..len].iter_mut().rev() {
        *slot = b'0' + (rest % 10) as u8;
        rest /= 10;
    }
    out.extend_from_slice(&buf[..len]);
}
