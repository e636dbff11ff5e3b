use lopdf::{Dictionary, dictionary};

/// The standard Type 1 fonts used by both documents. No embedding needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    Times,
    TimesBold,
    /// ZapfDingbats, for the quorum check marks.
    Symbols,
}

impl Font {
    pub const ALL: [Font; 6] = [
        Font::Helvetica,
        Font::HelveticaBold,
        Font::HelveticaOblique,
        Font::Times,
        Font::TimesBold,
        Font::Symbols,
    ];

    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
            Font::HelveticaOblique => "F3",
            Font::Times => "F4",
            Font::TimesBold => "F5",
            Font::Symbols => "F6",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::HelveticaOblique => "Helvetica-Oblique",
            Font::Times => "Times-Roman",
            Font::TimesBold => "Times-Bold",
            Font::Symbols => "ZapfDingbats",
        }
    }

    pub fn dictionary(&self) -> Dictionary {
        let mut dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
        };
        if *self != Font::Symbols {
            dict.set("Encoding", "WinAnsiEncoding");
        }
        dict
    }

    /// Bytes for a `Tj` operand.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Font::Symbols => text.chars().map(dingbat).collect(),
            _ => text.chars().map(win_ansi).collect(),
        }
    }

    /// Advance width of `text` in millimetres at `size` points.
    pub fn text_width_mm(&self, text: &str, size: f32) -> f32 {
        let units: u32 = self.encode(text).iter().map(|b| self.glyph_width(*b)).sum();
        units as f32 / 1000.0 * size / super::canvas::PT_PER_MM
    }

    fn glyph_width(&self, byte: u8) -> u32 {
        let base = match byte {
            32..=126 => HELVETICA_WIDTHS[(byte - 32) as usize] as u32,
            _ => 556,
        };
        match self {
            Font::Helvetica | Font::HelveticaOblique => base,
            Font::HelveticaBold => base * 106 / 100,
            Font::Times => base * 92 / 100,
            Font::TimesBold => base * 97 / 100,
            Font::Symbols => 760,
        }
    }
}

fn dingbat(c: char) -> u8 {
    match c {
        '✓' | '✔' => b'4',
        '✗' | '✘' => b'8',
        c if c.is_ascii() => c as u8,
        _ => b' ',
    }
}

/// Map a char to WinAnsiEncoding, `?` when it has no slot.
pub fn win_ansi(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7e}' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => b'?',
    }
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portuguese_text_fits_win_ansi() {
        assert_eq!(win_ansi('ó'), 0xf3);
        assert_eq!(win_ansi('º'), 0xba);
        assert_eq!(win_ansi('€'), 0x80);
        assert_eq!(win_ansi('✓'), b'?');
        assert_eq!(Font::Symbols.encode("✓✗"), b"48".to_vec());
    }

    #[test]
    fn bold_is_wider() {
        let regular = Font::Helvetica.text_width_mm("Assembleia", 12.0);
        let bold = Font::HelveticaBold.text_width_mm("Assembleia", 12.0);
        assert!(bold > regular);
        assert!(regular > 0.0);
    }
}
