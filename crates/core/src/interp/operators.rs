//! Content stream operator vocabulary.
//!
//! Operators are looked up by their keyword packed big-endian into a `u32`
//! (one to four ASCII bytes, zero padded). Words longer than four bytes
//! never match.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// Every operator the interpreter dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // General graphics state
    SaveState,
    RestoreState,
    ConcatMatrix,
    LineWidth,
    LineCap,
    LineJoin,
    MiterLimit,
    Dash,
    RenderingIntent,
    Flatness,
    ExtGState,
    // Color
    StrokeColorSpace,
    FillColorSpace,
    StrokeColor,
    StrokeColorN,
    FillColor,
    FillColorN,
    StrokeGray,
    FillGray,
    StrokeRGB,
    FillRGB,
    StrokeCMYK,
    FillCMYK,
    // Path construction
    MoveTo,
    LineTo,
    CurveTo,
    CurveToV,
    CurveToY,
    ClosePath,
    Rectangle,
    // Path painting
    Stroke,
    CloseStroke,
    Fill,
    FillOld,
    FillEvenOdd,
    FillStroke,
    FillStrokeEvenOdd,
    CloseFillStroke,
    CloseFillStrokeEvenOdd,
    EndPath,
    Clip,
    ClipEvenOdd,
    // Text objects and state
    BeginText,
    EndText,
    CharSpace,
    WordSpace,
    HorzScale,
    Leading,
    Font,
    RenderMode,
    Rise,
    // Text positioning and showing
    MoveText,
    MoveTextSetLeading,
    TextMatrix,
    NextLine,
    ShowText,
    ShowTextPositioned,
    NextLineShowText,
    NextLineShowTextSpacing,
    // Type 3 glyphs
    CharWidth,
    CacheDevice,
    // XObjects, shadings and inline images
    XObject,
    Shade,
    BeginImage,
    ImageData,
    EndImage,
    // Marked content
    MarkPoint,
    MarkPointProperties,
    BeginMarked,
    BeginMarkedProperties,
    EndMarked,
    // Compatibility sections
    BeginCompat,
    EndCompat,
}

/// Pack up to four keyword bytes into a lookup key.
pub const fn operator_id(word: &[u8]) -> Option<u32> {
    if word.is_empty() || word.len() > 4 {
        return None;
    }
    let mut id = 0u32;
    let mut i = 0;
    while i < 4 {
        id <<= 8;
        if i < word.len() {
            id |= word[i] as u32;
        }
        i += 1;
    }
    Some(id)
}

const OPERATORS: [(&[u8], Operator); 73] = [
    (b"\"", Operator::NextLineShowTextSpacing),
    (b"'", Operator::NextLineShowText),
    (b"B", Operator::FillStroke),
    (b"B*", Operator::FillStrokeEvenOdd),
    (b"BDC", Operator::BeginMarkedProperties),
    (b"BI", Operator::BeginImage),
    (b"BMC", Operator::BeginMarked),
    (b"BT", Operator::BeginText),
    (b"BX", Operator::BeginCompat),
    (b"CS", Operator::StrokeColorSpace),
    (b"DP", Operator::MarkPointProperties),
    (b"Do", Operator::XObject),
    (b"EI", Operator::EndImage),
    (b"EMC", Operator::EndMarked),
    (b"ET", Operator::EndText),
    (b"EX", Operator::EndCompat),
    (b"F", Operator::FillOld),
    (b"G", Operator::StrokeGray),
    (b"ID", Operator::ImageData),
    (b"J", Operator::LineCap),
    (b"K", Operator::StrokeCMYK),
    (b"M", Operator::MiterLimit),
    (b"MP", Operator::MarkPoint),
    (b"Q", Operator::RestoreState),
    (b"RG", Operator::StrokeRGB),
    (b"S", Operator::Stroke),
    (b"SC", Operator::StrokeColor),
    (b"SCN", Operator::StrokeColorN),
    (b"T*", Operator::NextLine),
    (b"TD", Operator::MoveTextSetLeading),
    (b"TJ", Operator::ShowTextPositioned),
    (b"TL", Operator::Leading),
    (b"Tc", Operator::CharSpace),
    (b"Td", Operator::MoveText),
    (b"Tf", Operator::Font),
    (b"Tj", Operator::ShowText),
    (b"Tm", Operator::TextMatrix),
    (b"Tr", Operator::RenderMode),
    (b"Ts", Operator::Rise),
    (b"Tw", Operator::WordSpace),
    (b"Tz", Operator::HorzScale),
    (b"W", Operator::Clip),
    (b"W*", Operator::ClipEvenOdd),
    (b"b", Operator::CloseFillStroke),
    (b"b*", Operator::CloseFillStrokeEvenOdd),
    (b"c", Operator::CurveTo),
    (b"cm", Operator::ConcatMatrix),
    (b"cs", Operator::FillColorSpace),
    (b"d", Operator::Dash),
    (b"d0", Operator::CharWidth),
    (b"d1", Operator::CacheDevice),
    (b"f", Operator::Fill),
    (b"f*", Operator::FillEvenOdd),
    (b"g", Operator::FillGray),
    (b"gs", Operator::ExtGState),
    (b"h", Operator::ClosePath),
    (b"i", Operator::Flatness),
    (b"j", Operator::LineJoin),
    (b"k", Operator::FillCMYK),
    (b"l", Operator::LineTo),
    (b"m", Operator::MoveTo),
    (b"n", Operator::EndPath),
    (b"q", Operator::SaveState),
    (b"re", Operator::Rectangle),
    (b"rg", Operator::FillRGB),
    (b"ri", Operator::RenderingIntent),
    (b"s", Operator::CloseStroke),
    (b"sc", Operator::FillColor),
    (b"scn", Operator::FillColorN),
    (b"sh", Operator::Shade),
    (b"v", Operator::CurveToV),
    (b"w", Operator::LineWidth),
    (b"y", Operator::CurveToY),
];

static OPERATOR_TABLE: LazyLock<FxHashMap<u32, Operator>> = LazyLock::new(|| {
    OPERATORS
        .iter()
        .filter_map(|(word, op)| operator_id(word).map(|id| (id, *op)))
        .collect()
});

impl Operator {
    /// Look up an operator keyword.
    pub fn from_keyword(word: &[u8]) -> Option<Self> {
        OPERATOR_TABLE.get(&operator_id(word)?).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_big_endian_and_padded() {
        assert_eq!(operator_id(b"q"), Some(0x7100_0000));
        assert_eq!(operator_id(b"BDC"), Some(0x4244_4300));
        assert_eq!(operator_id(b"abcde"), None);
        assert_eq!(operator_id(b""), None);
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(Operator::from_keyword(b"re"), Some(Operator::Rectangle));
        assert_eq!(Operator::from_keyword(b"scn"), Some(Operator::FillColorN));
        assert_eq!(Operator::from_keyword(b"r"), None);
        assert_eq!(Operator::from_keyword(b"ree"), None);
        assert_eq!(Operator::from_keyword(b"BDCX"), None);
        assert_eq!(Operator::from_keyword(b"Tjxxx"), None);
    }

    #[test]
    fn table_has_no_duplicates() {
        assert_eq!(OPERATOR_TABLE.len(), OPERATORS.len());
    }
}
