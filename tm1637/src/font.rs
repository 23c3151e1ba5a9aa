//! Segment bitmask tables mapping numerals and lower ASCII chars onto a 7 segment (+ dot)
//! display.
//!
//! Bit layout of every glyph is XGFEDCBA: bits 0-6 are segments a-g, bit 7 is the decimal
//! point.
//!
//! ```text
//!     a
//!    ---
//!  f| g |b
//!    ---
//!  e|   |c
//!    ---
//!     d
//! ```

/// Index of the minus-sign glyph in the numeral table.
pub const MINUS: u8 = 10;

/// Index of the blank glyph in the numeral table.
pub const SPACE: u8 = 11;

const NUMERAL_SYMBOLS: [u8; 12] = [
          // XGFEDCBA
    0x3f, // 0b00111111,    // 0
    0x06, // 0b00000110,    // 1
    0x5b, // 0b01011011,    // 2
    0x4f, // 0b01001111,    // 3
    0x66, // 0b01100110,    // 4
    0x6d, // 0b01101101,    // 5
    0x7d, // 0b01111101,    // 6
    0x07, // 0b00000111,    // 7
    0x7f, // 0b01111111,    // 8
    0x6f, // 0b01101111,    // 9
    0x40, // 0b01000000,    // minus sign
    0x00, // 0b00000000     // space
];

/// Segment bitmask for a numeral table index: digit values 0-9, [`MINUS`], [`SPACE`].
/// Anything past the table (including the 0xFF "clear" convention) renders blank.
pub(crate) fn numeral(index: u8) -> u8 {
    NUMERAL_SYMBOLS
        .get(usize::from(index))
        .copied()
        .unwrap_or(0)
}

/// Segment bitmask for an ASCII char; zero (blank) for anything the 7 segments can't
/// approximate, and for anything outside ASCII.
#[cfg(feature = "ascii-font")]
pub(crate) fn ascii(c: char) -> u8 {
    if c.is_ascii() {
        ASCII_SYMBOLS[c as usize]
    } else {
        0
    }
}

#[cfg(feature = "ascii-font")]
const ASCII_SYMBOLS: [u8; 128] = [
    //NUL   SOH   STX   ETX   EOT   ENQ   ACK   BEL   BS    HT    LF    VT
    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,
    //FF    CR    SO    SI    DLE   DC1   DC2   DC3   DC4   NAK   SYN   ETB
    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,
    //CAN   EM    SUB   ESC   FS    GS    RS    US    space !     "     #
    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0x22, 0,
    //$     %     &     '     (     )     *     +     ,     -     .     /
    0,    0,    0,    0x01, 0,    0,    0,    0,    0x08, 0x40, 0x08, 0x52,
    //0     1     2     3     4     5     6     7     8     9     :     ;
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x6f, 0,    0,
    //<     =     >     ?     @     A     B     C     D     E     F     G
    0,    0x48, 0,    0,    0,    0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, 0x3d,
    //H     I     J     K     L     M     N     O     P     Q     R     S
    0x76, 0x30, 0x1e, 0x75, 0x38, 0x55, 0x54, 0x5c, 0x73, 0x67, 0x50, 0x6d,
    //T     U     V     W     X     Y     Z     [     \     ]     ^     _
    0x78, 0x3e, 0x1c, 0x1d, 0x64, 0x6e, 0x5b, 0,    0x64, 0,    0,    0x08,
    //`     a     b     c     d     e     f     g     h     i     j     k
    0,    0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, 0x3d, 0x76, 0x30, 0x1e, 0x75,
    //l     m     n     o     p     q     r     s     t     u     v     w
    0x38, 0x55, 0x54, 0x5c, 0x73, 0x67, 0x50, 0x6d, 0x78, 0x3e, 0x1c, 0x1d,
    //x     y     z     {     |     }     ~     DEL
    0x64, 0x6e, 0x5b, 0,    0,    0,    0,    0,
];
