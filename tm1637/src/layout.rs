use crate::font;

/// The largest module the TM1637 can drive.
pub(crate) const MAX_DIGITS: usize = 6;

/// Digit count and wiring order of the attached module, resolved once at construction.
///
/// "Logical" positions are left-to-right as a person reads the display; "physical" addresses
/// are the chip's GRID outputs.  On 4-digit modules these coincide, but the common 6-digit
/// modules wire their digits out of order, so every rendering call translates through this
/// map before touching the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitLayout {
    digits: usize,
    order: [u8; MAX_DIGITS],
}

impl DigitLayout {
    /// A 4-digit module, wired left to right.
    pub const fn four_digit() -> Self {
        Self {
            digits: 4,
            order: [0, 1, 2, 3, 0, 0],
        }
    }

    /// A 6-digit module wired as two 3-digit groups in reverse order within each group.
    pub const fn six_digit() -> Self {
        Self {
            digits: 6,
            order: [2, 1, 0, 5, 4, 3],
        }
    }

    /// Number of digits on the module.
    pub const fn digit_count(&self) -> usize {
        self.digits
    }

    /// Physical chip address of a logical (left-to-right) position, or `None` for positions
    /// the module doesn't have.  `None` flows through the fixed-write path as a no-op, so
    /// callers can address logical slots uniformly without bounds juggling.
    pub fn address(&self, logical: usize) -> Option<u8> {
        if logical < self.digits {
            Some(self.order[logical])
        } else {
            None
        }
    }

    /// Reorder a logical left-to-right segment buffer into physical address order for an
    /// auto-addressed burst starting at address 0.
    pub(crate) fn remap(&self, logical: &[u8; MAX_DIGITS]) -> [u8; MAX_DIGITS] {
        let mut physical = [0u8; MAX_DIGITS];
        for (position, mask) in logical.iter().enumerate().take(self.digits) {
            physical[usize::from(self.order[position])] = *mask;
        }
        physical
    }
}

impl Default for DigitLayout {
    fn default() -> Self {
        Self::four_digit()
    }
}

/// Decompose a signed decimal value into per-slot segment glyphs, right-aligned across
/// `digits` slots.
///
/// Leading slots get the zero glyph when `lead_zero` is set, blanks otherwise.  A negative
/// value places the minus glyph immediately left of its most significant digit, or in the
/// leftmost slot when zero-padded.  Returns `None` when the value (plus its sign) needs more
/// slots than the module has; the caller decides how to surface that.
pub(crate) fn format_number(value: i32, lead_zero: bool, digits: usize) -> Option<[u8; MAX_DIGITS]> {
    let negative = value < 0;
    let magnitude = i64::from(value).unsigned_abs();

    let mut used = 1;
    let mut limit = 10u64;
    while magnitude >= limit {
        used += 1;
        limit *= 10;
    }

    if used + usize::from(negative) > digits {
        return None;
    }

    let mut slots = [font::numeral(font::SPACE); MAX_DIGITS];

    let mut rest = magnitude;
    for position in 0..used {
        slots[digits - 1 - position] = font::numeral((rest % 10) as u8);
        rest /= 10;
    }

    if lead_zero {
        for slot in slots
            .iter_mut()
            .take(digits - used)
            .skip(usize::from(negative))
        {
            *slot = font::numeral(0);
        }
        if negative {
            slots[0] = font::numeral(font::MINUS);
        }
    } else if negative {
        slots[digits - used - 1] = font::numeral(font::MINUS);
    }

    Some(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: fn(u8) -> u8 = font::numeral;
    const BLANK: u8 = 0x00;
    const MINUS: u8 = 0x40;

    #[test]
    fn four_digit_layout_is_identity() {
        let layout = DigitLayout::four_digit();

        assert_eq!(layout.digit_count(), 4);
        for position in 0..4 {
            assert_eq!(layout.address(position), Some(position as u8));
        }
        assert_eq!(layout.address(4), None);
        assert_eq!(layout.address(5), None);
    }

    #[test]
    fn six_digit_layout_permutes_groups() {
        let layout = DigitLayout::six_digit();

        assert_eq!(layout.digit_count(), 6);
        let addresses: [Option<u8>; 6] = core::array::from_fn(|i| layout.address(i));
        assert_eq!(
            addresses,
            [Some(2), Some(1), Some(0), Some(5), Some(4), Some(3)]
        );
        assert_eq!(layout.address(6), None);
    }

    #[test]
    fn remap_moves_masks_to_wired_addresses() {
        let layout = DigitLayout::six_digit();

        let logical = [1, 2, 3, 4, 5, 6];
        assert_eq!(layout.remap(&logical), [3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn remap_is_identity_on_four_digits() {
        let layout = DigitLayout::four_digit();

        let logical = [0x3f, 0x06, 0x5b, 0x4f, 0, 0];
        assert_eq!(layout.remap(&logical), logical);
    }

    #[test]
    fn zero_pads_with_zeros_or_blanks() {
        let padded = format_number(0, true, 4).unwrap();
        assert_eq!(padded[..4], [G(0), G(0), G(0), G(0)]);

        let spaced = format_number(0, false, 4).unwrap();
        assert_eq!(spaced[..4], [BLANK, BLANK, BLANK, G(0)]);
    }

    #[test]
    fn negative_minus_placement() {
        // Zero padding pushes the sign all the way left
        let padded = format_number(-5, true, 4).unwrap();
        assert_eq!(padded[..4], [MINUS, G(0), G(0), G(5)]);

        // Space padding keeps it next to the most significant digit
        let spaced = format_number(-5, false, 4).unwrap();
        assert_eq!(spaced[..4], [BLANK, BLANK, MINUS, G(5)]);

        let wider = format_number(-123, false, 4).unwrap();
        assert_eq!(wider[..4], [MINUS, G(1), G(2), G(3)]);
    }

    #[test]
    fn positive_values_right_align() {
        let value = format_number(12, false, 4).unwrap();
        assert_eq!(value[..4], [BLANK, BLANK, G(1), G(2)]);

        let full = format_number(9999, false, 4).unwrap();
        assert_eq!(full[..4], [G(9), G(9), G(9), G(9)]);
    }

    #[test]
    fn six_digit_capacity() {
        let value = format_number(-99999, false, 6).unwrap();
        assert_eq!(value[..6], [MINUS, G(9), G(9), G(9), G(9), G(9)]);

        let max = format_number(999999, true, 6).unwrap();
        assert_eq!(max[..6], [G(9), G(9), G(9), G(9), G(9), G(9)]);
    }

    #[test]
    fn overflow_is_rejected() {
        assert_eq!(format_number(10000, false, 4), None);
        assert_eq!(format_number(123456, false, 4), None);
        assert_eq!(format_number(-1000, false, 4), None);
        assert_eq!(format_number(1000000, false, 6), None);
        assert_eq!(format_number(-100000, true, 6), None);
        assert_eq!(format_number(i32::MIN, false, 6), None);
    }
}
