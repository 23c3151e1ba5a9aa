#![no_std]

mod bus;
mod font;
mod layout;

use core::marker::PhantomData;

pub use bus::*;
pub use font::{MINUS, SPACE};
pub use layout::DigitLayout;

use layout::MAX_DIGITS;

/// The decimal point / colon segment lives in bit 7 of every segment mask.
const DP: u8 = 0x80;

/// Brightness applied before the caller picks one.
const DEFAULT_BRIGHTNESS: u8 = 0x02;

/// Pause between rendered frames of the scrolling marquee and the timed reveal.
#[cfg(feature = "ascii-font")]
const FRAME_INTERVAL_MS: u64 = 300;

/// Lower-half glyph submask (segments c, d, e, g) shown in the first phase of the reveal.
#[cfg(feature = "ascii-font")]
const LOWER_SEGMENTS: u8 = 0x5c;

/// Upper-half glyph submask (segments a, b, f, g) shown in the second phase of the reveal.
#[cfg(feature = "ascii-font")]
const UPPER_SEGMENTS: u8 = 0x63;

/// The reveal always renders across the leftmost four digits.
#[cfg(feature = "ascii-font")]
const REVEAL_SLOTS: usize = 4;

/// Errors surfaced by the display operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A bus transaction failed.
    Bus(E),

    /// The value handed to [`Tm1637::set_number`] doesn't fit on the module, sign included.
    /// Nothing was transmitted; the display still shows whatever it showed before.
    NumberOutOfRange,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Bus(err)
    }
}

pub struct Tm1637Builder;

impl Tm1637Builder {
    /// Use an arbitrary [`Timer`] implementation.
    pub fn with_timer<T: Timer>(self) -> Tm1637Builder1<T> {
        Tm1637Builder1 {
            _timer: Default::default(),
        }
    }

    #[cfg(feature = "embassy-time")]
    /// Use the [`Timer`] implementation built using `embassy-time`
    pub fn with_embassy_timer(self) -> Tm1637Builder1<EmbassyTimeTimer> {
        self.with_timer::<EmbassyTimeTimer>()
    }
}

pub struct Tm1637Builder1<T: Timer> {
    _timer: PhantomData<T>,
}

impl<T: Timer> Tm1637Builder1<T> {
    /// Use an arbitrary [`BusDriver`] implementation.
    pub fn with_bus_driver<D: BusDriver>(self, driver: D) -> Tm1637Builder3<D, T> {
        Tm1637Builder3 {
            driver,
            layout: DigitLayout::default(),
            _timer: self._timer,
        }
    }

    /// Use the bit-banging driver, with an arbitrary implementation of [`Pins`] specific to
    /// your target platform.
    pub fn with_bit_banging_driver<P: Pins>(self, pins: P) -> Tm1637Builder2<P, T> {
        Tm1637Builder2 {
            pins,
            layout: DigitLayout::default(),
            _timer: self._timer,
        }
    }

    /// Use the bit-banging driver talking to the specified Embassy RP HAL pins
    #[cfg(feature = "embassy-rp")]
    pub fn with_embassy_rp_pins<
        'a,
        ClockPin: embassy_rp::gpio::Pin,
        DioPin: embassy_rp::gpio::Pin,
    >(
        self,
        clock: ClockPin,
        dio: DioPin,
    ) -> Tm1637Builder2<EmbassyRpPins<'a, ClockPin, DioPin>, T> {
        self.with_bit_banging_driver(EmbassyRpPins::new(clock, dio))
    }
}

pub struct Tm1637Builder2<P: Pins, T: Timer> {
    pins: P,
    layout: DigitLayout,
    _timer: PhantomData<T>,
}

impl<P: Pins, T: Timer> Tm1637Builder2<P, T> {
    /// Describe the attached module (digit count and wiring order).  Defaults to the 4-digit
    /// left-to-right layout.
    pub fn with_layout(mut self, layout: DigitLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Construct the [`Tm1637`] instance using the bit-banging driver.
    ///
    /// This is fallible if the underlying I/O implementation is.
    pub fn build(self) -> Result<Tm1637<BitBangingBusDriver<P, T>, T>, P::Error> {
        let driver = BitBangingBusDriver::new(self.pins)?;
        Ok(Tm1637::with_layout(driver, self.layout))
    }
}

pub struct Tm1637Builder3<D: BusDriver, T: Timer> {
    driver: D,
    layout: DigitLayout,
    _timer: PhantomData<T>,
}

impl<D: BusDriver, T: Timer> Tm1637Builder3<D, T> {
    /// Describe the attached module (digit count and wiring order).  Defaults to the 4-digit
    /// left-to-right layout.
    pub fn with_layout(mut self, layout: DigitLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Construct the [`Tm1637`] instance using the selected driver.
    pub fn build(self) -> Tm1637<D, T> {
        Tm1637::with_layout(self.driver, self.layout)
    }
}

/// Driver for TM1637 LED 7-segment display controllers.
///
/// The implementation is generalized over the implementation of the underlying bus protocol
/// driver, behind the [`BusDriver`] trait, and over the platform timer behind [`Timer`].  This
/// allows most of the code to remain the same, while supporting multiple hardware HALs and
/// timer implementations.
///
/// The most straightforward way to instantiate this driver is using [`Self::builder`] which
/// returns a builder type with which you can get easy access to the built-in implementations.
///
/// For example, to use the `embassy-time` timer implementation and the `embassy-rp` HAL for
/// RP2040:
///
/// ```
/// # #[cfg(all(feature = "embassy-time", feature = "embassy-rp"))]
/// # {
/// let p = embassy_rp::init(Default::default());
/// let mut display = tm1637::Tm1637::builder()
///     .with_embassy_timer()
///     .with_embassy_rp_pins(p.PIN_6, p.PIN_7)
///     .with_layout(tm1637::DigitLayout::four_digit())
///     .build()
///     .unwrap();
/// # }
/// ```
pub struct Tm1637<Driver, T> {
    driver: Driver,
    layout: DigitLayout,
    brightness: u8,
    _timer: PhantomData<T>,
}

impl Tm1637<(), ()> {
    /// Return a builder pattern implementation to ease some of the type parameter complexity
    /// around creating the bus driver and timer.
    ///
    /// This is not required; you can always instantiate the driver without a builder, but you
    /// might have to type more angle brackets to do so.
    pub fn builder() -> Tm1637Builder {
        Tm1637Builder
    }
}

impl<Driver: BusDriver, T: Timer> Tm1637<Driver, T> {
    pub fn new(driver: Driver) -> Self {
        Self::with_layout(driver, DigitLayout::default())
    }

    pub fn with_layout(driver: Driver, layout: DigitLayout) -> Self {
        Self {
            driver,
            layout,
            brightness: DEFAULT_BRIGHTNESS,
            _timer: PhantomData,
        }
    }

    /// The module description this handle was built with.
    pub fn layout(&self) -> &DigitLayout {
        &self.layout
    }

    /// The brightness level that will ride along with the next transmitted frame.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Store a brightness level from 0 (dimmest) to 7 (brightest); anything larger is clamped
    /// to 7.  The level is transmitted with every frame rather than on its own, so it takes
    /// effect on the next rendering call.
    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = level.min(0x07);
    }

    /// Blank every digit on the module and transmit the current brightness.
    pub async fn init(&mut self) -> Result<(), Error<Driver::Error>> {
        let blank = [0u8; MAX_DIGITS];
        self.set_segment_auto(&blank[..self.layout.digit_count()])
            .await
    }

    /// Write one digit's raw segment mask using the chip's fixed addressing mode, leaving the
    /// other digits untouched.
    ///
    /// `address` is the physical digit address, normally obtained from
    /// [`DigitLayout::address`]; `None` (an absent logical slot) is a no-op and nothing is
    /// transmitted.
    pub async fn set_segment_fixed(
        &mut self,
        address: Option<u8>,
        data: u8,
    ) -> Result<(), Error<Driver::Error>> {
        let Some(address) = address else {
            return Ok(());
        };

        self.apply_write_command(WriteCommand::SetFixedAddressing)
            .await?;
        self.apply_write_command(WriteCommand::WriteFixed {
            address,
            segment_mask: data,
        })
        .await?;
        self.apply_write_command(WriteCommand::DisplayControl {
            brightness: self.brightness,
        })
        .await
    }

    /// Refresh the whole module in one burst using the chip's auto-increment addressing mode.
    ///
    /// `data` holds segment masks in logical left-to-right order; the wiring order of the
    /// module is applied here.  Slots beyond `data` are blanked.
    pub async fn set_segment_auto(&mut self, data: &[u8]) -> Result<(), Error<Driver::Error>> {
        let count = data.len().min(self.layout.digit_count());
        let mut logical = [0u8; MAX_DIGITS];
        logical[..count].copy_from_slice(&data[..count]);
        let physical = self.layout.remap(&logical);

        self.apply_write_command(WriteCommand::SetAutoAddressing)
            .await?;
        self.apply_write_command(WriteCommand::WriteAuto {
            segment_masks: &physical[..self.layout.digit_count()],
        })
        .await?;
        self.apply_write_command(WriteCommand::DisplayControl {
            brightness: self.brightness,
        })
        .await
    }

    /// Write one numeral glyph: digit values 0-9, [`MINUS`], [`SPACE`]; any other value
    /// renders blank.  `dot` lights the digit's decimal point.
    pub async fn set_segment_number(
        &mut self,
        address: Option<u8>,
        value: u8,
        dot: bool,
    ) -> Result<(), Error<Driver::Error>> {
        let mut mask = font::numeral(value);
        if dot {
            mask |= DP;
        }

        self.set_segment_fixed(address, mask).await
    }

    /// Render a signed decimal number right-aligned across the module.
    ///
    /// Leading digits are zero-filled when `lead_zero` is set, blank otherwise; a negative
    /// value carries a minus glyph immediately left of its most significant digit.  Each bit
    /// of `dot_mask` lights one decimal point, bit 0 being the rightmost digit, independent of
    /// the numeric content.
    ///
    /// A value that doesn't fit (sign included) returns [`Error::NumberOutOfRange`] without
    /// transmitting anything.
    pub async fn set_number(
        &mut self,
        value: i32,
        lead_zero: bool,
        dot_mask: u8,
    ) -> Result<(), Error<Driver::Error>> {
        let digits = self.layout.digit_count();
        let slots =
            layout::format_number(value, lead_zero, digits).ok_or(Error::NumberOutOfRange)?;

        for (position, slot) in slots.iter().enumerate().take(digits) {
            let address = self.layout.address(position);
            let mask = slot | dot_for(dot_mask, digits, position);
            self.set_segment_fixed(address, mask).await?;
        }

        Ok(())
    }

    /// Render an ASCII string.
    ///
    /// Text that fits on the module is written left-aligned, one fixed-address frame per
    /// character.  Longer text turns into a left-scrolling marquee: a window of glyphs the
    /// width of the module slides over the text, one auto-addressed burst per step with a
    /// fixed pause between steps, then keeps shifting in blanks until the text has scrolled
    /// fully off.
    #[cfg(feature = "ascii-font")]
    pub async fn set_segment_ascii(&mut self, text: &str) -> Result<(), Error<Driver::Error>> {
        let digits = self.layout.digit_count();

        if text.chars().count() <= digits {
            for (position, c) in text.chars().enumerate() {
                let address = self.layout.address(position);
                self.set_segment_fixed(address, font::ascii(c)).await?;
            }

            return Ok(());
        }

        let mut window = [0u8; MAX_DIGITS];
        for c in text.chars() {
            push_glyph(&mut window, digits, font::ascii(c));
            self.set_segment_auto(&window[..digits]).await?;
            T::wait_millis(FRAME_INTERVAL_MS).await;
        }

        // Scroll the tail off the left edge
        for _ in 0..digits {
            push_glyph(&mut window, digits, 0);
            self.set_segment_auto(&window[..digits]).await?;
            T::wait_millis(FRAME_INTERVAL_MS).await;
        }

        Ok(())
    }

    /// Render up to four characters with a two-phase flip effect.
    ///
    /// Longer text is truncated to its first four characters; shorter text is left-padded
    /// with blanks.  Each digit, right to left, first shows the lower half of its glyph and
    /// then the full glyph; after `duration_ms` each digit shows the upper half and is then
    /// cleared.  `dot_mask` works as in [`Self::set_number`] and stays lit through every
    /// phase.
    #[cfg(feature = "ascii-font")]
    pub async fn set_segment_ascii_with_time(
        &mut self,
        text: &str,
        dot_mask: u8,
        duration_ms: u64,
    ) -> Result<(), Error<Driver::Error>> {
        let mut glyphs = [0u8; REVEAL_SLOTS];
        let pad = REVEAL_SLOTS.saturating_sub(text.chars().count());
        for (offset, c) in text.chars().take(REVEAL_SLOTS - pad).enumerate() {
            glyphs[pad + offset] = font::ascii(c);
        }

        for position in 0..REVEAL_SLOTS {
            let address = self.layout.address(position);
            self.set_segment_fixed(address, 0).await?;
        }

        for position in (0..REVEAL_SLOTS).rev() {
            let address = self.layout.address(position);
            let dot = dot_for(dot_mask, REVEAL_SLOTS, position);

            self.set_segment_fixed(address, (glyphs[position] & LOWER_SEGMENTS) | dot)
                .await?;
            T::wait_millis(FRAME_INTERVAL_MS).await;
            self.set_segment_fixed(address, glyphs[position] | dot)
                .await?;
            T::wait_millis(FRAME_INTERVAL_MS).await;
        }

        T::wait_millis(duration_ms).await;

        for position in (0..REVEAL_SLOTS).rev() {
            let address = self.layout.address(position);
            let dot = dot_for(dot_mask, REVEAL_SLOTS, position);

            self.set_segment_fixed(address, (glyphs[position] & UPPER_SEGMENTS) | dot)
                .await?;
            T::wait_millis(FRAME_INTERVAL_MS).await;
            self.set_segment_fixed(address, 0).await?;
            T::wait_millis(FRAME_INTERVAL_MS).await;
        }

        Ok(())
    }

    /// Apply the command to the controller
    async fn apply_write_command<'c>(
        &mut self,
        command: WriteCommand<'c>,
    ) -> Result<(), Error<Driver::Error>> {
        let (command_byte, data_bytes) = command.encode();

        #[cfg(feature = "defmt")]
        defmt::trace!("command byte = {=u8:x}", command_byte);

        if let Some(data_bytes) = data_bytes {
            self.driver
                .send_command_write_data(command_byte, data_bytes)
                .await?;
        } else {
            self.driver.send_command(command_byte).await?;
        }

        Ok(())
    }
}

/// The decimal-point bit for one logical position.  Bit 0 of the mask addresses the rightmost
/// digit, matching how a number reads.
fn dot_for(dot_mask: u8, digits: usize, position: usize) -> u8 {
    if dot_mask & (1 << (digits - 1 - position)) != 0 {
        DP
    } else {
        0
    }
}

/// Slide the marquee window one step left and push a new glyph in on the right.
#[cfg(feature = "ascii-font")]
fn push_glyph(window: &mut [u8; MAX_DIGITS], digits: usize, glyph: u8) {
    window.copy_within(1..digits, 0);
    window[digits - 1] = glyph;
}

/// Represents possible commands sent to the TM1637 as Rust enums for greater readability.
enum WriteCommand<'a> {
    /// Put the chip in auto-increment addressing mode: each data byte written after an
    /// address goes to the next digit.
    SetAutoAddressing,

    /// Put the chip in fixed addressing mode: data bytes go to the explicitly given digit.
    SetFixedAddressing,

    /// Set one digit's segment mask at an explicit address.  Only valid in fixed addressing
    /// mode.
    WriteFixed {
        /// Physical digit address, 0 through 5.
        address: u8,

        /// The bit mask controlling which segments of the digit are illuminated.
        segment_mask: u8,
    },

    /// Write a run of segment masks starting at address 0, the chip incrementing the address
    /// after each byte.  Only valid in auto-increment addressing mode.
    WriteAuto {
        /// Segment masks in physical address order.
        segment_masks: &'a [u8],
    },

    /// Turn the display on at the given brightness.  Sent as the closing transaction of every
    /// frame.
    DisplayControl {
        /// Brightness, in a range from 0 to 7.
        brightness: u8,
    },
}

impl<'a> WriteCommand<'a> {
    /// Convert this command into the appropriate byte sequence to send to the controller.
    ///
    /// Return value is a tuple consisting of the following:
    ///
    /// - Command byte to send to controller
    /// - (Optional) slice of data bytes to send along with command byte
    ///
    /// The command byte and data bytes (if any) are sent together, during a single start/stop
    /// transaction on the bus.
    fn encode(&self) -> (u8, Option<&[u8]>) {
        match self {
            WriteCommand::SetAutoAddressing => {
                // Data command, address auto-increment
                (0b0100_0000, None)
            }
            WriteCommand::SetFixedAddressing => {
                // Data command, fixed addressing
                (0b0100_0100, None)
            }
            WriteCommand::WriteFixed {
                address,
                segment_mask,
            } => {
                // Address command; the chip has six display registers at C0H..C5H
                #[cfg(feature = "defmt")]
                defmt::debug_assert!(*address < 0b0000_0110);
                (
                    0b1100_0000 | (address & 0b0000_0111),
                    Some(core::slice::from_ref(segment_mask)),
                )
            }
            WriteCommand::WriteAuto { segment_masks } => {
                // Address command at C0H; the chip walks the rest of the run itself
                #[cfg(feature = "defmt")]
                defmt::debug_assert!(segment_masks.len() <= 6);
                (0b1100_0000, Some(*segment_masks))
            }
            WriteCommand::DisplayControl { brightness } => {
                // Display control command: display on, lowest three bits are the brightness
                #[cfg(feature = "defmt")]
                defmt::debug_assert!(*brightness < 0b1000);
                (0b1000_1000 | (brightness & 0b0000_0111), None)
            }
        }
    }
}
