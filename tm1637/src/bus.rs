//! Module describing the [`BusDriver`] trait and the bit-banging implementation of the TM1637
//! two-wire bus, plus the platform seams ([`Pins`], [`Timer`]) it is built on.

// This module defines traits w/ async methods.  That triggers a warning due to the very...limited
// support for this in the current Rust version.  However this pertains only to the use of futures
// returned by async methods in multi-threaded executors.  As this crate is meant for use on
// embedded microcontrollers without any concept of threads, this does not concern us at all
#![allow(async_fn_in_trait)]

use core::marker::PhantomData;

/// This trait represents some low-level implementation of the TM1637 bus interface, likely in
/// terms of some platform-specific HAL.
///
/// The TM1637 uses a two-wire bus that looks a lot like I2C but isn't: there is no device
/// address, and after every byte the chip acknowledges by pulling the data line low for one
/// clock cycle.  This trait exposes a transaction-level interface; each method opens the bus
/// with a start condition and closes it with a stop condition.
pub trait BusDriver {
    type Error;

    /// Send a single command byte in its own start/stop transaction.
    async fn send_command(&mut self, b: u8) -> Result<(), Self::Error>;

    /// Send a command byte followed by one or more data bytes, all within a single start/stop
    /// transaction.
    async fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error>;
}

/// The two GPIO lines the TM1637 is wired to, abstracted over the target platform.
///
/// CLK is output-only.  DIO is normally an output, but must be switchable to an input so the
/// chip can drive it during the acknowledgment window after each byte.
///
/// Sadly it's not currently possible to express the direction switch purely in terms of
/// Embedded HAL traits (there is no standard abstraction for a bidirectional pin), so this
/// trait has to exist.  The built-in implementations cover the supported HALs.
pub trait Pins {
    type Error;

    fn set_clock_high(&mut self) -> Result<(), Self::Error>;
    fn set_clock_low(&mut self) -> Result<(), Self::Error>;

    fn set_dio_high(&mut self) -> Result<(), Self::Error>;
    fn set_dio_low(&mut self) -> Result<(), Self::Error>;

    /// Release DIO so the chip can drive it during the acknowledgment window.
    fn set_dio_as_input(&mut self);

    /// Take DIO back after the acknowledgment window.
    fn set_dio_as_output(&mut self);

    /// Sample the level the chip is driving on DIO.  Only meaningful while DIO is an input.
    fn dio_is_high(&mut self) -> Result<bool, Self::Error>;
}

/// Abstraction on platform-specific timers to provide a generic way to pause the bus driver
/// execution in order to implement the TM1637 bus protocol correctly.
///
/// The timer situation on embedded Rust is still quite unstable, with competing timer
/// implementations, including `embassy_time`, `embedded-time`, `fugit`, and probably others.  To
/// avoid picking a side, this very simple timer trait needs to be implemented in terms of
/// whatever your preferred timer implementation is.
pub trait Timer {
    /// Wait between two signal edges on the bus.  This must exceed the chip's minimum edge
    /// spacing; somewhere between 1us and 3us works on real modules.
    async fn wait_clock_tick();

    /// Coarse pause used between rendered frames (scrolling text, the timed reveal).
    async fn wait_millis(ms: u64);
}

/// Error type of [`BitBangingBusDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitBangError<E> {
    /// A pin operation failed.
    Pin(E),

    /// The chip did not pull DIO low during the acknowledgment window after a byte.  Usually
    /// means a wiring problem or a clock rate the chip can't follow.
    Nack,
}

impl<E> From<E> for BitBangError<E> {
    fn from(err: E) -> Self {
        BitBangError::Pin(err)
    }
}

/// Implementation of [`BusDriver`] that bit-bangs the TM1637 protocol over a pair of GPIO
/// lines, generic over the [`Pins`] and [`Timer`] implementations for the target platform.
pub struct BitBangingBusDriver<P: Pins, T: Timer> {
    pins: P,
    _timer: PhantomData<T>,
}

impl<P: Pins, T: Timer> BitBangingBusDriver<P, T> {
    /// Take ownership of the pins and put the bus into its idle state (both lines high).
    ///
    /// CLK is held low while DIO is brought up, so the chip cannot mistake the
    /// initialization for a start condition.
    pub fn new(mut pins: P) -> Result<Self, P::Error> {
        pins.set_clock_low()?;
        pins.set_dio_as_output();
        pins.set_dio_high()?;
        pins.set_clock_high()?;

        Ok(Self {
            pins,
            _timer: PhantomData,
        })
    }

    /// Signal a start condition: DIO falls while CLK is high.  Both lines must be high on
    /// entry, which is the case after `new` and after every `stop`.
    async fn start(&mut self) -> Result<(), BitBangError<P::Error>> {
        self.pins.set_dio_low()?;
        T::wait_clock_tick().await;

        Ok(())
    }

    /// Signal a stop condition: DIO rises while CLK is high, leaving the bus idle.
    async fn stop(&mut self) -> Result<(), BitBangError<P::Error>> {
        self.pins.set_dio_low()?;
        T::wait_clock_tick().await;
        self.pins.set_clock_high()?;
        T::wait_clock_tick().await;
        self.pins.set_dio_high()?;
        T::wait_clock_tick().await;

        Ok(())
    }

    /// Shift one byte out LSB first and observe the chip's acknowledgment.
    ///
    /// The chip reads DIO on the rising edge of CLK, so each bit is placed on DIO while CLK
    /// is low and then clocked in by bringing CLK high.
    async fn send_byte(&mut self, b: u8) -> Result<(), BitBangError<P::Error>> {
        for bit in 0..8 {
            self.pins.set_clock_low()?;
            T::wait_clock_tick().await;

            if (b >> bit) & 1 != 0 {
                self.pins.set_dio_high()?;
            } else {
                self.pins.set_dio_low()?;
            }
            T::wait_clock_tick().await;

            self.pins.set_clock_high()?;
            T::wait_clock_tick().await;
        }

        self.read_ack().await
    }

    /// The TM1637 acknowledges a byte by pulling DIO low from the falling edge of CLK after
    /// the 8th bit until the next falling edge.  DIO has to be an input during this window to
    /// avoid both ends driving the line at once.
    async fn read_ack(&mut self) -> Result<(), BitBangError<P::Error>> {
        self.pins.set_dio_as_input();

        self.pins.set_clock_low()?;
        T::wait_clock_tick().await;

        self.pins.set_clock_high()?;
        T::wait_clock_tick().await;
        let acked = !self.pins.dio_is_high()?;

        self.pins.set_clock_low()?;
        T::wait_clock_tick().await;

        self.pins.set_dio_as_output();

        if acked {
            Ok(())
        } else {
            Err(BitBangError::Nack)
        }
    }
}

impl<P: Pins, T: Timer> BusDriver for BitBangingBusDriver<P, T> {
    type Error = BitBangError<P::Error>;

    async fn send_command(&mut self, b: u8) -> Result<(), Self::Error> {
        self.start().await?;
        let result = self.send_byte(b).await;

        // The transaction is closed even when the byte was not acknowledged, so the bus is
        // back in its idle state for whatever happens next
        self.stop().await?;

        result
    }

    async fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.start().await?;
        let mut result = self.send_byte(b).await;

        if result.is_ok() {
            for byte in data {
                result = self.send_byte(*byte).await;
                if result.is_err() {
                    break;
                }
            }
        }

        self.stop().await?;

        result
    }
}

#[cfg(feature = "embassy-time")]
mod embassy_time_timer {
    use embassy_time::{Duration, Timer as EmbassyTimer};

    /// One inter-edge pause.  3uS comfortably exceeds the chip's minimum while still clocking
    /// a full three-transaction frame out in well under a millisecond.
    const CLOCK_TICK: Duration = Duration::from_micros(3);

    /// [`super::Timer`] implementation built on `embassy-time`.
    pub struct EmbassyTimeTimer;

    impl super::Timer for EmbassyTimeTimer {
        async fn wait_clock_tick() {
            EmbassyTimer::after(CLOCK_TICK).await
        }

        async fn wait_millis(ms: u64) {
            EmbassyTimer::after(Duration::from_millis(ms)).await
        }
    }
}

#[cfg(feature = "embassy-time")]
pub use embassy_time_timer::EmbassyTimeTimer;

#[cfg(feature = "embassy-rp")]
mod embassy_rp_pins {
    use core::convert::Infallible;
    use embassy_rp::gpio;
    use embedded_hal_1::digital::{InputPin, OutputPin};

    /// Implementation of [`super::Pins`] using the Embassy RP HAL for the RP2040
    /// microcontroller.
    ///
    /// CLK is a plain output; DIO uses [`gpio::Flex`] so its direction can be flipped for the
    /// acknowledgment window.
    pub struct EmbassyRpPins<'a, ClockPin: gpio::Pin, DioPin: gpio::Pin> {
        clock: gpio::Output<'a, ClockPin>,
        dio: gpio::Flex<'a, DioPin>,
    }

    impl<'a, ClockPin: gpio::Pin, DioPin: gpio::Pin> EmbassyRpPins<'a, ClockPin, DioPin> {
        pub fn new(clock: ClockPin, dio: DioPin) -> Self {
            let mut me = Self {
                clock: gpio::Output::new(clock, gpio::Level::High),
                dio: gpio::Flex::new(dio),
            };

            // DIO is for output except during the acknowledgment window
            me.dio.set_as_output();
            me.dio.set_high();

            me
        }
    }

    impl<'a, ClockPin: gpio::Pin, DioPin: gpio::Pin> super::Pins
        for EmbassyRpPins<'a, ClockPin, DioPin>
    {
        type Error = Infallible;

        fn set_clock_high(&mut self) -> Result<(), Self::Error> {
            OutputPin::set_high(&mut self.clock)
        }

        fn set_clock_low(&mut self) -> Result<(), Self::Error> {
            OutputPin::set_low(&mut self.clock)
        }

        fn set_dio_high(&mut self) -> Result<(), Self::Error> {
            OutputPin::set_high(&mut self.dio)
        }

        fn set_dio_low(&mut self) -> Result<(), Self::Error> {
            OutputPin::set_low(&mut self.dio)
        }

        fn set_dio_as_input(&mut self) {
            self.dio.set_as_input();
        }

        fn set_dio_as_output(&mut self) {
            self.dio.set_as_output();
        }

        fn dio_is_high(&mut self) -> Result<bool, Self::Error> {
            InputPin::is_high(&mut self.dio)
        }
    }
}

#[cfg(feature = "embassy-rp")]
pub use embassy_rp_pins::EmbassyRpPins;

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::convert::Infallible;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PinOp {
        ClockHigh,
        ClockLow,
        DioHigh,
        DioLow,
        DioInput,
        DioOutput,
    }

    /// Records every pin transition and answers ACK-window reads with a fixed level.
    struct MockPins {
        ops: Vec<PinOp>,
        dio_input_level: bool,
    }

    impl MockPins {
        fn acking() -> Self {
            // The chip acknowledges by pulling DIO low
            Self {
                ops: Vec::new(),
                dio_input_level: false,
            }
        }

        fn not_acking() -> Self {
            Self {
                ops: Vec::new(),
                dio_input_level: true,
            }
        }
    }

    impl Pins for &mut MockPins {
        type Error = Infallible;

        fn set_clock_high(&mut self) -> Result<(), Infallible> {
            self.ops.push(PinOp::ClockHigh);
            Ok(())
        }

        fn set_clock_low(&mut self) -> Result<(), Infallible> {
            self.ops.push(PinOp::ClockLow);
            Ok(())
        }

        fn set_dio_high(&mut self) -> Result<(), Infallible> {
            self.ops.push(PinOp::DioHigh);
            Ok(())
        }

        fn set_dio_low(&mut self) -> Result<(), Infallible> {
            self.ops.push(PinOp::DioLow);
            Ok(())
        }

        fn set_dio_as_input(&mut self) {
            self.ops.push(PinOp::DioInput);
        }

        fn set_dio_as_output(&mut self) {
            self.ops.push(PinOp::DioOutput);
        }

        fn dio_is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.dio_input_level)
        }
    }

    /// Timer whose waits complete immediately, so test futures never pend.
    struct MockTimer;

    impl Timer for MockTimer {
        async fn wait_clock_tick() {}

        async fn wait_millis(_ms: u64) {}
    }

    fn block_on<F: core::future::Future>(fut: F) -> F::Output {
        use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn noop_clone(p: *const ()) -> RawWaker {
            RawWaker::new(p, &VTABLE)
        }
        fn noop(_: *const ()) {}
        static VTABLE: RawWakerVTable = RawWakerVTable::new(noop_clone, noop, noop, noop);

        let waker = unsafe { Waker::from_raw(RawWaker::new(core::ptr::null(), &VTABLE)) };
        let mut cx = Context::from_waker(&waker);
        let mut fut = core::pin::pin!(fut);

        loop {
            if let Poll::Ready(output) = fut.as_mut().poll(&mut cx) {
                return output;
            }
        }
    }

    fn init_ops(ops: &mut Vec<PinOp>) {
        ops.extend([
            PinOp::ClockLow,
            PinOp::DioOutput,
            PinOp::DioHigh,
            PinOp::ClockHigh,
        ]);
    }

    fn start_ops(ops: &mut Vec<PinOp>) {
        ops.push(PinOp::DioLow);
    }

    fn stop_ops(ops: &mut Vec<PinOp>) {
        ops.extend([PinOp::DioLow, PinOp::ClockHigh, PinOp::DioHigh]);
    }

    /// The transitions `send_byte` makes for one byte: eight clocked bits LSB first, then the
    /// acknowledgment window.
    fn byte_ops(b: u8, ops: &mut Vec<PinOp>) {
        for bit in 0..8 {
            ops.push(PinOp::ClockLow);
            ops.push(if (b >> bit) & 1 != 0 {
                PinOp::DioHigh
            } else {
                PinOp::DioLow
            });
            ops.push(PinOp::ClockHigh);
        }

        ops.extend([
            PinOp::DioInput,
            PinOp::ClockLow,
            PinOp::ClockHigh,
            PinOp::ClockLow,
            PinOp::DioOutput,
        ]);
    }

    #[test]
    fn init_leaves_bus_idle() {
        let mut pins = MockPins::acking();
        BitBangingBusDriver::<_, MockTimer>::new(&mut pins).unwrap();

        // CLK stays low while DIO is configured, then both end up high
        assert_eq!(
            pins.ops,
            [
                PinOp::ClockLow,
                PinOp::DioOutput,
                PinOp::DioHigh,
                PinOp::ClockHigh
            ]
        );
    }

    #[test]
    fn single_byte_transaction_edge_order() {
        let mut pins = MockPins::acking();
        let mut driver = BitBangingBusDriver::<_, MockTimer>::new(&mut pins).unwrap();

        block_on(driver.send_command(0x44)).unwrap();

        let mut expected = Vec::new();
        init_ops(&mut expected);
        start_ops(&mut expected);
        byte_ops(0x44, &mut expected);
        stop_ops(&mut expected);

        assert_eq!(pins.ops, expected);
    }

    #[test]
    fn command_with_payload_is_one_transaction() {
        let mut pins = MockPins::acking();
        let mut driver = BitBangingBusDriver::<_, MockTimer>::new(&mut pins).unwrap();

        block_on(driver.send_command_write_data(0xc2, &[0x3f, 0x06])).unwrap();

        let mut expected = Vec::new();
        init_ops(&mut expected);
        start_ops(&mut expected);
        byte_ops(0xc2, &mut expected);
        byte_ops(0x3f, &mut expected);
        byte_ops(0x06, &mut expected);
        stop_ops(&mut expected);

        assert_eq!(pins.ops, expected);
    }

    #[test]
    fn missing_ack_is_reported() {
        let mut pins = MockPins::not_acking();
        let mut driver = BitBangingBusDriver::<_, MockTimer>::new(&mut pins).unwrap();

        assert_eq!(
            block_on(driver.send_command(0x40)),
            Err(BitBangError::Nack)
        );

        // The transaction is still closed so the bus ends up idle
        assert_eq!(
            pins.ops[pins.ops.len() - 3..],
            [PinOp::DioLow, PinOp::ClockHigh, PinOp::DioHigh]
        );
    }

    #[test]
    fn missing_ack_aborts_payload() {
        let mut pins = MockPins::not_acking();
        let mut driver = BitBangingBusDriver::<_, MockTimer>::new(&mut pins).unwrap();

        assert_eq!(
            block_on(driver.send_command_write_data(0xc0, &[0x3f, 0x06, 0x5b])),
            Err(BitBangError::Nack)
        );

        // Only the command byte went out: init + start + one byte + stop
        let mut expected = Vec::new();
        init_ops(&mut expected);
        start_ops(&mut expected);
        byte_ops(0xc0, &mut expected);
        stop_ops(&mut expected);

        assert_eq!(pins.ops, expected);
    }
}
