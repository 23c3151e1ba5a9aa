//! Example of using a TM1637 display module on an RP2040 board like the Pi Pico

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use tm1637::DigitLayout;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    // Instantiate the TM1637 interface using a bit-banging implementation of the TM1637 bus
    // interface implemented using the `embassy-rp` HAL and the `embassy-time` timer.
    let mut display = tm1637::Tm1637::builder()
        .with_embassy_timer()
        .with_embassy_rp_pins(p.PIN_6, p.PIN_7)
        .with_layout(DigitLayout::four_digit())
        .build()
        .unwrap();
    display.init().await.unwrap();

    debug!("TM1637 display initialized");

    loop {
        // Walk a single segment through every digit
        for address in 0..4 {
            for segment in 0..7 {
                display
                    .set_segment_fixed(Some(address), 1 << segment)
                    .await
                    .unwrap();
                Timer::after_millis(50).await;
            }
            display.set_segment_fixed(Some(address), 0).await.unwrap();
        }

        // Sweep the brightness range on a fully lit display
        for level in 0..8 {
            display.set_brightness(level);
            display.set_segment_auto(&[0xff; 4]).await.unwrap();
            Timer::after_millis(200).await;
        }
        display.set_brightness(2);

        // Signed numbers, with and without leading zeros
        display.set_number(-42, false, 0).await.unwrap();
        Timer::after_millis(1000).await;
        display.set_number(-42, true, 0).await.unwrap();
        Timer::after_millis(1000).await;

        // 12.34 using the dot mask
        display.set_number(1234, true, 0b0100).await.unwrap();
        Timer::after_millis(1000).await;

        // Too wide for four digits; the display is left untouched
        if display.set_number(123456, false, 0).await.is_err() {
            warn!("123456 doesn't fit on a 4-digit module");
        }
        Timer::after_millis(1000).await;

        // Short text fits; long text scrolls by on its own
        display.set_segment_ascii("PLAY").await.unwrap();
        Timer::after_millis(1000).await;
        display.set_segment_ascii("IP 192.168.10.20").await.unwrap();

        // Two-phase reveal of "12.34", held for a second
        display
            .set_segment_ascii_with_time("1234", 0b0100, 1000)
            .await
            .unwrap();

        Timer::after_millis(500).await;
    }
}
