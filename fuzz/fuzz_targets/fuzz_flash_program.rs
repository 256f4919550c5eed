//! Fuzz target: `SpiNorFlash::program`
//!
//! The first four bytes pick a start address; the rest is the payload.
//! Whatever the alignment and length, the driver must either reject the
//! request up front or split it so the chip never sees a page program that
//! wraps, and the data must read back intact.
//!
//! cargo fuzz run fuzz_flash_program

#![no_main]

use colorimeter::adapters::time::SimClock;
use colorimeter::error::FlashError;
use colorimeter::storage::nor::SpiNorFlash;
use colorimeter::storage::sim::SimNorChip;
use colorimeter::storage::{BlockStorage, FlashGeometry, FlashTimeouts};
use libfuzzer_sys::fuzz_target;

const GEOMETRY: FlashGeometry = FlashGeometry {
    capacity: 64 * 1024,
    sector_size: 4096,
    page_size: 256,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (head, payload) = data.split_at(4);
    // Bias towards in-range addresses while still exercising the edges.
    let addr = u32::from_le_bytes([head[0], head[1], head[2], head[3]]) % (GEOMETRY.capacity + 512);

    let chip = SimNorChip::new(GEOMETRY);
    let mut nor = SpiNorFlash::new(
        chip.clone(),
        SimClock::with_step(1),
        GEOMETRY,
        FlashTimeouts::default(),
    );

    match nor.program(addr, payload) {
        Ok(()) => {
            let mut back = vec![0u8; payload.len()];
            assert!(nor.read(addr, &mut back).is_ok());
            assert_eq!(back, payload);
        }
        Err(FlashError::OutOfRange { .. }) => {
            assert_eq!(chip.transaction_count(), 0, "rejected write reached the bus");
        }
        Err(e) => panic!("unexpected flash error: {e}"),
    }
    assert_eq!(chip.page_violations(), 0, "page program wrapped");
});
