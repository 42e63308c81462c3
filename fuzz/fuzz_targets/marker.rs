#![no_main]

use libfuzzer_sys::fuzz_target;
use mpk_wire::Marker;

// Fuzz target: tag classification and header lengths.
//
// Catches bugs in:
// - A supported byte that fails to round-trip through to_u8
// - Fixint payloads leaking into another tag's byte range
// - Header lengths that disagree with the int/bin layouts
fuzz_target!(|data: &[u8]| {
    for &byte in data {
        let Some(marker) = Marker::from_u8(byte) else {
            continue;
        };
        assert_eq!(marker.to_u8(), byte);
        assert_eq!(Marker::try_from(byte), Ok(marker));

        let expected = 1 + marker
            .int_layout()
            .map(|(w, _)| w.bytes())
            .or(marker.bin_length_width().map(|w| w.bytes()))
            .unwrap_or(match marker {
                Marker::F32 => 4,
                Marker::F64 => 8,
                _ => 0,
            });
        assert_eq!(marker.header_len(), expected, "{marker}");
    }
});
