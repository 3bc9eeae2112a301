#![no_main]

use libfuzzer_sys::fuzz_target;
use zenmagick::{DecodeRequest, Limits, Magick};

fuzz_target!(|data: &[u8]| {
    let Ok(magick) = Magick::global() else {
        return;
    };
    let limits = Limits {
        max_pixels: Some(4_000_000),
        max_memory_bytes: Some(64 * 1024 * 1024),
        ..Default::default()
    };
    if let Ok(output) = DecodeRequest::new(data)
        .with_magick(magick)
        .with_limits(&limits)
        .decode()
    {
        let expected = output
            .layout
            .byte_len(output.width(), output.height())
            .expect("size checked by limits");
        assert_eq!(output.pixels.as_bytes().len(), expected);
    }
});
