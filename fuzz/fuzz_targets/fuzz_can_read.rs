#![no_main]

use libfuzzer_sys::fuzz_target;
use zenmagick::Magick;

fuzz_target!(|data: &[u8]| {
    let Ok(magick) = Magick::global() else {
        return;
    };
    // Must never panic, and a readable blob must also probe cleanly.
    if let Ok(true) = magick.can_read(data) {
        let _ = magick.probe(data, 0);
    }
});
