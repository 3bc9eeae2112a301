mod common;

use zenmagick::{
    ChannelMap, DecodeLayout, EncodeRequest, ImgVec, PixelBuffer, PixelData, Rgba,
};

#[test]
fn rgba8_survives_png() {
    let Some(magick) = common::magick() else {
        return;
    };
    let pixels: Vec<Rgba<u8>> = (0..12u8)
        .map(|i| Rgba::new(i * 20, 255 - i * 7, i * 3 + 1, 40 + i * 15))
        .collect();
    let img = ImgVec::new(pixels.clone(), 4, 3);
    let output = EncodeRequest::new("png")
        .with_magick(magick)
        .encode_rgba8(img.as_ref())
        .unwrap();
    assert_eq!(output.format, "PNG");

    let decoded = magick.decode(&output.data).unwrap();
    match decoded.pixels {
        PixelData::Rgba8(back) => {
            assert_eq!((back.width(), back.height()), (4, 3));
            assert_eq!(back.buf(), &pixels);
        }
        other => panic!("expected Rgba8, got {other:?}"),
    }
}

#[test]
fn sixteen_bit_buffers_stay_sixteen_bit() {
    let Some(magick) = common::magick() else {
        return;
    };
    let words: Vec<u16> = (0..3 * 2 * 3u16)
        .map(|i| 0x1234u16.wrapping_add(i.wrapping_mul(0x0f0f)))
        .collect();
    let buffer = PixelBuffer::new(3, 2, ChannelMap::RGB, words).unwrap();
    let output = EncodeRequest::new("PNG")
        .with_magick(magick)
        .encode(&buffer)
        .unwrap();
    let decoded = magick.decode(&output.data).unwrap();
    assert_eq!(decoded.layout, DecodeLayout::Rgb16);
    assert_eq!(decoded.pixels.to_buffer().words().as_u16(), buffer.words().as_u16());
}

#[test]
fn encode_to_writes_the_whole_image() {
    let Some(magick) = common::magick() else {
        return;
    };
    let buffer = PixelBuffer::new(2, 2, ChannelMap::RGB, vec![9u8, 90, 200].repeat(4)).unwrap();
    let mut sink = Vec::new();
    let written = EncodeRequest::new("GIF")
        .with_magick(magick)
        .encode_to(&buffer, &mut sink)
        .unwrap();
    assert_eq!(written, sink.len());
    assert_eq!(&sink[..3], b"GIF");
}

#[test]
fn unknown_format_fails_to_encode() {
    let Some(magick) = common::magick() else {
        return;
    };
    let buffer = PixelBuffer::new(1, 1, ChannelMap::GRAY, vec![0u8]).unwrap();
    let err = EncodeRequest::new("NO-SUCH-FORMAT")
        .with_magick(magick)
        .encode(&buffer)
        .unwrap_err();
    assert!(err.is_encode(), "{err:?}");
}
