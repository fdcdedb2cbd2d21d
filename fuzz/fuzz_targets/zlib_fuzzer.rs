#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = png_inflate::zlib::decompress_to_vec_zlib(data);
    let _ = png_inflate::inflate::decompress_to_vec(data);
});
