#![no_main]
use libfuzzer_sys::fuzz_target;
use lzip_stream::{DecodeOptions, LzipIndex, MemoryMedia};

fuzz_target!(|data: &[u8]| {
    let media = MemoryMedia::new(data.to_vec());
    let _ = LzipIndex::new(&media, &DecodeOptions::default());
});
