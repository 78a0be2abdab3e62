#![no_main]
use libfuzzer_sys::fuzz_target;
use lzip_stream::{decode_stream, DecodeOptions, MemberHeader};

fuzz_target!(|data: &[u8]| {
    if data.len() < MemberHeader::SIZE {
        return;
    }

    // Cap the window a crafted header can demand (to avoid OOM)
    let mut header = [0u8; MemberHeader::SIZE];
    header.copy_from_slice(&data[..MemberHeader::SIZE]);
    if let Ok(parsed) = MemberHeader::parse(&header) {
        if parsed.dictionary_size > 8 * 1024 * 1024 {
            return;
        }
    }

    let _ = decode_stream(data, std::io::sink(), &DecodeOptions::default());
});
