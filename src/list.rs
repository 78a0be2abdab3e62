//! Pretty-printing of member index data.
//!
//! Renders the same table the command line tool prints: one line per
//! file with uncompressed size, compressed size and space saved, plus
//! dictionary size, member count and trailing bytes at higher verbosity,
//! and a per-member table for multimember files.

use std::io;
use std::io::Write;

use crate::index::LzipIndex;

/// Format a dictionary size with a binary prefix, e.g. `4096 B`,
/// ` 320 KiB`, `   1 MiB`.
pub fn format_ds(dictionary_size: u32) -> String {
    const PREFIXES: [&str; 3] = ["Ki", "Mi", "Gi"];
    const FACTOR: u32 = 1024;
    let mut num = dictionary_size;
    let mut exact = num % FACTOR == 0;
    let mut prefix = "";
    let mut pad = "  ";
    for p in PREFIXES {
        if !(num > 9999 || (exact && num >= FACTOR)) {
            break;
        }
        num /= FACTOR;
        if num % FACTOR != 0 {
            exact = false;
        }
        prefix = p;
        pad = "";
    }
    format!("{}{:>4} {}B", pad, num, prefix)
}

fn write_sizes_line<W: Write>(
    out: &mut W,
    uncompressed: u64,
    compressed: u64,
    name: &str,
) -> io::Result<()> {
    if uncompressed > 0 {
        let saved = 100.0 - (100.0 * compressed as f64) / uncompressed as f64;
        writeln!(
            out,
            "{:>14} {:>14} {:>6.2}%  {}",
            uncompressed, compressed, saved, name
        )
    } else {
        writeln!(
            out,
            "{:>14} {:>14}   -INF%  {}",
            uncompressed, compressed, name
        )
    }
}

/// Write the listing for one indexed file.
///
/// `verbosity` 0 prints the basic sizes line, 1 adds dictionary size,
/// member count and trailing bytes, 2 and up also prints the per-member
/// table of multimember files.
pub fn write_listing<W: Write>(
    out: &mut W,
    index: &LzipIndex,
    name: &str,
    verbosity: i32,
) -> io::Result<()> {
    if verbosity >= 1 {
        write!(out, "   dict   memb  trail ")?;
    }
    writeln!(out, "  uncompressed     compressed   saved  name")?;

    let members = index.members();
    if verbosity >= 1 {
        write!(
            out,
            "{} {:>5} {:>6} ",
            format_ds(index.dictionary_size()),
            members.len(),
            index.file_size() - index.cdata_size()
        )?;
    }
    write_sizes_line(out, index.udata_size(), index.cdata_size(), name)?;

    if verbosity >= 2 && members.len() > 1 {
        writeln!(
            out,
            " member      data_pos      data_size     member_pos    member_size"
        )?;
        for (i, member) in members.iter().enumerate() {
            writeln!(
                out,
                "{:>6} {:>14} {:>14} {:>14} {:>14}",
                i + 1,
                member.data_block.pos,
                member.data_block.size,
                member.member_block.pos,
                member.member_block.size
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress::member_builder::build_member;
    use crate::decompress::DecodeOptions;
    use crate::file_media::MemoryMedia;

    fn listing(file: Vec<u8>, verbosity: i32) -> String {
        let media = MemoryMedia::new(file);
        let index = LzipIndex::new(&media, &DecodeOptions::default()).unwrap();
        let mut out = Vec::new();
        write_listing(&mut out, &index, "test.lz", verbosity).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_ds() {
        assert_eq!(format_ds(4096), "   4 KiB");
        assert_eq!(format_ds(320 * 1024), " 320 KiB");
        assert_eq!(format_ds(1 << 20), "   1 MiB");
        assert_eq!(format_ds(512 * 1024 * 1024), " 512 MiB");
        assert_eq!(format_ds(5000), "  5000 B");
    }

    #[test]
    fn test_single_member_listing() {
        let out = listing(build_member(b"Hello, world!\n", 4096), 0);
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "  uncompressed     compressed   saved  name"
        );
        let line = lines.next().unwrap();
        assert!(line.starts_with("            14 "));
        assert!(line.ends_with("  test.lz"));
    }

    #[test]
    fn test_multimember_listing() {
        let mut file = build_member(b"Hello, ", 4096);
        file.extend_from_slice(&build_member(b"world!\n", 4096));
        let out = listing(file, 2);
        assert!(out.contains("   4 KiB     2      0 "));
        assert!(out.contains(" member      data_pos      data_size     member_pos    member_size"));
        // Second member starts where the first one ends
        let last = out.lines().last().unwrap();
        assert!(last.trim_start().starts_with('2'));
    }

    #[test]
    fn test_empty_data_listing() {
        let out = listing(build_member(b"", 4096), 0);
        assert!(out.contains("-INF%"));
    }
}
