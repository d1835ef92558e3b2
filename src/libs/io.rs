use std::io::{BufRead, BufReader, BufWriter, Read, Write};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens a file for reading, decompressing it when it starts with the gzip
/// magic bytes. Concatenated gzip members are read through.
///
/// ```
/// use std::io::BufRead;
/// use std::io::Write;
///
/// let dir = tempfile::tempdir().unwrap();
/// let plain = dir.path().join("reads.fq");
/// std::fs::write(&plain, "@r1\nACGT\n+\nIIII\n").unwrap();
///
/// let mut gz = flate2::write::GzEncoder::new(vec![], flate2::Compression::default());
/// gz.write_all(b"@r1\nACGT\n+\nIIII\n").unwrap();
/// let packed = dir.path().join("reads.fastq");
/// std::fs::write(&packed, gz.finish().unwrap()).unwrap();
///
/// for path in [plain, packed] {
///     let reader = methylseq::libs::io::reader(&path).unwrap();
///     assert_eq!(reader.lines().count(), 4);
/// }
/// ```
pub fn reader(path: impl AsRef<std::path::Path>) -> std::io::Result<Box<dyn BufRead>> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut buffered = BufReader::new(file);
    let is_gzip = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);

    let reader: Box<dyn BufRead> = if is_gzip {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(buffered)))
    } else {
        Box::new(buffered)
    };
    Ok(reader)
}

/// Reads the whole of a possibly compressed file.
pub fn read_to_string(path: impl AsRef<std::path::Path>) -> std::io::Result<String> {
    let mut text = String::new();
    reader(path)?.read_to_string(&mut text)?;
    Ok(text)
}

/// `stdout` or a file, buffered.
pub fn writer(output: &str) -> std::io::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        Box::new(BufWriter::new(std::fs::File::create(output)?))
    };
    Ok(writer)
}
