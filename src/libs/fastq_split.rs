//! Splits FASTQ files into bins by a hash of the read id.
//!
//! Both mates of a read carry the same id, so splitting the two files of a
//! pair with the same bin count puts mates in bins with the same index.

use crate::libs::error::{PipelineError, Result};
use bio::io::fastq;
use indexmap::IndexMap;
use std::fs::File;
use std::path::Path;

/// Fixed seed of the read id hash.
pub const HASH_SEED: u32 = 0;

/// Bin of a read id, in `0..bins`.
///
/// ```
/// let bin = methylseq::libs::fastq_split::bin_of("SRR000001.1", 16);
/// assert!(bin < 16);
/// assert_eq!(bin, methylseq::libs::fastq_split::bin_of("SRR000001.1", 16));
/// ```
pub fn bin_of(id: &str, bins: u32) -> usize {
    (murmurhash3::murmurhash3_x86_32(id.as_bytes(), HASH_SEED) % bins) as usize
}

/// Name of bin `bin` of `filename`.
pub fn shard_name(filename: &str, bin: u32) -> String {
    format!("{}-{}", filename, bin)
}

/// Splits one file into `bins` files next to it.
///
/// Returns the input's file name and the shard file names in bin order. Every
/// bin gets a file, possibly empty.
pub fn split_file(path: &Path, bins: u32) -> Result<(String, Vec<String>)> {
    if bins == 0 {
        return Err(PipelineError::MalformedInput("bins must be positive".to_string()));
    }
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| PipelineError::MalformedInput(format!("no file name in {}", path.display())))?
        .to_string();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let shards: Vec<String> = (0..bins).map(|bin| shard_name(&filename, bin)).collect();
    let mut writers = shards
        .iter()
        .map(|name| Ok(fastq::Writer::new(File::create(parent.join(name))?)))
        .collect::<Result<Vec<_>>>()?;

    let reader = fastq::Reader::new(crate::libs::io::reader(path)?);
    let mut count = 0u64;
    for record in reader.records() {
        let record =
            record.map_err(|e| PipelineError::MalformedInput(format!("{}: {}", path.display(), e)))?;
        writers[bin_of(record.id(), bins)].write_record(&record)?;
        count += 1;
    }
    for writer in writers.iter_mut() {
        writer.flush()?;
    }

    log::info!("wrote {} records for {}", count, path.display());
    Ok((filename, shards))
}

/// Splits every file, keyed by input file name.
pub fn split_files<P: AsRef<Path>>(paths: &[P], bins: u32) -> Result<IndexMap<String, Vec<String>>> {
    if !bins.is_power_of_two() {
        log::warn!("bins ({}) is not a power of 2", bins);
    }

    let mut written = IndexMap::new();
    for path in paths {
        let (filename, shards) = split_file(path.as_ref(), bins)?;
        written.insert(filename, shards);
    }
    Ok(written)
}
