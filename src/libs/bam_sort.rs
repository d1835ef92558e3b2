//! Splits a BAM file into one BAM per chromosome.
//!
//! Only the autosomes in [`KEEP_CHROMS`] get a file. Records on any other
//! reference, and unplaced records, are dropped.

use crate::libs::error::{PipelineError, Result};
use noodles::bam;
use noodles::sam::alignment::io::Write as _;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

pub const KEEP_CHROMS: [&str; 22] = [
    "chr1", "chr2", "chr3", "chr4", "chr5", "chr6", "chr7", "chr8", "chr9", "chr10", "chr11",
    "chr12", "chr13", "chr14", "chr15", "chr16", "chr17", "chr18", "chr19", "chr20", "chr21",
    "chr22",
];

/// Name of the per-chromosome file cut from an input with file stem `stem`.
///
/// ```
/// let name = methylseq::libs::bam_sort::chrom_file_name("chr7", "sample.deduplicated");
/// assert_eq!(name, "chr7_sample.deduplicated.bam");
/// ```
pub fn chrom_file_name(chrom: &str, stem: &str) -> String {
    format!("{}_{}.bam", chrom, stem)
}

/// Writes `<chrom>_<stem>.bam` next to `path` for every kept chromosome that
/// has at least one record.
///
/// Returns `(chrom, file name)` pairs in order of first appearance. Each
/// output carries the input's header.
pub fn sort_by_chromosome(path: &Path) -> Result<Vec<(String, String)>> {
    let malformed = |e: std::io::Error| PipelineError::MalformedInput(format!("{}: {}", path.display(), e));

    let stem = path
        .file_stem()
        .and_then(|f| f.to_str())
        .ok_or_else(|| PipelineError::MalformedInput(format!("no file name in {}", path.display())))?
        .to_string();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut reader = bam::io::Reader::new(File::open(path)?);
    let header = reader.read_header().map_err(malformed)?;
    let names: Vec<String> = header
        .reference_sequences()
        .keys()
        .map(|name| name.to_string())
        .collect();

    let mut writers = HashMap::new();
    let mut written = vec![];
    let mut record = bam::Record::default();
    let (mut total, mut kept) = (0u64, 0u64);

    while reader.read_record(&mut record).map_err(malformed)? != 0 {
        total += 1;
        let id = match record.reference_sequence_id().transpose().map_err(malformed)? {
            Some(id) => id,
            None => continue,
        };
        let name = names.get(id).ok_or_else(|| {
            PipelineError::MalformedInput(format!(
                "{}: reference sequence id {} not in header",
                path.display(),
                id
            ))
        })?;
        if !KEEP_CHROMS.contains(&name.as_str()) {
            continue;
        }

        let writer = match writers.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = chrom_file_name(name, &stem);
                let mut writer = bam::io::Writer::new(File::create(parent.join(&file))?);
                writer.write_alignment_header(&header)?;
                written.push((name.clone(), file));
                entry.insert(writer)
            }
        };
        writer.write_alignment_record(&header, &record)?;
        kept += 1;
    }

    for writer in writers.values_mut() {
        writer.finish(&header)?;
    }

    log::info!(
        "kept {} of {} records from {} in {} files",
        kept,
        total,
        path.display(),
        written.len()
    );
    Ok(written)
}
