use crate::libs::artifact::SizeLookup;
use crate::libs::descriptor::{ReadPair, Storage};
use crate::libs::error::{PipelineError, Result};
use crate::libs::resource::{ArtifactResourceRequirement, ResourceQuantity};
use crate::libs::shard::ReadShard;

pub const MEM_EXPAND_BUFFER: f64 = 1.25;
pub const DISK_EXPAND_BUFFER: f64 = 1.10;

/// Expanded footprint of `bytes` of input.
pub fn requirement_for_bytes(bytes: u64, mem_buffer: f64, disk_buffer: f64) -> ArtifactResourceRequirement {
    let disk = ResourceQuantity::from_bytes((disk_buffer * bytes as f64) as u64);
    let memory = ResourceQuantity::from_bytes((mem_buffer * bytes as f64) as u64);
    ArtifactResourceRequirement::new(memory, disk)
}

/// Estimates the footprint of one read file with custom buffers.
pub fn estimate_with(
    sizes: &dyn SizeLookup,
    uri: &str,
    storage: Storage,
    mem_buffer: f64,
    disk_buffer: f64,
) -> Result<ArtifactResourceRequirement> {
    match storage {
        Storage::ObjectStore => {
            let length = sizes.size(uri)?;
            log::debug!("{} is {} bytes", uri, length);
            Ok(requirement_for_bytes(length, mem_buffer, disk_buffer))
        }
        Storage::LocalFile => Err(PipelineError::UnsupportedStorage(format!(
            "local file estimate of {}",
            uri
        ))),
    }
}

/// Estimates the footprint of one read file with the default buffers.
pub fn estimate(sizes: &dyn SizeLookup, uri: &str, storage: Storage) -> Result<ArtifactResourceRequirement> {
    estimate_with(sizes, uri, storage, MEM_EXPAND_BUFFER, DISK_EXPAND_BUFFER)
}

/// Both mates of a pair.
pub fn estimate_for_read_pair(sizes: &dyn SizeLookup, pair: &ReadPair) -> Result<ArtifactResourceRequirement> {
    let mate1 = estimate(sizes, &pair.uri_1, pair.storage)?;
    let mate2 = estimate(sizes, &pair.uri_2, pair.storage)?;
    mate1.try_add(&mate2)
}

/// Both bins of a shard, from the size recorded on their handles.
///
/// The two bins of a shard can land on different scale steps, in which case
/// the smaller one is converted first.
pub fn estimate_for_shard(shard: &ReadShard) -> Result<ArtifactResourceRequirement> {
    let mate1 = requirement_for_bytes(shard.mate1.size, MEM_EXPAND_BUFFER, DISK_EXPAND_BUFFER);
    let mate2 = requirement_for_bytes(shard.mate2.size, MEM_EXPAND_BUFFER, DISK_EXPAND_BUFFER);
    let align = |a: ResourceQuantity, b: ResourceQuantity| {
        let unit = a.unit().max(b.unit());
        (a.convert_to(unit), b.convert_to(unit))
    };
    let (m1, m2) = align(mate1.memory, mate2.memory);
    let (d1, d2) = align(mate1.disk, mate2.disk);
    ArtifactResourceRequirement::new(m1, d1).try_add(&ArtifactResourceRequirement::new(m2, d2))
}
