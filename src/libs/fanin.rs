use crate::libs::align::ChromosomeArtifactMap;
use crate::libs::artifact::ArtifactHandle;
use indexmap::IndexMap;

/// Chromosome label to the per-shard alignments of that chromosome.
pub type ChromosomeGroup = IndexMap<String, Vec<ArtifactHandle>>;

/// Collects every shard's per-chromosome artifacts under their label.
///
/// The key set is the union of the shards' key sets, in first-seen order.
/// A chromosome absent from some shards just gets a shorter list.
pub fn group_by_chromosome<I>(shard_maps: I) -> ChromosomeGroup
where
    I: IntoIterator<Item = ChromosomeArtifactMap>,
{
    let mut group = ChromosomeGroup::new();
    for map in shard_maps {
        for (label, handle) in map {
            group.entry(label).or_default().push(handle);
        }
    }
    group
}
