use crate::libs::artifact::{ArtifactHandle, ArtifactSplitter};
use crate::libs::descriptor::ReadPair;
use crate::libs::error::{PipelineError, Result};

/// One index-aligned bin of both mates of a read pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadShard {
    pub mate1: ArtifactHandle,
    pub mate2: ArtifactHandle,
    /// Name of the pair this shard came from, not unique.
    pub name: String,
}

/// Zips the bins of both mates, i-th with i-th.
pub fn coalesce_shards(
    mate1_bins: Vec<ArtifactHandle>,
    mate2_bins: Vec<ArtifactHandle>,
    name: &str,
) -> Result<Vec<ReadShard>> {
    if mate1_bins.len() != mate2_bins.len() {
        return Err(PipelineError::ShardCountMismatch {
            name: name.to_string(),
            mate1: mate1_bins.len(),
            mate2: mate2_bins.len(),
        });
    }

    Ok(mate1_bins
        .into_iter()
        .zip(mate2_bins)
        .map(|(mate1, mate2)| ReadShard {
            mate1,
            mate2,
            name: name.to_string(),
        })
        .collect())
}

/// Splits both mates of one pair and pairs up the bins.
///
/// The mates are split independently and may run concurrently; both must be
/// done before pairing.
pub fn shard_read_pair(splitter: &dyn ArtifactSplitter, pair: &ReadPair, bins: usize) -> Result<Vec<ReadShard>> {
    if bins == 0 {
        return Err(PipelineError::MalformedInput(format!(
            "bins for {} must be positive",
            pair.name
        )));
    }

    let (mate1_bins, mate2_bins) = rayon::join(
        || splitter.split(&pair.uri_1, bins),
        || splitter.split(&pair.uri_2, bins),
    );
    let (mate1_bins, mate2_bins) = (mate1_bins?, mate2_bins?);
    log::info!(
        "{}: split into {} + {} bins",
        pair.name,
        mate1_bins.len(),
        mate2_bins.len()
    );

    coalesce_shards(mate1_bins, mate2_bins, &pair.name)
}

/// Concatenates per-pair shard lists, pair order first, then bin order.
pub fn flatten_shards(shards: Vec<Vec<ReadShard>>) -> Vec<ReadShard> {
    shards.into_iter().flatten().collect()
}

/// Shards every pair, in order.
pub fn plan_shards(splitter: &dyn ArtifactSplitter, pairs: &[ReadPair], bins: usize) -> Result<Vec<ReadShard>> {
    let per_pair = pairs
        .iter()
        .map(|pair| shard_read_pair(splitter, pair, bins))
        .collect::<Result<Vec<_>>>()?;
    Ok(flatten_shards(per_pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::descriptor::Storage;
    use crate::libs::fakes::FakeSplitter;

    fn pair(name: &str) -> ReadPair {
        ReadPair {
            name: name.to_string(),
            uri_1: format!("s3://b/{}_1.fq", name),
            uri_2: format!("s3://b/{}_2.fq", name),
            storage: Storage::ObjectStore,
        }
    }

    fn handles(prefix: &str, n: usize) -> Vec<ArtifactHandle> {
        (0..n)
            .map(|i| ArtifactHandle::new(format!("{}-{}", prefix, i), 10))
            .collect()
    }

    #[test]
    fn coalesce_pairs_by_index() {
        let shards = coalesce_shards(handles("a", 3), handles("b", 3), "x").unwrap();
        assert_eq!(shards.len(), 3);
        for (i, shard) in shards.iter().enumerate() {
            assert_eq!(shard.mate1.id, format!("a-{}", i));
            assert_eq!(shard.mate2.id, format!("b-{}", i));
            assert_eq!(shard.name, "x");
        }
    }

    #[test]
    fn coalesce_count_mismatch() {
        let err = coalesce_shards(handles("a", 3), handles("b", 2), "x").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ShardCountMismatch { ref name, mate1: 3, mate2: 2 } if name == "x"
        ));
    }

    #[test]
    fn plan_preserves_order() {
        let splitter = FakeSplitter::default();
        let pairs = vec![pair("s1"), pair("s2")];
        let shards = plan_shards(&splitter, &pairs, 4).unwrap();

        assert_eq!(shards.len(), 8);
        assert!(shards[..4].iter().all(|s| s.name == "s1"));
        assert!(shards[4..].iter().all(|s| s.name == "s2"));
        assert_eq!(shards[1].mate1.id, "s3://b/s1_1.fq-1");
        assert_eq!(shards[1].mate2.id, "s3://b/s1_2.fq-1");
        assert_eq!(shards[6].mate2.id, "s3://b/s2_2.fq-2");
    }

    #[test]
    fn plan_uneven_split() {
        let splitter = FakeSplitter::default().short("s3://b/s2_2.fq");
        let pairs = vec![pair("s1"), pair("s2")];
        let err = plan_shards(&splitter, &pairs, 4).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ShardCountMismatch { ref name, mate1: 4, mate2: 3 } if name == "s2"
        ));
    }

    #[test]
    fn plan_duplicate_names_allowed() {
        let splitter = FakeSplitter::default();
        let mut second = pair("s1");
        second.uri_1 = "s3://b/other_1.fq".to_string();
        second.uri_2 = "s3://b/other_2.fq".to_string();
        let shards = plan_shards(&splitter, &[pair("s1"), second], 2).unwrap();
        assert_eq!(shards.len(), 4);
        assert!(shards.iter().all(|s| s.name == "s1"));
    }

    #[test]
    fn plan_zero_bins() {
        let splitter = FakeSplitter::default();
        assert!(matches!(
            plan_shards(&splitter, &[pair("s1")], 0),
            Err(PipelineError::MalformedInput(_))
        ));
    }
}
