use crate::libs::error::{PipelineError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::fmt;

lazy_static! {
    static ref RE_S3_URL: Regex = Regex::new(r"^s3://(?P<bucket>[^/]+)/?(?P<key>.*)$").unwrap();
}

/// Where a read file lives, derived from its URI scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    ObjectStore,
    LocalFile,
}

impl Storage {
    /// ```
    /// use methylseq::libs::descriptor::Storage;
    /// assert_eq!(Storage::parse("S3").unwrap(), Storage::ObjectStore);
    /// assert_eq!(Storage::parse("file").unwrap(), Storage::LocalFile);
    /// assert!(Storage::parse("gs").is_err());
    /// ```
    pub fn parse(scheme: &str) -> Result<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "s3" => Ok(Storage::ObjectStore),
            "file" => Ok(Storage::LocalFile),
            _ => Err(PipelineError::UnrecognizedStorage(scheme.to_string())),
        }
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::ObjectStore => write!(f, "s3"),
            Storage::LocalFile => write!(f, "file"),
        }
    }
}

/// Everything before the first `:`
pub fn scheme_of(uri: &str) -> &str {
    uri.split(':').next().unwrap_or("")
}

/// Path part of a `file://` URI, other strings are returned untouched.
pub fn local_path_of(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

/// Paired-end reads of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub name: String,
    pub uri_1: String,
    pub uri_2: String,
    pub storage: Storage,
}

impl ReadPair {
    /// Parses one `paired_reads` entry: `{"<name>": {"1": "<uri>", "2": "<uri>"}}`.
    pub fn parse(raw: &Value) -> Result<Self> {
        let obj = raw.as_object().ok_or_else(|| {
            PipelineError::MalformedInput(format!("paired reads entry is not an object: {}", raw))
        })?;
        if obj.len() != 1 {
            return Err(PipelineError::MalformedInput(format!(
                "illegal input, should be 1 key, the identifier of the reads, got {}",
                obj.len()
            )));
        }
        let (name, reads) = obj.iter().next().ok_or_else(|| {
            PipelineError::MalformedInput("empty paired reads entry".to_string())
        })?;

        let mate = |key: &str| -> Result<String> {
            reads
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    PipelineError::MalformedInput(format!(
                        "paired reads {} should have '1' and '2' keys with uris as values",
                        name
                    ))
                })
        };
        let uri_1 = mate("1")?;
        let uri_2 = mate("2")?;

        let scheme = scheme_of(&uri_1);
        if scheme != scheme_of(&uri_2) {
            return Err(PipelineError::MalformedInput(format!(
                "file schemes for {} don't match: {} and {}",
                name, uri_1, uri_2
            )));
        }
        let storage = Storage::parse(scheme)?;

        Ok(Self {
            name: name.to_string(),
            uri_1,
            uri_2,
            storage,
        })
    }
}

/// Bucket and key prefix that results get published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    pub bucket: String,
    pub key: String,
}

impl OutputLocation {
    pub fn parse(raw: &str) -> Result<Self> {
        let caps = RE_S3_URL.captures(raw).ok_or_else(|| {
            PipelineError::MalformedLocation(format!("failed to parse s3 location {}", raw))
        })?;
        Ok(Self {
            bucket: caps["bucket"].to_string(),
            key: caps["key"].to_string(),
        })
    }

    /// ```
    /// use methylseq::libs::descriptor::OutputLocation;
    /// let loc = OutputLocation::parse("s3://bucket/runs/42/").unwrap();
    /// assert_eq!(loc.url_for("0_report.txt"), "s3://bucket/runs/42/0_report.txt");
    /// assert_eq!(loc.url_for("a/b.bam"), "s3://bucket/runs/42/ab.bam");
    /// ```
    pub fn url_for(&self, filename: &str) -> String {
        let filename = filename.replace('/', "");
        let key = self.key.trim_matches('/');
        if key.is_empty() {
            format!("s3://{}/{}", self.bucket, filename)
        } else {
            format!("s3://{}/{}/{}", self.bucket, key, filename)
        }
    }
}

impl fmt::Display for OutputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key.trim_start_matches('/'))
    }
}

/// Splits an object URL into `(bucket, key, filename)`.
///
/// ```
/// let (bucket, key, filename) =
///     methylseq::libs::descriptor::parse_object_url("s3://bucket/the/key/to/happyness.json").unwrap();
/// assert_eq!(bucket, "bucket");
/// assert_eq!(key, "the/key/to/happyness.json");
/// assert_eq!(filename, "happyness.json");
/// ```
pub fn parse_object_url(url: &str) -> Result<(String, String, String)> {
    let caps = RE_S3_URL
        .captures(url)
        .ok_or_else(|| PipelineError::MalformedLocation(format!("illegal s3 url {}", url)))?;
    let key = caps["key"].to_string();
    let filename = key.rsplit('/').next().unwrap_or("").to_string();
    Ok((caps["bucket"].to_string(), key, filename))
}

/// Last path component of any URI.
pub fn filename_of(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_object_store_reads() {
        let raw = json!({
            "testdata": {
                "1": "s3://rand-dev/methylseq/testdata/reads_1.fastq",
                "2": "s3://rand-dev/methylseq/testdata/reads_2.fastq",
            }
        });
        let pair = ReadPair::parse(&raw).unwrap();
        assert_eq!(pair.name, "testdata");
        assert_eq!(pair.uri_1, "s3://rand-dev/methylseq/testdata/reads_1.fastq");
        assert_eq!(pair.uri_2, "s3://rand-dev/methylseq/testdata/reads_2.fastq");
        assert_eq!(pair.storage, Storage::ObjectStore);

        let raw = json!({"x": {"1": "s3://b/k1", "2": "s3://b/k2"}});
        assert_eq!(ReadPair::parse(&raw).unwrap().storage, Storage::ObjectStore);
    }

    #[test]
    fn parse_local_reads() {
        let raw = json!({
            "testdata": {
                "1": "file://data/reads_1.fastq",
                "2": "file://data/reads_2.fastq",
            }
        });
        let pair = ReadPair::parse(&raw).unwrap();
        assert_eq!(pair.storage, Storage::LocalFile);
        assert_eq!(local_path_of(&pair.uri_1), "data/reads_1.fastq");
    }

    #[test]
    fn parse_rejects_two_names() {
        let raw = json!({
            "a": {"1": "s3://b/k1", "2": "s3://b/k2"},
            "b": {"1": "s3://b/k3", "2": "s3://b/k4"},
        });
        assert!(matches!(
            ReadPair::parse(&raw),
            Err(PipelineError::MalformedInput(_))
        ));
        assert!(matches!(
            ReadPair::parse(&json!({})),
            Err(PipelineError::MalformedInput(_))
        ));
        assert!(matches!(
            ReadPair::parse(&json!(["s3://b/k1"])),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn parse_rejects_missing_mate() {
        let raw = json!({"x": {"1": "s3://b/k1"}});
        let err = ReadPair::parse(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
        assert!(err.to_string().contains("x"));

        let raw = json!({"x": {"1": "s3://b/k1", "2": 2}});
        assert!(matches!(
            ReadPair::parse(&raw),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn parse_rejects_mixed_schemes() {
        let raw = json!({"x": {"1": "s3://b/k1", "2": "file://b/k2"}});
        assert!(matches!(
            ReadPair::parse(&raw),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_scheme() {
        let raw = json!({"x": {"1": "gs://b/k1", "2": "gs://b/k2"}});
        assert!(matches!(
            ReadPair::parse(&raw),
            Err(PipelineError::UnrecognizedStorage(ref s)) if s == "gs"
        ));
    }

    #[test]
    fn output_location() {
        let loc = OutputLocation::parse("s3://bucket/some/prefix").unwrap();
        assert_eq!(loc.bucket, "bucket");
        assert_eq!(loc.key, "some/prefix");
        assert_eq!(loc.url_for("x.bam"), "s3://bucket/some/prefix/x.bam");

        let loc = OutputLocation::parse("s3://bucket").unwrap();
        assert_eq!(loc.url_for("x.bam"), "s3://bucket/x.bam");

        let loc = OutputLocation {
            bucket: "bucket".to_string(),
            key: "//double//".to_string(),
        };
        assert_eq!(loc.url_for("x.bam"), "s3://bucket/double/x.bam");
    }

    #[test]
    fn output_location_requires_s3() {
        for raw in ["bucket/key", "file://bucket/key", "s3://", " s3://bucket"] {
            assert!(
                matches!(
                    OutputLocation::parse(raw),
                    Err(PipelineError::MalformedLocation(_))
                ),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn filenames() {
        assert_eq!(filename_of("s3://b/k/reads_1.fastq.gz"), "reads_1.fastq.gz");
        assert_eq!(filename_of("s3://b/index/Bisulfite_Genome/"), "Bisulfite_Genome");
        assert_eq!(filename_of("reads.fq"), "reads.fq");
        assert!(parse_object_url("http://b/k").is_err());
    }
}
