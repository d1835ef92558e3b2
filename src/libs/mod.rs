pub mod align;
pub mod artifact;
pub mod bam_sort;
pub mod backend;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod estimate;
pub mod fanin;
pub mod fastq_split;
pub mod graph;
pub mod io;
pub mod methylation;
pub mod pipeline;
pub mod resource;
pub mod shard;

#[cfg(test)]
pub mod fakes;
