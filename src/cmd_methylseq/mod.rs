//! Subcommand modules for the `methylseq` binary.

pub mod bam_sort;
pub mod fastq_split;
pub mod plan;
pub mod run;
pub mod size;
