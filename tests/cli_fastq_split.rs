use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::BTreeMap;

fn fastq(n: usize, mate: usize) -> String {
    (0..n)
        .map(|i| format!("@read{} {}:N:0\nACGTACGT\n+\nIIIIIIII\n", i, mate))
        .collect()
}

fn ids(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .step_by(4)
        .map(|l| l.trim_start_matches('@').split(' ').next().unwrap_or("").to_string())
        .collect())
}

#[test]
fn command_fastq_split() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let r1 = dir.path().join("reads_1.fastq");
    let r2 = dir.path().join("reads_2.fastq");
    std::fs::write(&r1, fastq(100, 1))?;
    std::fs::write(&r2, fastq(100, 2))?;

    let mut cmd = Command::cargo_bin("methylseq")?;
    let output = cmd
        .arg("fastq-split")
        .arg("-i")
        .arg(&r1)
        .arg(&r2)
        .arg("-b")
        .arg("4")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let written: BTreeMap<String, Vec<String>> = serde_json::from_str(stdout.trim())?;
    assert_eq!(written.len(), 2);
    assert_eq!(written["reads_2.fastq"].len(), 4);
    assert_eq!(written["reads_1.fastq"][3], "reads_1.fastq-3");

    let mut total = 0;
    for bin in 0..4 {
        let a = ids(&dir.path().join(format!("reads_1.fastq-{}", bin)))?;
        let b = ids(&dir.path().join(format!("reads_2.fastq-{}", bin)))?;
        assert_eq!(a, b);
        total += a.len();
    }
    assert_eq!(total, 100);

    Ok(())
}

#[test]
fn command_fastq_split_zero_bins() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("methylseq")?;
    cmd.arg("fastq-split")
        .arg("-i")
        .arg("reads_1.fastq")
        .arg("-b")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));

    Ok(())
}

#[test]
fn command_fastq_split_missing_input() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("methylseq")?;
    cmd.arg("fastq-split")
        .arg("-i")
        .arg(dir.path().join("absent.fastq"))
        .arg("-b")
        .arg("2")
        .assert()
        .failure();

    Ok(())
}
