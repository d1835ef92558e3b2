use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn command_size() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("methylseq")?;
    let output = cmd
        .arg("size")
        .arg("0")
        .arg("1536")
        .arg("20971520")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout, "0B\n1.5KB\n20MB\n");

    Ok(())
}

#[test]
fn command_size_to() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("methylseq")?;
    cmd.arg("size")
        .arg("2147483648")
        .arg("--to")
        .arg("mb")
        .assert()
        .success()
        .stdout("2000MB\n");

    Ok(())
}

#[test]
fn command_size_bad_unit() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("methylseq")?;
    cmd.arg("size")
        .arg("1024")
        .arg("--to")
        .arg("QB")
        .assert()
        .failure()
        .stderr(predicate::str::contains("don't understand unit QB"));

    Ok(())
}
