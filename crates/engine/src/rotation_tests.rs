// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use tempfile::tempdir;

#[test]
fn appends_without_rotating_below_limit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("terminal-raw.log");
    let mut sink = RotatingSink::new(path.clone(), 1024, 3).unwrap();
    sink.append(b"hello\n").unwrap();
    sink.append(b"world\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
    assert!(!path.with_extension("log.1").exists());
}

#[test]
fn rotates_when_limit_exceeded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("terminal-raw.log");
    let mut sink = RotatingSink::new(path.clone(), 10, 3).unwrap();
    sink.append(b"0123456789").unwrap();
    sink.append(b"more").unwrap();
    assert_eq!(fs::read_to_string(path.with_extension("log.1")).unwrap(), "0123456789");
    assert_eq!(fs::read_to_string(&path).unwrap(), "more");
}

#[test]
fn shifts_existing_suffixes_and_drops_oldest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("terminal-raw.log");
    let mut sink = RotatingSink::new(path.clone(), 5, 2).unwrap();
    sink.append(b"aaaaa").unwrap();
    sink.append(b"bbbbb").unwrap(); // rotates aaaaa -> .1, writes bbbbb
    sink.append(b"ccccc").unwrap(); // rotates bbbbb -> .2 (dropping aaaaa), writes ccccc

    assert_eq!(fs::read_to_string(path.with_extension("log.2")).unwrap(), "aaaaa");
    assert_eq!(fs::read_to_string(path.with_extension("log.1")).unwrap(), "bbbbb");
    assert_eq!(fs::read_to_string(&path).unwrap(), "ccccc");
}

#[test]
fn reopens_existing_file_and_accounts_for_its_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("terminal-raw.log");
    fs::write(&path, b"existing").unwrap();
    let mut sink = RotatingSink::new(path.clone(), 10, 3).unwrap();
    sink.append(b"!!").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "existing!!");
}
