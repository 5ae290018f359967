// Feed line parsing and snapshot building

use disks_poweroff::device::{DeviceId, DeviceSet};
use disks_poweroff::diskstats::{build_snapshot, parse_line, read_snapshot};

const SDA_LINE: &str =
    "   8       0 sda 19912 11150 4603573 10996 76961 88315 4666256 72070 0 92637 83075 0 0 0 0 13 8";
const DM_LINE: &str = " 253       0 dm-0 4427735 0 764012960 1975224 10010485 0 1190249536 120592768 0 7406036 122645676 136166 0 460220616 77684 0 0";

fn dev(name: &str) -> DeviceId {
    DeviceId::normalize(name)
}

fn tracked(names: &[&str]) -> DeviceSet {
    names.iter().map(|n| dev(n)).collect()
}

#[test]
fn test_parse_line_extracts_fields_3_6_10() {
    let (device, counters) = parse_line(SDA_LINE).unwrap();
    assert_eq!(device, dev("sda"));
    assert_eq!(counters.sectors_read, "4603573");
    assert_eq!(counters.sectors_written, "4666256");
}

#[test]
fn test_parse_line_device_mapper() {
    let (device, counters) = parse_line(DM_LINE).unwrap();
    assert_eq!(device, dev("dm-0"));
    assert_eq!(counters.sectors_read, "764012960");
    assert_eq!(counters.sectors_written, "1190249536");
}

#[test]
fn test_parse_line_short_line_is_skipped() {
    assert!(parse_line("8 0 sda 1 2 3").is_none());
    assert!(parse_line("").is_none());
    assert!(parse_line("   ").is_none());
}

#[test]
fn test_build_snapshot_keeps_only_tracked_devices() {
    let feed = format!("{SDA_LINE}\n{DM_LINE}\n");
    let snapshot = build_snapshot(&feed, &tracked(&["sda"]));
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains_key(&dev("sda")));
    assert!(!snapshot.contains_key(&dev("dm-0")));
}

#[test]
fn test_untracked_line_never_produces_an_entry() {
    // sdc is not tracked, so its line is ignored regardless of its counters.
    let feed = "8 0 sdc 1 1 100 1 1 1 100 1 0 1 1\n";
    let snapshot = build_snapshot(feed, &tracked(&["sda", "sdb"]));
    assert!(snapshot.is_empty());
}

#[test]
fn test_build_snapshot_skips_malformed_lines() {
    let feed = format!("garbage\n{SDA_LINE}\n8 0\n");
    let snapshot = build_snapshot(&feed, &tracked(&["sda"]));
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_read_snapshot_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("diskstats");
    std::fs::write(&path, format!("{SDA_LINE}\n")).unwrap();
    let snapshot = read_snapshot(&path, &tracked(&["sda"])).unwrap();
    assert_eq!(snapshot[&dev("sda")].sectors_read, "4603573");
}

#[test]
fn test_unreadable_feed_is_an_error_not_an_empty_snapshot() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = read_snapshot(&dir.path().join("missing"), &tracked(&["sda"])).unwrap_err();
    assert!(err.to_string().contains("missing"));
}
