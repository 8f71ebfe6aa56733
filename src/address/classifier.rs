//! MAC/IP record parsing and segment classification.

use color_eyre::eyre::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

/// Match: "<mac> <ipv4>" anywhere in the input
static MAC_IP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+:\w+:\w+:\w+:\w+:\w+\s+\d+\.\d+\.\d+\.\d+").expect("Invalid mac/ip regex")
});

/// A single observed MAC/IP combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AddressPair {
    pub mac: String,
    pub ip: String,
}

impl AddressPair {
    pub fn new(mac: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            ip: ip.into(),
        }
    }
}

/// Address pairs split into the internal and external segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressSet {
    pub internal: Vec<AddressPair>,
    pub external: Vec<AddressPair>,
}

/// External addresses grouped by MAC; one MAC may present several IPs.
pub type ExternalAddressIndex = BTreeMap<String, BTreeSet<String>>;

/// Scan free-form text for MAC/IP pairs.
///
/// Anything that does not look like `MAC<whitespace>IPv4` is ignored, and
/// repeated MAC+IP combinations collapse into a single entry.
pub fn read_records(text: &str) -> BTreeSet<AddressPair> {
    let mut records = BTreeSet::new();

    for found in MAC_IP_PATTERN.find_iter(text) {
        let mut parts = found.as_str().split_whitespace();
        if let (Some(mac), Some(ip)) = (parts.next(), parts.next()) {
            records.insert(AddressPair::new(mac, ip));
        }
    }

    records
}

/// Read and scan a MAC/IP input file
pub fn read_records_file(path: &Path) -> Result<BTreeSet<AddressPair>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read MAC/IP file '{}'", path.display()))?;
    let records = read_records(&content);
    log::info!("Read {} unique MAC/IP pairs from {:?}", records.len(), path);
    Ok(records)
}

/// Split records into internal and external segments.
///
/// A record is internal when its IP matches `internal_pattern` at the start
/// of the address (prefix match, not a full match). Every record ends up in
/// exactly one of the two lists.
pub fn partition<'a, I>(records: I, internal_pattern: &Regex) -> AddressSet
where
    I: IntoIterator<Item = &'a AddressPair>,
{
    let mut set = AddressSet::default();

    for pair in records {
        let is_internal = internal_pattern
            .find(&pair.ip)
            .map_or(false, |m| m.start() == 0);

        if is_internal {
            set.internal.push(pair.clone());
        } else {
            set.external.push(pair.clone());
        }
    }

    set
}

/// Fold address pairs into a MAC-keyed index of IP sets
pub fn aggregate_by_mac<'a, I>(records: I) -> ExternalAddressIndex
where
    I: IntoIterator<Item = &'a AddressPair>,
{
    let mut index = ExternalAddressIndex::new();
    for pair in records {
        index
            .entry(pair.mac.clone())
            .or_default()
            .insert(pair.ip.clone());
    }
    index
}

/// Expand an index back into its address pairs
pub fn flatten(index: &ExternalAddressIndex) -> Vec<AddressPair> {
    index
        .iter()
        .flat_map(|(mac, ips)| ips.iter().map(move |ip| AddressPair::new(mac.clone(), ip.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn internal_pattern() -> Regex {
        Regex::new("^192.168").unwrap()
    }

    #[test]
    fn test_read_records_and_partition_scenario() {
        let text = "aa:bb:cc:dd:ee:ff 192.168.1.5\n11:22:33:44:55:66 10.0.0.9";
        let records = read_records(text);
        assert_eq!(records.len(), 2);

        let set = partition(&records, &internal_pattern());
        assert_eq!(set.internal, vec![AddressPair::new("aa:bb:cc:dd:ee:ff", "192.168.1.5")]);
        assert_eq!(set.external, vec![AddressPair::new("11:22:33:44:55:66", "10.0.0.9")]);
    }

    #[test]
    fn test_read_records_ignores_noise_and_duplicates() {
        let text = r#"
# arp dump
aa:bb:cc:dd:ee:ff   192.168.1.5   eth0
garbage line without anything useful
aa:bb:cc:dd:ee:ff 192.168.1.5
aa:bb:cc:dd:ee:ff	192.168.1.6
not:a:mac 10.0.0.1
"#;
        let records = read_records(text);
        assert_eq!(records.len(), 2);
        assert!(records.contains(&AddressPair::new("aa:bb:cc:dd:ee:ff", "192.168.1.5")));
        assert!(records.contains(&AddressPair::new("aa:bb:cc:dd:ee:ff", "192.168.1.6")));
    }

    #[test]
    fn test_read_records_empty_input() {
        assert!(read_records("").is_empty());
        assert!(read_records("nothing to see here").is_empty());
    }

    #[test]
    fn test_read_records_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "00:11:22:33:44:55 192.168.0.10").unwrap();
        writeln!(file, "66:77:88:99:aa:bb 172.16.0.3").unwrap();

        let records = read_records_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_records_file_missing() {
        assert!(read_records_file(Path::new("/nonexistent/mac_ip.txt")).is_err());
    }

    #[test]
    fn test_partition_is_prefix_match() {
        let records = vec![
            AddressPair::new("aa:aa:aa:aa:aa:01", "192.168.3.4"),
            AddressPair::new("aa:aa:aa:aa:aa:02", "10.192.168.1"),
        ];
        let set = partition(&records, &internal_pattern());
        assert_eq!(set.internal.len(), 1);
        assert_eq!(set.internal[0].ip, "192.168.3.4");
        assert_eq!(set.external.len(), 1);
        assert_eq!(set.external[0].ip, "10.192.168.1");

        // An unanchored pattern still only matches at the start
        let unanchored = Regex::new("168").unwrap();
        let set = partition(&records, &unanchored);
        assert!(set.internal.is_empty());
        assert_eq!(set.external.len(), 2);
    }

    #[test]
    fn test_partition_covers_every_record() {
        let text = "\
            01:00:00:00:00:01 192.168.0.1\n\
            01:00:00:00:00:02 192.168.0.2\n\
            01:00:00:00:00:03 8.8.8.8\n\
            01:00:00:00:00:03 8.8.4.4\n\
            01:00:00:00:00:04 203.0.113.7\n";
        let records = read_records(text);
        let set = partition(&records, &internal_pattern());

        assert_eq!(set.internal.len() + set.external.len(), records.len());

        let internal: BTreeSet<_> = set.internal.iter().cloned().collect();
        let external: BTreeSet<_> = set.external.iter().cloned().collect();
        assert!(internal.is_disjoint(&external));

        let union: BTreeSet<_> = internal.union(&external).cloned().collect();
        assert_eq!(union, records);
    }

    #[test]
    fn test_aggregate_by_mac_groups_ips() {
        let records = vec![
            AddressPair::new("01:00:00:00:00:03", "8.8.8.8"),
            AddressPair::new("01:00:00:00:00:03", "8.8.4.4"),
            AddressPair::new("01:00:00:00:00:04", "203.0.113.7"),
        ];
        let index = aggregate_by_mac(&records);

        assert_eq!(index.len(), 2);
        assert_eq!(index["01:00:00:00:00:03"].len(), 2);
        assert!(index["01:00:00:00:00:04"].contains("203.0.113.7"));
    }

    #[test]
    fn test_aggregate_by_mac_is_idempotent() {
        let records = vec![
            AddressPair::new("01:00:00:00:00:03", "8.8.8.8"),
            AddressPair::new("01:00:00:00:00:03", "8.8.4.4"),
            AddressPair::new("01:00:00:00:00:03", "8.8.8.8"),
            AddressPair::new("01:00:00:00:00:05", "198.51.100.1"),
        ];
        let once = aggregate_by_mac(&records);
        let twice = aggregate_by_mac(&flatten(&once));
        assert_eq!(once, twice);
    }
}
