//! Endpoint address classification.
//!
//! This module turns the free-form MAC/IP input file into the address data
//! consumed by the topology generators: a flat list of internal pairs and a
//! MAC-keyed index of external addresses.

pub mod classifier;

pub use classifier::{
    aggregate_by_mac, flatten, partition, read_records, read_records_file, AddressPair,
    AddressSet, ExternalAddressIndex,
};
