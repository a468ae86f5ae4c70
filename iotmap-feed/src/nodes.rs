//! Deriving the layer-2 node population.
//!
//! Either from an explicit node-list file (`id,dl1;dl2,nwk1;nwk2` per
//! row, semicolon-separated address sets) or extracted from the feed
//! itself with protocol-specific address derivation.

use crate::error::FeedError;
use csv::{ReaderBuilder, Trim};
use iotmap_core::{Layer, NodeId, NodeRecord, Protocol, Transmission};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parse a node-list file.
pub fn read_nodes<R: Read>(reader: R) -> Result<Vec<NodeRecord>, FeedError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut nodes = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.len() < 3 {
            return Err(FeedError::InvalidNodeId(
                record.get(0).unwrap_or_default().to_string(),
            ));
        }
        let id: u32 = record[0]
            .parse()
            .map_err(|_| FeedError::InvalidNodeId(record[0].to_string()))?;
        let dl = split_addresses(&record[1]);
        let nwk = split_addresses(&record[2]);
        nodes.push(NodeRecord::new(NodeId(id), Layer::Datalink, dl, nwk));
    }
    Ok(nodes)
}

/// Read a node-list file from disk.
pub fn load_nodes<P: AsRef<Path>>(path: P) -> Result<Vec<NodeRecord>, FeedError> {
    read_nodes(File::open(path)?)
}

fn split_addresses(field: &str) -> Vec<String> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// List the node population observed in a feed, ids assigned in
/// first-seen order starting at 1.
pub fn extract_nodes(transmissions: &[Transmission]) -> Vec<NodeRecord> {
    let mut seen: Vec<(Vec<String>, Vec<String>)> = Vec::new();
    for tx in transmissions {
        for dl in [&tx.dl_src, &tx.dl_dst] {
            let candidate = derive_addresses(tx.protocol, dl);
            if !seen.contains(&candidate) {
                seen.push(candidate);
            }
        }
    }
    seen.into_iter()
        .enumerate()
        .map(|(i, (dl, nwk))| NodeRecord::new(NodeId(i as u32 + 1), Layer::Datalink, dl, nwk))
        .collect()
}

/// Address sets a device owns, derived from one datalink address.
fn derive_addresses(protocol: Protocol, dl: &str) -> (Vec<String>, Vec<String>) {
    match protocol {
        // Zigbee and BTLE address the network with the datalink address.
        Protocol::Zigbee | Protocol::Btle => (vec![dl.to_string()], vec![dl.to_string()]),
        Protocol::Sixlowpan => sixlowpan_addresses(dl),
    }
}

/// 6LoWPAN devices answer on a link-local address derived from the
/// datalink address; long EUI-64 forms also appear shortened on the air.
fn sixlowpan_addresses(dl: &str) -> (Vec<String>, Vec<String>) {
    if dl.len() == 23 && dl.contains(':') {
        let short = &dl[3..20];
        (
            vec![dl.to_string(), short.to_string()],
            vec![format!("fe80::2{short}")],
        )
    } else if dl.contains(':') && dl.len() > 3 {
        (vec![dl.to_string()], vec![format!("fe80::2{}", &dl[3..])])
    } else {
        (vec![dl.to_string()], vec![dl.to_string()])
    }
}
