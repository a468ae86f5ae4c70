//! Reading unified-format transmission CSV files.

use crate::error::FeedError;
use csv::{ReaderBuilder, StringRecord, Trim};
use iotmap_core::{AppType, Protocol, Transmission};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// A parsed feed plus the count of rows dropped on the way in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    /// Transmissions sorted ascending by timestamp.
    pub transmissions: Vec<Transmission>,
    pub dropped: usize,
}

/// Read `protocol,timestamp,dlsrc,dldst,nwksrc,nwkdst,apptype,data` rows.
///
/// Malformed rows are dropped and logged; the feed is re-sorted by
/// timestamp before it is returned, which the correlation passes depend
/// on.
pub fn read_transmissions<R: Read>(reader: R) -> Result<FeedBatch, FeedError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut batch = FeedBatch::default();
    for record in csv_reader.records() {
        let record = record?;
        match parse_record(&record) {
            Ok(tx) => batch.transmissions.push(tx),
            Err(reason) => {
                warn!(
                    %reason,
                    line = record.position().map_or(0, |p| p.line()),
                    "dropping malformed transmission row"
                );
                batch.dropped += 1;
            }
        }
    }

    batch
        .transmissions
        .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(batch)
}

/// Read a feed file from disk.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<FeedBatch, FeedError> {
    read_transmissions(File::open(path)?)
}

fn parse_record(record: &StringRecord) -> Result<Transmission, FeedError> {
    if record.len() != 8 {
        return Err(FeedError::FieldCount(record.len()));
    }

    let protocol: Protocol = record[0].parse()?;
    let timestamp: f64 = record[1]
        .parse()
        .map_err(|_| FeedError::InvalidTimestamp(record[1].to_string()))?;
    if !timestamp.is_finite() {
        return Err(FeedError::InvalidTimestamp(record[1].to_string()));
    }
    let app_raw: u8 = record[6]
        .parse()
        .map_err(|_| FeedError::InvalidAppType(record[6].to_string()))?;
    let app_type = AppType::new(app_raw)?;

    Ok(Transmission {
        protocol,
        timestamp,
        dl_src: record[2].to_string(),
        dl_dst: record[3].to_string(),
        nwk_src: record[4].to_string(),
        nwk_dst: record[5].to_string(),
        app_type,
        data: record[7].to_string(),
    })
}
