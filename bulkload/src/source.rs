use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::{error, warn};

use crate::partition::{avalanche, PartitionAssigner};
use crate::record::Record;

/// A record plus the partition its source picked for it.
#[derive(Clone, Debug, PartialEq)]
pub struct SourcedRecord {
    pub record: Record,
    pub partition: usize,
}

/// Anything that can feed records into a load.
pub trait RecordSource {
    /// The next record, or `None` once the input is exhausted.
    fn next_record(&mut self) -> Option<SourcedRecord>;
}

/// Generates `count` test items with hashed integer ids.
pub struct SyntheticSource {
    assigner: PartitionAssigner,
    next: u32,
    count: u32,
}

impl SyntheticSource {
    pub fn new(count: u32, assigner: PartitionAssigner) -> Self {
        SyntheticSource {
            assigner,
            next: 0,
            count,
        }
    }

    fn record_for(id: i32) -> Record {
        Record::new(id.to_string())
            .with_attribute("first", &id.to_string())
            .with_attribute("second", &id.wrapping_mul(2).to_string())
            .with_attribute("third", "{a:'foo', b:'bar'}")
            .with_attribute("fourth", "[10,9,8,7,6,5,4,3,2,1]")
    }
}

impl RecordSource for SyntheticSource {
    fn next_record(&mut self) -> Option<SourcedRecord> {
        if self.next >= self.count {
            return None;
        }

        let id = avalanche(self.next) as i32;
        self.next += 1;

        Some(SourcedRecord {
            record: Self::record_for(id),
            partition: self.assigner.for_id(id),
        })
    }
}

/// Reads `key<TAB>{json object}` lines.
///
/// Every member of the object becomes an attribute: strings as they are, anything else in
/// its compact JSON form. A line that can't be parsed still loads its key, with no attributes;
/// that includes lines that aren't valid UTF-8, whose key is decoded lossily.
pub struct DelimitedSource<R> {
    assigner: PartitionAssigner,
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
}

impl DelimitedSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, assigner: PartitionAssigner) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(DelimitedSource::new(BufReader::new(file), assigner))
    }
}

impl<R: BufRead> DelimitedSource<R> {
    pub fn new(reader: R, assigner: PartitionAssigner) -> Self {
        DelimitedSource {
            assigner,
            reader,
            buf: Vec::new(),
            line_number: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Record {
        let Some((key, blob)) = line.split_once('\t') else {
            warn!(line = self.line_number, "no tab separator, loading key without attributes");
            return Record::new(line);
        };

        let mut record = Record::new(key);
        match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(members)) => {
                for (name, value) in members {
                    match value {
                        Value::String(text) => record.push_attribute(&name, &text),
                        other => record.push_attribute(&name, &other.to_string()),
                    }
                }
            }
            Ok(_) => {
                warn!(line = self.line_number, key, "value is not a JSON object, loading key without attributes");
            }
            Err(e) => {
                warn!(line = self.line_number, key, "invalid JSON ({}), loading key without attributes", e);
            }
        }

        record
    }
}

impl<R: BufRead> RecordSource for DelimitedSource<R> {
    fn next_record(&mut self) -> Option<SourcedRecord> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    error!(line = self.line_number + 1, "failed to read input: {}", e);
                    return None;
                }
            }
            self.line_number += 1;

            let raw = self.buf.strip_suffix(b"\n").unwrap_or(self.buf.as_slice());
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if line.trim().is_empty() {
                continue;
            }

            let record = match std::str::from_utf8(raw) {
                Ok(line) => self.parse_line(line),
                Err(e) => {
                    let key = line.split('\t').next().unwrap_or_default();
                    warn!(line = self.line_number, key, "invalid UTF-8 ({}), loading key without attributes", e);
                    Record::new(key)
                }
            };
            let partition = self.assigner.for_key(&record.id);
            return Some(SourcedRecord { record, partition });
        }
    }
}
