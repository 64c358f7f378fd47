use crate::error::{DiagError, DiagResult};

/// SPL kstat named data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KstatDataType {
    Char,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Long,
    Ulong,
    String,
    Unknown(u32),
}

impl KstatDataType {
    fn from_code(code: u32) -> Self {
        match code {
            0 => KstatDataType::Char,
            1 => KstatDataType::Int32,
            2 => KstatDataType::Uint32,
            3 => KstatDataType::Int64,
            4 => KstatDataType::Uint64,
            5 => KstatDataType::Long,
            6 => KstatDataType::Ulong,
            7 => KstatDataType::String,
            other => KstatDataType::Unknown(other),
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            KstatDataType::Char | KstatDataType::String | KstatDataType::Unknown(_)
        )
    }
}

/// One `name type value` row
#[derive(Debug, Clone, PartialEq)]
pub struct KstatEntry {
    pub name: String,
    pub data_type: KstatDataType,
    pub raw: String,
}

/// A parsed kstat text file: header timestamps plus named rows in file order
#[derive(Debug, Clone)]
pub struct KstatTable {
    source: String,
    /// Snapshot time in nanoseconds, the last field of the header line
    pub snaptime: u64,
    entries: Vec<KstatEntry>,
}

impl KstatTable {
    /// Parse the content of a kstat file. `source` names it in errors.
    pub fn parse(source: &str, content: &str) -> DiagResult<Self> {
        let mut lines = content.lines().filter(|line| !line.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| DiagError::invalid_format("kstat header line", "", source))?;
        let header_fields: Vec<&str> = header.split_whitespace().collect();
        let snaptime_str = header_fields.last().copied().unwrap_or("");
        let snaptime = snaptime_str.parse::<u64>().map_err(|_| {
            DiagError::parse_error(
                source,
                header,
                &format!("Invalid timestamp: {}", snaptime_str),
            )
        })?;
        let mut entries = Vec::new();
        for line in lines {
            let mut parts = line.split_whitespace();
            let (Some(name), Some(type_str)) = (parts.next(), parts.next()) else {
                tracing::trace!(source, line, "skipping short kstat line");
                continue;
            };
            if name == "name" && type_str == "type" {
                continue;
            }
            let Ok(code) = type_str.parse::<u32>() else {
                tracing::trace!(source, line, "skipping kstat line without a type code");
                continue;
            };
            entries.push(KstatEntry {
                name: name.to_string(),
                data_type: KstatDataType::from_code(code),
                raw: parts.collect::<Vec<_>>().join(" "),
            });
        }

        Ok(Self {
            source: source.to_string(),
            snaptime,
            entries,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get(&self, name: &str) -> Option<&KstatEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Unsigned value of a named row; `Ok(None)` when the row is absent
    pub fn value_u64(&self, name: &str) -> DiagResult<Option<u64>> {
        let Some(entry) = self.get(name) else {
            return Ok(None);
        };
        if !entry.data_type.is_numeric() {
            return Err(DiagError::invalid_format(
                &format!("numeric counter '{}'", name),
                &format!("{:?}", entry.data_type),
                &self.source,
            ));
        }
        entry.raw.parse::<u64>().map(Some).map_err(|_| {
            DiagError::parse_error(
                &self.source,
                &format!("{} {}", entry.name, entry.raw),
                &format!("Invalid number: {}", entry.raw),
            )
        })
    }

    /// Unsigned value of a named row, 0 when absent
    pub fn value_or_zero(&self, name: &str) -> DiagResult<u64> {
        Ok(self.value_u64(name)?.unwrap_or(0))
    }

    /// Unsigned value of a row that must be present
    pub fn required_u64(&self, name: &str) -> DiagResult<u64> {
        self.value_u64(name)?
            .ok_or_else(|| DiagError::invalid_format(&format!("counter '{}'", name), "missing", &self.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZFETCHSTATS: &str = "\
5 1 0x01 3 144 2690978755 113049478271574
name                            type data
hits                            4    12345
misses                          4    678
max_streams                     4    9
";

    #[test]
    fn test_parse_header_timestamps() {
        let table = KstatTable::parse("zfetchstats", ZFETCHSTATS).unwrap();
        assert_eq!(table.snaptime, 113049478271574);
        assert_eq!(table.entries.len(), 3);
    }

    #[test]
    fn test_values_by_name() {
        let table = KstatTable::parse("zfetchstats", ZFETCHSTATS).unwrap();
        assert_eq!(table.value_u64("hits").unwrap(), Some(12345));
        assert_eq!(table.value_u64("misses").unwrap(), Some(678));
        assert_eq!(table.value_u64("absent").unwrap(), None);
        assert_eq!(table.value_or_zero("absent").unwrap(), 0);
        assert_eq!(table.get("hits").unwrap().data_type, KstatDataType::Uint64);
    }

    #[test]
    fn test_invalid_timestamp_is_parse_error() {
        let result = KstatTable::parse("zfetchstats", "5 1 0x01 3 144 2690978755 soon\n");
        assert!(matches!(result, Err(DiagError::Parse { .. })));
    }

    #[test]
    fn test_empty_content_is_invalid_format() {
        let result = KstatTable::parse("zfetchstats", "");
        assert!(matches!(result, Err(DiagError::InvalidFormat { .. })));
    }

    #[test]
    fn test_non_integer_value_fails_on_access() {
        let table = KstatTable::parse(
            "zfetchstats",
            "5 1 0x01 1 48 10 20\nname type data\nhits 4 lots\n",
        )
        .unwrap();
        assert!(matches!(table.value_u64("hits"), Err(DiagError::Parse { .. })));
    }

    #[test]
    fn test_string_values_keep_spaces() {
        let table = KstatTable::parse(
            "pool/state",
            "1 1 0x01 1 48 10 20\nname type data\nstate 7 ONLINE but degraded\n",
        )
        .unwrap();
        let entry = table.get("state").unwrap();
        assert_eq!(entry.data_type, KstatDataType::String);
        assert_eq!(entry.raw, "ONLINE but degraded");
        assert!(matches!(
            table.value_u64("state"),
            Err(DiagError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_missing_required_counter() {
        let table = KstatTable::parse("arcstats", "1 1 0x01 0 0 10 20\n").unwrap();
        assert!(matches!(
            table.required_u64("c_max"),
            Err(DiagError::InvalidFormat { .. })
        ));
    }
}
