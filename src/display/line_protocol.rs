//! InfluxDB line protocol encoding: `measurement,tags fields timestamp`

use std::fmt::Write;

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// Float rendered with a fixed number of decimals
    Fixed(f64, usize),
    Text(String),
}

/// Builder for one line of line protocol
#[derive(Debug, Clone)]
pub struct Line {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<i64>,
}

impl Line {
    pub fn new(measurement: &str) -> Self {
        Self {
            measurement: measurement.to_string(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    /// Add a tag. Empty values are dropped, the protocol does not allow them.
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.tags.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn field(mut self, key: &str, value: FieldValue) -> Self {
        self.fields.push((key.to_string(), value));
        self
    }

    pub fn int(self, key: &str, value: i64) -> Self {
        self.field(key, FieldValue::Integer(value))
    }

    pub fn uint(self, key: &str, value: u64) -> Self {
        self.field(key, FieldValue::Unsigned(value))
    }

    pub fn float(self, key: &str, value: f64) -> Self {
        self.field(key, FieldValue::Float(value))
    }

    pub fn text(self, key: &str, value: &str) -> Self {
        self.field(key, FieldValue::Text(value.to_string()))
    }

    /// Timestamp in nanoseconds since the Unix epoch
    pub fn timestamp(mut self, nanos: i64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    pub fn has_fields(&self) -> bool {
        self.fields.iter().any(|(_, value)| is_encodable(value))
    }

    /// Encode the line without a trailing newline.
    ///
    /// Non-finite floats cannot be represented and are left out.
    pub fn encode(&self) -> String {
        let mut out = escape(&self.measurement, &[',', ' ']);
        for (key, value) in &self.tags {
            let _ = write!(out, ",{}={}", escape_key(key), escape_key(value));
        }

        let mut first = true;
        for (key, value) in &self.fields {
            if !is_encodable(value) {
                continue;
            }
            out.push(if first { ' ' } else { ',' });
            first = false;
            let _ = write!(out, "{}=", escape_key(key));
            match value {
                FieldValue::Integer(v) => {
                    let _ = write!(out, "{}i", v);
                }
                FieldValue::Unsigned(v) => {
                    let _ = write!(out, "{}i", v);
                }
                FieldValue::Float(v) => {
                    let _ = write!(out, "{}", v);
                }
                FieldValue::Fixed(v, decimals) => {
                    let _ = write!(out, "{:.*}", decimals, v);
                }
                FieldValue::Text(v) => {
                    let _ = write!(out, "\"{}\"", escape(v, &['"']));
                }
            }
        }

        if let Some(timestamp) = self.timestamp {
            let _ = write!(out, " {}", timestamp);
        }
        out
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

fn is_encodable(value: &FieldValue) -> bool {
    match value {
        FieldValue::Float(v) | FieldValue::Fixed(v, _) => v.is_finite(),
        _ => true,
    }
}

/// Escape tag keys, tag values and field keys: space, comma, equals, backslash
pub fn escape_key(s: &str) -> String {
    escape(s, &[' ', ',', '='])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Current wall clock in nanoseconds, truncated to whole seconds
pub fn now_seconds_as_nanos() -> i64 {
    chrono::Utc::now().timestamp() * 1_000_000_000
}
