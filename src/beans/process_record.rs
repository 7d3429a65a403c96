use std::collections::HashMap;

/// Fields most callers want out of `ps` output.
pub const DEFAULT_PS_FIELDS: &[&str] = &["user", "pid", "name"];

/// One row of whitespace separated tabular output, keyed by the
/// lowercased header name of each recognized column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessRecord {
    pub fields: HashMap<String, String>,
}

impl ProcessRecord {
    pub fn new() -> ProcessRecord {
        ProcessRecord {
            fields: HashMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    pub fn pid(&self) -> Option<u32> {
        self.get("pid").and_then(|p| p.parse().ok())
    }
}

/// Parse whitespace separated tabular output such as `ps` prints.
///
/// The first line is the header; its tokens are lowercased and the ones
/// listed in `fields` (matched case insensitively) are mapped to their
/// column index. Each following non blank line becomes one record with
/// values taken positionally.
///
/// Some builds of `ps` print a process state column ("S", "R", ...) in
/// data rows without labeling it in the header. A literal `S` token that
/// is not the last token of its row is treated as that column: it is
/// skipped and the next token supplies the value for the current header
/// position. A process whose real value in a non final column is exactly
/// `S` is therefore misread; no lookahead tries to disambiguate.
///
/// Rows shorter than the header simply omit the missing trailing fields.
/// A header with no recognized column still yields one record per data
/// line, each with no populated keys. The function never fails.
pub fn parse_table(raw: &str, fields: &[&str]) -> Vec<ProcessRecord> {
    let mut lines = raw.lines();
    let mut columns: HashMap<usize, String> = HashMap::new();
    if let Some(header) = lines.next() {
        for (idx, token) in header.split_whitespace().enumerate() {
            let name = token.to_lowercase();
            if fields.iter().any(|f| f.eq_ignore_ascii_case(&name)) {
                columns.insert(idx, name);
            }
        }
    }

    let mut records = vec![];
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let mut record = ProcessRecord::new();
        let mut column = 0;
        let mut idx = 0;
        while idx < tokens.len() {
            let mut value = tokens[idx];
            if value == "S" && idx + 1 < tokens.len() {
                idx += 1;
                value = tokens[idx];
            }
            if let Some(name) = columns.get(&column) {
                record.fields.insert(name.clone(), value.to_string());
            }
            column += 1;
            idx += 1;
        }
        records.push(record);
    }
    records
}

/// Pids out of one chunk of `jdwp` output: one decimal pid per line,
/// anything else ignored.
pub fn parse_jdwp_pids(chunk: &str) -> Vec<u32> {
    chunk
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .collect()
}
