//! Extract stage: raw CSV file → [`Dataset`].
//!
//! Encoding and delimiter are auto-detected. Every non-empty field is read
//! as text; deciding numeric and date types is left to the Type Coercer.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ExtractError, ExtractResult};
use crate::logs::{log_debug, log_error, log_info};
use crate::models::{Cell, DType, Dataset};

const STAGE: &str = "Extract";

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows
    pub dataset: Dataset,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
}

/// Shape and completeness of an extracted dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractStats {
    pub rows: usize,
    pub columns: usize,
    pub missing_values: usize,
    pub dtypes: BTreeMap<String, DType>,
}

impl ExtractStats {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let dtypes = dataset
            .columns()
            .iter()
            .filter_map(|c| dataset.dtype(c).map(|t| (c.clone(), t)))
            .collect();
        Self {
            rows: dataset.row_count(),
            columns: dataset.column_count(),
            missing_values: dataset.total_missing(),
            dtypes,
        }
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        // Latin-1 labels map to windows-1252, as in the WHATWG encoding table
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()
        }
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            // Fallback: UTF-8 with lossy conversion
            None => String::from_utf8_lossy(bytes).to_string(),
        },
    };

    // A UTF-8 BOM would end up glued to the first header
    text.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Empty fields become [`Cell::Missing`]; short rows are padded, extra
/// trailing fields are ignored.
pub fn parse_csv(content: &str, delimiter: char) -> ExtractResult<Dataset> {
    if content.trim().is_empty() {
        return Err(ExtractError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ExtractError::NoHeaders);
    }

    let mut dataset = Dataset::new(headers);
    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Missing
                } else {
                    Cell::text(field)
                }
            })
            .collect();
        dataset.push_row(row);
    }

    Ok(dataset)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ExtractResult<ParseResult> {
    if bytes.is_empty() {
        return Err(ExtractError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let dataset = parse_csv(&content, delimiter)?;
    let headers = dataset.columns().to_vec();

    Ok(ParseResult {
        dataset,
        encoding,
        delimiter,
        headers,
    })
}

/// Read the raw transactions file and log what was extracted.
///
/// A file that does not exist is [`ExtractError::MissingSource`].
pub fn read_dataset<P: AsRef<Path>>(path: P) -> ExtractResult<(ParseResult, ExtractStats)> {
    let path = path.as_ref();
    log_debug(STAGE, format!("Attempting to read CSV file from {}", path.display()));

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log_error(STAGE, format!("FAILED: File not found at path: {}", path.display()));
            return Err(ExtractError::MissingSource {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let result = parse_bytes_auto(&bytes)?;
    let stats = ExtractStats::from_dataset(&result.dataset);

    log_info(STAGE, format!("Data successfully extracted from {}", path.display()));
    log_info(
        STAGE,
        format!(
            "Rows: {}, Columns: {}, Missing Values: {}",
            stats.rows, stats.columns, stats.missing_values
        ),
    );
    log_debug(
        STAGE,
        format!(
            "Encoding: {}, delimiter: '{}', column types: {:?}",
            result.encoding,
            format_delimiter(result.delimiter),
            stats.dtypes
        ),
    );

    Ok((result, stats))
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let ds = parse_csv("name,age\nAlice,30\nBob,25", ',').unwrap();

        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.get(0, "name"), Some(&Cell::text("Alice")));
        assert_eq!(ds.get(1, "age"), Some(&Cell::text("25")));
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let ds = parse_csv("item,note\n\"Item_1\",\"a, b\"", ',').unwrap();
        assert_eq!(ds.get(0, "note"), Some(&Cell::text("a, b")));
    }

    #[test]
    fn test_empty_fields_are_missing() {
        let ds = parse_csv("a;b;c\n1;;3", ';').unwrap();

        assert_eq!(ds.get(0, "a"), Some(&Cell::text("1")));
        assert_eq!(ds.get(0, "b"), Some(&Cell::Missing));
        assert_eq!(ds.total_missing(), 1);
    }

    #[test]
    fn test_all_empty_record_kept_as_missing_row() {
        let ds = parse_csv("a,b\n1,2\n,\n3,4\n", ',').unwrap();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.rows()[1], vec![Cell::Missing, Cell::Missing]);

        let stats = ExtractStats::from_dataset(&ds);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.missing_values, 2);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let ds = parse_csv("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_ragged_rows() {
        let ds = parse_csv("a,b,c\n1\n1,2,3,4", ',').unwrap();
        assert_eq!(ds.get(0, "c"), Some(&Cell::Missing));
        assert_eq!(ds.rows()[1].len(), 3);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_csv("", ','), Err(ExtractError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(ExtractError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"Item;Price Per Unit\nItem_1;3.5\n").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.dataset.row_count(), 1);
        assert_eq!(result.headers, vec!["Item", "Price Per Unit"]);
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Item,Quantity\nItem_1,2\n");
        let result = parse_bytes_auto(&bytes).unwrap();
        assert_eq!(result.headers[0], "Item");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_currency_sign() {
        // 0xA4 is the generic currency sign in ISO-8859-1, not the euro
        assert_eq!(decode_content(&[0xA4], "iso-8859-1"), "\u{a4}");
        assert_eq!(decode_content(&[0x80], "latin1"), "\u{20ac}");
    }

    #[test]
    fn test_extract_stats() {
        let ds = parse_csv("a,b\n1,\n,2\n3,4", ',').unwrap();
        let stats = ExtractStats::from_dataset(&ds);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.columns, 2);
        assert_eq!(stats.missing_values, 2);
        assert_eq!(stats.dtypes["a"], DType::String);
    }

    #[test]
    fn test_missing_file_is_missing_source() {
        let err = read_dataset("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ExtractError::MissingSource { .. }));
    }
}
