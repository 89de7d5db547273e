//! End-to-end tests driving the public [`Reader`] API, mirroring the
//! testable properties and concrete scenarios spelled out for the parser.

use streamcsv::{CsvError, Field, Format, FormatBuilder, HeaderRow, Reader, VariableColumnPolicy};

fn rows_for(data: &[u8], format: Format, chunk_size: usize) -> Vec<Vec<String>> {
    Reader::from_slice(data, format, chunk_size)
        .unwrap()
        .map(|row| {
            let row = row.unwrap();
            row.iter().map(|f| f.as_str().unwrap().into_owned()).collect()
        })
        .collect()
}

#[test]
fn chunking_invariance() {
    let data = b"a,b,c\n\"hello, world\",2,three\n4,5,\"multi\nline\"\n6,7,8\n";
    let format = FormatBuilder::new().build().unwrap();

    let whole = rows_for(data, format.clone(), data.len());
    for chunk_size in [1, 2, 3, 5, 8, 16, 64] {
        let chunked = rows_for(data, format.clone(), chunk_size);
        assert_eq!(whole, chunked, "mismatch at chunk_size={chunk_size}");
    }
}

#[test]
fn field_count_matches_sum_of_rows() {
    let data = b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n";
    let format = FormatBuilder::new().build().unwrap();
    let reader = Reader::from_slice(data, format, 7).unwrap();
    let total: usize = reader.map(|r| r.unwrap().len()).sum();
    assert_eq!(total, 9);
}

#[test]
fn round_trip_on_quote_free_input() {
    let data = b"a,b,c\none,two,three\nfour,five,six\n";
    let format = FormatBuilder::new().build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    let rebuilt: Vec<String> = reader
        .map(|r| {
            let row = r.unwrap();
            row.iter().map(|f| f.as_str().unwrap().into_owned()).collect::<Vec<_>>().join(",")
        })
        .collect();
    assert_eq!(rebuilt, vec!["one,two,three", "four,five,six"]);
}

#[test]
fn bom_idempotence() {
    let without_bom = b"x,y\n1,2\n".to_vec();
    let mut with_bom = vec![0xEF, 0xBB, 0xBF];
    with_bom.extend_from_slice(&without_bom);

    let format = FormatBuilder::new().build().unwrap();
    let a = Reader::from_slice(&without_bom, format.clone(), 4096).unwrap();
    let b = Reader::from_slice(&with_bom, format, 4096).unwrap();
    assert_eq!(a.col_names().unwrap().names(), b.col_names().unwrap().names());
}

#[test]
fn crlf_lf_equivalence() {
    let format = FormatBuilder::new().build().unwrap();
    let lf = rows_for(b"a,b\n1,2\n3,4\n", format.clone(), 4096);
    let crlf = rows_for(b"a,b\r\n1,2\r\n3,4\r\n", format.clone(), 4096);
    let lfcr = rows_for(b"a,b\n\r1,2\n\r3,4\n\r", format, 4096);
    assert_eq!(lf, crlf);
    assert_eq!(lf, lfcr);
}

#[test]
fn whitespace_trim_preserves_interior_whitespace() {
    let data = b"a,b\n  hello world  , 2 \n";
    let format = FormatBuilder::new().trim_chars(vec![b' ']).build().unwrap();
    let rows = rows_for(data, format, 4096);
    assert_eq!(rows[0][0], "hello world");
    assert_eq!(rows[0][1], "2");
}

#[test]
fn utf8_resync_after_one_invalid_byte() {
    let mut data = b"a,b\n".to_vec();
    data.push(0xFF);
    data.extend_from_slice(b",ok\n3,4\n");

    let format = FormatBuilder::new().build().unwrap();
    let reader = Reader::from_slice(&data, format, 4096).unwrap();
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 2);
    // The invalid byte makes the field invalid UTF-8, so the strict
    // accessor reports it rather than silently swallowing it...
    assert!(rows[0].get(0).unwrap().as_str().is_err());
    // ...while the lossy accessor recovers via U+FFFD substitution and
    // parsing carries on unaffected for every field after it.
    assert!(rows[0].get(0).unwrap().as_str_lossy().contains('\u{FFFD}'));
    assert_eq!(rows[0].get(1).unwrap().as_str().unwrap(), "ok");
    assert_eq!(rows[1].get(0).unwrap().as_str().unwrap(), "3");
    assert_eq!(rows[1].get(1).unwrap().as_str().unwrap(), "4");
}

#[test]
fn utf8_error_counters_are_scoped_to_the_rows_that_actually_had_one() {
    // Three data rows sharing one chunk; only the middle row has a bad byte.
    let mut data = b"a,b\n1,2\n3,".to_vec();
    data.push(0xFF);
    data.extend_from_slice(b"\n5,6\n");

    let format = FormatBuilder::new().build().unwrap();
    let mut reader = Reader::from_slice(&data, format, 4096).unwrap();
    assert!(!reader.had_utf8_errors());
    assert_eq!(reader.utf8_error_count(), 0);

    let mut rows = 0;
    while let Some(row) = reader.next() {
        row.unwrap();
        rows += 1;
    }

    assert_eq!(rows, 3);
    assert!(reader.had_utf8_errors());
    // Exactly the one row with the bad byte is counted, not every row in
    // the chunk it happened to share.
    assert_eq!(reader.utf8_error_count(), 1);
    // The header row counts towards rows_seen even though it never reaches
    // the caller as a `Row`.
    assert_eq!(reader.rows_seen(), 4);
}

#[test]
fn scenario_no_header_exposes_every_row() {
    let data = b"1,2\n3,4\n";
    let format = FormatBuilder::new().header_row(HeaderRow::None).build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    assert!(reader.col_names().is_none());
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(matches!(rows[0].get_by_name("anything"), Err(CsvError::UnknownColumn { .. })));
}

#[test]
fn scenario_no_quote_mode_treats_quote_as_ordinary() {
    let data = b"a,b\n\"x,2\n";
    let format = FormatBuilder::new().no_quote().build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows[0].get(0).unwrap().raw_bytes(), b"\"x");
    assert_eq!(rows[0].get(1).unwrap().raw_bytes(), b"2");
}

#[test]
fn null_values_are_configurable() {
    let data = b"a,b\nNA,2\n,3\n";
    let format = FormatBuilder::new().null_values(vec!["NA".to_string()]).build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert!(rows[0].get(0).unwrap().is_null());
    assert!(!rows[1].get(0).unwrap().is_null(), "empty field is not null once the default is overridden");
}

#[test]
fn numeric_type_inference_predicates() {
    let data = b"a,b,c\n42,3.5,hello\n";
    let format = FormatBuilder::new().build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    let row = &rows[0];
    assert!(row.get(0).unwrap().is_int());
    assert!(!row.get(0).unwrap().is_float());
    assert!(row.get(1).unwrap().is_float());
    assert!(!row.get(1).unwrap().is_int());
    assert!(row.get(2).unwrap().is_str());
}

#[test]
fn type_coercion_via_get() {
    let data = b"a,b,c\n42,3.5,true\n";
    let format = FormatBuilder::new().build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    let row = &rows[0];
    assert_eq!(row.get(0).unwrap().get::<i64>().unwrap(), 42);
    assert_eq!(row.get(1).unwrap().get::<f64>().unwrap(), 3.5);
    assert!(row.get(2).unwrap().get::<bool>().unwrap());
    assert!(matches!(row.get(0).unwrap().get::<bool>(), Err(CsvError::TypeMismatch { .. })));
}

#[test]
fn out_of_range_field_access_is_reported_without_poisoning_iteration() {
    let data = b"a,b\n1,2\n3,4\n";
    let format = FormatBuilder::new().build().unwrap();
    let mut reader = Reader::from_slice(data, format, 4096).unwrap();
    let first = reader.next().unwrap().unwrap();
    assert!(matches!(first.field(5), Err(CsvError::OutOfRange { index: 5, field_count: 2 })));
    // The iterator itself is unaffected by the accessor error above.
    let second = reader.next().unwrap().unwrap();
    assert_eq!(second.get(0).unwrap().as_str().unwrap(), "3");
    assert!(reader.next().is_none());
}

#[test]
fn strict_variable_column_policy_reports_malformed_rows_per_row() {
    let data = b"a,b\n1,2\n3\n4,5\n";
    let format = FormatBuilder::new().variable_column_policy(VariableColumnPolicy::Strict).build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    let results: Vec<_> = reader.collect();
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CsvError::MalformedRow { expected: 2, actual: 1 })));
    assert!(results[2].is_ok());
}

#[test]
fn header_row_other_than_zero_discards_preceding_rows() {
    let data = b"comment line\nid,value\n1,2\n";
    let format = FormatBuilder::new().header_row(HeaderRow::Index(1)).build().unwrap();
    let reader = Reader::from_slice(data, format, 4096).unwrap();
    assert_eq!(reader.col_names().unwrap().names(), &["id", "value"]);
    let rows: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_by_name("id").unwrap().as_str().unwrap(), "1");
}

#[test]
fn from_reader_over_a_std_io_read_matches_from_slice() {
    let data = b"a,b\n1,2\n3,4\n".to_vec();
    let format = FormatBuilder::new().build().unwrap();

    let via_slice = rows_for(&data, format.clone(), 4096);
    let via_reader: Vec<Vec<String>> = Reader::from_reader(data.as_slice(), format, 3)
        .unwrap()
        .map(|row| {
            let row = row.unwrap();
            row.iter().map(|f: Field| f.as_str().unwrap().into_owned()).collect()
        })
        .collect();

    assert_eq!(via_slice, via_reader);
}
