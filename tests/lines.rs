//! Tests for chunked line splitting and record length validation.

use anyhow::Result;
use microlector::io::{FixedWidthLines, Line, LineSplitter};
use microlector::testing::ChunkedReader;
use microlector::{ErrorKind, FieldSpec, FileSpec};

fn spec(record_length: usize) -> FileSpec {
    FileSpec {
        id: "f".into(),
        record_length,
        fields: vec![FieldSpec::new("a", "integer", record_length)],
        key: None,
        parent: None,
    }
}

fn read_all(data: &str, record_length: usize, chunk: usize) -> Result<Vec<String>> {
    let lines = FixedWidthLines::new(ChunkedReader::new(data, chunk), &spec(record_length), 4096);
    let mut out = Vec::new();
    for line in lines {
        out.push(line?.text);
    }
    Ok(out)
}

fn texts(lines: Vec<Line>) -> Vec<String> {
    lines.into_iter().map(|l| l.text).collect()
}

#[test]
fn test_splitter_carries_fragments() {
    let mut s = LineSplitter::new();
    assert_eq!(texts(s.feed("abc\nde")), vec!["abc"]);
    assert_eq!(texts(s.feed("f\r")), vec!["def"]);
    // \n right after a chunk-final \r finishes that same line
    assert!(s.feed("\nghi").is_empty());
    assert_eq!(
        s.finish(),
        Some(Line {
            number: 3,
            text: "ghi".into()
        })
    );
    assert_eq!(s.finish(), None);
}

#[test]
fn test_every_chunk_size_gives_same_lines() -> Result<()> {
    let data = "0001\r\n0002\n0003\r0004\r\n";
    for chunk in 1..=data.len() {
        assert_eq!(
            read_all(data, 4, chunk)?,
            vec!["0001", "0002", "0003", "0004"],
            "chunk size {chunk}"
        );
    }
    Ok(())
}

#[test]
fn test_blank_lines_are_skipped() -> Result<()> {
    assert_eq!(read_all("\n\n0001\n\r\n\n0002\n\n", 4, 3)?, vec!["0001", "0002"]);
    Ok(())
}

#[test]
fn test_final_line_without_terminator() -> Result<()> {
    assert_eq!(read_all("0001\n0002", 4, 3)?, vec!["0001", "0002"]);
    Ok(())
}

#[test]
fn test_multibyte_split_across_chunks() -> Result<()> {
    // 'ñ' is two bytes; length is counted in characters
    let data = "añob\nniño\n";
    for chunk in 1..=4 {
        assert_eq!(read_all(data, 4, chunk)?, vec!["añob", "niño"]);
    }
    Ok(())
}

#[test]
fn test_length_mismatch_stops_after_good_lines() -> Result<()> {
    let spec = spec(4);
    let mut lines = FixedWidthLines::new(ChunkedReader::new("0001\n0002\n003\n0004\n", 2), &spec, 16);

    assert_eq!(lines.next().transpose()?.map(|l| l.number), Some(1));
    assert_eq!(lines.next().transpose()?.map(|l| l.number), Some(2));
    match lines.next() {
        Some(Err(err)) => {
            assert_eq!(err.kind(), ErrorKind::LineLengthMismatch);
            assert!(err.to_string().contains("line 3"));
        }
        other => panic!("expected length mismatch, got {other:?}"),
    }
    assert!(lines.next().is_none());
    Ok(())
}

#[test]
fn test_invalid_utf8_is_a_stream_error() {
    let spec = spec(2);
    let mut lines = FixedWidthLines::new(ChunkedReader::new(vec![b'a', 0xff, b'\n'], 8), &spec, 8);
    let err = lines.next().and_then(Result::err).map(|e| e.kind());
    assert_eq!(err, Some(ErrorKind::Stream));
}

#[test]
fn test_blank_lines_count_toward_line_numbers() -> Result<()> {
    let spec = spec(4);
    let mut lines = FixedWidthLines::new(ChunkedReader::new("0001\n\n\n003\n", 3), &spec, 16);

    assert_eq!(lines.next().transpose()?.map(|l| l.number), Some(1));
    match lines.next() {
        Some(Err(err)) => assert!(err.to_string().contains("line 4"), "{err}"),
        other => panic!("expected length mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_crlf_split_across_chunks_keeps_numbering() -> Result<()> {
    let data = "0001\r\n\r\n0002\r\n0003";
    for chunk in 1..=data.len() {
        let spec = spec(4);
        let numbers = FixedWidthLines::new(ChunkedReader::new(data, chunk), &spec, 4096)
            .map(|line| line.map(|l| l.number))
            .collect::<microlector::Result<Vec<_>>>()?;
        assert_eq!(numbers, vec![1, 3, 4], "chunk size {chunk}");
    }
    Ok(())
}
