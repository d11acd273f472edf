//! 청크 아티팩트 모듈 - 라인 구분 레코드 형식
//!
//! 청크 하나당 4칸 들여쓰기 JSON 오브젝트를 쓰고, 개행과 `=` 80개
//! 구분선, 개행이 뒤따릅니다. 다음 단계(토픽별 그룹핑 후 LLM 호출)가
//! 그대로 읽는 형식이므로 바이트 호환을 유지해야 합니다.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::chunker::Chunk;

// ============================================================================
// Format
// ============================================================================

/// 레코드 구분선 너비 (`=` 문자 수)
const SEPARATOR_WIDTH: usize = 80;

/// 레코드 구분선
fn separator_line() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// 청크를 4칸 들여쓰기 JSON으로 직렬화
fn to_pretty_json(chunk: &Chunk) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);

    chunk
        .serialize(&mut serializer)
        .context("청크 직렬화 실패")?;

    String::from_utf8(buf).context("직렬화 결과가 UTF-8이 아닙니다")
}

// ============================================================================
// Writer
// ============================================================================

/// 청크 시퀀스를 아티팩트 형식으로 쓰기
pub fn write_chunks<W: Write>(writer: &mut W, chunks: &[Chunk]) -> Result<()> {
    let separator = separator_line();

    for chunk in chunks {
        writeln!(writer, "{}", to_pretty_json(chunk)?)?;
        writeln!(writer, "{}", separator)?;
    }

    Ok(())
}

/// 청크 시퀀스를 파일로 쓰기
pub fn write_chunks_to_path(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("아티팩트 파일 생성 실패: {:?}", path))?;
    let mut writer = BufWriter::new(file);

    write_chunks(&mut writer, chunks)?;
    writer.flush().context("아티팩트 쓰기 실패")?;

    tracing::info!("Wrote {} chunk records to {:?}", chunks.len(), path);
    Ok(())
}

// ============================================================================
// Reader
// ============================================================================

/// 아티팩트 텍스트를 청크 시퀀스로 파싱
///
/// 쓰기의 역변환입니다. 파싱 결과는 원본 청크 시퀀스와
/// 필드 단위로 동일합니다.
pub fn parse_chunks(input: &str) -> Result<Vec<Chunk>> {
    // JSON 문자열 내부의 개행은 이스케이프되므로
    // 개행으로 감싼 구분선은 레코드 경계에서만 나타남
    let delimiter = format!("\n{}\n", separator_line());
    let mut chunks = Vec::new();

    for (index, record) in input.split(delimiter.as_str()).enumerate() {
        let record = record.trim();
        if record.is_empty() {
            continue;
        }

        let chunk = serde_json::from_str(record)
            .with_context(|| format!("아티팩트 레코드 {} 파싱 실패", index + 1))?;
        chunks.push(chunk);
    }

    Ok(chunks)
}

/// 파일에서 청크 시퀀스 읽기
pub fn read_chunks_from_path(path: &Path) -> Result<Vec<Chunk>> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("아티팩트 파일 읽기 실패: {:?}", path))?;
    parse_chunks(&input)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            Chunk {
                source_page: "Core Concepts".to_string(),
                source_url: "https://example.com/docs/core".to_string(),
                chunk_topic: "Steps".to_string(),
                chunk_id: "Steps".to_string(),
                text: "Steps are the unit of work.\nEach step has a handler.".to_string(),
            },
            Chunk {
                source_page: "Core Concepts".to_string(),
                source_url: "https://example.com/docs/core".to_string(),
                chunk_topic: "Flows".to_string(),
                chunk_id: "Flows (Part 1)".to_string(),
                text: "Flows connect steps together.".to_string(),
            },
        ]
    }

    #[test]
    fn test_roundtrip_exact() {
        let chunks = sample_chunks();

        let mut buf = Vec::new();
        write_chunks(&mut buf, &chunks).unwrap();

        let parsed = parse_chunks(std::str::from_utf8(&buf).unwrap()).unwrap();
        assert_eq!(parsed, chunks);
    }

    #[test]
    fn test_record_format() {
        let chunks = sample_chunks();

        let mut buf = Vec::new();
        write_chunks(&mut buf, &chunks).unwrap();
        let output = String::from_utf8(buf).unwrap();

        // 레코드마다 구분선 하나
        let separator = "=".repeat(80);
        assert_eq!(
            output.lines().filter(|line| *line == separator).count(),
            chunks.len()
        );

        // 4칸 들여쓰기, 키 순서 고정
        assert!(output.contains("    \"source_page\""));
        let page_pos = output.find("\"source_page\"").unwrap();
        let url_pos = output.find("\"source_url\"").unwrap();
        let topic_pos = output.find("\"chunk_topic\"").unwrap();
        let id_pos = output.find("\"chunk_id\"").unwrap();
        let text_pos = output.find("\"text\"").unwrap();
        assert!(page_pos < url_pos && url_pos < topic_pos);
        assert!(topic_pos < id_pos && id_pos < text_pos);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks.txt");
        let chunks = sample_chunks();

        write_chunks_to_path(&path, &chunks).unwrap();
        let parsed = read_chunks_from_path(&path).unwrap();

        assert_eq!(parsed, chunks);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_chunks("").unwrap().is_empty());
        assert!(parse_chunks("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_corrupt_record() {
        let separator = "=".repeat(80);
        let input = format!("{{ broken json\n{}\n", separator);
        assert!(parse_chunks(&input).is_err());
    }
}
