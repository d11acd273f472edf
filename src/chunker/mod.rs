//! 문서 청킹 모듈
//!
//! 스크랩된 문서 텍스트를 토큰 예산 내의 청크로 분할합니다.
//! 3단계 계층 분할을 사용합니다:
//! - 페이지 분할: `===== <url> =====` 마커 기준
//! - 서브토픽 분할: 빈 줄(연속 개행 2개 이상) 기준
//! - 토큰 제한 분할: 토큰 수가 예산을 초과하면 슬라이딩 윈도우

mod tokenizer;

pub use tokenizer::{Cl100kTokenizer, Tokenizer};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// 기본 최대 청크 크기 (토큰 수)
pub const DEFAULT_MAX_TOKENS: usize = 500;

/// 기본 오버랩 크기 (토큰 수)
pub const DEFAULT_OVERLAP_TOKENS: usize = 50;

/// 페이지 본문이 비어있을 때 사용하는 기본 페이지 제목
pub const DEFAULT_PAGE_TITLE: &str = "Untitled Page";

/// 페이지 마커 패턴: `===== <url> =====`
const PAGE_MARKER_PATTERN: &str = r"(?m)^=====[ \t]+(\S+)[ \t]+=====[ \t]*$";

// ============================================================================
// Errors
// ============================================================================

/// 청킹 에러
#[derive(Debug, Error)]
pub enum ChunkError {
    /// 잘못된 설정 - 치명적, 호출자가 중단해야 함
    #[error(
        "잘못된 청크 설정: overlap_tokens({overlap_tokens})는 \
         max_tokens({max_tokens})보다 작아야 합니다"
    )]
    Configuration {
        max_tokens: usize,
        overlap_tokens: usize,
    },

    /// 페이지 마커 없음 - 복구 가능, 호출자는 경고 후 빈 결과로 계속
    #[error("입력 텍스트에서 페이지 마커(===== <url> =====)를 찾을 수 없습니다")]
    SourceFormat,

    /// 토큰 윈도우 디코딩 실패
    #[error("토큰 윈도우 디코딩 실패: {0}")]
    Decode(anyhow::Error),
}

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정 (토큰 단위)
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// 청크 당 최대 토큰 수
    pub max_tokens: usize,
    /// 연속 청크 간 중첩 토큰 수
    pub overlap_tokens: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
        }
    }
}

impl ChunkConfig {
    /// 설정 검증
    ///
    /// overlap_tokens >= max_tokens이면 슬라이딩 윈도우가 전진하지
    /// 못하므로 설정 에러로 즉시 실패합니다.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.overlap_tokens >= self.max_tokens {
            return Err(ChunkError::Configuration {
                max_tokens: self.max_tokens,
                overlap_tokens: self.overlap_tokens,
            });
        }
        Ok(())
    }

    /// 윈도우 전진 폭 (validate 통과 시 항상 > 0)
    fn step(&self) -> usize {
        self.max_tokens - self.overlap_tokens
    }
}

// ============================================================================
// Chunk
// ============================================================================

/// 청킹 결과 레코드
///
/// 필드 순서는 아티팩트 직렬화 형식의 키 순서와 같습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 원본 페이지 제목 (페이지 본문의 첫 줄)
    pub source_page: String,
    /// 스크랩 원본 URL
    pub source_url: String,
    /// 서브섹션 제목 (서브섹션의 첫 줄)
    pub chunk_topic: String,
    /// 고유 라벨 - 분할되지 않으면 chunk_topic,
    /// 분할되면 "{chunk_topic} (Part N)"
    pub chunk_id: String,
    /// 청크 텍스트 (이전 청크와 오버랩될 수 있음)
    pub text: String,
}

// ============================================================================
// DocumentChunker
// ============================================================================

/// 계층적 문서 청커
///
/// 순수 변환입니다. 청크를 저장하는 것은 호출자(artifact 모듈)의
/// 책임입니다.
pub struct DocumentChunker {
    config: ChunkConfig,
    tokenizer: Box<dyn Tokenizer>,
    page_marker: Regex,
    blank_lines: Regex,
}

impl DocumentChunker {
    /// 새 청커 생성
    ///
    /// 설정이 잘못되면 즉시 실패합니다.
    ///
    /// # Arguments
    /// * `config` - 토큰 예산 설정
    /// * `tokenizer` - 인코딩/디코딩 능력
    pub fn new(config: ChunkConfig, tokenizer: Box<dyn Tokenizer>) -> Result<Self, ChunkError> {
        config.validate()?;

        Ok(Self {
            config,
            tokenizer,
            page_marker: Regex::new(PAGE_MARKER_PATTERN).unwrap(),
            blank_lines: Regex::new(r"\n{2,}").unwrap(),
        })
    }

    /// 기본 설정으로 생성
    pub fn with_defaults(tokenizer: Box<dyn Tokenizer>) -> Result<Self, ChunkError> {
        Self::new(ChunkConfig::default(), tokenizer)
    }

    /// 문서 텍스트를 청크 시퀀스로 분할
    ///
    /// # Returns
    /// 입력 순서대로 정렬된 청크 목록
    ///
    /// # Errors
    /// - `ChunkError::SourceFormat` - 페이지 마커가 하나도 없음 (복구 가능)
    /// - `ChunkError::Decode` - 토크나이저 디코딩 실패
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, ChunkError> {
        self.config.validate()?;

        let pages = self.split_pages(text)?;
        let mut chunks = Vec::new();

        for (source_url, body) in pages {
            self.chunk_page(&source_url, body, &mut chunks)?;
        }

        tracing::debug!("Produced {} chunks from {} bytes", chunks.len(), text.len());
        Ok(chunks)
    }

    /// 1단계: 페이지 마커 기준 분할
    ///
    /// `(source_url, page_body)` 쌍 목록을 반환합니다.
    /// 마커 패턴 매칭은 이 단계 뒤에 격리되어 있으므로
    /// 구조적 파서로 교체해도 Chunk 계약은 변하지 않습니다.
    fn split_pages<'a>(&self, text: &'a str) -> Result<Vec<(String, &'a str)>, ChunkError> {
        let mut markers: Vec<(usize, usize, &str)> = Vec::new();

        for caps in self.page_marker.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let url = caps.get(1).unwrap().as_str();
            markers.push((whole.start(), whole.end(), url));
        }

        if markers.is_empty() {
            return Err(ChunkError::SourceFormat);
        }

        let mut pages = Vec::with_capacity(markers.len());
        for (i, (_, end, url)) in markers.iter().enumerate() {
            let body_end = markers.get(i + 1).map(|m| m.0).unwrap_or(text.len());
            pages.push((url.to_string(), &text[*end..body_end]));
        }

        Ok(pages)
    }

    /// 2-3단계: 서브토픽 분할 + 토큰 제한 적용
    fn chunk_page(
        &self,
        source_url: &str,
        body: &str,
        out: &mut Vec<Chunk>,
    ) -> Result<(), ChunkError> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(());
        }

        // 페이지 본문의 첫 줄이 페이지 제목
        let source_page = body
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .unwrap_or(DEFAULT_PAGE_TITLE);

        for section in self.blank_lines.split(body) {
            if section.trim().is_empty() {
                continue;
            }

            let chunk_topic = section.lines().next().map(str::trim).unwrap_or("");
            self.chunk_section(source_page, source_url, chunk_topic, section, out)?;
        }

        Ok(())
    }

    /// 3단계: 토큰 예산 초과 시 슬라이딩 윈도우 분할
    ///
    /// 윈도우를 개별적으로 디코딩하므로 원본 대비 경계 공백이
    /// 달라질 수 있습니다. 이는 설계상 허용되는 손실입니다.
    fn chunk_section(
        &self,
        source_page: &str,
        source_url: &str,
        chunk_topic: &str,
        section: &str,
        out: &mut Vec<Chunk>,
    ) -> Result<(), ChunkError> {
        let tokens = self.tokenizer.encode(section);

        if tokens.len() <= self.config.max_tokens {
            out.push(Chunk {
                source_page: source_page.to_string(),
                source_url: source_url.to_string(),
                chunk_topic: chunk_topic.to_string(),
                chunk_id: chunk_topic.to_string(),
                text: section.to_string(),
            });
            return Ok(());
        }

        let step = self.config.step();
        let mut position = 0;
        let mut part = 1;

        while position < tokens.len() {
            let end = (position + self.config.max_tokens).min(tokens.len());
            let window = &tokens[position..end];
            let text = self.tokenizer.decode(window).map_err(ChunkError::Decode)?;

            out.push(Chunk {
                source_page: source_page.to_string(),
                source_url: source_url.to_string(),
                chunk_topic: chunk_topic.to_string(),
                chunk_id: format!("{} (Part {})", chunk_topic, part),
                text,
            });

            position += step;
            part += 1;
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
