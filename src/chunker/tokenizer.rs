//! 토크나이저 추상화 - 청크 크기 측정 단위
//!
//! 청킹의 모든 길이/오버랩은 문자나 바이트가 아니라
//! 토크나이저가 정의하는 토큰 단위로 측정됩니다.

use anyhow::Result;
use tiktoken_rs::CoreBPE;

// ============================================================================
// Tokenizer Trait
// ============================================================================

/// 토크나이저 트레이트
///
/// 청커에 주입되는 인코딩/디코딩 능력입니다.
/// encode와 decode는 서로 역변환이어야 하지만, 토큰 시퀀스를
/// 중간에서 잘라 디코딩하면 경계 공백이 달라질 수 있습니다.
pub trait Tokenizer: Send + Sync {
    /// 텍스트를 토큰 ID 시퀀스로 인코딩
    fn encode(&self, text: &str) -> Vec<u32>;

    /// 토큰 ID 시퀀스를 텍스트로 디코딩
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

// ============================================================================
// Cl100kTokenizer
// ============================================================================

/// cl100k_base BPE 토크나이저
///
/// OpenAI 계열 모델이 사용하는 cl100k_base 인코딩입니다.
/// ref: https://github.com/zurawiki/tiktoken-rs
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    /// 새 cl100k_base 토크나이저 생성
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| anyhow::anyhow!("cl100k 디코딩 실패: {}", e))
    }
}

// ============================================================================
// Tests
// ============================================================================
