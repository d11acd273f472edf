//! CLI 모듈
//!
//! kcard-rag CLI 명령어 정의 및 구현
//!
//! - chunk: 스크랩된 문서 텍스트 -> 청크 아티팩트
//! - query: 지식 카드 키워드 검색
//! - list: 아티팩트 내용 확인
//! - status: 상태 확인

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::artifact;
use crate::chunker::{
    ChunkConfig, ChunkError, Cl100kTokenizer, DocumentChunker, DEFAULT_MAX_TOKENS,
    DEFAULT_OVERLAP_TOKENS,
};
use crate::knowledge::{self, get_data_dir, KnowledgeBase};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "kcard-rag")]
#[command(version, about = "문서 청킹 + 키워드 RAG 검색 파이프라인", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 스크랩된 문서 텍스트를 청크 아티팩트로 변환
    Chunk {
        /// 입력 텍스트 파일 (===== <url> ===== 페이지 마커 포함)
        input: PathBuf,

        /// 출력 아티팩트 경로
        #[arg(short, long, default_value = "chunks.txt")]
        output: PathBuf,

        /// 청크 당 최대 토큰 수
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: usize,

        /// 청크 간 중첩 토큰 수
        #[arg(long, default_value_t = DEFAULT_OVERLAP_TOKENS)]
        overlap: usize,
    },

    /// 지식 카드에서 키워드 검색
    Query {
        /// 검색 쿼리
        query: String,

        /// 지식 카드 JSON 파일 (여러 개 지정 가능)
        #[arg(short, long)]
        card: Vec<PathBuf>,

        /// 지식 카드 디렉토리 (기본: ~/.kcard-rag/cards)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// 결합된 컨텍스트 문자열 전체 출력
        #[arg(long)]
        context: bool,
    },

    /// 청크 아티팩트 내용 확인
    List {
        /// 아티팩트 파일 경로
        artifact: PathBuf,

        /// 출력 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Chunk {
            input,
            output,
            max_tokens,
            overlap,
        } => cmd_chunk(input, output, max_tokens, overlap),
        Commands::Query {
            query,
            card,
            dir,
            context,
        } => cmd_query(&query, card, dir, context),
        Commands::List { artifact, limit } => cmd_list(artifact, limit),
        Commands::Status => cmd_status(),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 청킹 명령어 (chunk)
///
/// 페이지 마커가 없으면 경고 후 빈 아티팩트를 생성합니다 (복구 가능).
/// 토큰 예산 설정이 잘못되면 중단합니다 (치명적).
fn cmd_chunk(input: PathBuf, output: PathBuf, max_tokens: usize, overlap: usize) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("입력 파일을 읽을 수 없습니다: {:?}", input))?;

    println!("[*] 청킹 중: {:?} ({})", input, format_bytes(text.len()));

    let tokenizer = Cl100kTokenizer::new().context("토크나이저 초기화 실패")?;
    let config = ChunkConfig {
        max_tokens,
        overlap_tokens: overlap,
    };
    let chunker =
        DocumentChunker::new(config, Box::new(tokenizer)).context("청커 설정이 잘못되었습니다")?;

    let chunks = match chunker.chunk(&text) {
        Ok(chunks) => chunks,
        Err(ChunkError::SourceFormat) => {
            tracing::warn!("No page markers found in {:?}", input);
            println!("[!] 페이지 마커를 찾지 못했습니다. 빈 아티팩트를 생성합니다.");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    artifact::write_chunks_to_path(&output, &chunks)?;

    println!("[OK] 청크 {} 건을 저장했습니다: {:?}", chunks.len(), output);
    Ok(())
}

/// 검색 명령어 (query)
///
/// 지식 카드를 로드해 키워드 점수로 상위 문서를 출력합니다.
fn cmd_query(
    query: &str,
    card_files: Vec<PathBuf>,
    dir: Option<PathBuf>,
    show_context: bool,
) -> Result<()> {
    let kb = load_knowledge_base(card_files, dir)?;

    if kb.is_empty() {
        anyhow::bail!(
            "지식 베이스가 비어 있습니다. \
             --card 또는 --dir로 카드 파일을 지정하세요."
        );
    }

    println!("[*] 검색 중: \"{}\" (문서 {} 건)", query, kb.len());

    let ranked = knowledge::rank(query, &kb);

    if ranked.is_empty() {
        println!();
        println!("{}", knowledge::NO_CONTEXT_MESSAGE);
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", ranked.len());

    for (i, scored) in ranked.iter().enumerate() {
        println!(
            "{}. [점수: {}] {}",
            i + 1,
            scored.score,
            scored.document.title
        );
        println!("   {}", truncate_text(&scored.document.prompt_content, 200));
        println!();
    }

    if show_context {
        println!("--- 컨텍스트 문자열 ---");
        println!("{}", knowledge::retrieve(query, &kb));
    }

    Ok(())
}

/// 카드 파일/디렉토리에서 지식 베이스 로드
///
/// 명시적 파일 목록이 우선, 그다음 디렉토리, 마지막으로 기본
/// 카드 디렉토리(~/.kcard-rag/cards)입니다.
fn load_knowledge_base(card_files: Vec<PathBuf>, dir: Option<PathBuf>) -> Result<KnowledgeBase> {
    if !card_files.is_empty() {
        return Ok(KnowledgeBase::load_files(&card_files));
    }

    let dir = dir.unwrap_or_else(|| get_data_dir().join("cards"));
    KnowledgeBase::load_dir(&dir).with_context(|| format!("카드 디렉토리 로드 실패: {:?}", dir))
}

/// 목록 명령어 (list)
///
/// 아티팩트를 파싱해 청크 요약을 출력합니다.
fn cmd_list(artifact_path: PathBuf, limit: usize) -> Result<()> {
    let chunks = artifact::read_chunks_from_path(&artifact_path)?;

    if chunks.is_empty() {
        println!("[!] 아티팩트에 청크가 없습니다.");
        return Ok(());
    }

    println!("[OK] 청크 {} 건:\n", chunks.len());

    for chunk in chunks.iter().take(limit) {
        println!("  {}", chunk.chunk_id);
        println!(
            "      페이지: {} | URL: {}",
            chunk.source_page, chunk.source_url
        );
        println!("      {}", truncate_text(&chunk.text, 120));
        println!();
    }

    if chunks.len() > limit {
        println!("  ... 외 {} 건", chunks.len() - limit);
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status() -> Result<()> {
    println!("kcard-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let data_dir = get_data_dir();
    println!("[*] 데이터 디렉토리: {}", data_dir.display());

    let cards_dir = data_dir.join("cards");
    if !cards_dir.exists() {
        println!("[!] 카드 디렉토리가 없습니다: {}", cards_dir.display());
        println!(
            "    mkdir -p {} 후 카드 JSON 파일을 넣으세요",
            cards_dir.display()
        );
        return Ok(());
    }

    match KnowledgeBase::load_dir(&cards_dir) {
        Ok(kb) => {
            let total_bytes: usize = kb
                .documents()
                .iter()
                .map(|doc| doc.prompt_content.len())
                .sum();

            println!("[OK] 로드된 문서: {} 건", kb.len());
            println!("     총 콘텐츠: {}", format_bytes(total_bytes));
        }
        Err(e) => {
            println!("[!] 카드 로드 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
