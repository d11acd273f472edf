//! kcard-rag - 문서 청킹 + 키워드 RAG 검색 파이프라인
//!
//! 스크랩된 문서 텍스트를 토큰 예산 내의 청크로 분할해 라인 구분
//! 아티팩트로 저장하고, 지식 카드 컬렉션에서 키워드 점수 기반
//! 검색으로 LLM 그라운딩용 컨텍스트 문자열을 만듭니다.

pub mod artifact;
pub mod chunker;
pub mod cli;
pub mod knowledge;

// Re-exports
pub use artifact::{parse_chunks, read_chunks_from_path, write_chunks, write_chunks_to_path};
pub use chunker::{
    Chunk, ChunkConfig, ChunkError, Cl100kTokenizer, DocumentChunker, Tokenizer,
    DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP_TOKENS, DEFAULT_PAGE_TITLE,
};
pub use knowledge::{
    get_data_dir, rank, retrieve, KnowledgeBase, KnowledgeDocument, RawCard, ScoredDocument,
    DOCUMENT_SEPARATOR, NO_CONTEXT_MESSAGE, TOP_K,
};
