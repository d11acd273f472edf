//! Knowledge 모듈 - 지식 카드 로딩 및 키워드 검색
//!
//! - document: 느슨한 JSON 카드를 정규화된 문서로 로드
//! - retriever: 키워드 점수 기반 상위 문서 선택 및 컨텍스트 결합

mod document;
mod retriever;

// Re-exports
pub use document::{
    get_data_dir, KnowledgeBase, KnowledgeDocument, RawCard, DEFAULT_SOURCE_TYPE, DEFAULT_TITLE,
};
pub use retriever::{
    rank, retrieve, ScoredDocument, DOCUMENT_SEPARATOR, NO_CONTEXT_MESSAGE, TOP_K,
};
