//! 키워드 기반 검색기
//!
//! 쿼리 단어와 문서 텍스트의 부분 문자열 포함 여부로 점수를 매겨
//! 상위 문서의 prompt_content를 결합한 컨텍스트 문자열을 만듭니다.
//!
//! 토큰화된 매칭 대신 부분 문자열 포함을 쓰는 것은 의도된
//! 선택입니다. 수십~수백 건 규모의 컬렉션에서는 역색인이나
//! 임베딩 없이도 충분한 근사 관련도를 제공합니다.

use std::collections::HashSet;

use super::document::{KnowledgeBase, KnowledgeDocument};

// ============================================================================
// Constants
// ============================================================================

/// 매칭 문서가 없을 때 반환하는 고정 문자열
///
/// 다운스트림 생성기는 이를 에러가 아니라 "일반 지식으로 답변"
/// 신호로 취급해야 합니다.
pub const NO_CONTEXT_MESSAGE: &str =
    "No specific knowledge documents found. The AI will use its general knowledge.";

/// 선택된 문서들의 prompt_content 결합 구분자
pub const DOCUMENT_SEPARATOR: &str = "\n\n--- DOCUMENT END ---\n\n";

/// 컨텍스트에 포함할 최대 문서 수
pub const TOP_K: usize = 3;

/// 전체 쿼리가 제목에 포함될 때의 가산점
const TITLE_MATCH_BONUS: u32 = 5;

/// 점수에 반영되는 쿼리 단어의 최소 문자 수
const MIN_WORD_CHARS: usize = 3;

// ============================================================================
// Types
// ============================================================================

/// 한 쿼리에 대한 문서 점수 (랭킹 중에만 존재)
#[derive(Debug, Clone)]
pub struct ScoredDocument<'a> {
    /// 지식 베이스의 문서 참조
    pub document: &'a KnowledgeDocument,
    /// 키워드 매칭 점수
    pub score: u32,
}

// ============================================================================
// Retrieval
// ============================================================================

/// 쿼리에 대한 상위 문서 랭킹
///
/// 점수 내림차순으로 정렬하되 동점은 적재 순서를 유지합니다
/// (안정 정렬). 최대 TOP_K 건을 반환합니다.
pub fn rank<'a>(query: &str, knowledge_base: &'a KnowledgeBase) -> Vec<ScoredDocument<'a>> {
    let query_lower = query.to_lowercase();
    let query_words: HashSet<&str> = query_lower.split_whitespace().collect();

    let mut scored: Vec<ScoredDocument> = knowledge_base
        .documents()
        .iter()
        .filter_map(|document| {
            let score = score_document(&query_lower, &query_words, document);
            (score > 0).then_some(ScoredDocument { document, score })
        })
        .collect();

    // sort_by는 안정 정렬이므로 동점 문서는 입력 순서를 유지
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(TOP_K);
    scored
}

/// 단일 문서 점수 계산
///
/// - 3문자 이상의 쿼리 단어가 searchable_text에 포함되면 +1
/// - 전체 소문자 쿼리가 제목에 포함되면 +5
fn score_document(
    query_lower: &str,
    query_words: &HashSet<&str>,
    document: &KnowledgeDocument,
) -> u32 {
    let mut score = 0;

    for word in query_words {
        if word.chars().count() >= MIN_WORD_CHARS && document.searchable_text.contains(word) {
            score += 1;
        }
    }

    if document.title.to_lowercase().contains(query_lower) {
        score += TITLE_MATCH_BONUS;
    }

    score
}

/// 쿼리로 컨텍스트 문자열 검색
///
/// 순수 함수이며 실패하지 않습니다. 매칭 문서가 없으면
/// `NO_CONTEXT_MESSAGE`를 반환합니다.
///
/// # Arguments
/// * `query` - 사용자 쿼리
/// * `knowledge_base` - 불변 지식 베이스
///
/// # Returns
/// 상위 문서들의 prompt_content를 구분자로 결합한 문자열
pub fn retrieve(query: &str, knowledge_base: &KnowledgeBase) -> String {
    let top_documents = rank(query, knowledge_base);

    if top_documents.is_empty() {
        return NO_CONTEXT_MESSAGE.to_string();
    }

    top_documents
        .iter()
        .map(|scored| scored.document.prompt_content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

// ============================================================================
// Tests
// ============================================================================
