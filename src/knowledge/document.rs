//! 지식 문서 및 지식 베이스
//!
//! 느슨한 JSON 카드(선택적 필드)를 로드 시점에 한 번만 정규화하여
//! 필수 필드가 모두 채워진 `KnowledgeDocument`로 변환합니다.
//! 사용 지점마다 기본값 처리를 반복하지 않습니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.kcard-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kcard-rag")
}

// ============================================================================
// Types
// ============================================================================

/// 제목이 없는 카드에 사용하는 기본 제목
pub const DEFAULT_TITLE: &str = "Untitled Document";

/// 출처 정보가 없는 카드에 사용하는 기본 출처
pub const DEFAULT_SOURCE_TYPE: &str = "Unknown";

/// 원본 지식 카드 (느슨한 JSON 형태)
///
/// 모든 필드가 선택적입니다. 기본값 규칙:
/// - `title` 없음 -> "Untitled Document"
/// - 본문은 `explanation`이 비어있지 않으면 그것, 아니면 `content`
/// - `source_type` 없음 -> "Unknown" (파일 로드 시에는 파일명 태그로 덮어씀)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
}

impl RawCard {
    /// 본문 텍스트 선택 (explanation 우선, 빈 문자열은 없는 것으로 취급)
    fn body(&self) -> &str {
        self.explanation
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.content.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("")
    }
}

/// 검색 및 프롬프트 주입용 지식 문서
///
/// 세 필드 모두 항상 채워져 있습니다 (로드 시점에 정규화됨).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeDocument {
    /// 매칭 전용 - 제목 + 본문의 소문자 결합
    pub searchable_text: String,
    /// 선택되면 LLM 프롬프트에 그대로 주입되는 텍스트
    pub prompt_content: String,
    /// 표시/매칭용 제목 (항상 비어있지 않음)
    pub title: String,
}

impl KnowledgeDocument {
    /// 원본 카드를 정규화된 문서로 변환
    pub fn from_card(card: &RawCard) -> Self {
        let title = card
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        let source_type = card.source_type.as_deref().unwrap_or(DEFAULT_SOURCE_TYPE);
        let body = card.body();

        Self {
            searchable_text: format!("{} {}", title, body).to_lowercase(),
            prompt_content: format!(
                "Title: {}\nSource: {}\nContent:\n{}",
                title, source_type, body
            ),
            title: title.to_string(),
        }
    }
}

// ============================================================================
// KnowledgeBase
// ============================================================================

/// 지식 베이스 - 불변 문서 컬렉션
///
/// 한 번 구축된 뒤에는 읽기 전용입니다. 검색기에 값으로 주입되며
/// 전역 가변 상태를 사용하지 않습니다. 문서 순서는 적재 순서이고,
/// 검색의 동점 처리 순서를 결정합니다.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    documents: Vec<KnowledgeDocument>,
}

impl KnowledgeBase {
    /// 메모리상의 카드 목록에서 구축
    pub fn from_cards(cards: &[RawCard]) -> Self {
        Self {
            documents: cards.iter().map(KnowledgeDocument::from_card).collect(),
        }
    }

    /// JSON 카드 파일 목록에서 구축
    ///
    /// 읽기 실패, JSON 파싱 실패, 배열이 아닌 파일은 경고 후
    /// 건너뛰고 나머지 파일로 계속합니다.
    pub fn load_files(paths: &[PathBuf]) -> Self {
        let mut documents = Vec::new();

        for path in paths {
            match load_card_file(path) {
                Ok(cards) => {
                    tracing::info!("Loaded {} cards from {:?}", cards.len(), path);
                    documents.extend(cards.iter().map(KnowledgeDocument::from_card));
                }
                Err(e) => {
                    tracing::warn!("Skipping card file {:?}: {}", path, e);
                }
            }
        }

        Self { documents }
    }

    /// 디렉토리의 모든 .json 카드 파일에서 구축
    ///
    /// 경로 정렬 순서로 로드하므로 적재 순서(= 동점 처리 순서)가
    /// 결정적입니다.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();

        if paths.is_empty() {
            anyhow::bail!("카드 파일(.json)이 없습니다: {:?}", dir);
        }

        paths.sort();
        Ok(Self::load_files(&paths))
    }

    /// 문서 목록 접근
    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    /// 문서 수
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// 단일 JSON 카드 파일 로드
///
/// 카드 배열이어야 하며, 각 카드의 source_type은
/// "JSON Card ({파일명})"으로 태깅됩니다.
fn load_card_file(path: &Path) -> Result<Vec<RawCard>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("카드 파일을 읽을 수 없습니다: {:?}", path))?;

    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("JSON 파싱 실패: {:?}", path))?;

    if !value.is_array() {
        anyhow::bail!("카드 배열이 아닙니다: {:?}", path);
    }

    let mut cards: Vec<RawCard> =
        serde_json::from_value(value).with_context(|| format!("카드 형식 오류: {:?}", path))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    for card in &mut cards {
        card.source_type = Some(format!("JSON Card ({})", file_name));
    }

    Ok(cards)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn card(title: Option<&str>, content: &str) -> RawCard {
        RawCard {
            title: title.map(String::from),
            explanation: None,
            content: Some(content.to_string()),
            source_type: Some("TXT Document".to_string()),
        }
    }

    #[test]
    fn test_from_card_defaults_title() {
        let doc = KnowledgeDocument::from_card(&card(None, "some content"));
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert!(doc.searchable_text.starts_with("untitled document"));
    }

    #[test]
    fn test_from_card_prompt_format() {
        let doc = KnowledgeDocument::from_card(&card(Some("Guide"), "Body text."));
        assert_eq!(
            doc.prompt_content,
            "Title: Guide\nSource: TXT Document\nContent:\nBody text."
        );
    }

    #[test]
    fn test_searchable_text_is_lowercased() {
        let doc = KnowledgeDocument::from_card(&card(Some("Polars Guide"), "Use the Lazy API."));
        assert_eq!(doc.searchable_text, "polars guide use the lazy api.");
    }

    #[test]
    fn test_explanation_preferred_over_content() {
        let raw = RawCard {
            title: Some("Card".to_string()),
            explanation: Some("the explanation".to_string()),
            content: Some("the content".to_string()),
            source_type: None,
        };

        let doc = KnowledgeDocument::from_card(&raw);
        assert!(doc.prompt_content.ends_with("the explanation"));
        assert!(doc.prompt_content.contains("Source: Unknown"));
    }

    #[test]
    fn test_empty_explanation_falls_back_to_content() {
        let raw = RawCard {
            title: Some("Card".to_string()),
            explanation: Some(String::new()),
            content: Some("the content".to_string()),
            source_type: None,
        };

        let doc = KnowledgeDocument::from_card(&raw);
        assert!(doc.prompt_content.ends_with("the content"));
    }

    #[test]
    fn test_load_files_tags_source_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.json");
        std::fs::write(
            &path,
            r#"[{"title": "First Card", "explanation": "About chunking."}]"#,
        )
        .unwrap();

        let kb = KnowledgeBase::load_files(&[path]);
        assert_eq!(kb.len(), 1);
        assert!(kb.documents()[0]
            .prompt_content
            .contains("Source: JSON Card (cards.json)"));
    }

    #[test]
    fn test_load_files_skips_invalid() {
        let dir = TempDir::new().unwrap();

        let bad_json = dir.path().join("bad.json");
        std::fs::write(&bad_json, "not json at all").unwrap();

        let not_array = dir.path().join("object.json");
        std::fs::write(&not_array, r#"{"title": "solo card"}"#).unwrap();

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"[{"title": "Good Card", "content": "ok"}]"#).unwrap();

        let missing = dir.path().join("missing.json");

        let kb = KnowledgeBase::load_files(&[bad_json, not_array, missing, good]);
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.documents()[0].title, "Good Card");
    }

    #[test]
    fn test_load_dir_sorted_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"[{"title": "Second", "content": "b"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"[{"title": "First", "content": "a"}]"#,
        )
        .unwrap();

        let kb = KnowledgeBase::load_dir(dir.path()).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.documents()[0].title, "First");
        assert_eq!(kb.documents()[1].title, "Second");
    }

    #[test]
    fn test_load_dir_without_cards() {
        let dir = TempDir::new().unwrap();
        assert!(KnowledgeBase::load_dir(dir.path()).is_err());
    }
}
