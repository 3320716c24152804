use once_cell::sync::Lazy;
use regex::Regex;

/// The only site answers may be drawn from.
pub const SITE_URL: &str = "https://pnumin.github.io/vibe_dokdo";

/// Entire response when the site has nothing on the question.
pub const NOT_FOUND: &str = "답변을 찾을 수 없음";

/// Assistant message appended when the provider call fails.
pub const ERROR_MESSAGE: &str = "오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

/// Opening message naming the site the session is grounded on.
pub fn greeting(site_url: &str) -> String {
    format!("안녕하세요! 저는 독도 바이브 챗봇입니다. {site_url} 사이트의 내용을 바탕으로 독도에 대해 알려드릴게요. 무엇이 궁금하신가요?")
}

/// Directive used when the question is about dates or chronology.
pub const TIMELINE_DIRECTIVE: &str =
    "질문에 연도나 시기가 있으므로 사이트의 '연사연표'를 찾아서 해당 시기의 사건을 정리하고, 여러 항목을 비교할 때는 표로 정리하세요.";

/// Directive used for every other question.
pub const GENERAL_DIRECTIVE: &str =
    "질문에 연도가 없으므로 연표 내용은 제외하고 사이트의 일반 설명 내용을 찾아서 답변하세요.";

/// `site:` search operand for the URL: scheme and trailing slash removed.
fn site_query(site_url: &str) -> &str {
    let host_path = site_url
        .strip_prefix("https://")
        .or_else(|| site_url.strip_prefix("http://"))
        .unwrap_or(site_url);
    host_path.trim_end_matches('/')
}

pub fn system_instruction(site_url: &str) -> String {
    let query = site_query(site_url);
    format!(
        r#"
당신은 '{site_url}' 웹사이트의 내용을 기반으로 질문에 답변하는 챗봇입니다.

다음 규칙을 엄격히 준수하세요:
1. 사용자의 질문에 답변하기 위해 반드시 제공된 Google Search 도구를 사용하세요.
2. 검색 시, 주로 'site:{query}' 쿼리를 활용하여 해당 사이트 내의 정보를 우선적으로 찾으세요.

3. **콘텐츠 검색 및 답변 전략 (중요):**
   - **연도/역사 질문:** 질문에 구체적인 **연도**(예: 512년, 1905년 등)가 포함되어 있거나 '역사', '연표', '언제'를 묻는 경우, 반드시 사이트 내 **'연표(연사연표)'** 섹션을 집중적으로 검색하여 해당 시기의 사건을 정확히 답변하고, 여러 시기를 비교할 때는 **표(Table)**로 정리하세요.
   - **용어 질문:** 단어의 뜻을 묻는 경우 **'용어사전'**을 참고하세요.
   - **일반 질문:** 연도가 언급되지 않은 일반적인 질문(지리, 생태, 일반 소개 등)인 경우, **연표의 내용을 섞지 말고** 사이트 내의 일반 서술형 콘텐츠를 바탕으로 정리해서 답변하세요.

4. **답변 형식:**
   - 가독성을 높이기 위해 **Markdown** 문법을 적극적으로 사용하세요.
   - 핵심 키워드나 중요한 내용은 **굵게(Bold)** 표시하세요.
   - 정보의 나열이나 순서가 있는 내용은 글머리 기호(Bullet points)나 번호 매기기를 사용하세요.
   - 연표나 데이터를 비교할 때는 가능한 경우 **표(Table)** 형식을 사용하여 정리하세요.

5. 답변은 철저히 해당 사이트({site_url})에 있는 내용에 근거해야 합니다. 외부 지식을 섞지 마세요.
6. 만약 질문에 대한 답변을 위 사이트 내용에서 찾을 수 없다면, 정확히 "{NOT_FOUND}"이라고만 답변하세요. 다른 부연 설명을 하지 마세요.
7. 답변은 한국어로 정중하게 작성하세요.
"#
    )
}

// Years ("1905년", "512년", "1905"), full dates, centuries, eras.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?x)
        \d{1,4}\s*년
        | \b\d{3,4}\b
        | \d{4}[-./]\d{1,2}([-./]\d{1,2})?
        | \d{1,2}\s*세기
        | \d{1,2}\s*월\s*\d{1,2}\s*일
    ")
    .expect("date pattern is valid")
});

// Chronology words must start a word: Korean particles may follow them,
// but "주시기" (honorific) or "자연사" must not count.
static CHRONOLOGY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?xi)
        (?:^|[^\p{L}\p{N}])(?:언제|역사|연표|연사연표|연도|년도|몇\s*년|시기|시대|세기|당시)
        | \b(?:when|years?|history|timeline|chronolog\w*|century|centuries)\b
    ")
    .expect("chronology pattern is valid")
});

/// Whether the question names a year/date or asks about chronology.
pub fn asks_chronology(utterance: &str) -> bool {
    DATE_PATTERN.is_match(utterance) || CHRONOLOGY_PATTERN.is_match(utterance)
}

/// Final user turn sent to the provider: the question plus the per-turn
/// restatement of the system rules.
pub fn wrap_question(site_url: &str, utterance: &str) -> String {
    let shape = if asks_chronology(utterance) {
        TIMELINE_DIRECTIVE
    } else {
        GENERAL_DIRECTIVE
    };

    format!(
        "질문: {utterance}\n\n(지시: {site_url} 사이트를 Google Search로 검색하여 답변하세요. {shape} \
         Markdown을 적용하여 핵심 키워드는 굵게, 나열은 글머리 기호나 번호로, 비교 데이터는 표로 정리하세요. \
         사이트 밖의 지식은 사용하지 마세요. 내용을 못 찾으면 '{NOT_FOUND}'이라고만 하세요. 답변은 한국어로 작성하세요.)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_question_targets_timeline() {
        let wrapped = wrap_question(SITE_URL, "독도는 언제 발견되었나요?");
        assert!(wrapped.starts_with("질문: 독도는 언제 발견되었나요?"));
        assert!(wrapped.contains("연사연표"));
        assert!(!wrapped.contains(GENERAL_DIRECTIVE));
    }

    #[test]
    fn ecology_question_excludes_timeline() {
        let wrapped = wrap_question(SITE_URL, "독도의 생태계는 어떤가요?");
        assert!(wrapped.contains(GENERAL_DIRECTIVE));
        assert!(wrapped.contains("연표 내용은 제외"));
        assert!(!wrapped.contains(TIMELINE_DIRECTIVE));
    }

    #[test]
    fn years_and_dates_count_as_chronology() {
        assert!(asks_chronology("1905년에 무슨 일이 있었나요?"));
        assert!(asks_chronology("512년 우산국"));
        assert!(asks_chronology("1952-01-18 평화선"));
        assert!(asks_chronology("19세기 독도"));
        assert!(asks_chronology("What happened in the 1900s history?"));
        assert!(asks_chronology("독도의 역사를 알려주세요"));
        assert!(asks_chronology("연표에서 조선 시기를 보여줘"));
        assert!(asks_chronology("몇 년에 편입되었나요?"));
        assert!(!asks_chronology("독도에 사는 새는?"));
        assert!(!asks_chronology("독도의 면적은 얼마나 되나요?"));
    }

    #[test]
    fn words_merely_containing_chronology_terms_do_not_count() {
        assert!(!asks_chronology("독도의 생태계에 대해 설명해 주시기 바랍니다"));
        assert!(!asks_chronology("독도의 자연사 박물관 정보"));
        assert!(!asks_chronology("독도에 가려면 이후 어떻게 하나요"));
        assert!(!asks_chronology("배를 타기 이전에 준비할 것은?"));
        assert!(!asks_chronology("Whenever I visit, what should I bring?"));

        let wrapped = wrap_question(SITE_URL, "독도의 생태계에 대해 설명해 주시기 바랍니다");
        assert!(wrapped.contains(GENERAL_DIRECTIVE));
    }

    #[test]
    fn wrapped_turn_carries_every_rule() {
        let wrapped = wrap_question(SITE_URL, "독도의 지형");
        assert!(wrapped.contains(SITE_URL));
        assert!(wrapped.contains("Google Search"));
        assert!(wrapped.contains("Markdown"));
        assert!(wrapped.contains("사이트 밖의 지식은 사용하지 마세요"));
        assert!(wrapped.contains(NOT_FOUND));
        assert!(wrapped.contains("한국어"));
    }

    #[test]
    fn system_instruction_matches_turn_rules() {
        let instruction = system_instruction(SITE_URL);
        for rule in [SITE_URL, "Google Search", "연사연표", "Markdown", "외부 지식", NOT_FOUND, "한국어"] {
            assert!(instruction.contains(rule), "missing rule: {rule}");
        }
        assert!(instruction.contains("'site:pnumin.github.io/vibe_dokdo'"));
    }

    #[test]
    fn configured_site_replaces_default_everywhere() {
        let site = "http://example.org/dokdo/";
        let instruction = system_instruction(site);
        assert!(instruction.contains("'site:example.org/dokdo'"));
        assert!(!instruction.contains("vibe_dokdo"));

        let wrapped = wrap_question(site, "독도의 지형");
        assert!(wrapped.contains(site));
        assert!(!wrapped.contains(SITE_URL));

        assert!(greeting(site).contains(site));
        assert!(greeting(SITE_URL).contains(SITE_URL));
    }
}
