//! Anchor slugs for same-document links

/// Characters dropped from slugs: `#`, `.` and full-width punctuation.
const REMOVED: &[char] = &[
    '#', '.', '　', '！', '＠', '＃', '＄', '％', '＾', '＆', '＊', '（', '）', '＋', '｜', '〜',
    '＝', '￥', '｀', '「', '」', '｛', '｝', '；', '’', '：', '”', '、', '。', '・', '＜', '＞',
    '？', '【', '】', '『', '』', '《', '》', '〔', '〕', '［', '］', '‹', '›', '«', '»', '〘',
    '〙', '〚', '〛',
];

/// Turn heading text into a link anchor: spaces become hyphens and the
/// characters in [`REMOVED`] are dropped. Case is preserved.
pub fn slug(text: &str) -> String {
    text.chars()
        .filter(|c| !REMOVED.contains(c))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_spaces_become_hyphens() {
        assert_eq!(slug("test test"), "test-test");
        assert_eq!(slug("Weekly Review #1"), "Weekly-Review-1");
    }

    #[test]
    fn test_slug_removes_hash_and_dot() {
        assert_eq!(slug("test#test"), "testtest");
        assert_eq!(slug("test.test"), "testtest");
    }

    #[test]
    fn test_slug_removes_full_width_space() {
        assert_eq!(slug("test　test"), "testtest");
    }

    #[test]
    fn test_slug_removes_every_full_width_mark() {
        for c in REMOVED {
            assert_eq!(slug(&format!("test{}test", c)), "testtest", "char {:?}", c);
        }
    }

    #[test]
    fn test_slug_keeps_other_text() {
        assert_eq!(slug("Rust の所有権"), "Rust-の所有権");
        assert_eq!(slug("a-b_c"), "a-b_c");
    }

    #[test]
    fn test_slug_is_deterministic() {
        assert_eq!(slug("今日の【メモ】"), slug("今日の【メモ】"));
        assert_eq!(slug("今日の【メモ】"), "今日のメモ");
    }
}
