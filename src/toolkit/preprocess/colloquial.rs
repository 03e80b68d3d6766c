

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};


#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchPosition {
    #[default]
    Anywhere,
    /// Only at the start of the utterance.
    Prefix,
    /// Only when the match ends the utterance, ignoring trailing sentence punctuation.
    Suffix,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColloquialEntry {
    pub pattern: String,
    pub standard_form: String,
    #[serde(default)]
    pub position: MatchPosition,
}

impl ColloquialEntry {
    pub fn new(pattern: impl Into<String>, standard_form: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            standard_form: standard_form.into(),
            position: MatchPosition::Anywhere,
        }
    }

    pub fn prefix(pattern: impl Into<String>, standard_form: impl Into<String>) -> Self {
        Self {
            position: MatchPosition::Prefix,
            ..Self::new(pattern, standard_form)
        }
    }

    pub fn suffix(pattern: impl Into<String>, standard_form: impl Into<String>) -> Self {
        Self {
            position: MatchPosition::Suffix,
            ..Self::new(pattern, standard_form)
        }
    }
}


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColloquialSubstitution {
    pub text: String,
    pub found_colloquials: Vec<String>,
    pub standardized_expressions: Vec<String>,
}


/// Phrase table applied in one left-to-right pass.
///
/// Entries are kept sorted by descending pattern length, so at any position
/// a compound colloquialism wins over each of its sub-phrases. Ties keep the
/// order they were supplied in. Standard forms are never re-scanned; the
/// table must not map a phrase onto another trigger.
#[derive(Debug, Clone, Default)]
pub struct ColloquialTable {
    entries: Vec<ColloquialEntry>,
}

impl ColloquialTable {
    
    pub fn new(entries: Vec<ColloquialEntry>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().filter(|e| !e.pattern.is_empty()).collect();
        entries.sort_by_key(|e| std::cmp::Reverse(e.pattern.chars().count()));
        Self { entries }
    }

    
    pub fn empty() -> Self {
        Self::default()
    }

    
    pub fn default_zh() -> Self {
        Self::new(vec![
            ColloquialEntry::prefix("麻烦帮我", ""),
            ColloquialEntry::prefix("能不能帮我", ""),
            ColloquialEntry::prefix("帮我", ""),
            ColloquialEntry::prefix("给我", ""),
            ColloquialEntry::new("帮我看一下", "查看"),
            ColloquialEntry::new("看一下", "查看"),
            ColloquialEntry::new("查一下", "查询"),
            ColloquialEntry::new("查查", "查询"),
            ColloquialEntry::new("瞅瞅", "查看"),
            ColloquialEntry::new("弄个", "创建"),
            ColloquialEntry::new("搞个", "创建"),
            ColloquialEntry::new("整一个", "创建"),
            ColloquialEntry::new("咋样", "怎么样"),
            ColloquialEntry::new("啥时候", "什么时候"),
            ColloquialEntry::new("多会儿", "什么时候"),
            ColloquialEntry::new("几号", "哪天"),
            ColloquialEntry::new("啥", "什么"),
            ColloquialEntry::new("咋", "怎么"),
            ColloquialEntry::suffix("一下吧", ""),
            ColloquialEntry::suffix("吧", ""),
            ColloquialEntry::suffix("呗", ""),
            ColloquialEntry::suffix("哈", ""),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    
    pub fn entries(&self) -> &[ColloquialEntry] {
        &self.entries
    }

    
    pub fn substitute(&self, text: &str) -> ColloquialSubstitution {
        let mut result = ColloquialSubstitution::default();
        if self.entries.is_empty() {
            result.text = text.trim().to_string();
            return result;
        }

        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let hit = self.entries.iter().find(|entry| {
                rest.starts_with(entry.pattern.as_str())
                    && match entry.position {
                        MatchPosition::Anywhere => true,
                        MatchPosition::Prefix => pos == 0,
                        MatchPosition::Suffix => rest[entry.pattern.len()..].chars().all(is_sentence_end),
                    }
            });

            match hit {
                Some(entry) => {
                    out.push_str(&entry.standard_form);
                    result.found_colloquials.push(entry.pattern.clone());
                    result.standardized_expressions.push(entry.standard_form.clone());
                    pos += entry.pattern.len();
                }
                None => {
                    let ch = rest.chars().next().map_or(1, char::len_utf8);
                    out.push_str(&rest[..ch]);
                    pos += ch;
                }
            }
        }

        result.text = out.trim().to_string();
        result
    }
}

/// What may trail a suffix entry and still count as the end of the utterance.
fn is_sentence_end(c: char) -> bool {
    c.is_whitespace() || "。！？…!?.~～".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_pattern_wins() {
        let table = ColloquialTable::new(vec![
            ColloquialEntry::new("看一下", "查看"),
            ColloquialEntry::new("帮我看一下", "请查看"),
            ColloquialEntry::new("帮我", "请"),
        ]);
        let result = table.substitute("帮我看一下库存");
        assert_eq!(result.text, "请查看库存");
        assert_eq!(result.found_colloquials, vec!["帮我看一下".to_string()]);
    }

    #[test]
    fn test_longest_wins_regardless_of_supply_order() {
        let entries = vec![
            ColloquialEntry::new("查", "检索"),
            ColloquialEntry::new("查一下", "查询"),
        ];
        let forward = ColloquialTable::new(entries.clone());
        let reversed = ColloquialTable::new(entries.into_iter().rev().collect());
        assert_eq!(forward.substitute("查一下订单").text, "查询订单");
        assert_eq!(reversed.substitute("查一下订单").text, "查询订单");
    }

    #[test]
    fn test_default_table_strips_polite_prefix_and_final_particle() {
        let result = ColloquialTable::default_zh().substitute("帮我查一下上周的订单吧");
        assert_eq!(result.text, "查询上周的订单");
        assert_eq!(
            result.found_colloquials,
            vec!["帮我".to_string(), "查一下".to_string(), "吧".to_string()]
        );
        assert_eq!(
            result.standardized_expressions,
            vec!["".to_string(), "查询".to_string(), "".to_string()]
        );
    }

    #[test]
    fn test_anchored_entries_only_match_at_edges() {
        let table = ColloquialTable::default_zh();
        let result = table.substitute("吧台设备坏了吗");
        assert_eq!(result.text, "吧台设备坏了吗");
        assert!(result.found_colloquials.is_empty());

        let result = table.substitute("你帮我查查");
        assert_eq!(result.text, "你帮我查询");
    }

    #[test]
    fn test_suffix_matches_before_final_punctuation() {
        let table = ColloquialTable::default_zh();
        let result = table.substitute("帮我查一下上周的订单吧。");
        assert_eq!(result.text, "查询上周的订单。");
        assert!(result.found_colloquials.contains(&"吧".to_string()));

        assert_eq!(table.substitute("查查订单吧！？").text, "查询订单！？");
        assert_eq!(table.substitute("好吧，查订单").text, "好吧，查订单");
    }

    #[test]
    fn test_single_pass_does_not_rescan_standard_forms() {
        let table = ColloquialTable::new(vec![ColloquialEntry::new("ab", "a")]);
        assert_eq!(table.substitute("aab").text, "aa");
        assert_eq!(table.substitute("abb").text, "ab");
    }

    #[test]
    fn test_empty_table_is_identity() {
        let result = ColloquialTable::empty().substitute("随便 说点啥");
        assert_eq!(result.text, "随便 说点啥");
        assert!(result.found_colloquials.is_empty());
    }
}
