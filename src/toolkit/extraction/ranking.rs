

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::utils::parse_count;


#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RankingClass {
    Max,
    Min,
    Top,
    Bottom,
}


#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RankingDimension {
    Quantity,
    Amount,
    Weight,
    Output,
    Efficiency,
    PassRate,
    Stock,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingQuery {
    pub class: RankingClass,
    /// Text that triggered the match.
    pub keyword: String,
    pub dimension: Option<RankingDimension>,
    pub limit: Option<u32>,
}

const COUNT: &str = r"(?:\d+|[一二两三四五六七八九十]+)";

/// Priority order: the first entry found in the text decides the class.
const RANKING_TABLE: &[(&str, RankingClass)] = &[
    (r"倒数", RankingClass::Bottom),
    (r"排名最后|排在最后", RankingClass::Bottom),
    (r"垫底", RankingClass::Bottom),
    (r"后{COUNT}(?:名|位)", RankingClass::Bottom),
    (r"前{COUNT}(?:名|个|位|条|家|台)", RankingClass::Top),
    (r"排名前{COUNT}?", RankingClass::Top),
    (r"(?i:top)\s*\d*", RankingClass::Top),
    (r"最多", RankingClass::Max),
    (r"最高", RankingClass::Max),
    (r"最大", RankingClass::Max),
    (r"最好", RankingClass::Max),
    (r"最快", RankingClass::Max),
    (r"最少", RankingClass::Min),
    (r"最低", RankingClass::Min),
    (r"最小", RankingClass::Min),
    (r"最差", RankingClass::Min),
    (r"最慢", RankingClass::Min),
    (r"排行|排名", RankingClass::Top),
];

/// Ordered: rate words precede the plain quantity words they contain.
const DIMENSION_TABLE: &[(RankingDimension, &[&str])] = &[
    (RankingDimension::PassRate, &["合格率", "良品率", "良率", "不良率"]),
    (RankingDimension::Efficiency, &["效率", "稼动率", "利用率", "OEE", "oee"]),
    (RankingDimension::Amount, &["销售额", "金额", "营收", "收入", "成本", "费用"]),
    (RankingDimension::Output, &["产量", "产出", "产能", "生产量"]),
    (RankingDimension::Weight, &["重量", "吨", "公斤", "千克"]),
    (RankingDimension::Stock, &["库存", "存货", "余量"]),
    (RankingDimension::Quantity, &["数量", "个数", "件数", "订单数", "多少个"]),
];

lazy_static! {
    static ref RANKING_PATTERNS: Vec<(Regex, RankingClass)> = RANKING_TABLE
        .iter()
        .map(|(pattern, class)| {
            let pattern = pattern.replace("{COUNT}", COUNT);
            (Regex::new(&pattern).expect("ranking pattern"), *class)
        })
        .collect();

    static ref LIMIT_PATTERN: Regex = Regex::new(&format!(
        r"(?:前|后|倒数第?|(?i:top)\s*)({COUNT})"
    )).expect("ranking limit pattern");
}


pub fn detect_ranking(text: &str) -> Option<RankingQuery> {
    let (keyword, class) = RANKING_PATTERNS.iter().find_map(|(re, class)| {
        re.find_iter(text)
            .find(|m| is_standalone(text, m.start(), m.end()))
            .map(|m| (m.as_str().trim().to_string(), *class))
    })?;

    Some(RankingQuery {
        class,
        keyword,
        dimension: infer_dimension(text),
        limit: extract_limit(text),
    })
}


pub fn infer_dimension(text: &str) -> Option<RankingDimension> {
    DIMENSION_TABLE
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(dimension, _)| *dimension)
}

/// Latin keywords such as "top" must not sit inside a longer word ("desktop", "topic").
fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let latin = |c: char| c.is_ascii_alphabetic();
    if !text[start..end].starts_with(latin) {
        return true;
    }
    let before = text[..start].chars().next_back().is_some_and(latin);
    let after = text[end..].chars().next().is_some_and(latin);
    !before && !after
}

fn extract_limit(text: &str) -> Option<u32> {
    LIMIT_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_count(m.as_str()))
        .filter(|n| *n > 0)
}
