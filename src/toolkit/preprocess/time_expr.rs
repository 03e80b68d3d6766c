

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::core::error::{PreprocessError, Result};
use crate::utils::parse_count;


/// Concrete half-open range `[start, end)` derived from a time phrase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub phrase: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Text that replaces the phrase: `YYYY-MM-DD` for one day, otherwise
    /// `YYYY-MM-DD至YYYY-MM-DD` with an inclusive last day.
    pub fn marker(&self) -> String {
        let first = self.start.date();
        let last = self.end.date().pred_opt().unwrap_or(first);
        if last <= first {
            first.format("%Y-%m-%d").to_string()
        } else {
            format!("{}至{}", first.format("%Y-%m-%d"), last.format("%Y-%m-%d"))
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}


#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeAnchor {
    Today,
    Yesterday,
    DayBeforeYesterday,
    Tomorrow,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    ThisYear,
    LastYear,
    /// Needs a count in capture group 1.
    RecentDays,
    RecentWeeks,
    RecentMonths,
}

impl TimeAnchor {
    /// Day range `[start, end)` anchored to `today`. `None` when the count is
    /// missing or zero, or the calendar arithmetic overflows.
    pub fn resolve(&self, count: Option<&str>, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let tomorrow = today.checked_add_days(Days::new(1))?;
        let monday = today.checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))?;
        let month_start = today.with_day(1)?;
        let quarter_start = NaiveDate::from_ymd_opt(today.year(), (today.month0() / 3) * 3 + 1, 1)?;
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
        let parsed_count = || count.and_then(parse_count).filter(|n| *n > 0);

        match self {
            Self::Today => Some((today, tomorrow)),
            Self::Yesterday => Some((today.checked_sub_days(Days::new(1))?, today)),
            Self::DayBeforeYesterday => Some((
                today.checked_sub_days(Days::new(2))?,
                today.checked_sub_days(Days::new(1))?,
            )),
            Self::Tomorrow => Some((tomorrow, tomorrow.checked_add_days(Days::new(1))?)),
            Self::ThisWeek => Some((monday, monday.checked_add_days(Days::new(7))?)),
            Self::LastWeek => Some((monday.checked_sub_days(Days::new(7))?, monday)),
            Self::ThisMonth => Some((month_start, month_start.checked_add_months(Months::new(1))?)),
            Self::LastMonth => Some((month_start.checked_sub_months(Months::new(1))?, month_start)),
            Self::ThisQuarter => Some((quarter_start, quarter_start.checked_add_months(Months::new(3))?)),
            Self::LastQuarter => Some((quarter_start.checked_sub_months(Months::new(3))?, quarter_start)),
            Self::ThisYear => Some((year_start, year_start.checked_add_months(Months::new(12))?)),
            Self::LastYear => Some((year_start.checked_sub_months(Months::new(12))?, year_start)),
            Self::RecentDays => {
                let n = parsed_count()?;
                Some((today.checked_sub_days(Days::new(u64::from(n) - 1))?, tomorrow))
            }
            Self::RecentWeeks => {
                let n = parsed_count()?;
                Some((today.checked_sub_days(Days::new(u64::from(n) * 7 - 1))?, tomorrow))
            }
            Self::RecentMonths => {
                let n = parsed_count()?;
                Some((today.checked_sub_months(Months::new(n))?, tomorrow))
            }
        }
    }
}


#[derive(Debug, Clone)]
pub struct TimeRule {
    pub pattern: Regex,
    pub anchor: TimeAnchor,
}

impl TimeRule {
    
    pub fn new(pattern: &str, anchor: TimeAnchor) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| PreprocessError::Config(format!("invalid time rule '{pattern}': {e}")))?;
        Ok(Self { pattern, anchor })
    }
}


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimeNormalization {
    pub text: String,
    pub ranges: Vec<TimeRange>,
    /// First range by position in the text.
    pub primary: Option<TimeRange>,
}

const COUNT: &str = r"(\d+|[一二两三四五六七八九十]+)";

const DEFAULT_RULES: &[(&str, TimeAnchor)] = &[
    (r"(?:最近|近|过去)COUNT(?:天|日)", TimeAnchor::RecentDays),
    (r"(?:最近|近|过去)COUNT个?(?:周|星期|礼拜)", TimeAnchor::RecentWeeks),
    (r"(?:最近|近|过去)COUNT个月", TimeAnchor::RecentMonths),
    (r"今天|今日", TimeAnchor::Today),
    (r"昨天|昨日", TimeAnchor::Yesterday),
    (r"前天", TimeAnchor::DayBeforeYesterday),
    (r"明天", TimeAnchor::Tomorrow),
    (r"本周|这周|这个星期|这星期|本星期|这礼拜", TimeAnchor::ThisWeek),
    (r"上周|上个星期|上星期|上个礼拜|上礼拜", TimeAnchor::LastWeek),
    (r"本月|这个月|当月", TimeAnchor::ThisMonth),
    (r"上个月|上月", TimeAnchor::LastMonth),
    (r"本季度|这个季度|这季度", TimeAnchor::ThisQuarter),
    (r"上个季度|上季度", TimeAnchor::LastQuarter),
    (r"今年|本年", TimeAnchor::ThisYear),
    (r"去年|上一年", TimeAnchor::LastYear),
];

lazy_static! {
    static ref DEFAULT_TIME_RULES: Vec<TimeRule> = DEFAULT_RULES
        .iter()
        .map(|(pattern, anchor)| TimeRule {
            pattern: Regex::new(&pattern.replace("COUNT", COUNT)).expect("default time rule"),
            anchor: *anchor,
        })
        .collect();

    static ref VAGUE_TIME: Regex = Regex::new(
        r"最近|近期|近来|前段时间|前阵子|前些天|之前|以前|早些时候|那时候|那会儿|过段时间|过几天|改天|回头"
    ).expect("vague time pattern");
}

/// True when the text mentions time without saying which.
pub fn has_vague_time(text: &str) -> bool {
    VAGUE_TIME.is_match(text)
}


#[derive(Debug, Clone, Default)]
pub struct TimeRuleTable {
    rules: Vec<TimeRule>,
}

impl TimeRuleTable {
    
    pub fn new(rules: Vec<TimeRule>) -> Self {
        Self { rules }
    }

    
    pub fn empty() -> Self {
        Self::default()
    }

    
    pub fn default_zh() -> Self {
        Self::new(DEFAULT_TIME_RULES.clone())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replaces every recognized phrase with its date marker. Overlapping
    /// matches keep the earliest, then the longest.
    pub fn normalize(&self, text: &str, now: NaiveDateTime) -> TimeNormalization {
        let today = now.date();
        let mut found: Vec<(usize, usize, TimeRange)> = Vec::new();

        for rule in &self.rules {
            for caps in rule.pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let count = caps.get(1).map(|m| m.as_str());
                let Some((start, end)) = rule.anchor.resolve(count, today) else { continue };
                let (Some(start), Some(end)) = (start.and_hms_opt(0, 0, 0), end.and_hms_opt(0, 0, 0)) else {
                    continue;
                };
                found.push((
                    whole.start(),
                    whole.end(),
                    TimeRange {
                        phrase: whole.as_str().to_string(),
                        start,
                        end,
                    },
                ));
            }
        }

        found.sort_by_key(|(start, end, _)| (*start, std::cmp::Reverse(*end)));

        let mut out = String::with_capacity(text.len() + 16 * found.len());
        let mut ranges = Vec::new();
        let mut cursor = 0;
        for (start, end, range) in found {
            if start < cursor {
                continue;
            }
            out.push_str(&text[cursor..start]);
            out.push_str(&range.marker());
            ranges.push(range);
            cursor = end;
        }
        out.push_str(&text[cursor..]);

        TimeNormalization {
            text: out,
            primary: ranges.first().cloned(),
            ranges,
        }
    }
}
