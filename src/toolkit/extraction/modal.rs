

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "吗" stays: it turns a statement into a question.
    static ref TRAILING_PARTICLES: Regex =
        Regex::new(r"[吧呢啊呀嘛哦喔哈啦咯嘞噢~～\s]+$").expect("modal particle pattern");
}

/// Strips sentence-final tone markers, possibly several in a row, then trims.
pub fn filter_modal_particles(text: &str) -> String {
    TRAILING_PARTICLES.replace(text.trim(), "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_single_particle() {
        assert_eq!(filter_modal_particles("帮我查一下上周的订单吧"), "帮我查一下上周的订单");
    }

    #[test]
    fn test_strips_consecutive_particles() {
        assert_eq!(filter_modal_particles("库存还有多少呢啊~ "), "库存还有多少");
        assert_eq!(filter_modal_particles("好的吧 呀"), "好的");
    }

    #[test]
    fn test_keeps_question_particle_and_inner_particles() {
        assert_eq!(filter_modal_particles("订单发货了吗"), "订单发货了吗");
        assert_eq!(filter_modal_particles("吧台设备"), "吧台设备");
    }

    #[test]
    fn test_only_particles_becomes_empty() {
        assert_eq!(filter_modal_particles("哈哈"), "");
    }
}
