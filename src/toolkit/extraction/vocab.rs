

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

/// Action words, longest first so compound verbs win over their prefixes.
pub const ACTION_WORDS: &[&str] = &[
    "查询", "查看", "看看", "搜索", "统计", "分析", "对比", "列出", "显示",
    "创建", "新建", "新增", "添加", "删除", "删掉", "移除", "去掉",
    "修改", "更新", "编辑", "取消", "导出", "下载", "导入", "打印",
    "审核", "审批", "提交", "生成", "入库", "出库", "盘点", "报废",
    "启动", "开启", "打开", "停止", "关闭", "停掉", "检验", "下单",
    "查", "找", "看", "建", "改",
];

/// Interrogative predicates that give an utterance a verb slot for
/// completeness scoring without naming an action.
pub const QUERY_PREDICATES: &[&str] = &[
    "是多少", "有多少", "多少", "哪些", "哪个", "哪家", "哪台", "是什么", "有没有", "怎么样", "几个",
];

/// Business object words, longest first.
pub const OBJECT_WORDS: &[&str] = &[
    "生产计划", "销售额", "合格率", "良品率", "供应商", "质检单", "采购单",
    "订单", "批次", "客户", "产品", "设备", "库存", "物料", "产量", "产线",
    "工单", "报表", "质检", "原料", "仓库", "员工", "计划", "出货",
];

/// Verb synonym groups used for fuzzy operation lookup. The first member of
/// each group is its canonical form.
pub const VERB_SYNONYM_GROUPS: &[&[&str]] = &[
    &["查询", "查看", "看看", "查", "看", "搜索", "找", "显示", "列出"],
    &["创建", "新建", "新增", "添加", "建", "下单"],
    &["删除", "删掉", "移除", "去掉"],
    &["修改", "更新", "编辑", "改"],
    &["导出", "下载", "打印"],
    &["启动", "开启", "打开"],
    &["停止", "关闭", "停掉"],
    &["审核", "审批"],
];

lazy_static! {
    /// (action, object) → canonical operation code.
    pub static ref OPERATION_CODES: HashMap<(&'static str, &'static str), &'static str> = {
        let mut m = HashMap::new();
        m.insert(("查询", "订单"), "ORDER_QUERY");
        m.insert(("创建", "订单"), "ORDER_CREATE");
        m.insert(("修改", "订单"), "ORDER_UPDATE");
        m.insert(("删除", "订单"), "ORDER_DELETE");
        m.insert(("取消", "订单"), "ORDER_CANCEL");
        m.insert(("审核", "订单"), "ORDER_APPROVE");
        m.insert(("导出", "订单"), "ORDER_EXPORT");
        m.insert(("查询", "批次"), "BATCH_QUERY");
        m.insert(("创建", "批次"), "BATCH_CREATE");
        m.insert(("报废", "批次"), "BATCH_SCRAP");
        m.insert(("查询", "库存"), "INVENTORY_QUERY");
        m.insert(("盘点", "库存"), "INVENTORY_CHECK");
        m.insert(("入库", "物料"), "MATERIAL_INBOUND");
        m.insert(("出库", "物料"), "MATERIAL_OUTBOUND");
        m.insert(("查询", "物料"), "MATERIAL_QUERY");
        m.insert(("查询", "供应商"), "SUPPLIER_QUERY");
        m.insert(("创建", "供应商"), "SUPPLIER_CREATE");
        m.insert(("删除", "供应商"), "SUPPLIER_DELETE");
        m.insert(("查询", "客户"), "CUSTOMER_QUERY");
        m.insert(("创建", "客户"), "CUSTOMER_CREATE");
        m.insert(("修改", "客户"), "CUSTOMER_UPDATE");
        m.insert(("查询", "设备"), "EQUIPMENT_QUERY");
        m.insert(("启动", "设备"), "EQUIPMENT_START");
        m.insert(("停止", "设备"), "EQUIPMENT_STOP");
        m.insert(("创建", "工单"), "WORK_ORDER_CREATE");
        m.insert(("查询", "工单"), "WORK_ORDER_QUERY");
        m.insert(("生成", "报表"), "REPORT_GENERATE");
        m.insert(("导出", "报表"), "REPORT_EXPORT");
        m.insert(("提交", "质检"), "QUALITY_INSPECTION_SUBMIT");
        m.insert(("审核", "质检单"), "QUALITY_INSPECTION_APPROVE");
        m.insert(("查询", "产品"), "PRODUCT_QUERY");
        m.insert(("创建", "产品"), "PRODUCT_CREATE");
        m
    };

    /// Relative time words, shared by the core extractor's modifier recovery
    /// and the action disambiguator's query-context check.
    pub static ref RELATIVE_TIME_PATTERN: Regex = Regex::new(
        r"(?:最近|近|过去)(?:\d+|[一二两三四五六七八九十]+)个?(?:天|日|周|星期|月)|今天|今日|昨天|昨日|前天|明天|本周|这周|上周|上个星期|本月|这个月|上个月|上月|本季度|上季度|今年|去年|最近|近期"
    ).expect("relative time pattern");

    pub static ref ABSOLUTE_TIME_PATTERN: Regex = Regex::new(
        r"\d{4}年|\d{4}-\d{1,2}-\d{1,2}|\d{1,2}月\d{1,2}[日号]|\d{1,2}月份"
    ).expect("absolute time pattern");
}

/// First vocabulary entry contained in `text`, in vocabulary order.
pub fn find_first<'a>(text: &str, words: &[&'a str]) -> Option<&'a str> {
    words.iter().copied().find(|w| text.contains(w))
}


pub fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}


pub fn synonym_group(verb: &str) -> Option<&'static [&'static str]> {
    VERB_SYNONYM_GROUPS.iter().copied().find(|group| group.contains(&verb))
}
