// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 销售订单行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesLine {
    /// 行类型，压测中固定为 "Item"
    pub line_type: String,
    /// 物料编号
    pub item_no: String,
    /// 数量
    pub quantity: u32,
    /// 待发货数量
    pub quantity_to_ship: u32,
}

/// 销售订单
///
/// 订单本身只存在于表单状态中，这里是工作流结束时用于诊断的快照。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesOrder {
    /// 订单号（由服务器自动编号）
    pub order_no: String,
    /// 客户编号
    pub customer_no: String,
    /// 活动代码
    pub activity_code: String,
    /// 订单行，按录入顺序排列
    pub lines: Vec<SalesLine>,
}

impl SalesOrder {
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}
