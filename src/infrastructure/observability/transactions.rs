// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::metrics::TRANSACTION_DURATION;
use chrono::{DateTime, Utc};
use metrics::histogram;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// 一个已结束的计时事务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTransaction {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// 计时事务接收端
pub trait TransactionSink: Send + Sync {
    fn record(&self, transaction: CompletedTransaction);
}

/// 把事务耗时写入 `navload_transaction_duration_seconds` 直方图
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsTransactionSink;

impl TransactionSink for MetricsTransactionSink {
    fn record(&self, transaction: CompletedTransaction) {
        debug!(
            transaction = %transaction.name,
            elapsed_ms = transaction.elapsed.as_millis() as u64,
            "Transaction finished"
        );
        histogram!(TRANSACTION_DURATION, "transaction" => transaction.name)
            .record(transaction.elapsed.as_secs_f64());
    }
}

/// 在内存中保存事务，用于测试和诊断
#[derive(Debug, Default)]
pub struct RecordingTransactionSink {
    transactions: Mutex<Vec<CompletedTransaction>>,
}

impl RecordingTransactionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> Vec<CompletedTransaction> {
        self.transactions.lock().clone()
    }

    /// 已记录的事务名称，按结束顺序排列
    pub fn names(&self) -> Vec<String> {
        self.transactions
            .lock()
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

impl TransactionSink for RecordingTransactionSink {
    fn record(&self, transaction: CompletedTransaction) {
        self.transactions.lock().push(transaction);
    }
}

/// 计时范围守卫
///
/// `begin` 记录开始时间，`end` 或离开作用域时把事务交给接收端，
/// 所以提前返回和 `?` 传播的路径上也会产生结束记录。
pub struct TimingSpan {
    name: String,
    started_at: DateTime<Utc>,
    start: Instant,
    sink: Arc<dyn TransactionSink>,
    finished: bool,
}

impl TimingSpan {
    pub fn begin(name: impl Into<String>, sink: Arc<dyn TransactionSink>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            start: Instant::now(),
            sink,
            finished: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 结束事务并返回耗时
    pub fn end(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.finished {
            self.finished = true;
            self.sink.record(CompletedTransaction {
                name: self.name.clone(),
                started_at: self.started_at,
                finished_at: Utc::now(),
                elapsed,
            });
        }
        elapsed
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_records_once_on_end() {
        let sink = Arc::new(RecordingTransactionSink::new());
        let span = TimingSpan::begin("Post", sink.clone());
        span.end();

        let recorded = sink.transactions();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].name, "Post");
        assert!(recorded[0].finished_at >= recorded[0].started_at);
    }

    #[test]
    fn test_span_records_on_early_exit() {
        fn fails(sink: Arc<dyn TransactionSink>) -> Result<(), String> {
            let _span = TimingSpan::begin("ConfirmShipAndInvoice", sink);
            Err("dialog vanished".to_string())
        }

        let sink = Arc::new(RecordingTransactionSink::new());
        assert!(fails(sink.clone()).is_err());
        assert_eq!(sink.names(), vec!["ConfirmShipAndInvoice".to_string()]);
    }
}
