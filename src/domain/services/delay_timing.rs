// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DelaySettings;
use rand::Rng;
use std::time::Duration;

/// 闭区间 `[min_ms, max_ms]` 内的均匀随机延迟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min_ms: 0, max_ms: 0 };

    /// 上下限颠倒时自动交换
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

/// 操作员节奏
///
/// `think` 用于每个订单行之后，`entry` 用于每次字段录入之前。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayTiming {
    pub think: DelayRange,
    pub entry: DelayRange,
}

impl DelayTiming {
    /// 不暂停
    pub fn none() -> Self {
        Self {
            think: DelayRange::ZERO,
            entry: DelayRange::ZERO,
        }
    }

    pub fn from_settings(settings: &DelaySettings) -> Self {
        Self {
            think: DelayRange::new(settings.think_min_ms, settings.think_max_ms),
            entry: DelayRange::new(settings.entry_min_ms, settings.entry_max_ms),
        }
    }

    pub async fn think_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        pace(self.think.sample(rng)).await
    }

    pub async fn entry_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        pace(self.entry.sample(rng)).await
    }
}

async fn pace(delay: Duration) -> Duration {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    delay
}
