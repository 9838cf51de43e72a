//! 決定由哪個來源提供車輛資料
//!
//! 狀態轉換是 [`decide`] 這個純函式：輸入要求的模式與兩個來源已完成的結果，
//! 輸出下一步 (載入某來源 / 使用某來源 / 全部失敗)。
//! [`SourceArbitrator`] 負責實際抓取、序號檢查與狀態保存。

use crate::domain::model::{SourceKind, SourceMode, SourceState, UnifiedCar};
use crate::domain::ports::CarSource;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, Mutex, RwLock};

pub const NO_DATA_ERROR: &str = "No car data available from any source";

/// 一次抓取完成後的結果
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Vec<UnifiedCar>),
    Failed(String),
}

impl FetchOutcome {
    pub fn has_data(&self) -> bool {
        matches!(self, FetchOutcome::Loaded(cars) if !cars.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchOutcome::Failed(message) => Some(message.as_str()),
            FetchOutcome::Loaded(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Load(SourceKind),
    Use(SourceKind),
    Exhausted { error: String },
}

/// 模式偏好的來源
pub fn preferred_source(mode: SourceMode) -> SourceKind {
    match mode {
        SourceMode::Primary | SourceMode::Auto => SourceKind::Primary,
        SourceMode::Fallback => SourceKind::Fallback,
    }
}

pub fn decide(mode: SourceMode, primary: Option<&FetchOutcome>, fallback: Option<&FetchOutcome>) -> Decision {
    match mode {
        SourceMode::Auto => match (primary, fallback) {
            (None, _) => Decision::Load(SourceKind::Primary),
            (Some(p), _) if p.has_data() => Decision::Use(SourceKind::Primary),
            (Some(_), None) => Decision::Load(SourceKind::Fallback),
            (Some(_), Some(f)) if f.has_data() => Decision::Use(SourceKind::Fallback),
            (Some(p), Some(f)) => Decision::Exhausted {
                error: f
                    .error()
                    .or_else(|| p.error())
                    .unwrap_or(NO_DATA_ERROR)
                    .to_string(),
            },
        },
        SourceMode::Primary => decide_explicit(SourceKind::Primary, primary, fallback),
        SourceMode::Fallback => decide_explicit(SourceKind::Fallback, fallback, primary),
    }
}

/// 明確指定來源時，只有失敗才切換到另一個來源 (空清單仍算成功)
fn decide_explicit(wanted: SourceKind, wanted_outcome: Option<&FetchOutcome>, other_outcome: Option<&FetchOutcome>) -> Decision {
    match (wanted_outcome, other_outcome) {
        (None, _) => Decision::Load(wanted),
        (Some(FetchOutcome::Loaded(_)), _) => Decision::Use(wanted),
        (Some(FetchOutcome::Failed(_)), None) => Decision::Load(wanted.other()),
        (Some(FetchOutcome::Failed(_)), Some(FetchOutcome::Loaded(_))) => Decision::Use(wanted.other()),
        (Some(FetchOutcome::Failed(_)), Some(FetchOutcome::Failed(last))) => Decision::Exhausted {
            error: last.clone(),
        },
    }
}

pub struct SourceArbitrator {
    primary: Box<dyn CarSource>,
    fallback: Box<dyn CarSource>,
    primary_gate: Mutex<()>,
    fallback_gate: Mutex<()>,
    generation: AtomicU64,
    /// 已經結束 (寫入、作廢或被取消) 的最新序號
    settled: watch::Sender<u64>,
    state: RwLock<SourceState>,
}

/// 週期結束時 (包含 future 被丟棄) 標記序號已結束，等待中的舊週期才不會卡住
struct SettleOnDrop<'a> {
    settled: &'a watch::Sender<u64>,
    generation: u64,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        mark_settled(self.settled, self.generation);
    }
}

fn mark_settled(settled: &watch::Sender<u64>, generation: u64) {
    settled.send_if_modified(|current| {
        if *current < generation {
            *current = generation;
            true
        } else {
            false
        }
    });
}

impl SourceArbitrator {
    pub fn new(primary: impl CarSource + 'static, fallback: impl CarSource + 'static, mode: SourceMode) -> Self {
        Self::from_boxed(Box::new(primary), Box::new(fallback), mode)
    }

    /// 來源型別要到執行期才決定時使用 (例如缺少 CMS 設定)
    pub fn from_boxed(primary: Box<dyn CarSource>, fallback: Box<dyn CarSource>, mode: SourceMode) -> Self {
        Self {
            primary,
            fallback,
            primary_gate: Mutex::new(()),
            fallback_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            settled: watch::Sender::new(0),
            state: RwLock::new(SourceState::new(mode)),
        }
    }

    pub async fn snapshot(&self) -> SourceState {
        self.state.read().await.clone()
    }

    pub async fn cars(&self) -> Vec<UnifiedCar> {
        self.state.read().await.cars.clone()
    }

    pub async fn mode(&self) -> SourceMode {
        self.state.read().await.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// 讓進行中的載入結果作廢 (例如畫面已卸載)
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        mark_settled(&self.settled, generation);
        tracing::debug!("Arbitrator invalidated, generation {}", generation);
    }

    /// 依目前模式依序載入，需要時切換來源
    pub async fn load(&self) -> SourceState {
        let mode = self.mode().await;
        self.run_cycle(mode, false).await
    }

    /// Auto 模式同時重新抓取兩個來源再重新判斷；明確模式與 `load` 相同
    pub async fn refresh(&self) -> SourceState {
        let mode = self.mode().await;
        self.run_cycle(mode, mode == SourceMode::Auto).await
    }

    /// 手動切換模式並立即載入
    pub async fn set_mode(&self, mode: SourceMode) -> SourceState {
        {
            let mut state = self.state.write().await;
            if state.mode != mode {
                tracing::info!("🔀 Source mode {:?} -> {:?}", state.mode, mode);
            }
            state.mode = mode;
        }
        self.run_cycle(mode, false).await
    }

    fn source(&self, kind: SourceKind) -> (&dyn CarSource, &Mutex<()>) {
        match kind {
            SourceKind::Primary => (self.primary.as_ref(), &self.primary_gate),
            SourceKind::Fallback => (self.fallback.as_ref(), &self.fallback_gate),
        }
    }

    async fn fetch(&self, kind: SourceKind) -> FetchOutcome {
        let (source, gate) = self.source(kind);
        // 同一來源同時只允許一個請求
        let _guard = gate.lock().await;

        tracing::debug!("📡 Fetching cars from {} source '{}'", kind, source.name());
        match source.fetch_cars().await {
            Ok(cars) => {
                tracing::debug!("📡 {} source '{}' returned {} cars", kind, source.name(), cars.len());
                FetchOutcome::Loaded(cars)
            }
            Err(e) => {
                tracing::warn!("⚠️ {} source '{}' failed: {}", kind, source.name(), e);
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_cycle(&self, mode: SourceMode, prefetch_both: bool) -> SourceState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _settle = SettleOnDrop {
            settled: &self.settled,
            generation,
        };

        let mut primary: Option<FetchOutcome> = None;
        let mut fallback: Option<FetchOutcome> = None;

        if prefetch_both {
            let (p, f) = tokio::join!(self.fetch(SourceKind::Primary), self.fetch(SourceKind::Fallback));
            primary = Some(p);
            fallback = Some(f);
        }

        let next = loop {
            match decide(mode, primary.as_ref(), fallback.as_ref()) {
                Decision::Load(kind) => {
                    let outcome = self.fetch(kind).await;
                    match kind {
                        SourceKind::Primary => primary = Some(outcome),
                        SourceKind::Fallback => fallback = Some(outcome),
                    }
                }
                Decision::Use(kind) => {
                    let (used, other) = match kind {
                        SourceKind::Primary => (primary.take(), fallback.take()),
                        SourceKind::Fallback => (fallback.take(), primary.take()),
                    };
                    let cars = match used {
                        Some(FetchOutcome::Loaded(cars)) => cars,
                        _ => Vec::new(),
                    };
                    let preferred = preferred_source(mode);
                    let switched = kind != preferred;
                    if switched {
                        tracing::warn!("🔀 Using {} source instead of {}", kind, preferred);
                    }

                    break SourceState {
                        mode,
                        data_source: Some(kind),
                        last_error: if switched {
                            other.as_ref().and_then(|o| o.error()).map(str::to_string)
                        } else {
                            None
                        },
                        cars,
                        switched_from: switched.then_some(preferred),
                        loaded_at: Some(Utc::now()),
                    };
                }
                Decision::Exhausted { error } => {
                    tracing::error!("❌ No usable car source: {}", error);
                    break SourceState {
                        mode,
                        data_source: None,
                        last_error: Some(error),
                        cars: Vec::new(),
                        switched_from: None,
                        loaded_at: Some(Utc::now()),
                    };
                }
            }
        };

        {
            let mut state = self.state.write().await;
            if self.generation.load(Ordering::SeqCst) == generation {
                tracing::info!(
                    "🚗 Loaded {} cars (mode {:?}, source {:?})",
                    next.cars.len(),
                    next.mode,
                    next.data_source
                );
                *state = next;
                return state.clone();
            }
        }

        // 被較新的週期取代：丟掉自己的結果，等最新的週期結束後回傳它的狀態
        tracing::debug!("Discarding stale load result (generation {})", generation);
        let mut settled = self.settled.subscribe();
        let _ = settled
            .wait_for(|settled| *settled >= self.generation.load(Ordering::SeqCst))
            .await;
        self.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(n: usize) -> FetchOutcome {
        FetchOutcome::Loaded(
            (0..n)
                .map(|i| UnifiedCar {
                    id: i.to_string(),
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn failed(message: &str) -> FetchOutcome {
        FetchOutcome::Failed(message.to_string())
    }

    #[test]
    fn test_auto_starts_with_primary() {
        assert_eq!(decide(SourceMode::Auto, None, None), Decision::Load(SourceKind::Primary));
        assert_eq!(
            decide(SourceMode::Auto, None, Some(&loaded(3))),
            Decision::Load(SourceKind::Primary)
        );
    }

    #[test]
    fn test_auto_prefers_primary_with_data() {
        assert_eq!(
            decide(SourceMode::Auto, Some(&loaded(2)), Some(&loaded(6))),
            Decision::Use(SourceKind::Primary)
        );
    }

    #[test]
    fn test_auto_falls_back_on_error_or_empty() {
        assert_eq!(
            decide(SourceMode::Auto, Some(&failed("timeout")), None),
            Decision::Load(SourceKind::Fallback)
        );
        assert_eq!(
            decide(SourceMode::Auto, Some(&loaded(0)), Some(&loaded(6))),
            Decision::Use(SourceKind::Fallback)
        );
    }

    #[test]
    fn test_auto_exhausted_reports_error() {
        assert_eq!(
            decide(SourceMode::Auto, Some(&loaded(0)), Some(&loaded(0))),
            Decision::Exhausted {
                error: NO_DATA_ERROR.to_string()
            }
        );
        assert_eq!(
            decide(SourceMode::Auto, Some(&failed("cms down")), Some(&loaded(0))),
            Decision::Exhausted {
                error: "cms down".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_modes_switch_only_on_failure() {
        assert_eq!(
            decide(SourceMode::Primary, Some(&loaded(0)), None),
            Decision::Use(SourceKind::Primary)
        );
        assert_eq!(
            decide(SourceMode::Primary, Some(&failed("401")), None),
            Decision::Load(SourceKind::Fallback)
        );
        assert_eq!(
            decide(SourceMode::Fallback, Some(&loaded(4)), Some(&failed("missing file"))),
            Decision::Use(SourceKind::Primary)
        );
        assert_eq!(
            decide(SourceMode::Fallback, Some(&failed("a")), Some(&failed("b"))),
            Decision::Exhausted {
                error: "a".to_string()
            }
        );
    }
}
