//! epoch 단위 하이퍼파라미터 상태 기계
//!
//! 커서 두 개(학습률, 정규화)를 단조 증가하는 epoch로 전진시키고, 그 위치의
//! 값을 돌려준다. 옵티마이저에 적용하는 것은 호출자 몫이다.

use anyhow::{ensure, Result};
use candle_core::Tensor;
use candle_nn::Optimizer;

use super::tables::{advance_cursor, milestone_index, ExperimentKey, ScheduleTables};

/// 한 epoch에 적용할 값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochHyperParams {
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub reg_strength: f64,
}

impl EpochHyperParams {
    pub fn apply_learning_rate<O: Optimizer>(&self, optimizer: &mut O) {
        optimizer.set_learning_rate(self.learning_rate);
    }

    /// 0.5 · weight_decay · Σ‖p‖²
    ///
    /// 그래디언트가 weight_decay · p 가 되므로 가중치 감소를 손실 항으로 넣을 때 쓴다.
    /// 파라미터가 없거나 감소가 0이면 None.
    pub fn weight_decay_penalty(&self, params: &[Tensor]) -> Result<Option<Tensor>> {
        if self.weight_decay == 0.0 {
            return Ok(None);
        }
        let mut total: Option<Tensor> = None;
        for p in params {
            let sq = p.sqr()?.sum_all()?;
            total = Some(match total {
                Some(acc) => acc.add(&sq)?,
                None => sq,
            });
        }
        match total {
            Some(t) => Ok(Some(t.affine(0.5 * self.weight_decay, 0.0)?)),
            None => Ok(None),
        }
    }
}

/// 마일스톤 커서 상태
#[derive(Debug, Clone)]
pub struct ScheduleController {
    tables: ScheduleTables,
    lr_cursor: usize,
    reg_cursor: usize,
    last_epoch: Option<usize>,
}

impl ScheduleController {
    pub fn new(tables: ScheduleTables) -> Result<Self> {
        tables.validate()?;
        Ok(Self { tables, lr_cursor: 0, reg_cursor: 0, last_epoch: None })
    }

    pub fn from_key(key: ExperimentKey) -> Result<Self> {
        log::info!("스케줄 테이블 로드: {}", key);
        Self::new(ScheduleTables::lookup(key)?)
    }

    /// 커서를 epoch까지 전진시키고 값을 돌려준다
    ///
    /// 이전 호출보다 작은 epoch는 에러. 같은 epoch 재호출은 허용.
    pub fn advance(&mut self, epoch: usize) -> Result<EpochHyperParams> {
        if let Some(last) = self.last_epoch {
            ensure!(epoch >= last, "epoch가 감소했습니다: {} → {}", last, epoch);
        }

        let lr_cursor = advance_cursor(&self.tables.lr.milestones, self.lr_cursor, epoch);
        let reg_cursor = match &self.tables.reg {
            Some(reg) => advance_cursor(&reg.milestones, self.reg_cursor, epoch),
            None => 0,
        };

        let params = self.params_at(lr_cursor, reg_cursor);
        if self.last_epoch.is_none() || lr_cursor != self.lr_cursor || reg_cursor != self.reg_cursor {
            log::info!(
                "epoch {}: lr={:e}, weight_decay={:e}, reg_strength={:e} (커서 {}/{})",
                epoch,
                params.learning_rate,
                params.weight_decay,
                params.reg_strength,
                lr_cursor,
                reg_cursor
            );
        }

        self.lr_cursor = lr_cursor;
        self.reg_cursor = reg_cursor;
        self.last_epoch = Some(epoch);
        Ok(params)
    }

    /// 커서를 움직이지 않고 epoch의 값을 계산
    pub fn peek(&self, epoch: usize) -> EpochHyperParams {
        let lr_cursor = milestone_index(&self.tables.lr.milestones, epoch);
        let reg_cursor = match &self.tables.reg {
            Some(reg) => milestone_index(&reg.milestones, epoch),
            None => 0,
        };
        self.params_at(lr_cursor, reg_cursor)
    }

    pub fn reset(&mut self) {
        self.lr_cursor = 0;
        self.reg_cursor = 0;
        self.last_epoch = None;
    }

    pub fn lr_cursor(&self) -> usize {
        self.lr_cursor
    }

    pub fn reg_cursor(&self) -> usize {
        self.reg_cursor
    }

    pub fn last_epoch(&self) -> Option<usize> {
        self.last_epoch
    }

    pub fn tables(&self) -> &ScheduleTables {
        &self.tables
    }

    // 테이블은 new()에서 검증되어 커서가 항상 값 범위 안에 있다
    fn params_at(&self, lr_cursor: usize, reg_cursor: usize) -> EpochHyperParams {
        let learning_rate = self.tables.lr.values[lr_cursor];
        match &self.tables.reg {
            Some(reg) => EpochHyperParams {
                learning_rate,
                weight_decay: reg.weight_decay[reg_cursor],
                reg_strength: reg.strength[reg_cursor],
            },
            None => EpochHyperParams {
                learning_rate,
                weight_decay: self.tables.base_weight_decay,
                reg_strength: 0.0,
            },
        }
    }
}
