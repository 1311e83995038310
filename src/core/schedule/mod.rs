//! # 학습 스케줄
//!
//! 실험 조합별 마일스톤 테이블과 epoch 커서 상태 기계

pub mod controller;
pub mod tables;

#[cfg(test)]
mod __tests__;

pub use controller::{EpochHyperParams, ScheduleController};
pub use tables::{
    milestone_index, milestones, Dataset, ExperimentKey, LrTable, Model, RegTable, RegVariant, ScheduleTables,
};
