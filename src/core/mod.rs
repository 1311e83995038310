//! # 각도 비상관 정규화 핵심 모듈
//!
//! 가중치 벡터 사이의 쌍별 각도를 목표 분리 각도로 밀어내는 정규화 손실과
//! epoch 단위 학습 스케줄

pub mod math;
pub mod angular;
pub mod masking;
pub mod penalty;
pub mod conv;
pub mod regularizers;
pub mod schedule;
pub mod metrics;

// 주요 타입들 재수출
pub use masking::{AngleTarget, MaskMode};
pub use penalty::RegLoss;
pub use regularizers::{
    adc, adk, cad, partition_weights, regularize, LayerKind, LayerWeight, RegWeights, RegularizerConfig,
    RegularizerKind,
};
pub use schedule::{
    milestones, Dataset, EpochHyperParams, ExperimentKey, Model, RegVariant, ScheduleController, ScheduleTables,
};
pub use metrics::{accuracy, AverageMeter};
