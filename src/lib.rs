//! adreg: 각도 비상관(Angular Decorrelation) 가중치 정규화 라이브러리
//!
//! 필터 벡터들이 서로 직교하거나 최소 각도 이상 떨어지도록 만드는 CAD / ADK / ADC
//! 손실을 candle 텐서 위에서 계산한다.

pub mod core;

// 핵심 모듈들 재수출
pub use crate::core::{
    // 정규화 진입점
    adc, adk, cad, regularize, partition_weights,
    AngleTarget, RegLoss, RegularizerConfig, RegularizerKind, LayerWeight, RegWeights,
    // 스케줄
    ScheduleController, ScheduleTables, EpochHyperParams, ExperimentKey, Dataset, Model, RegVariant,
    // 지표
    AverageMeter,
};
