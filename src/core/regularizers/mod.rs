//! # AD 정규화 진입점
//!
//! CAD / ADK / ADC 함수와 모델 단위 적용

pub mod ad;
pub mod config;
pub mod layers;

#[cfg(test)]
mod __tests__;

pub use ad::{adc, adk, cad};
pub use config::RegularizerConfig;
pub use layers::{partition_weights, regularize, LayerKind, LayerWeight, RegWeights, RegularizerKind};
