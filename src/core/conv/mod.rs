//! # 합성곱 각도 통계
//!
//! 평탄화 내적 대신 공간 상호상관의 중앙 탭을 사용하는 변형

pub mod conv_stats;


pub use conv_stats::*;
