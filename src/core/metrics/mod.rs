//! # 학습 지표
//!
//! 누적 평균 측정기와 top-k 정확도

pub mod accuracy;
pub mod meter;


pub use accuracy::accuracy;
pub use meter::AverageMeter;
