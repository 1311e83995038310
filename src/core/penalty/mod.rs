//! # 페널티 집계
//!
//! norm-loss, angle-loss 두 스칼라로 축약

pub mod aggregator;


pub use aggregator::*;
