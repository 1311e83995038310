//! # 쌍별 각도 통계
//!
//! 평탄화된 필터 벡터들의 Gram 행렬, 노름, 정규화 유사도

pub mod pairwise;


pub use pairwise::*;
