//! # 마스킹 정책
//!
//! 목표 각도 모드와 쌍별 위반 마스크

pub mod policy;


pub use policy::{violation_masks, AngleTarget, MaskMode, ViolationMasks};
