pub mod acos;
pub mod basic_math;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

// 재수출
pub use acos::{acos, needs_host_roundtrip, Acos, ACOS_GRAD_FLOOR};
pub use basic_math::*;
