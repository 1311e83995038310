//! # 스케줄 테스트

pub mod controller_test;
pub mod tables_test;
