//! # 정규화 진입점 테스트

pub mod ad_test;
