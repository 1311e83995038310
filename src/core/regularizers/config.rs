use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::masking::AngleTarget;
use super::layers::RegularizerKind;

/// 정규화 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularizerConfig {
    /// 정규화 변형
    pub kind: RegularizerKind,
    /// 목표 각도
    pub target: AngleTarget,
    /// 선형 레이어 포함 여부
    #[serde(default = "default_include_fc")]
    pub include_fc: bool,
}

fn default_include_fc() -> bool {
    true
}

impl Default for RegularizerConfig {
    fn default() -> Self {
        Self {
            kind: RegularizerKind::Adk,
            target: AngleTarget::Orthogonal,
            include_fc: true,
        }
    }
}

impl RegularizerConfig {
    /// 새 구성 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 정규화 변형 설정
    pub fn with_kind(mut self, kind: RegularizerKind) -> Self {
        self.kind = kind;
        self
    }

    /// 목표 각도 설정
    pub fn with_target(mut self, target: AngleTarget) -> Self {
        self.target = target;
        self
    }

    /// 선형 레이어 포함 설정
    pub fn with_include_fc(mut self, include_fc: bool) -> Self {
        self.include_fc = include_fc;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.target.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("정규화 구성 파싱 실패")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("구성 파일을 읽을 수 없습니다: {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
