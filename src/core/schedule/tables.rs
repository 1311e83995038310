//! 실험 조합별 마일스톤 테이블
//!
//! (데이터셋, 모델, 정규화 변형) 조합을 닫힌 열거형으로 받아 학습률,
//! 가중치 감소, 정규화 강도 테이블을 돌려준다.

use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::core::regularizers::RegularizerKind;

/// 데이터셋
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Cifar100,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Cifar100 => write!(f, "cifar100"),
        }
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cifar100" => Ok(Dataset::Cifar100),
            other => Err(anyhow!("알 수 없는 데이터셋: {}", other)),
        }
    }
}

/// 모델 구조
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "resnet18")]
    ResNet18,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::ResNet18 => write!(f, "resnet18"),
        }
    }
}

impl FromStr for Model {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "resnet18" => Ok(Model::ResNet18),
            other => Err(anyhow!("알 수 없는 모델: {}", other)),
        }
    }
}

/// 실험에서 비교하는 정규화 변형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegVariant {
    /// 정규화 없음
    #[serde(rename = "base")]
    Base,
    So,
    Dso,
    Srip,
    Ocnn,
    Adk,
    Adc,
    Cad,
    Ph0,
    Mst,
}

impl RegVariant {
    pub fn name(&self) -> &'static str {
        match self {
            RegVariant::Base => "base",
            RegVariant::So => "SO",
            RegVariant::Dso => "DSO",
            RegVariant::Srip => "SRIP",
            RegVariant::Ocnn => "OCNN",
            RegVariant::Adk => "ADK",
            RegVariant::Adc => "ADC",
            RegVariant::Cad => "CAD",
            RegVariant::Ph0 => "PH0",
            RegVariant::Mst => "MST",
        }
    }
}

impl fmt::Display for RegVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RegVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let variant = match s.to_ascii_uppercase().as_str() {
            "BASE" => RegVariant::Base,
            "SO" => RegVariant::So,
            "DSO" => RegVariant::Dso,
            "SRIP" => RegVariant::Srip,
            "OCNN" => RegVariant::Ocnn,
            "ADK" => RegVariant::Adk,
            "ADC" => RegVariant::Adc,
            "CAD" => RegVariant::Cad,
            "PH0" => RegVariant::Ph0,
            "MST" => RegVariant::Mst,
            other => return Err(anyhow!("알 수 없는 정규화 변형: {}", other)),
        };
        Ok(variant)
    }
}

impl From<RegularizerKind> for RegVariant {
    fn from(kind: RegularizerKind) -> Self {
        match kind {
            RegularizerKind::Cad => RegVariant::Cad,
            RegularizerKind::Adk => RegVariant::Adk,
            RegularizerKind::Adc => RegVariant::Adc,
        }
    }
}

/// 스케줄 테이블 조회 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentKey {
    pub dataset: Dataset,
    pub model: Model,
    pub variant: RegVariant,
}

impl ExperimentKey {
    pub fn new(dataset: Dataset, model: Model, variant: RegVariant) -> Self {
        Self { dataset, model, variant }
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.dataset, self.model, self.variant)
    }
}

/// 학습률 마일스톤 테이블 (values.len() == milestones.len() + 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrTable {
    pub milestones: Vec<usize>,
    pub values: Vec<f64>,
}

/// 정규화 마일스톤 테이블: 가중치 감소와 정규화 강도가 같은 커서를 공유
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegTable {
    pub milestones: Vec<usize>,
    pub weight_decay: Vec<f64>,
    pub strength: Vec<f64>,
}

/// 한 실험의 전체 스케줄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTables {
    pub lr: LrTable,
    /// 정규화 테이블이 없을 때 쓰는 가중치 감소
    pub base_weight_decay: f64,
    #[serde(default)]
    pub reg: Option<RegTable>,
}

/// epoch 이하인 마일스톤 수 (최대 milestones.len())
pub fn milestone_index(milestones: &[usize], epoch: usize) -> usize {
    advance_cursor(milestones, 0, epoch)
}

/// 저장된 커서 위치부터 다시 훑는다
pub(crate) fn advance_cursor(milestones: &[usize], cursor: usize, epoch: usize) -> usize {
    let mut index = cursor.min(milestones.len());
    while index < milestones.len() && epoch >= milestones[index] {
        index += 1;
    }
    index
}

fn check_milestones(name: &str, milestones: &[usize], values: &[f64]) -> Result<()> {
    ensure!(
        milestones.windows(2).all(|w| w[0] <= w[1]),
        "{} 마일스톤이 정렬되어 있지 않습니다: {:?}",
        name,
        milestones
    );
    ensure!(
        values.len() == milestones.len() + 1,
        "{} 값 개수({})는 마일스톤 수 + 1({})이어야 합니다",
        name,
        values.len(),
        milestones.len() + 1
    );
    ensure!(
        values.iter().all(|v| v.is_finite() && *v >= 0.0),
        "{} 값은 유한한 음이 아닌 수여야 합니다: {:?}",
        name,
        values
    );
    Ok(())
}

impl ScheduleTables {
    /// 정규화 없는 스케줄
    pub fn base(lr: LrTable, base_weight_decay: f64) -> Self {
        Self { lr, base_weight_decay, reg: None }
    }

    pub fn with_reg(mut self, reg: RegTable) -> Self {
        self.reg = Some(reg);
        self
    }

    pub fn is_regularized(&self) -> bool {
        self.reg.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        check_milestones("학습률", &self.lr.milestones, &self.lr.values)?;
        ensure!(
            self.base_weight_decay.is_finite() && self.base_weight_decay >= 0.0,
            "기본 가중치 감소가 잘못되었습니다: {}",
            self.base_weight_decay
        );
        if let Some(reg) = &self.reg {
            check_milestones("가중치 감소", &reg.milestones, &reg.weight_decay)?;
            check_milestones("정규화 강도", &reg.milestones, &reg.strength)?;
        }
        Ok(())
    }

    /// 알려진 실험 조합의 테이블, 없으면 에러
    pub fn lookup(key: ExperimentKey) -> Result<Self> {
        milestones(key).ok_or_else(|| anyhow!("스케줄이 정의되지 않은 실험 조합: {}", key))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let tables: Self = serde_json::from_str(json).context("스케줄 테이블 파싱 실패")?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("스케줄 파일을 읽을 수 없습니다: {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const REG_MILESTONES: [usize; 4] = [20, 50, 70, 120];

fn reg_table(strength: [f64; 5], weight_decay: [f64; 5]) -> RegTable {
    RegTable {
        milestones: REG_MILESTONES.to_vec(),
        weight_decay: weight_decay.to_vec(),
        strength: strength.to_vec(),
    }
}

/// 실험 조합별 스케줄 테이블. 정의되지 않은 조합은 None.
pub fn milestones(key: ExperimentKey) -> Option<ScheduleTables> {
    match (key.dataset, key.model) {
        (Dataset::Cifar100, Model::ResNet18) => {
            let base = ScheduleTables::base(
                LrTable {
                    milestones: vec![60, 120, 160],
                    values: vec![1e-1, 2e-2, 4e-3, 8e-4],
                },
                5e-4,
            );

            let reg = match key.variant {
                RegVariant::Base => return Some(base),
                RegVariant::So => reg_table([1e-1, 1e-3, 1e-4, 1e-6, 0.0], [1e-8, 1e-4, 1e-4, 1e-4, 1e-4]),
                RegVariant::Dso => reg_table([1e-1, 1e-3, 1e-4, 1e-6, 0.0], [1e-8, 5e-4, 5e-4, 5e-4, 5e-4]),
                RegVariant::Srip => reg_table([1e-3, 1e-4, 1e-5, 1e-6, 0.0], [1e-8, 1e-8, 1e-6, 1e-4, 5e-4]),
                RegVariant::Ocnn => reg_table([0.1; 5], [1e-4; 5]),
                RegVariant::Adk => reg_table([1.0; 5], [5e-4; 5]),
                RegVariant::Adc => reg_table([1e-1, 1e-3, 1e-4, 1e-6, 1e-8], [1e-8, 1e-8, 1e-6, 1e-4, 5e-4]),
                RegVariant::Ph0 | RegVariant::Mst => reg_table([0.1; 5], [5e-4; 5]),
                RegVariant::Cad => return None,
            };
            Some(base.with_reg(reg))
        }
    }
}
