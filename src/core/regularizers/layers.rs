//! 모델 레이어를 정규화 변형별로 분류
//!
//! 1×1 합성곱과 첫 번째 합성곱(그리고 선택적으로 선형 레이어)은 평탄화 벡터
//! 정규화(ADK/CAD) 대상, 나머지 합성곱은 stride와 함께 ADC 대상이 된다.

use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::masking::AngleTarget;
use crate::core::penalty::RegLoss;
use super::ad::{adc, adk, cad};

/// 레이어 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Conv2d { kernel_size: usize, stride: usize },
    Linear,
}

/// 이름이 붙은 레이어 가중치
#[derive(Debug, Clone)]
pub struct LayerWeight {
    pub name: String,
    pub kind: LayerKind,
    pub weight: Tensor,
}

impl LayerWeight {
    pub fn conv2d(name: impl Into<String>, weight: Tensor, stride: usize) -> Result<Self> {
        let (_, _, kernel_size, _) = weight.dims4()?;
        Ok(Self { name: name.into(), kind: LayerKind::Conv2d { kernel_size, stride }, weight })
    }

    pub fn linear(name: impl Into<String>, weight: Tensor) -> Self {
        Self { name: name.into(), kind: LayerKind::Linear, weight }
    }
}

/// 분류 결과
#[derive(Debug, Clone, Default)]
pub struct RegWeights {
    /// 평탄화 벡터 정규화 대상
    pub kernel: Vec<Tensor>,
    /// (커널, stride) ADC 대상
    pub conv: Vec<(Tensor, usize)>,
}

impl RegWeights {
    pub fn len(&self) -> usize {
        self.kernel.len() + self.conv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 레이어를 순서대로 훑으며 분류
pub fn partition_weights(layers: &[LayerWeight], include_fc: bool) -> RegWeights {
    let mut first_conv = true;
    let mut out = RegWeights::default();

    for layer in layers {
        match layer.kind {
            LayerKind::Conv2d { kernel_size: 1, .. } => out.kernel.push(layer.weight.clone()),
            LayerKind::Conv2d { stride, .. } => {
                if first_conv {
                    out.kernel.push(layer.weight.clone());
                    first_conv = false;
                } else {
                    out.conv.push((layer.weight.clone(), stride));
                }
            }
            LayerKind::Linear if include_fc => out.kernel.push(layer.weight.clone()),
            LayerKind::Linear => {}
        }
    }

    log::debug!("정규화 대상 분류: kernel={}, conv={}", out.kernel.len(), out.conv.len());
    out
}

/// 모델 전체에 적용할 정규화 변형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegularizerKind {
    /// 모든 가중치에 CAD
    Cad,
    /// 모든 가중치에 ADK
    Adk,
    /// kernel 가중치에 ADK, conv 가중치에 ADC
    Adc,
}

impl fmt::Display for RegularizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegularizerKind::Cad => "CAD",
            RegularizerKind::Adk => "ADK",
            RegularizerKind::Adc => "ADC",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RegularizerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CAD" => Ok(RegularizerKind::Cad),
            "ADK" => Ok(RegularizerKind::Adk),
            "ADC" => Ok(RegularizerKind::Adc),
            other => Err(anyhow::anyhow!("알 수 없는 정규화 변형: {}", other)),
        }
    }
}

/// 분류된 가중치 전체에 대한 손실 합
pub fn regularize(weights: &RegWeights, kind: RegularizerKind, target: AngleTarget) -> Result<Option<RegLoss>> {
    let mut total: Option<RegLoss> = None;
    let mut accumulate = |loss: RegLoss| -> Result<()> {
        total = Some(match total.take() {
            Some(acc) => acc.add(&loss)?,
            None => loss,
        });
        Ok(())
    };

    for weight in &weights.kernel {
        let loss = match kind {
            RegularizerKind::Cad => cad(weight, target)?,
            RegularizerKind::Adk | RegularizerKind::Adc => adk(weight, target)?,
        };
        accumulate(loss)?;
    }

    for (kernel, stride) in &weights.conv {
        let loss = match kind {
            RegularizerKind::Cad => cad(kernel, target)?,
            RegularizerKind::Adk => adk(kernel, target)?,
            RegularizerKind::Adc => adc(kernel, target, *stride)?,
        };
        accumulate(loss)?;
    }

    Ok(total)
}
