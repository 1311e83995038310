//! 위반 마스크 정책
//!
//! 목표 각도보다 더 정렬된(각도가 작은) 쌍을 골라낸다. 직교 모드는
//! 부동소수 비교 없이 열거형으로 선택한다.

use anyhow::{ensure, Result};
use candle_core::Tensor;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::core::math::{filled_like, mask_and, off_diagonal_mask};

/// 목표 각도 분리
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleTarget {
    /// π/2, 모든 비대각 쌍을 감독
    Orthogonal,
    /// 최소 분리 각도 θ (라디안), 위반 쌍만 감독
    Separated(f64),
}

impl Default for AngleTarget {
    fn default() -> Self {
        AngleTarget::Orthogonal
    }
}

impl AngleTarget {
    /// 검증된 분리 목표 생성 (0 < θ ≤ π/2)
    pub fn separated(theta: f64) -> Result<Self> {
        let target = AngleTarget::Separated(theta);
        target.validate()?;
        Ok(target)
    }

    pub fn validate(&self) -> Result<()> {
        if let AngleTarget::Separated(theta) = *self {
            ensure!(
                theta.is_finite() && theta > 0.0 && theta <= FRAC_PI_2,
                "목표 각도는 (0, π/2] 범위여야 합니다: {}",
                theta
            );
        }
        Ok(())
    }

    /// 양의 방향 목표 각도 θ
    pub fn theta(&self) -> f64 {
        match *self {
            AngleTarget::Orthogonal => FRAC_PI_2,
            AngleTarget::Separated(theta) => theta,
        }
    }

    /// 반평행 방향 목표 각도 π - θ
    pub fn mirrored_theta(&self) -> f64 {
        PI - self.theta()
    }

    /// 위반 판정 임계 유사도 cos θ (직교 모드는 정확히 0)
    pub fn cos_threshold(&self) -> f64 {
        match *self {
            AngleTarget::Orthogonal => 0.0,
            AngleTarget::Separated(theta) => theta.cos(),
        }
    }

    pub fn is_orthogonal(&self) -> bool {
        matches!(self, AngleTarget::Orthogonal)
    }
}

/// 변형별 마스킹 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// 원본 m개 벡터. 양/음 방향 위반을 따로 마스킹 (ADK)
    Signed,
    /// [W; -W] 2m개 벡터. 양의 상관만 마스킹 (CAD)
    Doubled,
}

/// 위반 마스크 (u8, 자기 쌍 제외)
#[derive(Debug, Clone)]
pub struct ViolationMasks {
    /// 너무 정렬된 쌍 → 목표 θ
    pub aligned: Tensor,
    /// 너무 반평행한 쌍 → 목표 π - θ
    pub anti_aligned: Option<Tensor>,
}

/// 유사도 행렬에서 위반 마스크 계산
pub fn violation_masks(similarity: &Tensor, target: AngleTarget, mode: MaskMode) -> Result<ViolationMasks> {
    target.validate()?;
    let (m, n) = similarity.dims2()?;
    ensure!(m == n, "유사도 행렬은 정방행렬이어야 합니다: {}x{}", m, n);

    let off_diag = off_diagonal_mask(m, similarity.device())?;
    let threshold = target.cos_threshold();

    match mode {
        MaskMode::Signed => {
            if target.is_orthogonal() {
                return Ok(ViolationMasks { aligned: off_diag, anti_aligned: None });
            }
            let upper = similarity.gt(&filled_like(similarity, threshold)?)?;
            let lower = similarity.lt(&filled_like(similarity, -threshold)?)?;
            Ok(ViolationMasks {
                aligned: mask_and(&upper, &off_diag)?,
                anti_aligned: Some(mask_and(&lower, &off_diag)?),
            })
        }
        MaskMode::Doubled => {
            let upper = similarity.gt(&filled_like(similarity, threshold)?)?;
            let positive = similarity.gt(&similarity.zeros_like()?)?;
            let aligned = mask_and(&mask_and(&upper, &positive)?, &off_diag)?;
            Ok(ViolationMasks { aligned, anti_aligned: None })
        }
    }
}
