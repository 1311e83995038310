//! 마스킹된 각도 오차와 노름 오차를 스칼라 손실 두 개로 축약

use anyhow::Result;
use candle_core::{DType, Tensor};

use crate::core::masking::{AngleTarget, ViolationMasks};
use crate::core::math::{acos, clamp_unit, select_or_zero};

/// 정규화 손실 쌍 (0차원 텐서, 미분 가능)
#[derive(Debug, Clone)]
pub struct RegLoss {
    /// Σ (1 - ‖wᵢ‖²)²
    pub norm_loss: Tensor,
    /// Σ (각도 - 목표)², 위반 쌍만
    pub angle_loss: Tensor,
}

impl RegLoss {
    pub fn new(norm_loss: Tensor, angle_loss: Tensor) -> Self {
        Self { norm_loss, angle_loss }
    }

    /// strength * (norm_loss + angle_loss)
    pub fn total(&self, strength: f64) -> Result<Tensor> {
        Ok(self.norm_loss.add(&self.angle_loss)?.affine(strength, 0.0)?)
    }

    /// 두 손실을 더한다 (레이어별 합산용)
    pub fn add(&self, other: &RegLoss) -> Result<RegLoss> {
        Ok(RegLoss {
            norm_loss: self.norm_loss.add(&other.norm_loss)?,
            angle_loss: self.angle_loss.add(&other.angle_loss)?,
        })
    }

    /// (norm_loss, angle_loss) 값을 f64로 읽는다
    pub fn to_scalars(&self) -> Result<(f64, f64)> {
        let norm = self.norm_loss.to_dtype(DType::F64)?.to_scalar::<f64>()?;
        let angle = self.angle_loss.to_dtype(DType::F64)?.to_scalar::<f64>()?;
        Ok((norm, angle))
    }
}

/// Σ (1 - sq_norm)², 마스크 없이 모든 벡터에 대해
pub fn norm_loss(sq_norms: &Tensor) -> Result<Tensor> {
    Ok(sq_norms.affine(-1.0, 1.0)?.sqr()?.sum_all()?)
}

/// Σ_mask (acos(s) - target)²
///
/// 마스크 밖 원소는 acos 이전에 0으로 바뀌므로 정의역 밖 값이 들어가지 않는다.
/// 선택된 원소가 없으면 정확히 0.
pub fn masked_angle_error(similarity: &Tensor, mask: &Tensor, target: f64) -> Result<Tensor> {
    let safe = select_or_zero(mask, &clamp_unit(similarity, 0.0)?)?;
    let angles = acos(&safe)?;
    let error = select_or_zero(mask, &angles.affine(1.0, -target)?)?;
    Ok(error.sqr()?.sum_all()?)
}

/// 위반 마스크에 대한 각도 손실
pub fn angle_loss(similarity: &Tensor, masks: &ViolationMasks, target: AngleTarget) -> Result<Tensor> {
    let aligned = masked_angle_error(similarity, &masks.aligned, target.theta())?;
    match &masks.anti_aligned {
        Some(anti) => {
            let mirrored = masked_angle_error(similarity, anti, target.mirrored_theta())?;
            Ok(aligned.add(&mirrored)?)
        }
        None => Ok(aligned),
    }
}
