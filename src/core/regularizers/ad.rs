//! 각도 비상관(AD) 정규화 진입점
//!
//! 학습 루프가 매 최적화 스텝마다 호출한다. 반환된 두 손실은 그래프에 연결된
//! 0차원 텐서이며, 호출자가 정규화 강도를 곱해 목적 함수에 더한다.

use anyhow::Result;
use candle_core::Tensor;

use crate::core::angular::{flatten_filters, with_negation, PairwiseStats, NORM_EPS};
use crate::core::conv::ConvStats;
use crate::core::masking::{violation_masks, AngleTarget, MaskMode};
use crate::core::math::mask_count;
use crate::core::penalty::{angle_loss, norm_loss, RegLoss};

/// CAD: [W; -W] 로 복제한 벡터 집합에서 양의 상관 위반만 벌점
///
/// 복제된 집합은 반평행 위반을 양의 방향 위반으로 함께 담으므로 마스크 하나로
/// 충분하다. 분모에 eps를 더하지 않는다.
pub fn cad(weight: &Tensor, target: AngleTarget) -> Result<RegLoss> {
    let vectors = with_negation(&flatten_filters(weight)?)?;
    let stats = PairwiseStats::compute(&vectors, 0.0)?;
    pairwise_losses(&stats, target, MaskMode::Doubled)
}

/// ADK: 원본 벡터 집합에서 양/음 방향 위반을 따로 벌점
pub fn adk(weight: &Tensor, target: AngleTarget) -> Result<RegLoss> {
    let vectors = flatten_filters(weight)?;
    let stats = PairwiseStats::compute(&vectors, NORM_EPS)?;
    pairwise_losses(&stats, target, MaskMode::Signed)
}

/// ADC: 합성곱 커널의 중앙 탭 상호상관 기반 벌점
pub fn adc(kernel: &Tensor, target: AngleTarget, stride: usize) -> Result<RegLoss> {
    let stats = ConvStats::compute(kernel, stride)?;
    stats.losses(target)
}

fn pairwise_losses(stats: &PairwiseStats, target: AngleTarget, mode: MaskMode) -> Result<RegLoss> {
    let similarity = stats.similarity()?;
    let masks = violation_masks(&similarity, target, mode)?;

    if log::log_enabled!(log::Level::Debug) {
        let anti = match &masks.anti_aligned {
            Some(mask) => mask_count(mask)?,
            None => 0,
        };
        log::debug!(
            "{:?} 마스크: m={}, 정렬 위반={}, 반평행 위반={}",
            mode,
            stats.len(),
            mask_count(&masks.aligned)?,
            anti
        );
    }

    Ok(RegLoss::new(
        norm_loss(&stats.sq_norms)?,
        angle_loss(&similarity, &masks, target)?,
    ))
}
