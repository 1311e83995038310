//! 벡터 집합의 쌍별 각도 통계
//!
//! 가중치 텐서를 (m, d) 벡터 집합으로 펼친 뒤 Gram 행렬과 노름을 계산한다.
//! 정규화 분모는 그래프에서 분리(detach)되어 상수로 취급된다.

use anyhow::{bail, Result};
use candle_core::Tensor;

/// 일반(ADK) 경로의 분모 보호값
pub const NORM_EPS: f64 = 1e-8;

/// 출력 채널 우선 가중치를 (m, d)로 펼친다
pub fn flatten_filters(weight: &Tensor) -> Result<Tensor> {
    let dims = weight.dims();
    if dims.is_empty() {
        bail!("가중치는 최소 1차원이어야 합니다");
    }
    let m = dims[0];
    if m == 0 {
        bail!("출력 채널 수가 0인 가중치: {:?}", dims);
    }
    let d = weight.elem_count() / m;
    Ok(weight.reshape((m, d))?)
}

/// [W; -W] 로 벡터 수를 두 배로 만든다 (CAD 변형)
pub fn with_negation(vectors: &Tensor) -> Result<Tensor> {
    Ok(Tensor::cat(&[vectors, &vectors.neg()?], 0)?)
}

/// Gram 행렬과 노름
#[derive(Debug, Clone)]
pub struct PairwiseStats {
    /// W Wᵀ (m×m), 미분 가능
    pub gram: Tensor,
    /// 각 벡터의 제곱 노름 (m), 미분 가능
    pub sq_norms: Tensor,
    /// ‖wᵢ‖‖wⱼ‖ + eps (m×m), 그래프에서 분리됨
    pub denom: Tensor,
    m: usize,
}

impl PairwiseStats {
    /// (m, d) 벡터 집합에서 통계 계산
    pub fn compute(vectors: &Tensor, eps: f64) -> Result<Self> {
        let (m, _d) = vectors.dims2()?;

        let gram = vectors.matmul(&vectors.t()?)?;
        let sq_norms = vectors.sqr()?.sum(1)?;

        let norms = sq_norms.detach().sqrt()?;
        let denom = norms
            .unsqueeze(1)?
            .broadcast_mul(&norms.unsqueeze(0)?)?
            .affine(1.0, eps)?;

        log::trace!("pairwise stats: m={}, eps={}", m, eps);
        if eps == 0.0 && log::log_enabled!(log::Level::Warn) {
            let zero = norms
                .to_dtype(candle_core::DType::F64)?
                .to_vec1::<f64>()?
                .iter()
                .filter(|n| **n == 0.0)
                .count();
            if zero > 0 {
                log::warn!("노름이 0인 벡터 {}개: eps 없는 정규화에서 NaN이 생길 수 있습니다", zero);
            }
        }

        Ok(Self { gram, sq_norms, denom, m })
    }

    /// 벡터 수 m
    pub fn len(&self) -> usize {
        self.m
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 정규화된 코사인 유사도 (m×m)
    pub fn similarity(&self) -> Result<Tensor> {
        Ok(self.gram.div(&self.denom)?)
    }
}
