//! 합성곱 커널의 각도 통계 (ADC)
//!
//! 커널 텐서를 자기 자신과 상호상관시켜 (o, o, H, W) 응답 볼륨을 만들고,
//! 중앙 탭(이동량 0)을 내적 대신 사용한다. 중앙 탭이 아닌 모든 위치의 응답도
//! 각도 손실에 포함된다.

use anyhow::{bail, ensure, Result};
use candle_core::{IndexOp, Tensor};

use crate::core::masking::AngleTarget;
use crate::core::math::{acos, clamp_unit, filled_like, mask_and, select_or_zero};
use crate::core::penalty::RegLoss;

/// acos 이전에 0 쪽으로 당기는 양
pub const CONV_BOUNDARY_EPS: f64 = 1e-3;

/// 커널 응답 볼륨과 정규화 결과
#[derive(Debug, Clone)]
pub struct ConvStats {
    /// conv2d(kernel, kernel) 원시 응답 (o, o, H, W)
    pub response: Tensor,
    /// 중앙 탭 인덱스
    pub center: usize,
    /// 출력 채널별 노름 (o), 그래프에서 분리됨
    pub norms: Tensor,
    /// 경계 보정 후 acos 결과 (o, o, H, W)
    pub angles: Tensor,
    /// [i, i, c, c] 위치만 1인 u8 마스크
    pub identity_mask: Tensor,
}

/// stride에서 패딩 계산: floor((k - 1) / s) * s
pub fn conv_padding(kernel_size: usize, stride: usize) -> usize {
    ((kernel_size - 1) / stride) * stride
}

impl ConvStats {
    /// (o, i, k, k) 커널에서 통계 계산
    pub fn compute(kernel: &Tensor, stride: usize) -> Result<Self> {
        let (o, _i, kh, kw) = match kernel.dims4() {
            Ok(dims) => dims,
            Err(_) => bail!("ADC 커널은 4차원 (o, i, h, w)이어야 합니다: {:?}", kernel.dims()),
        };
        ensure!(stride > 0, "stride는 1 이상이어야 합니다");
        ensure!(kh == kw, "정방 커널만 지원합니다: {}x{}", kh, kw);
        ensure!(o > 0 && kw > 0, "빈 커널: {:?}", kernel.dims());

        // conv2d 내장 패딩은 입력 채널 3에서 잘못된 응답을 내므로 직접 0 패딩
        let padding = conv_padding(kw, stride);
        let padded = kernel
            .pad_with_zeros(2, padding, padding)?
            .pad_with_zeros(3, padding, padding)?;
        let response = padded.conv2d(kernel, 0, stride, 1, 1)?;
        let (_, _, height, width) = response.dims4()?;
        let center = width / 2;
        ensure!(height == width, "응답 볼륨이 정방이 아닙니다: {}x{}", height, width);

        // 중앙 탭 대각 = 각 채널의 제곱 노름
        let center_slice = response.i((.., .., center, center))?;
        let eye = Tensor::eye(o, response.dtype(), response.device())?;
        let sq_norms = center_slice.mul(&eye)?.sum(1)?;
        let norms = sq_norms.detach().sqrt()?;

        let outer = norms.unsqueeze(1)?.broadcast_mul(&norms.unsqueeze(0)?)?;
        let normalized = response.broadcast_div(&outer.unsqueeze(2)?.unsqueeze(3)?)?;

        // 0이 아닌 값은 경계(±1)에서 멀어지도록 당긴다
        let zeros = normalized.zeros_like()?;
        let sign = normalized
            .gt(&zeros)?
            .to_dtype(normalized.dtype())?
            .sub(&normalized.lt(&zeros)?.to_dtype(normalized.dtype())?)?;
        let pulled = normalized.sub(&sign.affine(CONV_BOUNDARY_EPS, 0.0)?)?;
        let angles = acos(&clamp_unit(&pulled, 0.0)?)?;

        let identity_mask = identity_at_center(o, height, width, center, kernel)?;

        log::trace!(
            "conv stats: o={}, k={}, stride={}, padding={}, response={}x{}",
            o, kw, stride, padding, height, width
        );

        Ok(Self { response, center, norms, angles, identity_mask })
    }

    /// Σ (response[i, i, c, c] - 1)²
    pub fn norm_loss(&self) -> Result<Tensor> {
        let diag = select_or_zero(&self.identity_mask, &self.response.affine(1.0, -1.0)?)?;
        Ok(diag.sqr()?.sum_all()?)
    }

    /// 중앙 대각 이외의 모든 응답에 대한 각도 손실
    pub fn angle_loss(&self, target: AngleTarget) -> Result<Tensor> {
        target.validate()?;
        let others = self.identity_mask.eq(&self.identity_mask.zeros_like()?)?;

        match target {
            AngleTarget::Orthogonal => {
                let error = select_or_zero(&others, &self.angles.affine(1.0, -target.theta())?)?;
                Ok(error.sqr()?.sum_all()?)
            }
            AngleTarget::Separated(_) => {
                let theta = target.theta();
                let mirrored = target.mirrored_theta();

                let too_close = mask_and(&self.angles.lt(&filled_like(&self.angles, theta)?)?, &others)?;
                let too_opposed = mask_and(&self.angles.gt(&filled_like(&self.angles, mirrored)?)?, &others)?;

                let close_err = select_or_zero(&too_close, &self.angles.affine(1.0, -theta)?)?;
                let opposed_err = select_or_zero(&too_opposed, &self.angles.affine(1.0, -mirrored)?)?;
                Ok(close_err.sqr()?.sum_all()?.add(&opposed_err.sqr()?.sum_all()?)?)
            }
        }
    }

    /// 두 손실을 함께 계산
    pub fn losses(&self, target: AngleTarget) -> Result<RegLoss> {
        Ok(RegLoss::new(self.norm_loss()?, self.angle_loss(target)?))
    }
}

/// [i, i, c, c] 위치에만 1이 있는 (o, o, H, W) u8 마스크
fn identity_at_center(o: usize, height: usize, width: usize, center: usize, like: &Tensor) -> Result<Tensor> {
    let mut data = vec![0u8; o * o * height * width];
    for i in 0..o {
        let idx = ((i * o + i) * height + center) * width + center;
        data[idx] = 1;
    }
    Ok(Tensor::from_vec(data, (o, o, height, width), like.device())?)
}
