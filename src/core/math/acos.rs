//! 미분 가능한 역코사인 연산
//!
//! candle에는 acos 단항 연산이 없으므로 `CustomOp1`로 구현한다.
//! 순방향은 CPU 저장소(F32/F64)에서 계산하고, 역방향은 candle 텐서 연산으로
//! 구성하므로 그래디언트 그래프에 그대로 연결된다.

use candle_core::{CpuStorage, CustomOp1, Device, Layout, Shape, Tensor};

/// 역방향에서 `1 - x²`의 하한 (x = ±1 에서 무한대 그래디언트 방지)
pub const ACOS_GRAD_FLOOR: f64 = 1e-12;

/// acos 커스텀 연산
#[derive(Debug, Clone, Copy, Default)]
pub struct Acos;

impl CustomOp1 for Acos {
    fn name(&self) -> &'static str {
        "acos"
    }

    fn cpu_fwd(&self, storage: &CpuStorage, layout: &Layout) -> candle_core::Result<(CpuStorage, Shape)> {
        let (start, end) = match layout.contiguous_offsets() {
            Some(offsets) => offsets,
            None => candle_core::bail!("acos: 연속 메모리 레이아웃이 필요합니다"),
        };

        let output = match storage {
            CpuStorage::F32(values) => {
                CpuStorage::F32(values[start..end].iter().map(|v| v.acos()).collect())
            }
            CpuStorage::F64(values) => {
                CpuStorage::F64(values[start..end].iter().map(|v| v.acos()).collect())
            }
            _ => candle_core::bail!("acos: F32/F64 텐서만 지원합니다"),
        };

        Ok((output, layout.shape().clone()))
    }

    /// d/dx acos(x) = -1 / sqrt(1 - x²)
    fn bwd(&self, arg: &Tensor, _res: &Tensor, grad_res: &Tensor) -> candle_core::Result<Option<Tensor>> {
        let one_minus_sq = arg.sqr()?.affine(-1.0, 1.0)?;
        let floor = one_minus_sq.ones_like()?.affine(ACOS_GRAD_FLOOR, 0.0)?;
        let denom = one_minus_sq.maximum(&floor)?.sqrt()?;
        let grad_arg = grad_res.neg()?.div(&denom)?;
        Ok(Some(grad_arg))
    }
}

/// 원소별 acos. 입력은 [-1, 1] 범위여야 한다 (범위 밖은 NaN).
///
/// CPU가 아닌 텐서는 CPU에서 계산한 뒤 원래 장치로 되돌린다. 두 번의 장치 이동은
/// 그래프에 기록되므로 그래디언트도 원래 장치로 돌아온다.
pub fn acos(x: &Tensor) -> candle_core::Result<Tensor> {
    if !needs_host_roundtrip(x.device()) {
        return x.contiguous()?.apply_op1(Acos);
    }
    let device = x.device().clone();
    let y = x.to_device(&Device::Cpu)?.contiguous()?.apply_op1(Acos)?;
    y.to_device(&device)
}

/// 순방향 커널이 없는 장치인지
pub fn needs_host_roundtrip(device: &Device) -> bool {
    !device.is_cpu()
}
