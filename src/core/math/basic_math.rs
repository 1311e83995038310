use candle_core::{DType, Device, Tensor};

/// `x`와 같은 shape/dtype/device를 가지며 `value`로 채워진 텐서
pub fn filled_like(x: &Tensor, value: f64) -> candle_core::Result<Tensor> {
    x.zeros_like()?.affine(1.0, value)
}

/// [-1 + margin, 1 - margin] 구간으로 클램프 (acos 정의역 보호)
pub fn clamp_unit(x: &Tensor, margin: f64) -> candle_core::Result<Tensor> {
    let lo = filled_like(x, -1.0 + margin)?;
    let hi = filled_like(x, 1.0 - margin)?;
    x.maximum(&lo)?.minimum(&hi)
}

/// 자기 자신 쌍(대각)을 제외한 m×m u8 마스크
pub fn off_diagonal_mask(m: usize, device: &Device) -> candle_core::Result<Tensor> {
    let eye = Tensor::eye(m, DType::U8, device)?;
    eye.eq(&eye.zeros_like()?)
}

/// u8 마스크 두 개의 논리곱
pub fn mask_and(a: &Tensor, b: &Tensor) -> candle_core::Result<Tensor> {
    a.mul(b)
}

/// 마스크가 선택한 원소 수
pub fn mask_count(mask: &Tensor) -> candle_core::Result<usize> {
    let count = mask.to_dtype(DType::F64)?.sum_all()?.to_scalar::<f64>()?;
    Ok(count as usize)
}

/// 마스크 밖 원소를 0으로 바꾼다. 그래디언트도 마스크 밖에서는 0.
pub fn select_or_zero(mask: &Tensor, x: &Tensor) -> candle_core::Result<Tensor> {
    mask.where_cond(x, &x.zeros_like()?)
}
