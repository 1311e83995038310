use crate::core::masking::AngleTarget;
use crate::core::regularizers::*;
use anyhow::Result;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use candle_core::{DType, Device, Tensor, Var};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::{FRAC_PI_3, FRAC_PI_4, PI};

fn random_weight(seed: u64, shape: &[usize]) -> Result<Tensor> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n: usize = shape.iter().product();
    let values: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Ok(Tensor::from_vec(values, shape, &Device::Cpu)?)
}

#[test]
fn 직교_단위벡터_adk_테스트() -> Result<()> {
    let w = Tensor::new(&[[1.0f32, 0.0], [0.0, 1.0]], &Device::Cpu)?;
    let (norm, angle) = adk(&w, AngleTarget::Orthogonal)?.to_scalars()?;

    assert_abs_diff_eq!(norm, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(angle, 0.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn 동일_단위벡터_cad_테스트() -> Result<()> {
    // CAD는 분모 eps가 없으므로 유사도가 정확히 1, 각도 0
    let w = Tensor::new(&[[1.0f64, 0.0], [1.0, 0.0]], &Device::Cpu)?;
    let (norm, angle) = cad(&w, AngleTarget::Orthogonal)?.to_scalars()?;

    // 복제 집합 4개 벡터 중 양의 상관 비대각 순서쌍: (0,1), (1,0), (2,3), (3,2)
    assert_abs_diff_eq!(norm, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(angle, 4.0 * PI * PI / 4.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn cad는_adk의_두배_테스트() -> Result<()> {
    let w = random_weight(11, &[6, 2, 2])?;

    for target in [AngleTarget::Orthogonal, AngleTarget::separated(FRAC_PI_3)?] {
        let (cad_norm, cad_angle) = cad(&w, target)?.to_scalars()?;
        let (adk_norm, adk_angle) = adk(&w, target)?.to_scalars()?;

        assert_relative_eq!(cad_norm, 2.0 * adk_norm, max_relative = 1e-9);
        assert_relative_eq!(cad_angle, 2.0 * adk_angle, max_relative = 1e-5);
    }
    Ok(())
}

#[test]
fn 위반없음_손실0_테스트() -> Result<()> {
    // 60°씩 떨어진 세 단위벡터: |s| = 0.5 < cos(π/6) 이므로 위반 없음
    let angles = [0.0f64, PI / 3.0, 2.0 * PI / 3.0];
    let values: Vec<f64> = angles.iter().flat_map(|a| [a.cos(), a.sin()]).collect();
    let w = Tensor::from_vec(values, (3, 2), &Device::Cpu)?;

    let (_, angle) = adk(&w, AngleTarget::separated(PI / 6.0)?)?.to_scalars()?;
    assert!(!angle.is_nan());
    assert_eq!(angle, 0.0);
    Ok(())
}

#[test]
fn 합성곱_가중치_평탄화_adk_테스트() -> Result<()> {
    let w = random_weight(5, &[4, 3, 3, 3])?;
    let flat = w.reshape((4, 27))?;

    let (a_norm, a_angle) = adk(&w, AngleTarget::Orthogonal)?.to_scalars()?;
    let (b_norm, b_angle) = adk(&flat, AngleTarget::Orthogonal)?.to_scalars()?;
    assert_eq!(a_norm, b_norm);
    assert_eq!(a_angle, b_angle);
    Ok(())
}

#[test]
fn adc_델타커널_손실0_테스트() -> Result<()> {
    let mut data = vec![0f32; 2 * 2 * 3 * 3];
    data[4] = 1.0;
    data[(2 + 1) * 9 + 4] = 1.0;
    let kernel = Tensor::from_vec(data, (2, 2, 3, 3), &Device::Cpu)?;

    let (norm, angle) = adc(&kernel, AngleTarget::separated(FRAC_PI_4)?, 2)?.to_scalars()?;
    assert_abs_diff_eq!(norm, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(angle, 0.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn 영벡터_adk_유한성_테스트() -> Result<()> {
    let w = Var::new(&[[0.0f32, 0.0], [1.0, 0.5], [0.2, 0.9]], &Device::Cpu)?;

    for target in [AngleTarget::Orthogonal, AngleTarget::separated(FRAC_PI_3)?] {
        let loss = adk(w.as_tensor(), target)?;
        let (norm, angle) = loss.to_scalars()?;
        assert!(norm.is_finite() && angle.is_finite());

        let grads = loss.total(1.0)?.backward()?;
        let grad = grads.get(&w).expect("그래디언트").flatten_all()?.to_vec1::<f32>()?;
        assert!(grad.iter().all(|g| g.is_finite()), "영벡터가 있어도 ADK 그래디언트는 유한: {:?}", grad);
    }
    Ok(())
}

#[test]
fn cad_그래디언트_전달_테스트() -> Result<()> {
    let w = Var::from_tensor(&random_weight(21, &[5, 4])?.to_dtype(DType::F32)?)?;

    let grads = cad(w.as_tensor(), AngleTarget::separated(FRAC_PI_4)?)?.total(0.1)?.backward()?;
    let grad = grads.get(&w).expect("그래디언트").to_vec2::<f32>()?;

    assert_eq!(grad.len(), 5);
    assert!(grad.iter().flatten().all(|g| g.is_finite()));
    assert!(grad.iter().flatten().any(|g| *g != 0.0));
    Ok(())
}

#[test]
fn 잘못된_목표각도_거부_테스트() -> Result<()> {
    let w = random_weight(1, &[3, 3])?;
    assert!(adk(&w, AngleTarget::Separated(3.0)).is_err());
    assert!(cad(&w, AngleTarget::Separated(0.0)).is_err());
    Ok(())
}
