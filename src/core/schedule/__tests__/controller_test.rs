use crate::core::schedule::*;
use anyhow::Result;
use approx::assert_relative_eq;
use candle_core::{Device, Tensor, Var};
use candle_nn::{Optimizer, SGD};

fn key(variant: RegVariant) -> ExperimentKey {
    ExperimentKey::new(Dataset::Cifar100, Model::ResNet18, variant)
}

#[test]
fn 정규화_스케줄_전진_테스트() -> Result<()> {
    let mut controller = ScheduleController::from_key(key(RegVariant::Adc))?;

    let p0 = controller.advance(0)?;
    assert_eq!(p0.learning_rate, 1e-1);
    assert_eq!(p0.reg_strength, 1e-1);
    assert_eq!(p0.weight_decay, 1e-8);

    let p20 = controller.advance(20)?;
    assert_eq!(controller.reg_cursor(), 1);
    assert_eq!(p20.reg_strength, 1e-3);
    assert_eq!(p20.learning_rate, 1e-1, "학습률 커서는 독립");

    let p150 = controller.advance(150)?;
    assert_eq!(controller.reg_cursor(), 4);
    assert_eq!(controller.lr_cursor(), 2);
    assert_eq!(p150.reg_strength, 1e-8);
    assert_eq!(p150.weight_decay, 5e-4);
    assert_eq!(p150.learning_rate, 4e-3);

    controller.advance(500)?;
    assert_eq!(controller.lr_cursor(), 3, "마지막 값에서 고정");
    assert_eq!(controller.reg_cursor(), 4);
    Ok(())
}

#[test]
fn 기본_스케줄은_강도0_테스트() -> Result<()> {
    let mut controller = ScheduleController::from_key(key(RegVariant::Base))?;

    for epoch in [0, 60, 200] {
        let params = controller.advance(epoch)?;
        assert_eq!(params.reg_strength, 0.0);
        assert_eq!(params.weight_decay, 5e-4);
        assert_eq!(controller.reg_cursor(), 0);
    }
    assert_eq!(controller.advance(200)?.learning_rate, 8e-4);
    Ok(())
}

#[test]
fn 전진과_peek_일치_테스트() -> Result<()> {
    let mut controller = ScheduleController::from_key(key(RegVariant::So))?;

    for epoch in 0..180 {
        let peeked = controller.peek(epoch);
        assert_eq!(controller.advance(epoch)?, peeked, "epoch {}", epoch);
    }
    Ok(())
}

#[test]
fn peek은_커서를_움직이지_않음_테스트() -> Result<()> {
    let controller = ScheduleController::from_key(key(RegVariant::Dso))?;
    let later = controller.peek(100);

    assert_eq!(later.weight_decay, 5e-4);
    assert_eq!(controller.lr_cursor(), 0);
    assert_eq!(controller.last_epoch(), None);
    Ok(())
}

#[test]
fn 역행하는_epoch_거부_테스트() -> Result<()> {
    let mut controller = ScheduleController::from_key(key(RegVariant::Adk))?;
    controller.advance(30)?;
    controller.advance(30)?;

    assert!(controller.advance(10).is_err());
    assert_eq!(controller.last_epoch(), Some(30), "실패한 호출은 상태를 바꾸지 않음");

    controller.reset();
    assert_eq!(controller.advance(10)?.reg_strength, 1.0);
    Ok(())
}

#[test]
fn 잘못된_테이블로_생성_거부_테스트() {
    let tables = ScheduleTables::base(LrTable { milestones: vec![10], values: vec![0.1] }, 0.0);
    assert!(ScheduleController::new(tables).is_err());
    assert!(ScheduleController::from_key(key(RegVariant::Cad)).is_err());
}

#[test]
fn 옵티마이저_학습률_적용_테스트() -> Result<()> {
    let w = Var::new(&[1.0f32, 2.0], &Device::Cpu)?;
    let mut sgd = SGD::new(vec![w], 0.5)?;

    let mut controller = ScheduleController::from_key(key(RegVariant::Adk))?;
    let params = controller.advance(130)?;
    params.apply_learning_rate(&mut sgd);

    assert_eq!(sgd.learning_rate(), 4e-3);
    Ok(())
}

#[test]
fn 가중치감소_손실항_테스트() -> Result<()> {
    let params = EpochHyperParams { learning_rate: 0.1, weight_decay: 0.01, reg_strength: 0.0 };
    let a = Tensor::new(&[3.0f64, 4.0], &Device::Cpu)?;
    let b = Tensor::new(&[[1.0f64]], &Device::Cpu)?;

    let penalty = params.weight_decay_penalty(&[a, b])?.expect("손실항");
    assert_relative_eq!(penalty.to_scalar::<f64>()?, 0.5 * 0.01 * 26.0, max_relative = 1e-12);

    let none = EpochHyperParams { weight_decay: 0.0, ..params };
    assert!(none.weight_decay_penalty(&[Tensor::new(&[1.0f64], &Device::Cpu)?])?.is_none());
    assert!(params.weight_decay_penalty(&[])?.is_none());
    Ok(())
}
