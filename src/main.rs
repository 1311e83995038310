use adreg::core::metrics::AverageMeter;
use adreg::core::regularizers::{adk, partition_weights, regularize, LayerWeight, RegularizerConfig, RegularizerKind};
use adreg::core::schedule::{Dataset, ExperimentKey, Model, RegVariant, ScheduleController};
use adreg::AngleTarget;
use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{Optimizer, SGD};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::FRAC_PI_3;

const STEPS_PER_EPOCH: usize = 25;
const EPOCH_STRIDE: usize = 30;
const LAST_EPOCH: usize = 180;

/// 작은 합성곱 모델의 가중치
struct DemoModel {
    stem: Var,
    block: Var,
    shortcut: Var,
    fc: Var,
}

impl DemoModel {
    fn random(seed: u64, device: &Device) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut var = |shape: &[usize], scale: f32| -> Result<Var> {
            let n: usize = shape.iter().product();
            let values: Vec<f32> = (0..n).map(|_| rng.gen_range(-scale..scale)).collect();
            Ok(Var::from_tensor(&Tensor::from_vec(values, shape, device)?)?)
        };

        Ok(Self {
            stem: var(&[8, 3, 3, 3], 0.5)?,
            block: var(&[8, 8, 3, 3], 0.3)?,
            shortcut: var(&[8, 8, 1, 1], 0.5)?,
            fc: var(&[10, 8], 0.5)?,
        })
    }

    fn vars(&self) -> Vec<Var> {
        vec![self.stem.clone(), self.block.clone(), self.shortcut.clone(), self.fc.clone()]
    }

    fn layers(&self) -> Result<Vec<LayerWeight>> {
        Ok(vec![
            LayerWeight::conv2d("stem", self.stem.as_tensor().clone(), 1)?,
            LayerWeight::conv2d("block.conv", self.block.as_tensor().clone(), 2)?,
            LayerWeight::conv2d("block.shortcut", self.shortcut.as_tensor().clone(), 2)?,
            LayerWeight::linear("fc", self.fc.as_tensor().clone()),
        ])
    }
}

fn report(model: &DemoModel, target: AngleTarget) -> Result<()> {
    for layer in model.layers()? {
        let (norm, angle) = adk(&layer.weight, target)?.to_scalars()?;
        println!("   - {:<16} norm_loss={:.5} angle_loss={:.5}", layer.name, norm, angle);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🧭 각도 비상관 정규화 데모\n");

    let device = Device::Cpu;
    let config = RegularizerConfig::new()
        .with_kind(RegularizerKind::Adc)
        .with_target(AngleTarget::separated(FRAC_PI_3)?);
    config.validate()?;
    println!("구성: {}", config.to_json_pretty()?);

    let key = ExperimentKey::new(Dataset::Cifar100, Model::ResNet18, RegVariant::from(config.kind));
    let mut schedule = ScheduleController::from_key(key)?;

    let model = DemoModel::random(42, &device)?;
    let mut sgd = SGD::new(model.vars(), 0.1)?;

    println!("\n[초기 상태]");
    report(&model, config.target)?;

    for epoch in (0..=LAST_EPOCH).step_by(EPOCH_STRIDE) {
        let hp = schedule.advance(epoch)?;
        hp.apply_learning_rate(&mut sgd);

        let mut meter = AverageMeter::new("reg");
        for _ in 0..STEPS_PER_EPOCH {
            let weights = partition_weights(&model.layers()?, config.include_fc);
            let Some(loss) = regularize(&weights, config.kind, config.target)? else {
                break;
            };

            let mut objective = loss.total(hp.reg_strength)?;
            let params: Vec<Tensor> = model.vars().iter().map(|v| v.as_tensor().clone()).collect();
            if let Some(decay) = hp.weight_decay_penalty(&params)? {
                objective = objective.add(&decay)?;
            }

            let (norm, angle) = loss.to_scalars()?;
            meter.update(norm + angle, 1);
            sgd.backward_step(&objective)?;
        }

        println!(
            "epoch {:>3} | lr {:.1e} | wd {:.1e} | strength {:.1e} | {}",
            epoch,
            hp.learning_rate,
            hp.weight_decay,
            hp.reg_strength,
            meter
        );
    }

    println!("\n[최종 상태]");
    report(&model, config.target)?;

    let fc = model.fc.as_tensor().to_dtype(DType::F64)?;
    let norms = fc.sqr()?.sum(1)?.sqrt()?.to_vec1::<f64>()?;
    println!("\nfc 행 노름: {:?}", norms.iter().map(|n| format!("{:.3}", n)).collect::<Vec<_>>());
    println!("\n✅ 완료");
    Ok(())
}
