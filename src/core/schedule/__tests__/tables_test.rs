use crate::core::regularizers::RegularizerKind;
use crate::core::schedule::*;
use anyhow::Result;
use std::io::Write;

fn key(variant: RegVariant) -> ExperimentKey {
    ExperimentKey::new(Dataset::Cifar100, Model::ResNet18, variant)
}

#[test]
fn 마일스톤_인덱스_테스트() {
    let ms = [20, 50, 70, 120];

    assert_eq!(milestone_index(&ms, 0), 0);
    assert_eq!(milestone_index(&ms, 19), 0);
    assert_eq!(milestone_index(&ms, 20), 1);
    assert_eq!(milestone_index(&ms, 69), 2);
    assert_eq!(milestone_index(&ms, 120), 4);
    assert_eq!(milestone_index(&ms, 150), 4, "마지막 인덱스에서 고정");
    assert_eq!(milestone_index(&[], 10), 0);
}

#[test]
fn 마일스톤_인덱스_단조성_테스트() {
    let ms = [20, 50, 70, 120];
    let indices: Vec<usize> = (0..200).map(|e| milestone_index(&ms, e)).collect();
    assert!(indices.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn 알려진_조합_조회_테스트() -> Result<()> {
    let adk = ScheduleTables::lookup(key(RegVariant::Adk))?;
    assert_eq!(adk.lr.milestones, vec![60, 120, 160]);
    assert_eq!(adk.lr.values.len(), 4);

    let reg = adk.reg.as_ref().expect("ADK는 정규화 테이블이 있어야 함");
    assert_eq!(reg.milestones, vec![20, 50, 70, 120]);
    assert_eq!(reg.strength, vec![1.0; 5]);
    assert_eq!(reg.weight_decay, vec![5e-4; 5]);

    let srip = ScheduleTables::lookup(key(RegVariant::Srip))?;
    assert_eq!(srip.reg.expect("SRIP").strength[4], 0.0);
    Ok(())
}

#[test]
fn 모든_정의된_조합은_유효_테스트() -> Result<()> {
    let variants = [
        RegVariant::Base,
        RegVariant::So,
        RegVariant::Dso,
        RegVariant::Srip,
        RegVariant::Ocnn,
        RegVariant::Adk,
        RegVariant::Adc,
        RegVariant::Ph0,
        RegVariant::Mst,
    ];
    for variant in variants {
        let tables = milestones(key(variant)).expect("정의된 조합");
        tables.validate()?;
        assert_eq!(tables.is_regularized(), variant != RegVariant::Base, "{}", variant);
    }
    Ok(())
}

#[test]
fn 정의되지_않은_조합_테스트() {
    assert!(milestones(key(RegVariant::Cad)).is_none());

    let err = ScheduleTables::lookup(key(RegVariant::Cad)).unwrap_err();
    assert!(err.to_string().contains("cifar100/resnet18/CAD"), "{}", err);
}

#[test]
fn 문자열_파싱_테스트() -> Result<()> {
    assert_eq!("CIFAR100".parse::<Dataset>()?, Dataset::Cifar100);
    assert_eq!("ResNet18".parse::<Model>()?, Model::ResNet18);
    assert_eq!("base".parse::<RegVariant>()?, RegVariant::Base);
    assert_eq!("ph0".parse::<RegVariant>()?, RegVariant::Ph0);
    assert_eq!(RegVariant::Dso.to_string(), "DSO");

    assert!("imagenet".parse::<Dataset>().is_err());
    assert!("vgg16".parse::<Model>().is_err());
    assert!("L2".parse::<RegVariant>().is_err());

    assert_eq!(RegVariant::from(RegularizerKind::Adc), RegVariant::Adc);
    Ok(())
}

#[test]
fn 실험키_json_테스트() -> Result<()> {
    let json = serde_json::to_string(&key(RegVariant::Base))?;
    assert_eq!(json, r#"{"dataset":"cifar100","model":"resnet18","variant":"base"}"#);

    let parsed: ExperimentKey = serde_json::from_str(r#"{"dataset":"cifar100","model":"resnet18","variant":"ADC"}"#)?;
    assert_eq!(parsed, key(RegVariant::Adc));
    Ok(())
}

#[test]
fn 테이블_json_왕복_테스트() -> Result<()> {
    let tables = ScheduleTables::lookup(key(RegVariant::Adc))?;
    let parsed = ScheduleTables::from_json_str(&tables.to_json_pretty()?)?;
    assert_eq!(parsed, tables);
    Ok(())
}

#[test]
fn 테이블_파일_로드_테스트() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{"lr": {{"milestones": [5], "values": [0.1, 0.01]}}, "base_weight_decay": 0.0005}}"#
    )?;

    let tables = ScheduleTables::from_json_file(file.path())?;
    assert!(!tables.is_regularized(), "reg 생략 시 None");
    assert_eq!(tables.lr.values, vec![0.1, 0.01]);
    Ok(())
}

#[test]
fn 잘못된_테이블_거부_테스트() {
    // 값 개수 부족
    let short = r#"{"lr": {"milestones": [5, 10], "values": [0.1, 0.01]}, "base_weight_decay": 0.0}"#;
    assert!(ScheduleTables::from_json_str(short).is_err());

    // 정렬되지 않은 마일스톤
    let unsorted = r#"{"lr": {"milestones": [10, 5], "values": [0.1, 0.01, 0.001]}, "base_weight_decay": 0.0}"#;
    assert!(ScheduleTables::from_json_str(unsorted).is_err());

    // 음수 강도
    let negative = r#"{
        "lr": {"milestones": [], "values": [0.1]},
        "base_weight_decay": 0.0,
        "reg": {"milestones": [3], "weight_decay": [0.0, 0.0], "strength": [1.0, -1.0]}
    }"#;
    assert!(ScheduleTables::from_json_str(negative).is_err());
}
