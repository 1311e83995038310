use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// top-k 분류 정확도 (퍼센트)
///
/// `output`은 (batch, classes) 로짓, `target`은 (batch,) 정답 인덱스.
/// 반환값은 `topk` 순서대로 정답이 상위 k개 안에 든 샘플 비율 × 100.
pub fn accuracy(output: &Tensor, target: &Tensor, topk: &[usize]) -> Result<Vec<f64>> {
    let (batch, classes) = output.dims2()?;
    ensure!(batch > 0, "빈 배치의 정확도는 정의되지 않습니다");
    ensure!(target.dims1()? == batch, "정답 개수({})가 배치 크기({})와 다릅니다", target.dims1()?, batch);
    for &k in topk {
        ensure!(k >= 1 && k <= classes, "k={}는 1..={} 범위여야 합니다", k, classes);
    }

    let labels = target.to_dtype(DType::U32)?;
    let max_label = labels.max(0)?.to_scalar::<u32>()? as usize;
    ensure!(max_label < classes, "정답 인덱스 {}가 클래스 수 {}를 넘습니다", max_label, classes);

    let max_k = topk.iter().copied().max().unwrap_or(1);
    let ranked = output.contiguous()?.arg_sort_last_dim(false)?.narrow(1, 0, max_k)?;
    // (batch, max_k): 정답과 같은 인덱스는 행마다 최대 하나
    let correct = ranked.broadcast_eq(&labels.reshape((batch, 1))?)?.to_dtype(DType::F64)?;

    topk.iter()
        .map(|&k| {
            let hits = correct.narrow(1, 0, k)?.sum_all()?.to_scalar::<f64>()?;
            Ok(hits * 100.0 / batch as f64)
        })
        .collect()
}
