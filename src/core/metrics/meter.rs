use std::fmt;

/// 누적 평균 측정기
#[derive(Debug, Clone, PartialEq)]
pub struct AverageMeter {
    pub name: String,
    /// 마지막으로 들어온 값
    pub val: f64,
    pub sum: f64,
    pub count: usize,
}

impl AverageMeter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), val: 0.0, sum: 0.0, count: 0 }
    }

    pub fn reset(&mut self) {
        self.val = 0.0;
        self.sum = 0.0;
        self.count = 0;
    }

    /// `val`을 가중치 `n`으로 누적 (배치 평균이면 n = 배치 크기)
    pub fn update(&mut self, val: f64, n: usize) {
        self.val = val;
        self.sum += val * n as f64;
        self.count += n;
    }

    /// 누적 평균, 아직 값이 없으면 0
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl fmt::Display for AverageMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.4} ({:.4})", self.name, self.val, self.avg())
    }
}
