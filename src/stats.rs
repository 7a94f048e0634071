use crate::model::{CommitCountAggregate, DescribeStats};
use console::style;

/// Summary statistics of `num_commits`. `None` when there is nothing to describe.
pub fn describe(counts: &[CommitCountAggregate]) -> Option<DescribeStats> {
    if counts.is_empty() {
        return None;
    }

    let mut values: Vec<f64> = counts.iter().map(|c| c.num_commits as f64).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    // Sample standard deviation, undefined for a single value.
    let std = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };

    Some(DescribeStats {
        count: n,
        mean,
        std,
        min: values[0],
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.50),
        p75: quantile(&values, 0.75),
        max: values[n - 1],
    })
}

/// Linear interpolation between closest ranks over sorted `values`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}

pub fn print_describe(stats: Option<&DescribeStats>) {
    println!("{}", style("Commits per PR").bold());
    println!("{}", "─".repeat(30));

    let Some(s) = stats else {
        println!("No pull requests to describe");
        return;
    };

    let lines = [
        ("count", s.count as f64),
        ("mean", s.mean),
        ("std", s.std),
        ("min", s.min),
        ("25%", s.p25),
        ("50%", s.p50),
        ("75%", s.p75),
        ("max", s.max),
    ];
    for (label, value) in lines {
        println!("{:<8} {:>12.6}", label, value);
    }
}
