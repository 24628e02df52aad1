/// Mean of a set of millisecond samples.
pub fn mean_ms(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: u64 = samples.iter().sum();
    Some(sum as f64 / samples.len() as f64)
}

/// Population standard deviation of millisecond samples.
pub fn std_dev_ms(samples: &[u64]) -> Option<f64> {
    let mean = mean_ms(samples)?;
    let variance = samples
        .iter()
        .map(|&value| {
            let diff = mean - value as f64;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;

    Some(variance.sqrt())
}

/// Median of millisecond samples, averaging the middle pair for even counts.
pub fn median_ms(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean_ms(&[200, 300, 400]), Some(300.0));
        assert_eq!(mean_ms(&[250, 260]), Some(255.0));
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean_ms(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev_ms(&[300, 300, 300]), Some(0.0));
        let sd = std_dev_ms(&[200, 400]).unwrap();
        assert!((sd - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_std_dev_empty() {
        assert_eq!(std_dev_ms(&[]), None);
    }

    #[test]
    fn test_median() {
        assert_eq!(median_ms(&[420, 180, 300]), Some(300.0));
        assert_eq!(median_ms(&[400, 200, 300, 100]), Some(250.0));
        assert_eq!(median_ms(&[]), None);
    }
}
