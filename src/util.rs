/// `part` as a percentage of `whole`, or None when `whole` is zero
pub fn percentage(part: usize, whole: usize) -> Option<f64> {
    match whole {
        0 => None,
        w => Some(part as f64 / w as f64 * 100.0),
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3, 3), Some(100.0));
        assert_eq!(percentage(0, 4), Some(0.0));
        assert_eq!(percentage(1, 0), None);
        let two_thirds = percentage(2, 3).unwrap();
        assert!((two_thirds - 66.6667).abs() < 0.001);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[100.0, 50.0]), Some(75.0));
        assert_eq!(mean(&[42.0]), Some(42.0));
        assert_eq!(mean(&[]), None);
    }
}
