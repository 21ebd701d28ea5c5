const MAX_HITS: usize = 5;

/// Picks the indices of the most likely classes from per-class log scores, best first.
///
/// The best class is always taken. Each following class is taken while its score
/// is within one sample standard deviation of the previously taken one, so a
/// clear winner yields a short list and an ambiguous distribution yields up to
/// [`MAX_HITS`] entries.
pub fn shortlist(scores: &[f64]) -> Vec<usize> {
    if scores.is_empty() {
        return vec![];
    }
    let stddev = sample_stddev(scores);

    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut result = Vec::with_capacity(MAX_HITS);
    let mut last = scores[ranked[0]];
    for index in ranked.into_iter().take(MAX_HITS) {
        let score = scores[index];
        log::debug!("hit={} score={score} last={last} stddev={stddev}", result.len());
        if (score - last).abs() > stddev {
            break;
        }
        result.push(index);
        last = score;
    }
    result
}

fn sample_stddev(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn empty() {
        assert!(shortlist(&[]).is_empty());
    }

    #[test]
    fn single_class() {
        assert_eq!(vec![0], shortlist(&[-3.0]));
    }

    #[test]
    fn clear_winner_yields_single_hit() {
        assert_eq!(vec![2], shortlist(&[-100.0, -101.0, -1.0, -99.0]));
    }

    #[rstest]
    #[case(vec![-5.0, -5.0, -5.0])]
    #[case(vec![-5.0; 8])]
    #[case(vec![-1.0, -1.1, -1.2, -1.3, -1.4, -1.5, -1.6, -30.0])]
    fn flat_distribution_yields_up_to_five(#[case] scores: Vec<f64>) {
        let hits = shortlist(&scores);
        assert_eq!(scores.len().min(5), hits.len());
    }

    #[test]
    fn tolerance_is_chained_from_last_kept() {
        // stddev is ~2.24. No step exceeds 2, but the spread from the best is 6.
        let scores = [-10.0, -14.0, -12.0, -16.0, -13.0];
        assert_eq!(vec![0, 2, 4, 1, 3], shortlist(&scores));
    }

    #[test]
    fn gap_stops_the_list() {
        let scores = [-1.0, -1.5, -20.0, -21.0, -22.0];
        assert_eq!(vec![0, 1], shortlist(&scores));
    }

    #[rstest]
    #[case(vec![-3.0, -1.0, -2.0])]
    #[case(vec![-7.5, -7.4, -40.0, -7.6, -7.3, -7.2, -9.0])]
    #[case(vec![0.0, -1e9])]
    fn length_is_bounded_and_top_is_max(#[case] scores: Vec<f64>) {
        let hits = shortlist(&scores);
        assert!((1..=5).contains(&hits.len()));
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(max, scores[hits[0]]);
    }
}
