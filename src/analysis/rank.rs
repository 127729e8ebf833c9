use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::error::AnalysisError;
use crate::analysis::fft::SpectralProfile;
use crate::analysis::series::BinKey;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RankedFrequency {
    pub frequency: usize,
    pub magnitude: f64,
}

/// One bin's frequencies ordered by magnitude, largest first.
/// Position in `entries` is the bin-local rank.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedSpectrum {
    pub entries: Vec<RankedFrequency>,
}
impl RankedSpectrum {
    pub fn position_of(&self, frequency: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.frequency == frequency)
    }
}

/// Presentation order for the average-rank profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Smallest average rank first: most consistently prominent frequencies lead.
    Ascending,
    /// Largest average rank first.
    #[default]
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrequencyScore {
    pub frequency: usize,
    pub value: f64,
}

/// Cross-bin summaries indexed by frequency.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrossBinAggregate {
    pub bin_count: usize,
    pub magnitude_sum: Vec<f64>,
    pub average_rank: Vec<f64>,
}
impl CrossBinAggregate {
    pub fn frequency_count(&self) -> usize {
        self.magnitude_sum.len()
    }
    pub fn mean_spectrum(&self) -> Vec<f64> {
        let bins = self.bin_count as f64;
        self.magnitude_sum.iter().map(|s| s / bins).collect()
    }
    /// Mean magnitude per frequency, smallest first.
    pub fn by_mean_magnitude(&self) -> Vec<FrequencyScore> {
        sorted_scores(&self.mean_spectrum(), RankOrder::Ascending)
    }
    pub fn by_average_rank(&self, order: RankOrder) -> Vec<FrequencyScore> {
        sorted_scores(&self.average_rank, order)
    }
}

fn sorted_scores(values: &[f64], order: RankOrder) -> Vec<FrequencyScore> {
    let mut scores: Vec<FrequencyScore> = values
        .iter()
        .enumerate()
        .map(|(frequency, &value)| FrequencyScore { frequency, value })
        .collect();
    match order {
        RankOrder::Ascending => scores.sort_by(|a, b| a.value.total_cmp(&b.value)),
        RankOrder::Descending => scores.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
    scores
}

/// Ranks per-bin spectra and folds them into [`CrossBinAggregate`].
pub struct RankAggregator;
impl RankAggregator {
    /// Stable descending sort; equal magnitudes keep ascending frequency order.
    pub fn rank(profile: &SpectralProfile) -> RankedSpectrum {
        let mut entries: Vec<RankedFrequency> = profile
            .magnitudes
            .iter()
            .enumerate()
            .map(|(frequency, &magnitude)| RankedFrequency {
                frequency,
                magnitude,
            })
            .collect();
        entries.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        RankedSpectrum { entries }
    }
    pub fn aggregate(
        profiles: &BTreeMap<BinKey, SpectralProfile>,
    ) -> Result<CrossBinAggregate, AnalysisError> {
        let length = profiles
            .values()
            .next()
            .map(SpectralProfile::len)
            .ok_or(AnalysisError::EmptyInput)?;
        let mut magnitude_sum = vec![0.0; length];
        let mut rank_sum = vec![0.0; length];
        for profile in profiles.values() {
            if profile.len() != length {
                return Err(AnalysisError::LengthMismatch {
                    expected: length,
                    actual: profile.len(),
                });
            }
            for (sum, magnitude) in magnitude_sum.iter_mut().zip(&profile.magnitudes) {
                *sum += magnitude;
            }
            for (position, entry) in Self::rank(profile).entries.iter().enumerate() {
                rank_sum[entry.frequency] += position as f64;
            }
        }
        let bin_count = profiles.len();
        let average_rank = rank_sum.iter().map(|r| r / bin_count as f64).collect();
        Ok(CrossBinAggregate {
            bin_count,
            magnitude_sum,
            average_rank,
        })
    }
}
#[cfg(test)]
mod tests {
    use super::*;

    fn profiles(rows: &[&[f64]]) -> BTreeMap<BinKey, SpectralProfile> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                (
                    BinKey::interval(i as f64, i as f64 + 1.0),
                    SpectralProfile {
                        magnitudes: row.to_vec(),
                    },
                )
            })
            .collect()
    }
    #[test]
    fn rank_sorts_descending_with_stable_ties() {
        let ranked = RankAggregator::rank(&SpectralProfile {
            magnitudes: vec![1.0, 5.0, 1.0, 3.0, 5.0],
        });
        let order: Vec<usize> = ranked.entries.iter().map(|e| e.frequency).collect();
        assert_eq!(order, vec![1, 4, 3, 0, 2]);
        assert_eq!(ranked.position_of(3), Some(2));
        assert_eq!(ranked.position_of(9), None);
    }
    #[test]
    fn three_constant_bins() {
        let rows: [&[f64]; 3] = [&[4.0, 0.0, 0.0, 0.0], &[0.0; 4], &[8.0, 0.0, 0.0, 0.0]];
        let aggregate = RankAggregator::aggregate(&profiles(&rows)).unwrap();
        assert_eq!(aggregate.bin_count, 3);
        assert_eq!(aggregate.magnitude_sum, vec![12.0, 0.0, 0.0, 0.0]);
        assert_eq!(aggregate.mean_spectrum(), vec![4.0, 0.0, 0.0, 0.0]);
        assert_eq!(aggregate.average_rank[0], 0.0);
        // remaining ties keep index order in every bin
        assert_eq!(aggregate.average_rank, vec![0.0, 1.0, 2.0, 3.0]);
    }
    #[test]
    fn magnitude_sum_is_elementwise() {
        let rows: [&[f64]; 3] = [&[0.1, 0.7, 2.3], &[1.9, 0.2, 0.0], &[3.3, 4.4, 5.5]];
        let aggregate = RankAggregator::aggregate(&profiles(&rows)).unwrap();
        for f in 0..3 {
            let expected = rows[0][f] + rows[1][f] + rows[2][f];
            assert_eq!(aggregate.magnitude_sum[f], expected);
        }
    }
    #[test]
    fn average_rank_is_mean_position() {
        let aggregate =
            RankAggregator::aggregate(&profiles(&[&[1.0, 9.0, 5.0], &[9.0, 1.0, 5.0]])).unwrap();
        // bin 0 ranks [1, 2, 0]; bin 1 ranks [0, 2, 1]
        assert_eq!(aggregate.average_rank, vec![1.0, 1.0, 1.0]);
        let aggregate =
            RankAggregator::aggregate(&profiles(&[&[1.0, 9.0, 5.0], &[2.0, 8.0, 6.0]])).unwrap();
        assert_eq!(aggregate.average_rank, vec![2.0, 0.0, 1.0]);
    }
    #[test]
    fn presentation_orders() {
        let aggregate =
            RankAggregator::aggregate(&profiles(&[&[1.0, 9.0, 5.0], &[2.0, 8.0, 6.0]])).unwrap();
        let by_rank: Vec<usize> = aggregate
            .by_average_rank(RankOrder::Descending)
            .iter()
            .map(|s| s.frequency)
            .collect();
        assert_eq!(by_rank, vec![0, 2, 1]);
        let by_rank: Vec<usize> = aggregate
            .by_average_rank(RankOrder::Ascending)
            .iter()
            .map(|s| s.frequency)
            .collect();
        assert_eq!(by_rank, vec![1, 2, 0]);
        let by_mean: Vec<usize> = aggregate
            .by_mean_magnitude()
            .iter()
            .map(|s| s.frequency)
            .collect();
        assert_eq!(by_mean, vec![0, 2, 1]);
    }
    #[test]
    fn mismatched_lengths_are_rejected() {
        let rows: [&[f64]; 2] = [&[1.0, 2.0], &[1.0, 2.0, 3.0]];
        let err = RankAggregator::aggregate(&profiles(&rows)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LengthMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }
    #[test]
    fn no_bins_is_empty_input() {
        let err = RankAggregator::aggregate(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
    }
}
