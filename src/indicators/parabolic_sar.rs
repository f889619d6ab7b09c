// =============================================================================
// Parabolic SAR — Wilder's acceleration factor system
// =============================================================================
//
// Inherently sequential: each value depends on the trend direction, extreme
// point (EP) and acceleration factor (AF) carried from the previous bar.
//
//   SAR_t = SAR_{t-1} + AF * (EP - SAR_{t-1})
//
// AF starts at `af_start`, grows by `af_step` each time a new extreme is made
// and is capped at `af_max`. When price crosses the SAR the trend flips, the
// SAR jumps to the old EP and AF/EP reset.
//
// The first two bars seed the state; values are emitted from index 2.
// =============================================================================

use crate::market_data::Bar;

/// Acceleration-factor schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarSchedule {
    pub start: f64,
    pub step: f64,
    pub max: f64,
}

impl SarSchedule {
    fn is_valid(&self) -> bool {
        self.start > 0.0 && self.step > 0.0 && self.max >= self.start
    }
}

/// Recurrence state threaded through the fold.
#[derive(Debug, Clone, Copy)]
struct SarState {
    long: bool,
    sar: f64,
    ep: f64,
    af: f64,
}

impl SarState {
    fn seed(first: &Bar, second: &Bar, schedule: SarSchedule) -> Self {
        let long = second.close >= first.close;
        if long {
            Self {
                long,
                sar: first.low,
                ep: second.high,
                af: schedule.start,
            }
        } else {
            Self {
                long,
                sar: first.high,
                ep: second.low,
                af: schedule.start,
            }
        }
    }

    /// Advance one bar. `w` is `[bar_{t-2}, bar_{t-1}, bar_t]`.
    fn advance(self, w: &[Bar], schedule: SarSchedule) -> Self {
        let (prev2, prev1, bar) = (&w[0], &w[1], &w[2]);
        let projected = self.sar + self.af * (self.ep - self.sar);

        if self.long {
            // In an uptrend the SAR may not rise above the two previous lows.
            let sar = projected.min(prev1.low).min(prev2.low);
            if bar.low < sar {
                Self {
                    long: false,
                    sar: self.ep,
                    ep: bar.low,
                    af: schedule.start,
                }
            } else if bar.high > self.ep {
                Self {
                    sar,
                    ep: bar.high,
                    af: (self.af + schedule.step).min(schedule.max),
                    ..self
                }
            } else {
                Self { sar, ..self }
            }
        } else {
            // In a downtrend the SAR may not fall below the two previous highs.
            let sar = projected.max(prev1.high).max(prev2.high);
            if bar.high > sar {
                Self {
                    long: true,
                    sar: self.ep,
                    ep: bar.high,
                    af: schedule.start,
                }
            } else if bar.low < self.ep {
                Self {
                    sar,
                    ep: bar.low,
                    af: (self.af + schedule.step).min(schedule.max),
                    ..self
                }
            } else {
                Self { sar, ..self }
            }
        }
    }
}

/// Parabolic SAR series, one slot per bar.
///
/// Returns all `None` for fewer than three bars or an invalid AF schedule.
pub fn calculate_psar(bars: &[Bar], schedule: SarSchedule) -> Vec<Option<f64>> {
    if bars.len() < 3 || !schedule.is_valid() {
        return vec![None; bars.len()];
    }

    let seed = SarState::seed(&bars[0], &bars[1], schedule);
    let mut result = vec![None, None];
    result.extend(bars.windows(3).scan(seed, |state, w| {
        *state = state.advance(w, schedule);
        Some(Some(state.sar))
    }));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: SarSchedule = SarSchedule {
        start: 0.02,
        step: 0.02,
        max: 0.2,
    };

    fn bars(data: &[(f64, f64, f64)]) -> Vec<Bar> {
        data.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Bar::new(i as i64 * 86_400, close, high, low, close, 1_000.0))
            .collect()
    }

    #[test]
    fn psar_uptrend_below_price() {
        let data: Vec<(f64, f64, f64)> = (0..20)
            .map(|i| {
                let base = 100.0 + i as f64 * 3.0;
                (base + 2.0, base - 1.0, base + 1.5)
            })
            .collect();
        let bars = bars(&data);
        let psar = calculate_psar(&bars, DEFAULT);
        assert_eq!(psar[0], None);
        assert_eq!(psar[1], None);
        for i in 2..20 {
            let sar = psar[i].unwrap();
            assert!(sar < bars[i].low, "PSAR {sar} should be below low {} at bar {i}", bars[i].low);
        }
    }

    #[test]
    fn psar_downtrend_above_price() {
        let data: Vec<(f64, f64, f64)> = (0..20)
            .map(|i| {
                let base = 200.0 - i as f64 * 3.0;
                (base + 1.0, base - 2.0, base - 1.5)
            })
            .collect();
        let bars = bars(&data);
        let psar = calculate_psar(&bars, DEFAULT);
        for i in 2..20 {
            let sar = psar[i].unwrap();
            assert!(sar > bars[i].high, "PSAR {sar} should be above high {} at bar {i}", bars[i].high);
        }
    }

    #[test]
    fn psar_flips_on_reversal() {
        let mut data: Vec<(f64, f64, f64)> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                (base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        // Sharp collapse well below any trailing SAR.
        data.push((95.0, 80.0, 81.0));
        let bars = bars(&data);
        let psar = calculate_psar(&bars, DEFAULT);
        let flipped = psar[10].unwrap();
        // After the flip SAR sits at the prior extreme point (highest high).
        assert_eq!(flipped, bars[9].high);
        assert!(flipped > bars[10].high);
    }

    #[test]
    fn acceleration_factor_is_capped() {
        let schedule = SarSchedule {
            start: 0.02,
            step: 0.05,
            max: 0.1,
        };
        let bars = bars(&[(10.0, 9.0, 9.5), (11.0, 10.0, 10.5), (12.0, 11.0, 11.5)]);
        let mut state = SarState::seed(&bars[0], &bars[1], schedule);
        for _ in 0..5 {
            state = state.advance(&bars, schedule);
            state.ep = 0.0; // force a fresh extreme on every step
        }
        assert!((state.af - 0.1).abs() < 1e-12);
    }

    #[test]
    fn too_short_or_invalid_schedule() {
        let two = bars(&[(10.0, 9.0, 9.5), (11.0, 10.0, 10.5)]);
        assert_eq!(calculate_psar(&two, DEFAULT), vec![None, None]);

        let three = bars(&[(10.0, 9.0, 9.5), (11.0, 10.0, 10.5), (12.0, 11.0, 11.5)]);
        let bad = SarSchedule {
            start: 0.0,
            ..DEFAULT
        };
        assert_eq!(calculate_psar(&three, bad), vec![None; 3]);
    }
}
