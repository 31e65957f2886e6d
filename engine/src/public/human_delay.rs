//! Human-delay sampling: the engine's one nondeterministic primitive. The
//! engine never draws from an unseeded source itself; a host supplies a
//! [`HumanDelayRng`], and reusing the same sequence of samples across two
//! runs is what makes a run reproducible given identical inputs and a
//! fixed RNG.

use crate::public::program::HumanDelayConfig;

/// A source of uniform `[0, 1)` samples. A host typically backs this with
/// a seeded PRNG (e.g. `rand::rngs::StdRng`) so that two runs of the same
/// program are byte-for-byte reproducible.
pub trait HumanDelayRng {
    fn sample_unit(&mut self) -> f64;
}

/// Always returns `0.0`. Used when a program declares no `humanDelays`, and
/// in tests that don't care about delay jitter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl HumanDelayRng for NoDelay {
    fn sample_unit(&mut self) -> f64 {
        0.0
    }
}

/// Sample a delay (in seconds) for `action_id` from `delays`, using the
/// triangular distribution `Triangular(min, mode, max)` via inverse
/// transform sampling. Returns `0.0` if no config matches the action.
pub fn human_delay_sample(action_id: &str, delays: &[HumanDelayConfig], rng: &mut dyn HumanDelayRng) -> f64 {
    let Some(cfg) = delays.iter().find(|c| c.action_id == action_id) else {
        return 0.0;
    };
    if cfg.max <= cfg.min {
        return cfg.min.max(0.0);
    }
    let u = rng.sample_unit().clamp(0.0, 1.0);
    let fc = (cfg.mode - cfg.min) / (cfg.max - cfg.min);
    let sample = if u < fc {
        cfg.min + (u * (cfg.max - cfg.min) * (cfg.mode - cfg.min)).sqrt()
    } else {
        cfg.max - ((1.0 - u) * (cfg.max - cfg.min) * (cfg.max - cfg.mode)).sqrt()
    };
    sample.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);
    impl HumanDelayRng for Fixed {
        fn sample_unit(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn no_config_means_zero_delay() {
        let mut rng = Fixed(0.5);
        assert_eq!(human_delay_sample("train_villager", &[], &mut rng), 0.0);
    }

    #[test]
    fn degenerate_range_returns_min() {
        let delays = vec![HumanDelayConfig {
            action_id: "train_villager".into(),
            min: 10.0,
            mode: 10.0,
            max: 10.0,
        }];
        let mut rng = Fixed(0.9);
        assert_eq!(human_delay_sample("train_villager", &delays, &mut rng), 10.0);
    }

    #[test]
    fn samples_within_bounds() {
        let delays = vec![HumanDelayConfig {
            action_id: "train_villager".into(),
            min: 1.0,
            mode: 10.0,
            max: 10.0,
        }];
        for u in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0] {
            let mut rng = Fixed(u);
            let sample = human_delay_sample("train_villager", &delays, &mut rng);
            assert!((1.0..=10.0).contains(&sample), "sample {sample} out of bounds for u={u}");
        }
    }
}
