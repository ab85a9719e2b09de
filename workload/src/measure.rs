use std::time::{Duration, Instant};

use log::trace;

/// Repeats an operation and records how long each iteration took.
///
/// Warm-up iterations run exactly like measured ones but are not recorded. Parts of an
/// iteration wrapped in [`Iteration::untimed`] are subtracted from its duration, which lets an
/// operation populate or clear its store between iterations without that work being measured.
#[derive(Debug)]
pub struct Bencher {
    warmup: u64,
    iterations: u64,
    samples: Vec<Duration>,
}

impl Bencher {
    pub fn new(warmup: u64, iterations: u64) -> Self {
        Self {
            warmup,
            iterations,
            samples: Vec::new(),
        }
    }

    /// Runs `body` for every warm-up and measured iteration, stopping at the first error.
    pub fn measure_repeated<F>(&mut self, mut body: F) -> anyhow::Result<()>
    where
        F: FnMut(&mut Iteration) -> anyhow::Result<()>,
    {
        for _ in 0..self.warmup {
            let mut it = Iteration::start();
            body(&mut it)?;
        }
        self.samples.reserve(self.iterations as usize);
        for i in 0..self.iterations {
            let mut it = Iteration::start();
            body(&mut it)?;
            let elapsed = it.finish();
            trace!("iteration {i}: {elapsed:?}");
            self.samples.push(elapsed);
        }
        Ok(())
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Sum of every recorded iteration, the figure criterion's `iter_custom` expects.
    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    pub fn into_samples(self) -> Samples {
        Samples::new(self.samples)
    }
}

/// A single iteration in progress.
#[derive(Debug)]
pub struct Iteration {
    started: Instant,
    paused: Duration,
}

impl Iteration {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            paused: Duration::ZERO,
        }
    }

    /// Runs `f` without counting its time towards this iteration.
    pub fn untimed<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let r = f();
        self.paused += start.elapsed();
        r
    }

    fn finish(self) -> Duration {
        self.started.elapsed().saturating_sub(self.paused)
    }
}

/// Recorded iteration durations and the statistics reported for them.
///
/// Zero-length samples can only come from the clock's resolution, so they are counted as bogus
/// and left out of every statistic.
#[derive(Debug, Clone, Default)]
pub struct Samples {
    raw: Vec<Duration>,
    sorted: Vec<Duration>,
}

impl Samples {
    pub fn new(raw: Vec<Duration>) -> Self {
        let mut sorted = raw.iter().copied().filter(|d| !d.is_zero()).collect::<Vec<_>>();
        sorted.sort_unstable();
        Self { raw, sorted }
    }

    /// Every sample in recording order, bogus ones included.
    pub fn raw(&self) -> &[Duration] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn bogus(&self) -> usize {
        self.raw.len() - self.sorted.len()
    }

    pub fn min(&self) -> Option<Duration> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<Duration> {
        self.sorted.last().copied()
    }

    pub fn total(&self) -> Duration {
        self.sorted.iter().sum()
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.sorted.is_empty() {
            return None;
        }
        Some(self.total() / self.sorted.len() as u32)
    }

    pub fn median(&self) -> Option<Duration> {
        let n = self.sorted.len();
        match n {
            0 => None,
            _ if n % 2 == 1 => Some(self.sorted[n / 2]),
            _ => Some((self.sorted[n / 2 - 1] + self.sorted[n / 2]) / 2),
        }
    }

    /// Operations per second, counting `rows` operations per iteration.
    pub fn throughput(&self, rows: u64) -> Option<Throughput> {
        let per_sec = |d: Duration| rows as f64 / d.as_secs_f64();
        Some(Throughput {
            slowest: per_sec(self.max()?),
            mean: per_sec(self.mean()?),
            median: per_sec(self.median()?),
            fastest: per_sec(self.min()?),
        })
    }
}

/// Operations per second at the slowest, mean, median and fastest iteration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Throughput {
    pub slowest: f64,
    pub mean: f64,
    pub median: f64,
    pub fastest: f64,
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn warmup_is_not_recorded() {
        let mut calls = 0;
        let mut b = Bencher::new(3, 7);
        b.measure_repeated(|_| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 10);
        assert_eq!(b.samples().len(), 7);
    }

    #[test]
    fn untimed_is_excluded() {
        let mut b = Bencher::new(0, 3);
        b.measure_repeated(|it| {
            it.untimed(|| sleep(ms(40)));
            Ok(())
        })
        .unwrap();
        for &s in b.samples() {
            assert!(s < ms(40), "untimed sleep leaked into sample: {s:?}");
        }
    }

    #[test]
    fn timed_is_included() {
        let mut b = Bencher::new(0, 2);
        b.measure_repeated(|it| {
            let v = it.untimed(|| 5);
            sleep(ms(v));
            Ok(())
        })
        .unwrap();
        assert!(b.samples().iter().all(|&s| s >= ms(5)));
        assert!(b.total() >= ms(10));
    }

    #[test]
    fn error_stops_run() {
        let mut calls = 0;
        let mut b = Bencher::new(1, 10);
        let r = b.measure_repeated(|_| {
            calls += 1;
            if calls == 4 {
                anyhow::bail!("store failed");
            }
            Ok(())
        });
        assert_eq!(r.unwrap_err().to_string(), "store failed");
        assert_eq!(calls, 4);
        assert_eq!(b.samples().len(), 2);
    }

    #[test]
    fn statistics() {
        let s = Samples::new(vec![ms(4), ms(0), ms(1), ms(3), ms(2)]);
        assert_eq!(s.raw().len(), 5);
        assert_eq!(s.len(), 4);
        assert_eq!(s.bogus(), 1);
        assert_eq!(s.min(), Some(ms(1)));
        assert_eq!(s.max(), Some(ms(4)));
        assert_eq!(s.total(), ms(10));
        assert_eq!(s.mean(), Some(Duration::from_micros(2_500)));
        assert_eq!(s.median(), Some(Duration::from_micros(2_500)));

        let odd = Samples::new(vec![ms(9_000), ms(1_000), ms(2_000)]);
        assert_eq!(odd.median(), Some(ms(2_000)));
        assert_eq!(
            odd.throughput(10),
            Some(Throughput {
                slowest: 10.0 / 9.0,
                mean: 2.5,
                median: 5.0,
                fastest: 10.0,
            })
        );
    }

    #[test]
    fn empty_statistics() {
        let s = Samples::new(vec![Duration::ZERO; 3]);
        assert!(s.is_empty());
        assert_eq!(s.bogus(), 3);
        assert_eq!(s.min(), None);
        assert_eq!(s.median(), None);
        assert_eq!(s.mean(), None);
        assert_eq!(s.throughput(1), None);
    }
}
