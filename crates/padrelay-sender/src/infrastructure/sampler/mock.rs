//! Scripted sampler for tests and demo mode.
//!
//! Replays a fixed list of snapshots, one per call, then keeps returning the
//! last one (or starts over when looping).

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use padrelay_core::{BitLayout, Snapshot};

use super::SamplerFactory;
use crate::application::transmit_state::{SampleError, StateSampler};

/// A [`StateSampler`] that replays a script instead of reading a device.
pub struct ScriptedSampler {
    layout: BitLayout,
    script: Vec<Snapshot>,
    cursor: usize,
    looping: bool,
    samples: Arc<AtomicUsize>,
}

impl ScriptedSampler {
    /// Creates a sampler over `script`.  An empty script samples as idle.
    pub fn new(layout: BitLayout, script: Vec<Snapshot>) -> Self {
        Self {
            layout,
            script,
            cursor: 0,
            looping: false,
            samples: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Restarts the script after its last snapshot instead of holding it.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Shares a sample counter, e.g. across every sampler a factory opens.
    pub fn with_counter(mut self, samples: Arc<AtomicUsize>) -> Self {
        self.samples = samples;
        self
    }

    /// Number of times [`sample`](StateSampler::sample) was called.
    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }
}

impl StateSampler for ScriptedSampler {
    fn sample(&mut self) -> Result<Snapshot, SampleError> {
        self.samples.fetch_add(1, Ordering::Relaxed);

        let Some(last) = self.script.len().checked_sub(1) else {
            return Ok(Snapshot::capture(&self.layout, |_| false));
        };
        let snapshot = self.script[self.cursor.min(last)].clone();
        self.cursor += 1;
        if self.looping && self.cursor > last {
            self.cursor = 0;
        }
        Ok(snapshot)
    }
}

/// Opens a fresh [`ScriptedSampler`] per connection.
pub struct ScriptedSamplerFactory {
    layout: BitLayout,
    script: Vec<Snapshot>,
    looping: bool,
    opened: AtomicUsize,
    samples: Arc<AtomicUsize>,
}

impl ScriptedSamplerFactory {
    pub fn new(layout: BitLayout, script: Vec<Snapshot>) -> Self {
        Self {
            layout,
            script,
            looping: false,
            opened: AtomicUsize::new(0),
            samples: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Number of samplers handed out so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Total samples taken across every opened sampler.
    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }
}

impl SamplerFactory for ScriptedSamplerFactory {
    fn open(&self) -> Result<Box<dyn StateSampler>, SampleError> {
        self.opened.fetch_add(1, Ordering::Relaxed);
        let mut sampler = ScriptedSampler::new(self.layout.clone(), self.script.clone())
            .with_counter(Arc::clone(&self.samples));
        if self.looping {
            sampler = sampler.looping();
        }
        Ok(Box::new(sampler))
    }
}

/// Presses and releases every signal in turn, holding each for `hold_ticks`.
pub fn demo_script(layout: &BitLayout, hold_ticks: usize) -> Vec<Snapshot> {
    let idle = Snapshot::capture(layout, |_| false);
    let mut script = Vec::with_capacity(layout.len() * hold_ticks * 2);
    for signal in layout.signals() {
        let held = Snapshot::capture(layout, |s| s == signal);
        script.extend(std::iter::repeat(held).take(hold_ticks));
        script.extend(std::iter::repeat(idle.clone()).take(hold_ticks));
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.active().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_scripted_sampler_holds_last_snapshot() {
        // Arrange
        let layout = BitLayout::default();
        let script = vec![
            Snapshot::from_active(&layout, &["left"]).unwrap(),
            Snapshot::from_active(&layout, &["up"]).unwrap(),
        ];
        let mut sampler = ScriptedSampler::new(layout, script);

        // Act
        let seen: Vec<Vec<String>> = (0..4)
            .map(|_| {
                let snap = sampler.sample().unwrap();
                active(&snap).into_iter().map(String::from).collect()
            })
            .collect();

        // Assert
        assert_eq!(seen, vec![vec!["left"], vec!["up"], vec!["up"], vec!["up"]]);
        assert_eq!(sampler.sample_count(), 4);
    }

    #[test]
    fn test_looping_sampler_starts_over() {
        let layout = BitLayout::default();
        let script = vec![
            Snapshot::from_active(&layout, &["down"]).unwrap(),
            Snapshot::from_active(&layout, &[] as &[&str]).unwrap(),
        ];
        let mut sampler = ScriptedSampler::new(layout, script).looping();

        sampler.sample().unwrap();
        sampler.sample().unwrap();
        let third = sampler.sample().unwrap();

        assert_eq!(active(&third), vec!["down"]);
    }

    #[test]
    fn test_empty_script_samples_idle() {
        let mut sampler = ScriptedSampler::new(BitLayout::default(), Vec::new());

        let snapshot = sampler.sample().unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.active().count(), 0);
    }

    #[test]
    fn test_factory_opens_independent_samplers_with_shared_counter() {
        // Arrange
        let layout = BitLayout::default();
        let factory = ScriptedSamplerFactory::new(
            layout.clone(),
            vec![Snapshot::from_active(&layout, &["right"]).unwrap()],
        );

        // Act
        let mut a = factory.open().unwrap();
        let mut b = factory.open().unwrap();
        a.sample().unwrap();
        b.sample().unwrap();
        b.sample().unwrap();

        // Assert
        assert_eq!(factory.opened(), 2);
        assert_eq!(factory.sample_count(), 3);
    }

    #[test]
    fn test_demo_script_presses_each_signal_in_order() {
        let layout = BitLayout::default();

        let script = demo_script(&layout, 2);

        assert_eq!(script.len(), 16);
        assert_eq!(active(&script[0]), vec!["left"]);
        assert!(active(&script[2]).is_empty());
        assert_eq!(active(&script[12]), vec!["right"]);
    }
}
