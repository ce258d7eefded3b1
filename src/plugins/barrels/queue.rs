//! Barrel reward queue: ordered barrels on the approach axis.
//!
//! ```text
//! Empty ──push──► AutoMoving ──head at threshold (Stop)──► StoppedAtThreshold
//!                     ▲                                        │ remove / push
//!                     └──────── queue emptied, refilled        ▼
//!                                                        SlidingForward ──packed──► StoppedAtThreshold
//! ```
//!
//! Invariant: entries are ordered by queue index and `y` strictly increases with the index.
//! A slide-forward repacks to `threshold + i * spacing` without reordering.
//!
//! Plain data keyed by an opaque id; the plugin maps ids to entities and copies `y` onto
//! transforms.

use serde::{Deserialize, Serialize};

/// What happens when the queue head reaches the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// The whole queue freezes at the threshold.
    #[default]
    Stop,
    /// Barrels crossing the threshold are removed without reward.
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMotion {
    Empty,
    AutoMoving,
    StoppedAtThreshold,
    SlidingForward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueGeometry {
    pub threshold_y: f32,
    pub spacing: f32,
    pub speed: f32,
    pub slide_speed: f32,
    pub policy: ThresholdPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedBarrel<Id> {
    pub id: Id,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarrelQueue<Id> {
    entries: Vec<QueuedBarrel<Id>>,
    motion: QueueMotion,
}

impl<Id> Default for BarrelQueue<Id> {
    fn default() -> Self {
        Self { entries: Vec::new(), motion: QueueMotion::Empty }
    }
}

impl<Id: Copy + PartialEq> BarrelQueue<Id> {
    pub fn entries(&self) -> &[QueuedBarrel<Id>] {
        &self.entries
    }

    pub fn motion(&self) -> QueueMotion {
        self.motion
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, id: Id) -> Option<usize> {
        self.entries.iter().position(|b| b.id == id)
    }

    /// Append a wave behind the current tail, spaced from `base_y`.
    pub fn push_wave(&mut self, ids: impl IntoIterator<Item = Id>, base_y: f32, geo: &QueueGeometry) {
        let mut pushed = false;
        for (i, id) in ids.into_iter().enumerate() {
            let mut y = base_y + i as f32 * geo.spacing;
            if let Some(tail) = self.entries.last() {
                y = y.max(tail.y + geo.spacing);
            }
            self.entries.push(QueuedBarrel { id, y });
            pushed = true;
        }
        if !pushed {
            return;
        }

        self.motion = match self.motion {
            QueueMotion::Empty | QueueMotion::AutoMoving => QueueMotion::AutoMoving,
            // Newcomers pack up behind a frozen head.
            QueueMotion::StoppedAtThreshold | QueueMotion::SlidingForward => QueueMotion::SlidingForward,
        };
    }

    /// Remove a destroyed barrel. Returns its former index.
    ///
    /// A queue stopped at the threshold slides the survivors forward.
    pub fn remove(&mut self, id: Id) -> Option<usize> {
        let index = self.position(id)?;
        self.entries.remove(index);

        if self.entries.is_empty() {
            self.motion = QueueMotion::Empty;
        } else if self.motion == QueueMotion::StoppedAtThreshold {
            self.motion = QueueMotion::SlidingForward;
        }
        Some(index)
    }

    /// One simulation step. Returns ids dropped by the `Destroy` policy (no reward).
    pub fn advance(&mut self, dt: f32, geo: &QueueGeometry) -> Vec<Id> {
        let mut crossed = Vec::new();

        match self.motion {
            QueueMotion::Empty | QueueMotion::StoppedAtThreshold => {}
            QueueMotion::AutoMoving => {
                let step = geo.speed * dt;
                for b in &mut self.entries {
                    b.y -= step;
                }

                match geo.policy {
                    ThresholdPolicy::Stop => {
                        let head = self.entries.first().map(|b| b.y);
                        if let Some(head_y) = head.filter(|y| *y <= geo.threshold_y) {
                            // Shift everyone by the overshoot so spacing is untouched.
                            let back = geo.threshold_y - head_y;
                            for b in &mut self.entries {
                                b.y += back;
                            }
                            self.motion = QueueMotion::StoppedAtThreshold;
                        }
                    }
                    ThresholdPolicy::Destroy => {
                        let cut = self.entries.iter().take_while(|b| b.y < geo.threshold_y).count();
                        crossed.extend(self.entries.drain(..cut).map(|b| b.id));
                        if self.entries.is_empty() {
                            self.motion = QueueMotion::Empty;
                        }
                    }
                }
            }
            QueueMotion::SlidingForward => {
                let step = geo.slide_speed * dt;
                let mut packed = true;
                for (i, b) in self.entries.iter_mut().enumerate() {
                    let target = geo.threshold_y + i as f32 * geo.spacing;
                    let delta = target - b.y;
                    if delta.abs() <= step {
                        b.y = target;
                    } else {
                        b.y += step * delta.signum();
                        packed = false;
                    }
                }
                if packed {
                    self.motion = QueueMotion::StoppedAtThreshold;
                }
            }
        }
        crossed
    }

    /// Drop everything (retry, encounter end).
    pub fn clear(&mut self) -> Vec<Id> {
        self.motion = QueueMotion::Empty;
        self.entries.drain(..).map(|b| b.id).collect()
    }
}
