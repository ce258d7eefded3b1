//! Squad formation model.
//!
//! Pure data: member slots, the requested center, and the clamp that keeps every active member
//! inside the stage. Units read their target position from here; nothing here touches the ECS.
//!
//! Plane mapping: an authoring offset `(x, y, z)` lands on the simulation plane as `(x, z)`,
//! so a negative `z` puts a member behind the leader.

use std::ops::Range;

use bevy::prelude::*;

use crate::config::SquadComposition;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementBounds {
    /// Absolute limits relative to the spawn origin. Member offsets are not considered.
    FreeRange { left: f32, right: f32 },
    /// Stage/lane edges. The center is reduced by the outermost member offsets.
    Lane { min_x: f32, max_x: f32 },
    Unclamped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SquadMember {
    pub prefab: String,
    pub offset: Vec3,
    pub active: bool,
    pub unit: Option<Entity>,
}

impl SquadMember {
    pub fn new(prefab: impl Into<String>, offset: Vec3) -> Self {
        Self { prefab: prefab.into(), offset, active: true, unit: None }
    }

    #[inline]
    pub fn plane_offset(&self) -> Vec2 {
        Vec2::new(self.offset.x, self.offset.z)
    }

    #[inline]
    pub fn is_leader_slot(&self) -> bool {
        self.offset == Vec3::ZERO
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Formation {
    members: Vec<SquadMember>,
    bounds: MovementBounds,
    origin_x: f32,
    /// Requested (clamped) center.
    target_x: f32,
    /// Observed center (the leader's actual x).
    center_x: f32,
    min_offset_x: f32,
    max_offset_x: f32,
}

impl Default for Formation {
    fn default() -> Self {
        Self::new(MovementBounds::Unclamped, 0.0)
    }
}

impl Formation {
    pub fn new(bounds: MovementBounds, origin_x: f32) -> Self {
        Self {
            members: Vec::new(),
            bounds,
            origin_x,
            target_x: origin_x,
            center_x: origin_x,
            min_offset_x: 0.0,
            max_offset_x: 0.0,
        }
    }

    pub fn from_composition(comp: &SquadComposition, bounds: MovementBounds, origin_x: f32) -> Self {
        let mut f = Self::new(bounds, origin_x);
        f.members = comp
            .members
            .iter()
            .map(|m| SquadMember {
                prefab: m.prefab.clone(),
                offset: Vec3::from_array(m.offset),
                active: m.active,
                unit: None,
            })
            .collect();

        match comp.active_count {
            Some(n) => {
                f.set_active_member_count(n);
            }
            None => f.recalculate_bounds(),
        }
        f
    }

    pub fn members(&self) -> &[SquadMember] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&SquadMember> {
        self.members.get(index)
    }

    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().enumerate().filter(|(_, m)| m.active).map(|(i, _)| i)
    }

    pub fn active_count(&self) -> usize {
        self.members.iter().filter(|m| m.active).count()
    }

    pub fn bind_unit(&mut self, index: usize, unit: Option<Entity>) {
        if let Some(m) = self.members.get_mut(index) {
            m.unit = unit;
        }
    }

    /// Slot index currently bound to `unit`.
    pub fn index_of(&self, unit: Entity) -> Option<usize> {
        self.members.iter().position(|m| m.unit == Some(unit))
    }

    #[inline]
    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.center_x
    }

    pub fn set_center_x(&mut self, x: f32) {
        self.center_x = x;
    }

    pub fn bounds(&self) -> MovementBounds {
        self.bounds
    }

    /// Leftmost/rightmost active offset.
    pub fn offset_bounds(&self) -> (f32, f32) {
        (self.min_offset_x, self.max_offset_x)
    }

    /// Accumulate a lateral delta into the target center and clamp it.
    pub fn apply_movement(&mut self, delta_x: f32) -> f32 {
        self.set_target_x(self.target_x + delta_x)
    }

    pub fn set_target_x(&mut self, x: f32) -> f32 {
        self.target_x = self.clamp_center(x);
        self.target_x
    }

    pub fn clamp_center(&self, x: f32) -> f32 {
        match self.bounds {
            MovementBounds::Unclamped => x,
            MovementBounds::FreeRange { left, right } => {
                x.clamp(self.origin_x + left.min(right), self.origin_x + left.max(right))
            }
            MovementBounds::Lane { min_x, max_x } => {
                let lo = min_x - self.min_offset_x;
                let hi = max_x - self.max_offset_x;
                if lo <= hi {
                    x.clamp(lo, hi)
                } else {
                    // Formation is wider than the lane: center it.
                    (min_x + max_x) * 0.5 - (self.min_offset_x + self.max_offset_x) * 0.5
                }
            }
        }
    }

    /// Rescan active members for min/max offset x. Call after any composition change.
    pub fn recalculate_bounds(&mut self) {
        let (lo, hi) = self
            .members
            .iter()
            .filter(|m| m.active)
            .map(|m| m.offset.x)
            .fold(None, |acc: Option<(f32, f32)>, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
            .unwrap_or((0.0, 0.0));
        self.min_offset_x = lo;
        self.max_offset_x = hi;
        self.target_x = self.clamp_center(self.target_x);
    }

    /// Staggered offset for the member at list position `index`.
    ///
    /// Odd indices go right, even go left; the row is `ceil(index / 2)`.
    pub fn staggered_offset(index: usize, step: Vec2) -> Vec3 {
        let row = index.div_ceil(2) as f32;
        let side = if index % 2 == 1 { 1.0 } else { -1.0 };
        Vec3::new(side * row * step.x, 0.0, -row * step.y)
    }

    /// Append `count` active members. Returns the new slot indices.
    pub fn add_members(&mut self, prefab: &str, count: usize, step: Vec2) -> Range<usize> {
        let start = self.members.len();
        for i in start..start + count {
            self.members.push(SquadMember::new(prefab, Self::staggered_offset(i, step)));
        }
        self.recalculate_bounds();
        start..self.members.len()
    }

    /// Activate the first `n` members, deactivate the rest.
    ///
    /// Returns the indices that went from active to inactive.
    pub fn set_active_member_count(&mut self, n: usize) -> Vec<usize> {
        let mut deactivated = Vec::new();
        for (i, m) in self.members.iter_mut().enumerate() {
            let active = i < n;
            if m.active && !active {
                deactivated.push(i);
            }
            m.active = active;
        }
        self.recalculate_bounds();
        deactivated
    }

    /// Deactivate up to `count` trailing active members, never the leader and never the last one.
    pub fn retire(&mut self, count: usize) -> Vec<usize> {
        let leader = self.leader_index();
        let keep = self.active_count().saturating_sub(count).max(1);
        let surplus = self.active_count().saturating_sub(keep);

        let retired: Vec<usize> = self
            .active_indices()
            .filter(|i| Some(*i) != leader)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .take(surplus)
            .collect();

        for &i in &retired {
            self.members[i].active = false;
        }
        if !retired.is_empty() {
            self.recalculate_bounds();
        }
        retired
    }

    /// Active member closest to the center; ties go to the lowest index.
    pub fn leader_index(&self) -> Option<usize> {
        self.active_indices().min_by(|a, b| {
            let la = self.members[*a].plane_offset().length_squared();
            let lb = self.members[*b].plane_offset().length_squared();
            la.total_cmp(&lb).then(a.cmp(b))
        })
    }

    /// Drop a member out of the formation (death/retire) without shifting indices.
    pub fn deactivate(&mut self, index: usize) {
        if let Some(m) = self.members.get_mut(index) {
            if m.active {
                m.active = false;
                self.recalculate_bounds();
            }
        }
    }

    /// World target for a member with the given plane offset.
    #[inline]
    pub fn member_target(&self, plane_offset: Vec2, line_y: f32) -> Vec2 {
        Vec2::new(self.target_x + plane_offset.x, line_y + plane_offset.y)
    }
}
