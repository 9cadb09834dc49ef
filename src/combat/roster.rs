//! Combined unit storage for both sides of a combat.
//!
//! `arenasim` hands unit storage to bevy's ECS (`Query<&mut Combatant>`);
//! this core has no ECS, so the two teams live in one owned `Vec<CombatUnit>`
//! with `UnitId` as a direct index. `two_mut` is the `split_at_mut` idiom,
//! needed wherever the emitter mutates an attacker/caster and a target/ally
//! in the same call.

use crate::model::unit::{CombatUnit, Side, UnitId};

#[derive(Debug)]
pub struct Roster {
    units: Vec<CombatUnit>,
}

impl Roster {
    pub fn new(units: Vec<CombatUnit>) -> Self {
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: UnitId) -> &CombatUnit {
        &self.units[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: UnitId) -> &mut CombatUnit {
        &mut self.units[id.0 as usize]
    }

    pub fn try_get(&self, id: UnitId) -> Option<&CombatUnit> {
        self.units.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatUnit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CombatUnit> {
        self.units.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        (0..self.units.len() as u32).map(UnitId)
    }

    pub fn side_ids(&self, side: Side) -> impl Iterator<Item = UnitId> + '_ {
        self.units
            .iter()
            .filter(move |u| u.side() == side)
            .map(|u| u.id())
    }

    pub fn alive(&self, side: Side) -> impl Iterator<Item = &CombatUnit> {
        self.units.iter().filter(move |u| u.side() == side && u.is_alive())
    }

    pub fn side_has_survivor(&self, side: Side) -> bool {
        self.units.iter().any(|u| u.side() == side && u.is_alive())
    }

    /// Simultaneous mutable borrows of two distinct units. Panics if the
    /// ids are equal or out of range.
    pub fn two_mut(&mut self, a: UnitId, b: UnitId) -> (&mut CombatUnit, &mut CombatUnit) {
        assert_ne!(a, b, "two_mut requires distinct unit ids");
        let (lo, hi) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let (left, right) = self.units.split_at_mut(hi.0 as usize);
        let lo_ref = &mut left[lo.0 as usize];
        let hi_ref = &mut right[0];
        if a.0 < b.0 {
            (lo_ref, hi_ref)
        } else {
            (hi_ref, lo_ref)
        }
    }
}
