//! Per-schedule in-flight guard so a slow tick and its successor never fire
//! the same schedule twice concurrently.

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InFlightGuard {
    active: DashMap<Uuid, ()>,
}

/// Held for the duration of one fire; removes its schedule from the guard
/// on drop regardless of how the fire finished.
pub struct InFlightPermit<'a> {
    guard: &'a InFlightGuard,
    schedule_id: Uuid,
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.active.remove(&self.schedule_id);
    }
}

impl InFlightGuard {
    /// Claim `schedule_id`, returning `None` if it's already in flight.
    pub fn try_acquire(&self, schedule_id: Uuid) -> Option<InFlightPermit<'_>> {
        if self.active.insert(schedule_id, ()).is_some() {
            return None;
        }
        Some(InFlightPermit { guard: self, schedule_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_while_first_is_held() {
        let guard = InFlightGuard::default();
        let id = Uuid::new_v4();
        let first = guard.try_acquire(id);
        assert!(first.is_some());
        assert!(guard.try_acquire(id).is_none());
    }

    #[test]
    fn dropping_a_permit_releases_the_schedule() {
        let guard = InFlightGuard::default();
        let id = Uuid::new_v4();
        let permit = guard.try_acquire(id).unwrap();
        drop(permit);
        assert!(guard.try_acquire(id).is_some());
    }
}
