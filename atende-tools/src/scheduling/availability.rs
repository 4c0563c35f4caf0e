//! Open-slot computation
//!
//! Intersects provider working-hour windows with existing non-canceled
//! bookings to produce the offerable start times for a service on a date.

use atende_core::{AtendeResult, ScheduleId, ScheduleService};
use atende_storage::{CalendarStore, DirectoryStore};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeSet;

/// Candidate start times are generated on this grid.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Compute the sorted open start times for a service on a date.
///
/// - No active providers, or no availability windows for the weekday:
///   empty result.
/// - A candidate is occupied when any existing appointment's
///   `[start, end)` interval contains it, regardless of provider: all
///   providers' bookings block the same slot pool for the schedule.
/// - Candidates run from each window's start through `end - duration`
///   inclusive; duplicates across windows collapse.
pub async fn compute_slots<D, C>(
    directory: &D,
    calendar: &C,
    schedule_id: ScheduleId,
    date: NaiveDate,
    service: &ScheduleService,
) -> AtendeResult<Vec<NaiveTime>>
where
    D: DirectoryStore + ?Sized,
    C: CalendarStore + ?Sized,
{
    let duration_minutes = service.parsed_duration()?.num_minutes();

    let providers = directory.provider_list_active(schedule_id).await?;
    if providers.is_empty() {
        return Ok(Vec::new());
    }

    let day_of_week = date.weekday().num_days_from_sunday() as u8;
    let mut windows = Vec::new();
    for provider in &providers {
        windows.extend(directory.availability_list(provider.id, day_of_week).await?);
    }
    if windows.is_empty() {
        return Ok(Vec::new());
    }

    let appointments = calendar.appointment_list_for_day(schedule_id, date).await?;
    let booked: Vec<(i64, i64)> = appointments
        .iter()
        .map(|a| (minutes(a.start_time), minutes(a.end_time)))
        .collect();

    let mut slots = BTreeSet::new();
    for window in &windows {
        let window_end = minutes(window.end_time);
        let mut candidate = minutes(window.start_time);
        while candidate + duration_minutes <= window_end {
            let occupied = booked
                .iter()
                .any(|&(start, end)| start <= candidate && end > candidate);
            if !occupied {
                slots.insert(candidate);
            }
            candidate += SLOT_STEP_MINUTES;
        }
    }

    Ok(slots.into_iter().filter_map(time_from_minutes).collect())
}

fn minutes(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) / 60
}

fn time_from_minutes(total: i64) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt((total / 60) as u32, (total % 60) as u32, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atende_core::format_hm;
    use atende_test_utils::{
        monday_on_or_after, seed_provider, seed_schedule, seed_service, seed_window,
    };
    use atende_core::{Appointment, AppointmentId, AppointmentStatus, ChatId, CustomerId};
    use atende_storage::{CalendarStore as _, MockStore};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn hm(slots: &[NaiveTime]) -> Vec<String> {
        slots.iter().copied().map(format_hm).collect()
    }

    #[tokio::test]
    async fn test_no_providers_means_no_slots() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        let service = seed_service(&store, schedule.id, "Corte", "00:30");
        let date = monday_on_or_after(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());

        let slots = compute_slots(&store, &store, schedule.id, date, &service)
            .await
            .unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_no_windows_for_weekday_means_no_slots() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        let service = seed_service(&store, schedule.id, "Corte", "00:30");
        let provider = seed_provider(&store, schedule.id, "Ana");
        // Window on Monday only.
        seed_window(&store, provider.id, 1, time(9, 0), time(12, 0));

        let monday = monday_on_or_after(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        let tuesday = monday.succ_opt().unwrap();
        let slots = compute_slots(&store, &store, schedule.id, tuesday, &service)
            .await
            .unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_slot_grid_respects_duration() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        let service = seed_service(&store, schedule.id, "Corte", "00:30");
        let provider = seed_provider(&store, schedule.id, "Ana");
        seed_window(&store, provider.id, 1, time(9, 0), time(10, 0));

        let monday = monday_on_or_after(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        let slots = compute_slots(&store, &store, schedule.id, monday, &service)
            .await
            .unwrap();
        assert_eq!(hm(&slots), vec!["09:00", "09:30"]);

        // A one-hour service only fits once in the same window.
        let long = seed_service(&store, schedule.id, "Coloração", "01:00");
        let slots = compute_slots(&store, &store, schedule.id, monday, &long)
            .await
            .unwrap();
        assert_eq!(hm(&slots), vec!["09:00"]);
    }

    #[tokio::test]
    async fn test_existing_booking_blocks_contained_candidates() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        let service = seed_service(&store, schedule.id, "Corte", "00:30");
        let provider = seed_provider(&store, schedule.id, "Ana");
        seed_window(&store, provider.id, 1, time(9, 0), time(11, 0));

        let monday = monday_on_or_after(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        let now = chrono::Utc::now();
        store
            .appointment_insert(&Appointment {
                id: AppointmentId::now_v7(),
                schedule_id: schedule.id,
                customer_id: CustomerId::now_v7(),
                provider_id: provider.id,
                service_id: service.id,
                date: monday,
                start_time: time(9, 30),
                end_time: time(10, 0),
                status: AppointmentStatus::Scheduled,
                notes: None,
                chat_id: Some(ChatId::now_v7()),
                metadata: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let slots = compute_slots(&store, &store, schedule.id, monday, &service)
            .await
            .unwrap();
        assert_eq!(hm(&slots), vec!["09:00", "10:00", "10:30"]);
        // Never offer a time inside an existing booking's interval.
        assert!(!slots.contains(&time(9, 30)));
    }

    #[tokio::test]
    async fn test_slots_deduplicate_across_providers() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        let service = seed_service(&store, schedule.id, "Corte", "00:30");
        let ana = seed_provider(&store, schedule.id, "Ana");
        let bia = seed_provider(&store, schedule.id, "Bia");
        seed_window(&store, ana.id, 1, time(9, 0), time(10, 0));
        seed_window(&store, bia.id, 1, time(9, 30), time(10, 30));

        let monday = monday_on_or_after(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        let slots = compute_slots(&store, &store, schedule.id, monday, &service)
            .await
            .unwrap();
        // 09:30 appears in both windows but is offered once, sorted.
        assert_eq!(hm(&slots), vec!["09:00", "09:30", "10:00"]);
    }
}
