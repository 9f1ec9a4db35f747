use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use queue_cell::models::{PaymentStatus, QueueSnapshot, Visit, VisitStatus};
use queue_cell::services::status::{
    compute_queue_status, estimate_wait_minutes, queue_position, DEFAULT_PER_PATIENT_MINUTES,
};

fn visit(stn: i32, status: VisitStatus) -> Visit {
    let now = Utc::now();
    Visit {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        stn,
        department: "General Medicine".to_string(),
        visit_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        status,
        payment_status: PaymentStatus::PayAtClinic,
        qr_payload: String::new(),
        doctor_id: None,
        notes: None,
        checked_in_at: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_empty_day_is_all_zeros() {
    assert_eq!(compute_queue_status(&[]), QueueSnapshot::empty());
}

#[test]
fn test_in_service_pins_now_serving_to_lowest_served_token() {
    let visits = vec![
        visit(1, VisitStatus::Completed),
        visit(2, VisitStatus::InService),
        visit(3, VisitStatus::InService),
        visit(4, VisitStatus::Waiting),
    ];

    let snapshot = compute_queue_status(&visits);
    assert_eq!(snapshot.now_serving, 2);
    assert_eq!(snapshot.total_waiting, 1);
}

#[test]
fn test_completed_max_drives_counter_when_nothing_in_service() {
    let visits = vec![
        visit(1, VisitStatus::Completed),
        visit(2, VisitStatus::Completed),
        visit(3, VisitStatus::Waiting),
        visit(4, VisitStatus::CheckedIn),
    ];

    let snapshot = compute_queue_status(&visits);
    assert_eq!(snapshot.now_serving, 2);
    assert_eq!(snapshot.total_waiting, 2);
}

#[test]
fn test_untouched_queue_sits_one_below_lowest_token() {
    let visits = vec![
        visit(5, VisitStatus::Waiting),
        visit(6, VisitStatus::Waiting),
        visit(7, VisitStatus::CheckedIn),
    ];

    let snapshot = compute_queue_status(&visits);
    assert_eq!(snapshot.now_serving, 4);
    assert_eq!(snapshot.total_waiting, 3);
}

#[test]
fn test_held_and_expired_do_not_count_as_waiting() {
    let visits = vec![
        visit(1, VisitStatus::Held),
        visit(2, VisitStatus::Expired),
        visit(3, VisitStatus::Waiting),
    ];

    let snapshot = compute_queue_status(&visits);
    assert_eq!(snapshot.total_waiting, 1);
    // No one in service, nothing completed: counter trails the lowest token.
    assert_eq!(snapshot.now_serving, 0);
}

#[test]
fn test_first_booking_of_the_day_scenario() {
    // A single fresh booking with token 1 sees now_serving 0, so it is
    // first in line with one ahead-of-it slot of estimated wait.
    let visits = vec![visit(1, VisitStatus::Waiting)];

    let snapshot = compute_queue_status(&visits);
    assert_eq!(snapshot.now_serving, 0);
    assert_eq!(snapshot.total_waiting, 1);

    let position = queue_position(1, snapshot.now_serving);
    assert_eq!(position, 1);
    assert_eq!(estimate_wait_minutes(position, DEFAULT_PER_PATIENT_MINUTES), 10);
}

#[test]
fn test_second_booking_waits_twice_as_long() {
    let visits = vec![visit(1, VisitStatus::Waiting), visit(2, VisitStatus::Waiting)];

    let snapshot = compute_queue_status(&visits);
    assert_eq!(snapshot.now_serving, 0);

    let position = queue_position(2, snapshot.now_serving);
    assert_eq!(position, 2);
    assert_eq!(estimate_wait_minutes(position, DEFAULT_PER_PATIENT_MINUTES), 20);
}

#[test]
fn test_position_never_goes_negative() {
    // A token already behind the serving counter reports position 0.
    assert_eq!(queue_position(3, 7), 0);
    assert_eq!(queue_position(7, 7), 0);
    assert_eq!(queue_position(8, 7), 1);
}

#[test]
fn test_wait_estimate_never_goes_negative() {
    assert_eq!(estimate_wait_minutes(0, 10), 0);
    assert_eq!(estimate_wait_minutes(3, 15), 45);
    assert_eq!(estimate_wait_minutes(-1, 10), 0);
}
