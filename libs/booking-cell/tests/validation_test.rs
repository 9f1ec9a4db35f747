use booking_cell::models::{BookVisitRequest, PaymentMode};
use booking_cell::services::sequence::next_sequence_number;
use booking_cell::services::validation::validate_booking;

fn valid_request() -> BookVisitRequest {
    BookVisitRequest {
        name: "Asha Rao".to_string(),
        age: 34,
        phone: "9876543210".to_string(),
        department: "General Medicine".to_string(),
        doctor_id: None,
        payment_mode: PaymentMode::PayAtClinic,
        email: None,
        address: None,
        emergency_contact: None,
        blood_group: None,
        allergies: None,
        medical_conditions: None,
        notes: None,
    }
}

#[test]
fn test_valid_request_has_no_issues() {
    assert!(validate_booking(&valid_request()).is_empty());
}

#[test]
fn test_blank_name_is_flagged() {
    let mut request = valid_request();
    request.name = "   ".to_string();

    let issues = validate_booking(&request);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "name");
}

#[test]
fn test_age_bounds() {
    let mut request = valid_request();

    request.age = 0;
    assert_eq!(validate_booking(&request)[0].field, "age");

    request.age = 121;
    assert_eq!(validate_booking(&request)[0].field, "age");

    request.age = 1;
    assert!(validate_booking(&request).is_empty());

    request.age = 120;
    assert!(validate_booking(&request).is_empty());
}

#[test]
fn test_phone_needs_ten_digits() {
    let mut request = valid_request();

    request.phone = "12345".to_string();
    assert_eq!(validate_booking(&request)[0].field, "phone");

    // Formatting characters don't count, digits do.
    request.phone = "+91 98765 43210".to_string();
    assert!(validate_booking(&request).is_empty());

    request.phone = String::new();
    assert_eq!(validate_booking(&request)[0].field, "phone");
}

#[test]
fn test_blank_department_is_flagged() {
    let mut request = valid_request();
    request.department = String::new();

    assert_eq!(validate_booking(&request)[0].field, "department");
}

#[test]
fn test_multiple_issues_reported_together() {
    let mut request = valid_request();
    request.name = String::new();
    request.age = 0;
    request.phone = "123".to_string();
    request.department = String::new();

    assert_eq!(validate_booking(&request).len(), 4);
}

#[test]
fn test_sequence_starts_at_one() {
    assert_eq!(next_sequence_number(&[]), 1);
}

#[test]
fn test_sequence_is_one_past_the_highest() {
    assert_eq!(next_sequence_number(&[1, 2, 3]), 4);
    assert_eq!(next_sequence_number(&[3, 1, 2]), 4);
}

#[test]
fn test_sequence_ignores_gaps() {
    // Holds and expiries leave gaps; the counter never reuses them.
    assert_eq!(next_sequence_number(&[1, 5, 9]), 10);
}
