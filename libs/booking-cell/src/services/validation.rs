use crate::models::{BookVisitRequest, FieldIssue};

/// Server-side form validation. Mirrors what the booking form enforces in
/// the browser; nothing past this point sees an invalid payload.
pub fn validate_booking(request: &BookVisitRequest) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    if request.name.trim().is_empty() {
        issues.push(issue("name", "Name is required"));
    }

    if !(1..=120).contains(&request.age) {
        issues.push(issue("age", "Age must be between 1 and 120"));
    }

    if request.phone.trim().is_empty() {
        issues.push(issue("phone", "Phone number is required"));
    } else if digit_count(&request.phone) < 10 {
        issues.push(issue("phone", "Phone number must have at least 10 digits"));
    }

    if request.department.trim().is_empty() {
        issues.push(issue("department", "Department is required"));
    }

    issues
}

fn digit_count(phone: &str) -> usize {
    phone.chars().filter(char::is_ascii_digit).count()
}

fn issue(field: &str, message: &str) -> FieldIssue {
    FieldIssue {
        field: field.to_string(),
        message: message.to_string(),
    }
}
