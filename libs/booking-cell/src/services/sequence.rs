/// Next sequence token number for a department/day: one past the highest
/// allocated, starting at 1. Sequences for different departments or days
/// are independent.
pub fn next_sequence_number(existing: &[i32]) -> i32 {
    existing.iter().max().map_or(1, |max| max + 1)
}
