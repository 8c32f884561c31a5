use std::cmp::Ordering;

/// Orders dotted release versions numerically (`8.10` sorts after `8.9`).
///
/// Missing trailing segments count as zero, so `8.5` and `8.5.0` compare
/// equal. Non-numeric segments fall back to a string comparison.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left_parts = left.split('.');
    let mut right_parts = right.split('.');
    loop {
        match (left_parts.next(), right_parts.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let l = l.unwrap_or("0");
                let r = r.unwrap_or("0");
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// True for plain dotted numeric releases such as `8.5` or `7.6.1`.
///
/// Release candidates, milestones, snapshots and custom dasherized versions
/// are not stable.
pub fn is_stable_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
