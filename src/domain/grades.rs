//! Grade-point mapping and CGPA aggregation on a 10-point scale.

/// Map exam marks (0..=100) to a grade point.
///
/// Bands: >=90 -> 10, >=80 -> 9, >=70 -> 8, >=60 -> 7, >=50 -> 6,
/// >=40 -> 5, below 40 is a fail (0).
pub fn grade_point(marks: i32) -> i32 {
    match marks {
        90..=100 => 10,
        80..=89 => 9,
        70..=79 => 8,
        60..=69 => 7,
        50..=59 => 6,
        40..=49 => 5,
        _ => 0,
    }
}

/// Letter grade for a grade point, for report display
pub fn letter_grade(grade_point: i32) -> &'static str {
    match grade_point {
        10 => "A+",
        9 => "A",
        8 => "B+",
        7 => "B",
        6 => "C",
        5 => "D",
        _ => "F",
    }
}

/// Credit-weighted CGPA over (grade_point, credits) pairs, rounded to two
/// decimals. An empty slice yields 0.0.
pub fn cgpa(entries: &[(i32, i32)]) -> f64 {
    let total_credits: i32 = entries.iter().map(|(_, c)| c).sum();
    if total_credits == 0 {
        return 0.0;
    }
    let weighted: i32 = entries.iter().map(|(gp, c)| gp * c).sum();
    let raw = f64::from(weighted) / f64::from(total_credits);
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_map_correctly() {
        assert_eq!(grade_point(100), 10);
        assert_eq!(grade_point(90), 10);
        assert_eq!(grade_point(89), 9);
        assert_eq!(grade_point(80), 9);
        assert_eq!(grade_point(60), 7);
        assert_eq!(grade_point(40), 5);
        assert_eq!(grade_point(39), 0);
        assert_eq!(grade_point(0), 0);
    }

    #[test]
    fn letters_follow_points() {
        assert_eq!(letter_grade(10), "A+");
        assert_eq!(letter_grade(6), "C");
        assert_eq!(letter_grade(0), "F");
    }

    #[test]
    fn cgpa_is_credit_weighted() {
        // 10 over 4 credits, 8 over 2 credits: (40 + 16) / 6 = 9.33
        assert_eq!(cgpa(&[(10, 4), (8, 2)]), 9.33);
    }

    #[test]
    fn cgpa_of_no_scores_is_zero() {
        assert_eq!(cgpa(&[]), 0.0);
        assert_eq!(cgpa(&[(10, 0)]), 0.0);
    }

    #[test]
    fn uniform_scores_are_unchanged_by_weighting() {
        assert_eq!(cgpa(&[(7, 3), (7, 5), (7, 2)]), 7.0);
    }
}
