//! Integration tests for MedPredict risk scoring

use medpredict::{
    compute_risk, compute_risk_at, dominant_condition, Condition, DietQuality, ExerciseLevel,
    RiskFactors, RiskInput, RiskLabel, YesNo,
};

fn input(
    age: i32,
    bp: (i32, i32),
    cholesterol: i32,
    blood_sugar: i32,
    bmi: f64,
    flags: (YesNo, YesNo),
    lifestyle: (ExerciseLevel, DietQuality),
) -> RiskInput {
    RiskInput {
        age,
        systolic: bp.0,
        diastolic: bp.1,
        cholesterol,
        blood_sugar,
        bmi,
        smoking: flags.0,
        family_history: flags.1,
        exercise_level: lifestyle.0,
        diet_quality: lifestyle.1,
    }
}

fn healthy() -> RiskInput {
    input(
        25,
        (110, 70),
        160,
        90,
        22.0,
        (YesNo::No, YesNo::No),
        (ExerciseLevel::High, DietQuality::Excellent),
    )
}

fn moderate() -> RiskInput {
    input(
        45,
        (130, 85),
        200,
        110,
        27.5,
        (YesNo::No, YesNo::Yes),
        (ExerciseLevel::Moderate, DietQuality::Balanced),
    )
}

/// Every input inside the validated ranges on a coarse grid
fn grid() -> Vec<RiskInput> {
    let mut out = Vec::new();
    for age in [0, 30, 60, 120] {
        for bp in [(60, 40), (120, 80), (260, 160)] {
            for cholesterol in [80, 220, 400] {
                for blood_sugar in [40, 140, 600] {
                    for bmi in [10.0, 27.0, 60.0] {
                        for smoking in [YesNo::No, YesNo::Yes] {
                            out.push(input(
                                age,
                                bp,
                                cholesterol,
                                blood_sugar,
                                bmi,
                                (smoking, YesNo::Yes),
                                (ExerciseLevel::Low, DietQuality::Poor),
                            ));
                        }
                    }
                }
            }
        }
    }
    out
}

#[test]
fn test_healthy_profile() {
    let factors = RiskFactors::from_input(&healthy());
    assert!((factors.base() - 0.08).abs() < 1e-9);

    let result = compute_risk(&healthy());
    assert_eq!(result.overall_risk, 1);
    assert_eq!(result.label, RiskLabel::Low);
    assert_eq!(result.heart_disease, 7);
    assert_eq!(result.diabetes, 7);
    assert_eq!(result.hypertension, 10);
}

#[test]
fn test_high_risk_profile() {
    let result = compute_risk(&input(
        70,
        (180, 110),
        280,
        250,
        38.0,
        (YesNo::Yes, YesNo::Yes),
        (ExerciseLevel::Low, DietQuality::Poor),
    ));
    assert_eq!(result.overall_risk, 100);
    assert_eq!(result.label, RiskLabel::Critical);
    assert_eq!(result.heart_disease, 100);
    assert_eq!(result.diabetes, 96);
    assert_eq!(result.hypertension, 98);
}

#[test]
fn test_moderate_profile() {
    let result = compute_risk(&moderate());
    assert_eq!(result.overall_risk, 68);
    assert_eq!(result.label, RiskLabel::Moderate);
    assert_eq!(result.heart_disease, 47);
    assert_eq!(result.diabetes, 37);
    assert_eq!(result.hypertension, 43);
}

#[test]
fn test_high_label_profile() {
    let result = compute_risk(&input(
        50,
        (140, 90),
        220,
        130,
        29.0,
        (YesNo::No, YesNo::No),
        (ExerciseLevel::Moderate, DietQuality::Balanced),
    ));
    assert_eq!(result.overall_risk, 73);
    assert_eq!(result.label, RiskLabel::High);
    assert_eq!(result.heart_disease, 70);
    assert_eq!(result.diabetes, 29);
    assert_eq!(result.hypertension, 60);
}

#[test]
fn test_range_extremes() {
    let minimum = compute_risk(&input(
        0,
        (60, 40),
        80,
        40,
        10.0,
        (YesNo::No, YesNo::No),
        (ExerciseLevel::High, DietQuality::Excellent),
    ));
    assert_eq!(
        (minimum.overall_risk, minimum.heart_disease, minimum.diabetes, minimum.hypertension),
        (1, 7, 7, 10)
    );

    let maximum = compute_risk(&input(
        120,
        (260, 160),
        400,
        600,
        60.0,
        (YesNo::Yes, YesNo::Yes),
        (ExerciseLevel::Low, DietQuality::Poor),
    ));
    assert_eq!(
        (maximum.overall_risk, maximum.heart_disease, maximum.diabetes, maximum.hypertension),
        (100, 100, 97, 98)
    );
}

#[test]
fn test_scores_stay_in_bounds() {
    for sample in grid() {
        let r = compute_risk(&sample);
        for score in [r.overall_risk, r.heart_disease, r.diabetes, r.hypertension] {
            assert!(score <= 100, "score {} out of range for {:?}", score, sample);
        }
        assert_eq!(r.label, RiskLabel::from_score(r.overall_risk));
    }
}

#[test]
fn test_label_boundaries() {
    let cases = [
        (100, RiskLabel::Critical),
        (85, RiskLabel::Critical),
        (84, RiskLabel::High),
        (70, RiskLabel::High),
        (69, RiskLabel::Moderate),
        (40, RiskLabel::Moderate),
        (39, RiskLabel::Low),
        (0, RiskLabel::Low),
    ];
    for (score, label) in cases {
        assert_eq!(RiskLabel::from_score(score), label, "score {}", score);
    }
}

#[test]
fn test_monotonic_in_each_factor() {
    let base = moderate();
    let overall = |i: &RiskInput| compute_risk(i).overall_risk;

    let mut prev = 0;
    for age in (0..=120).step_by(5) {
        let score = overall(&RiskInput { age, ..base });
        assert!(score >= prev, "age {} decreased risk", age);
        prev = score;
    }

    let mut prev = 0;
    for cholesterol in (80..=400).step_by(10) {
        let score = overall(&RiskInput { cholesterol, ..base });
        assert!(score >= prev, "cholesterol {} decreased risk", cholesterol);
        prev = score;
    }

    let mut prev = 0;
    for blood_sugar in (40..=600).step_by(20) {
        let score = overall(&RiskInput { blood_sugar, ..base });
        assert!(score >= prev, "blood sugar {} decreased risk", blood_sugar);
        prev = score;
    }

    let mut prev = 0;
    for systolic in (60..=260).step_by(10) {
        let score = overall(&RiskInput { systolic, ..base });
        assert!(score >= prev, "systolic {} decreased risk", systolic);
        prev = score;
    }

    let mut prev = 0;
    for bmi in (10..=60).map(f64::from) {
        let score = overall(&RiskInput { bmi, ..base });
        assert!(score >= prev, "bmi {} decreased risk", bmi);
        prev = score;
    }

    assert!(
        overall(&RiskInput { smoking: YesNo::Yes, ..base }) >= overall(&RiskInput { smoking: YesNo::No, ..base })
    );
    assert!(
        overall(&RiskInput { exercise_level: ExerciseLevel::Low, ..base })
            >= overall(&RiskInput { exercise_level: ExerciseLevel::High, ..base })
    );
    assert!(
        overall(&RiskInput { diet_quality: DietQuality::Poor, ..base })
            >= overall(&RiskInput { diet_quality: DietQuality::Excellent, ..base })
    );
}

#[test]
fn test_deterministic() {
    let at = chrono::Utc::now();
    for sample in grid().into_iter().take(50) {
        assert_eq!(compute_risk_at(&sample, at), compute_risk_at(&sample, at));
    }
}

#[test]
fn test_generated_at_wire_format() {
    let json = serde_json::to_value(compute_risk(&healthy())).unwrap();
    let generated_at = json["generatedAt"].as_str().unwrap();
    assert_eq!(generated_at.len(), 20);
    assert!(generated_at.ends_with('Z'));
    assert_eq!(json["label"], "low");
    assert_eq!(json["overallRisk"], 1);
}

#[test]
fn test_dominant_condition() {
    assert_eq!(dominant_condition(70, 85, 60), Condition::Diabetes);
    assert_eq!(dominant_condition(50, 50, 50), Condition::HeartDisease);
    assert_eq!(dominant_condition(10, 40, 40), Condition::Diabetes);
    assert_eq!(dominant_condition(10, 20, 30), Condition::Hypertension);
    assert_eq!(compute_risk(&healthy()).dominant_condition(), Condition::Hypertension);
}
