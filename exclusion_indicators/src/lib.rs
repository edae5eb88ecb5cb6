mod config;
pub mod builder;
pub mod manual;
pub mod quick_start;

use log::{debug, info};

pub use crate::config::*;

// **** Private helpers ****

// The access flags feeding k, in the order declared by the dimension set.
fn access_flags(record: &PersonRecord, dims: AccessDimensions) -> Vec<Option<bool>> {
    match dims {
        AccessDimensions::ComputerInternet => {
            vec![record.has_computer_access, record.has_internet_access]
        }
        AccessDimensions::ComputerInternetTraining => vec![
            record.has_computer_access,
            record.has_internet_access,
            record.has_ict_training,
        ],
    }
}

/// Counts the available access dimensions for a record.
///
/// If any configured dimension is unknown, the count itself is unknown: a
/// record with a missing answer must not pass for a record with a "no".
fn access_count(record: &PersonRecord, dims: AccessDimensions) -> Option<u32> {
    let mut k = 0;
    for flag in access_flags(record, dims) {
        if flag? {
            k += 1;
        }
    }
    Some(k)
}

fn digital_vulnerability(
    record: &PersonRecord,
    rule: DigitalRule,
    k: Option<u32>,
    k_max: u32,
) -> Option<f64> {
    match rule {
        DigitalRule::Linear => k.map(|k| ((k_max - k) as f64 * 100.0) / k_max as f64),
        DigitalRule::LinearFloored { floor } => {
            k.map(|k| floor + ((k_max - k) as f64 * (100.0 - floor)) / k_max as f64)
        }
        DigitalRule::Stepped { training_penalty } => {
            let tier = match (record.has_computer_access?, record.has_internet_access?) {
                (true, true) => 0.0,
                (false, false) => 100.0,
                _ => 80.0,
            };
            if tier >= 100.0 {
                return Some(100.0);
            }
            // The training penalty only applies below the top tier, so a
            // missing training flag is only blocking there.
            match record.has_ict_training {
                Some(true) => Some(tier),
                Some(false) => Some((tier + training_penalty).min(100.0)),
                None => None,
            }
        }
    }
}

fn mobility_vulnerability(
    record: &PersonRecord,
    config: &FormulaConfig,
    binary_exclusion: Option<u8>,
) -> Option<f64> {
    match &config.mobility_rule {
        MobilityRule::ThresholdAdditive {
            low_attainment_cutoff,
            education_penalty,
            training_penalty,
            exclusion_penalty,
        } => {
            let mut total = 0.0;
            match record.education_level {
                Some(level) if level <= *low_attainment_cutoff => total += education_penalty,
                Some(_) => {}
                None => match config.missing_education_policy {
                    MissingEducationPolicy::Zero => {}
                    MissingEducationPolicy::Undefined => return None,
                },
            }
            match record.has_ict_training {
                Some(false) => total += training_penalty,
                Some(true) => {}
                None => return None,
            }
            if let Some(penalty) = exclusion_penalty {
                match binary_exclusion {
                    Some(1) => total += penalty,
                    Some(_) => {}
                    None => return None,
                }
            }
            Some(total.clamp(0.0, 100.0))
        }
        MobilityRule::ScoreTable {
            table,
            education_weight,
            training_penalty,
            floor,
        } => {
            let education = match record.education_level {
                Some(level) => table.score_for(level) / table.max_score() * education_weight,
                None => match config.missing_education_policy {
                    MissingEducationPolicy::Zero => 0.0,
                    MissingEducationPolicy::Undefined => return None,
                },
            };
            let training = match record.has_ict_training {
                Some(false) => *training_penalty,
                Some(true) => 0.0,
                None => return None,
            };
            Some((floor + education + training).clamp(*floor, 100.0))
        }
    }
}

/// Computes the four indicators for one record.
///
/// Pure and deterministic: no I/O, no hidden state. Missing or out-of-domain
/// attributes surface as `None` in the dependent indicators, per the
/// missing-attribute policy.
pub fn compute_indicators(record: &PersonRecord, config: &FormulaConfig) -> IndicatorResult {
    let k_max = config.dimensions.k_max();
    let k = access_count(record, config.dimensions);

    let binary_exclusion = k.map(|k| u8::from(k == 0));

    let ordinal_exclusion = k.map(|k| match config.ordinal_rule {
        OrdinalRule::RawCount => k as f64,
        OrdinalRule::FlooredPercent { floor } => {
            floor + (k as f64 * (100.0 - floor)) / k_max as f64
        }
    });

    let digital_vulnerability_pct = digital_vulnerability(record, config.digital_rule, k, k_max);
    let mobility_vulnerability_pct = mobility_vulnerability(record, config, binary_exclusion);

    IndicatorResult {
        binary_exclusion,
        ordinal_exclusion,
        digital_vulnerability_pct,
        mobility_vulnerability_pct,
    }
}

/// Applies the calculator to a collection of records.
///
/// The configuration is validated once up front; after that the batch is a
/// pure per-record map. Output order and count match the input, and a record
/// with missing attributes yields undefined fields instead of aborting the
/// batch.
pub fn run_indicator_stats(
    records: &[PersonRecord],
    config: &FormulaConfig,
) -> Result<Vec<IndicatorResult>, IndicatorErrors> {
    info!(
        "run_indicator_stats: processing {:?} records, dimensions: {:?}",
        records.len(),
        config.dimensions
    );
    config.validate()?;
    let results = records
        .iter()
        .map(|record| {
            let res = compute_indicators(record, config);
            debug!("run_indicator_stats: record: {:?} -> {:?}", record, res);
            res
        })
        .collect();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        computer: bool,
        internet: bool,
        training: bool,
        education: EducationLevel,
    ) -> PersonRecord {
        PersonRecord {
            sex: Some(Sex::Female),
            age: Some(30),
            education_level: Some(education),
            has_computer_access: Some(computer),
            has_internet_access: Some(internet),
            has_ict_training: Some(training),
            region: Some(Region::Cuyo),
            province: None,
        }
    }

    fn all_presets() -> Vec<FormulaConfig> {
        vec![
            FormulaConfig::reference(),
            FormulaConfig::threshold_additive(),
            FormulaConfig::legacy_two_dimension(),
            FormulaConfig::stepped(),
        ]
    }

    fn all_access_combinations() -> Vec<PersonRecord> {
        let mut res = Vec::new();
        for computer in [false, true] {
            for internet in [false, true] {
                for training in [false, true] {
                    for education in EducationLevel::ALL {
                        res.push(record(computer, internet, training, education));
                    }
                }
            }
        }
        res
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} but found {}",
            expected,
            actual
        );
    }

    #[test]
    fn binary_exclusion_iff_no_access() {
        for config in all_presets() {
            for rec in all_access_combinations() {
                let res = compute_indicators(&rec, &config);
                let flags = match config.dimensions {
                    AccessDimensions::ComputerInternet => {
                        vec![rec.has_computer_access, rec.has_internet_access]
                    }
                    AccessDimensions::ComputerInternetTraining => vec![
                        rec.has_computer_access,
                        rec.has_internet_access,
                        rec.has_ict_training,
                    ],
                };
                let k = flags.iter().filter(|f| f.unwrap()).count();
                let expected = u8::from(k == 0);
                assert_eq!(res.binary_exclusion, Some(expected), "record: {:?}", rec);
            }
        }
    }

    #[test]
    fn digital_vulnerability_non_increasing_in_k() {
        // Grow k one dimension at a time and check the vulnerability never
        // increases.
        let ladder = [
            record(false, false, false, EducationLevel::PrimaryComplete),
            record(true, false, false, EducationLevel::PrimaryComplete),
            record(true, true, false, EducationLevel::PrimaryComplete),
            record(true, true, true, EducationLevel::PrimaryComplete),
        ];
        for config in all_presets() {
            let mut previous = f64::INFINITY;
            for rec in ladder.iter() {
                let res = compute_indicators(rec, &config);
                let v = res.digital_vulnerability_pct.unwrap();
                assert!(
                    v <= previous,
                    "vulnerability increased from {} to {} under {:?}",
                    previous,
                    v,
                    config.digital_rule
                );
                previous = v;
            }
        }
    }

    #[test]
    fn percentages_stay_within_bounds() {
        for config in all_presets() {
            for rec in all_access_combinations() {
                let res = compute_indicators(&rec, &config);
                let digital = res.digital_vulnerability_pct.unwrap();
                let mobility = res.mobility_vulnerability_pct.unwrap();
                assert!((0.0..=100.0).contains(&digital), "digital: {}", digital);
                assert!((0.0..=100.0).contains(&mobility), "mobility: {}", mobility);
            }
        }
        // The floor-10 variant never goes below 10.
        let config = FormulaConfig::reference();
        for rec in all_access_combinations() {
            let res = compute_indicators(&rec, &config);
            assert!(res.ordinal_exclusion.unwrap() >= 10.0);
            assert!(res.digital_vulnerability_pct.unwrap() >= 10.0);
            assert!(res.mobility_vulnerability_pct.unwrap() >= 10.0);
        }
    }

    #[test]
    fn recomputation_is_idempotent() {
        let rec = record(true, false, true, EducationLevel::SecondaryIncomplete);
        for config in all_presets() {
            let first = compute_indicators(&rec, &config);
            let second = compute_indicators(&rec, &config);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn batch_preserves_order_and_count() {
        let records = all_access_combinations();
        let config = FormulaConfig::reference();
        let results = run_indicator_stats(&records, &config).unwrap();
        assert_eq!(results.len(), records.len());
        for (rec, res) in records.iter().zip(results.iter()) {
            assert_eq!(*res, compute_indicators(rec, &config));
        }
    }

    #[test]
    fn fully_excluded_record_threshold_additive() {
        let rec = record(false, false, false, EducationLevel::NoInstruction);
        let res = compute_indicators(&rec, &FormulaConfig::threshold_additive());
        assert_eq!(res.binary_exclusion, Some(1));
        assert_close(res.ordinal_exclusion.unwrap(), 0.0);
        assert_close(res.digital_vulnerability_pct.unwrap(), 100.0);
        assert_close(res.mobility_vulnerability_pct.unwrap(), 100.0);
    }

    #[test]
    fn fully_included_record_threshold_additive() {
        let rec = record(true, true, true, EducationLevel::TertiaryComplete);
        let res = compute_indicators(&rec, &FormulaConfig::threshold_additive());
        assert_eq!(res.binary_exclusion, Some(0));
        assert_close(res.ordinal_exclusion.unwrap(), 3.0);
        assert_close(res.digital_vulnerability_pct.unwrap(), 0.0);
        assert_close(res.mobility_vulnerability_pct.unwrap(), 0.0);
    }

    #[test]
    fn fully_included_record_reference() {
        let rec = record(true, true, true, EducationLevel::TertiaryComplete);
        let res = compute_indicators(&rec, &FormulaConfig::reference());
        assert_eq!(res.binary_exclusion, Some(0));
        assert_close(res.ordinal_exclusion.unwrap(), 100.0);
        // Floored scales bottom out at 10, not 0.
        assert_close(res.digital_vulnerability_pct.unwrap(), 10.0);
        assert_close(
            res.mobility_vulnerability_pct.unwrap(),
            10.0 + 1.0 / 7.0 * 50.0,
        );
    }

    #[test]
    fn single_access_record_reference() {
        let rec = record(true, false, false, EducationLevel::PrimaryIncomplete);
        let res = compute_indicators(&rec, &FormulaConfig::reference());
        assert_eq!(res.binary_exclusion, Some(0));
        // k = 1 of 3: 10 + 1/3 * 90 and 10 + 2/3 * 90.
        assert_close(res.ordinal_exclusion.unwrap(), 40.0);
        assert_close(res.digital_vulnerability_pct.unwrap(), 70.0);
        // 10 + 6/7 * 50 + 50 = 102.86, clamped at 100.
        assert_close(res.mobility_vulnerability_pct.unwrap(), 100.0);
    }

    #[test]
    fn reference_mobility_keeps_the_fractional_education_term() {
        // Educated enough that the sum stays below the cap: the education
        // contribution is score/max_score * 50, not a low-attainment step.
        let rec = record(true, false, false, EducationLevel::SecondaryComplete);
        let res = compute_indicators(&rec, &FormulaConfig::reference());
        assert_close(
            res.mobility_vulnerability_pct.unwrap(),
            10.0 + 3.0 / 7.0 * 50.0 + 50.0,
        );
    }

    #[test]
    fn no_instruction_saturates_reference_mobility() {
        let rec = record(false, false, false, EducationLevel::NoInstruction);
        let res = compute_indicators(&rec, &FormulaConfig::reference());
        // 10 + 50 + 50, clamped at 100.
        assert_close(res.mobility_vulnerability_pct.unwrap(), 100.0);
    }

    #[test]
    fn stepped_digital_tiers() {
        let config = FormulaConfig::stepped();
        let both = record(true, true, true, EducationLevel::SecondaryComplete);
        let one = record(true, false, true, EducationLevel::SecondaryComplete);
        let one_untrained = record(true, false, false, EducationLevel::SecondaryComplete);
        let none = record(false, false, false, EducationLevel::SecondaryComplete);
        assert_close(
            compute_indicators(&both, &config)
                .digital_vulnerability_pct
                .unwrap(),
            0.0,
        );
        assert_close(
            compute_indicators(&one, &config)
                .digital_vulnerability_pct
                .unwrap(),
            80.0,
        );
        assert_close(
            compute_indicators(&one_untrained, &config)
                .digital_vulnerability_pct
                .unwrap(),
            100.0,
        );
        // Already at 100: the training penalty does not push past the cap.
        assert_close(
            compute_indicators(&none, &config)
                .digital_vulnerability_pct
                .unwrap(),
            100.0,
        );
    }

    #[test]
    fn stepped_mobility_counts_exclusion_penalty() {
        let config = FormulaConfig::stepped();
        let rec = record(false, false, false, EducationLevel::NoInstruction);
        // 40 education + 30 training + 30 exclusion.
        let res = compute_indicators(&rec, &config);
        assert_close(res.mobility_vulnerability_pct.unwrap(), 100.0);

        let partial = record(true, false, false, EducationLevel::SecondaryComplete);
        // Not excluded, educated above the cutoff: only the training penalty.
        let res = compute_indicators(&partial, &config);
        assert_close(res.mobility_vulnerability_pct.unwrap(), 30.0);
    }

    #[test]
    fn unmapped_education_follows_declared_policy() {
        let mut rec = record(true, false, false, EducationLevel::PrimaryComplete);
        rec.education_level = None;

        // Threshold-additive policy: the education term contributes zero.
        let res = compute_indicators(&rec, &FormulaConfig::threshold_additive());
        assert_close(res.mobility_vulnerability_pct.unwrap(), 50.0);

        // Score-table policy: the indicator is undefined.
        let res = compute_indicators(&rec, &FormulaConfig::reference());
        assert_eq!(res.mobility_vulnerability_pct, None);
        // The digital indicators are unaffected.
        assert_eq!(res.binary_exclusion, Some(0));
    }

    #[test]
    fn missing_access_yields_undefined_digital_indicators() {
        let mut rec = record(true, true, true, EducationLevel::SecondaryComplete);
        rec.has_internet_access = None;
        let res = compute_indicators(&rec, &FormulaConfig::reference());
        assert_eq!(res.binary_exclusion, None);
        assert_eq!(res.ordinal_exclusion, None);
        assert_eq!(res.digital_vulnerability_pct, None);
        // Mobility only needs education and training here.
        assert!(res.mobility_vulnerability_pct.is_some());
    }

    #[test]
    fn missing_training_yields_undefined_mobility() {
        let mut rec = record(true, true, true, EducationLevel::SecondaryComplete);
        rec.has_ict_training = None;
        for config in all_presets() {
            let res = compute_indicators(&rec, &config);
            assert_eq!(res.mobility_vulnerability_pct, None, "{:?}", config);
        }
    }

    #[test]
    fn invalid_score_table_rejected() {
        let mut config = FormulaConfig::reference();
        config.mobility_rule = MobilityRule::ScoreTable {
            table: ScoreTable {
                scores: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            },
            education_weight: 45.0,
            training_penalty: 45.0,
            floor: 10.0,
        };
        let res = run_indicator_stats(&[], &config);
        assert_eq!(res, Err(IndicatorErrors::NonMonotonicScoreTable));

        let mut config = FormulaConfig::reference();
        config.mobility_rule = MobilityRule::ScoreTable {
            table: ScoreTable {
                scores: vec![3.0, 2.0, 1.0],
            },
            education_weight: 45.0,
            training_penalty: 45.0,
            floor: 10.0,
        };
        let res = run_indicator_stats(&[], &config);
        assert_eq!(res, Err(IndicatorErrors::WrongScoreTableSize(3)));
    }

    #[test]
    fn out_of_range_floor_rejected() {
        let mut config = FormulaConfig::reference();
        config.ordinal_rule = OrdinalRule::FlooredPercent { floor: 100.0 };
        let res = run_indicator_stats(&[], &config);
        assert_eq!(res, Err(IndicatorErrors::OutOfRangeFloor(100.0)));
    }
}
