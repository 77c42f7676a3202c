//! Table-driven analysis: column selection, group partitioning and the
//! `Analyzer` entry points.

mod common;

use abtest_stats::{
    Analyzer, BuiltinDistributions, Column, InferenceConfig, NamedResult, ProportionCounts,
    StatsError, Table,
};
use common::{ab_table, assert_close, bernoulli_sample, normal_sample};

fn analyzer() -> Analyzer {
    Analyzer::new(InferenceConfig::default()).unwrap()
}

mod selection {
    use super::*;

    #[test]
    fn json_table_round_trips() {
        let json = r#"{
            "revenue": {"type": "float", "values": [1.0, 2.0, 3.0, 4.0]},
            "orders": {"type": "int", "values": [1, 0, 2, 1]},
            "variant": {"type": "bool", "values": [false, true, false, true]}
        }"#;
        let table = Table::from_json_str(json).unwrap();
        let back = Table::from_json_str(&serde_json::to_string(&table).unwrap()).unwrap();
        assert_eq!(back, table);
        assert_eq!(
            table.column("orders").unwrap(),
            &Column::Int(vec![1, 0, 2, 1])
        );
    }

    #[test]
    fn unknown_column_type_is_json_error() {
        let json = r#"{"m": {"type": "string", "values": ["a"]}}"#;
        assert_eq!(Table::from_json_str(json).unwrap_err().code(), "json_error");
    }

    #[test]
    fn partition_covers_every_row_once() {
        let table = ab_table("m", vec![1.0; 7], vec![2.0; 5]);
        let p = table.partition("group").unwrap();
        let mut all: Vec<usize> = p.control.iter().chain(&p.treatment).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..12).collect::<Vec<_>>());
        assert_eq!(p.treatment.len(), 5);
    }

    #[test]
    fn group_with_value_two_is_rejected() {
        let table = Table::new()
            .with_column("m", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("g", vec![0i64, 2, 1])
            .unwrap();
        let err = analyzer().ttest(&table, "m", "g").unwrap_err();
        assert!(matches!(err, StatsError::InvalidColumn { ref column, .. } if column == "g"));
    }
}

mod analysis {
    use super::*;

    #[test]
    fn ttest_on_table_detects_lift() {
        let table = ab_table(
            "revenue",
            normal_sample(21, 1500, 20.0, 5.0),
            normal_sample(22, 1500, 21.5, 5.0),
        );
        let report = analyzer().ttest(&table, "revenue", "group").unwrap();
        assert_eq!(report.control.count, 1500);
        assert!(report.result.significant, "p={}", report.result.p_value);
        assert!(report.result.effect_absolute > 0.0);
        assert_close(
            report.result.effect_absolute,
            report.treatment.mean - report.control.mean,
            1e-12,
            "effect",
        );
    }

    #[test]
    fn ztest_on_table_matches_counts() {
        let control = bernoulli_sample(31, 4000, 0.10);
        let treatment = bernoulli_sample(32, 4000, 0.10);
        let group: Vec<bool> = std::iter::repeat(false)
            .take(control.len())
            .chain(std::iter::repeat(true).take(treatment.len()))
            .collect();
        let expected_control = control.iter().filter(|&&c| c).count() as u64;
        let mut outcome = control;
        outcome.extend(treatment);
        let table = Table::new()
            .with_column("converted", outcome)
            .unwrap()
            .with_column("group", group)
            .unwrap();

        let report = analyzer()
            .ztest_proportion(&table, "converted", "group")
            .unwrap();
        assert_eq!(
            report.control,
            ProportionCounts {
                successes: expected_control,
                trials: 4000
            }
        );
        assert!(report.result.degrees_of_freedom.is_none());
        assert!(report.result.p_value > 0.0 && report.result.p_value <= 1.0);
    }

    #[test]
    fn ttest_delta_on_table() {
        let searches: Vec<f64> = (0..400).map(|i| 4.0 + (i % 5) as f64).collect();
        let clicks: Vec<f64> = searches
            .iter()
            .enumerate()
            .map(|(i, s)| if i < 200 { (s * 0.2).floor() } else { (s * 0.5).floor() })
            .collect();
        let group: Vec<i64> = (0..400).map(|i| if i < 200 { 0 } else { 1 }).collect();
        let table = Table::new()
            .with_column("clicks", clicks)
            .unwrap()
            .with_column("searches", searches)
            .unwrap()
            .with_column("group", group)
            .unwrap();
        let report = analyzer()
            .ttest_delta(&table, "clicks", "searches", "group")
            .unwrap();
        assert!(report.treatment.ratio() > report.control.ratio());
        assert!(report.result.significant, "p={}", report.result.p_value);
    }

    #[test]
    fn srm_flags_skewed_assignment() {
        let table = ab_table("m", vec![0.0; 600], vec![0.0; 400]);
        let check = analyzer().srm(&table, "group", 0.5).unwrap();
        assert!(check.mismatch, "p={}", check.p_value);
        assert_close(check.chi_squared, 40.0, 1e-9, "chi2");
    }

    #[test]
    fn metric_family_is_fdr_corrected() {
        let analyzer = analyzer();
        let strong = ab_table(
            "m",
            normal_sample(41, 800, 1.0, 1.0),
            normal_sample(42, 800, 1.5, 1.0),
        );
        let null = ab_table(
            "m",
            normal_sample(43, 800, 1.0, 1.0),
            normal_sample(44, 800, 1.0, 1.0),
        );
        let family = vec![
            NamedResult::new("strong", analyzer.ttest(&strong, "m", "group").unwrap().result),
            NamedResult::new("null", analyzer.ttest(&null, "m", "group").unwrap().result),
        ];
        let out = analyzer.correct(&family).unwrap();
        assert_eq!(out[0].name, "strong");
        assert!(out[0].reject_null);
        assert!(out[0].adjusted_p >= family[0].result.p_value);
        let json = serde_json::to_value(&out).unwrap();
        assert!(json[0].get("adjustedP").is_some());
        assert!(json[0]["result"].get("pValue").is_some());
    }

    #[test]
    fn backends_agree_on_table_results() {
        let table = ab_table(
            "m",
            normal_sample(51, 60, 3.0, 1.0),
            normal_sample(52, 45, 3.3, 1.4),
        );
        let statrs = analyzer().ttest(&table, "m", "group").unwrap();
        let builtin = Analyzer::with_backend(BuiltinDistributions, InferenceConfig::default())
            .unwrap()
            .ttest(&table, "m", "group")
            .unwrap();
        assert_close(builtin.result.p_value, statrs.result.p_value, 1e-6, "p");
        assert_close(builtin.result.ci_upper, statrs.result.ci_upper, 1e-5, "ci_upper");
    }
}
