//! Subfactor Aggregator: turns the oracle's raw document into an `Evaluation`.
//!
//! Each top-level metric is a fixed weighted sum of four subfactors, each
//! clamped to `[0, 1000]` first:
//!
//! ```text
//! relevance = 0.4·direct_fit + 0.3·bottleneck + 0.2·core_support + 0.1·decoy
//! impact    = 0.4·depth + 0.3·breadth + 0.2·compound + 0.1·risk_reduction
//! urgency   = 0.4·deadline_pressure + 0.3·effort_vs_time + 0.2·cost_of_delay + 0.1·interdependence
//! effort    = (1.0·complexity + 0.5·emotion + 0.5·uncertainty) / 2
//! ```
//!
//! Results are truncated, not rounded. Weights are held as integer tenths so
//! truncation is exact and no float error can shift a result by one.
//!
//! The oracle decides `trap_task` / `avoidance_flag`; this module only enforces
//! the numeric invariants that follow from them.

use serde_json::Value;

use crate::models::evaluation::{Evaluation, METRIC_MAX, METRIC_MIN};

/// Weights in tenths, in field order.
const RELEVANCE_WEIGHTS: [i64; 4] = [4, 3, 2, 1];
const IMPACT_WEIGHTS: [i64; 4] = [4, 3, 2, 1];
const URGENCY_WEIGHTS: [i64; 4] = [4, 3, 2, 1];
/// Effort is `(2·complexity + emotion + uncertainty) / 4`.
const EFFORT_WEIGHTS: [i64; 3] = [2, 1, 1];
const EFFORT_DIVISOR: i64 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelevanceSub {
    pub direct_fit: i32,
    pub bottleneck: i32,
    pub core_support: i32,
    pub decoy: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpactSub {
    pub depth: i32,
    pub breadth: i32,
    pub compound: i32,
    pub risk_reduction: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrgencySub {
    pub deadline_pressure: i32,
    pub effort_vs_time: i32,
    pub cost_of_delay: i32,
    pub interdependence: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffortSub {
    pub complexity: i32,
    pub emotion: i32,
    pub uncertainty: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubfactorScores {
    pub relevance: RelevanceSub,
    pub impact: ImpactSub,
    pub urgency: UrgencySub,
    pub effort: EffortSub,
}

/// The oracle's answer, read leniently: missing or mistyped fields become
/// zero / false / empty instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleDocument {
    pub normalized_task: String,
    pub scores: SubfactorScores,
    pub avoidance_flag: bool,
    pub trap_task: bool,
    pub clarification_needed: bool,
    pub clarification_question: String,
    pub explanation_short: String,
}

impl OracleDocument {
    pub fn from_value(doc: &Value) -> Self {
        let sub = |group: &str, name: &str| -> i32 {
            doc.get("scores")
                .and_then(|s| s.get(group))
                .and_then(|g| g.get(name))
                .map(read_subfactor)
                .unwrap_or(METRIC_MIN)
        };

        OracleDocument {
            normalized_task: read_string(doc, "normalized_task"),
            scores: SubfactorScores {
                relevance: RelevanceSub {
                    direct_fit: sub("relevance_sub", "direct_fit"),
                    bottleneck: sub("relevance_sub", "bottleneck"),
                    core_support: sub("relevance_sub", "core_support"),
                    decoy: sub("relevance_sub", "decoy"),
                },
                impact: ImpactSub {
                    depth: sub("impact_sub", "depth"),
                    breadth: sub("impact_sub", "breadth"),
                    compound: sub("impact_sub", "compound"),
                    risk_reduction: sub("impact_sub", "risk_reduction"),
                },
                urgency: UrgencySub {
                    deadline_pressure: sub("urgency_sub", "deadline_pressure"),
                    effort_vs_time: sub("urgency_sub", "effort_vs_time"),
                    cost_of_delay: sub("urgency_sub", "cost_of_delay"),
                    interdependence: sub("urgency_sub", "interdependence"),
                },
                effort: EffortSub {
                    complexity: sub("effort_sub", "complexity"),
                    emotion: sub("effort_sub", "emotion"),
                    uncertainty: sub("effort_sub", "uncertainty"),
                },
            },
            avoidance_flag: read_bool(doc, "avoidance_flag"),
            trap_task: read_bool(doc, "trap_task"),
            clarification_needed: read_bool(doc, "clarification_needed"),
            clarification_question: read_string(doc, "clarification_question"),
            explanation_short: read_string(doc, "explanation_short"),
        }
    }
}

/// Integers are clamped; floats are truncated then clamped; anything else is 0.
fn read_subfactor(value: &Value) -> i32 {
    let raw = if let Some(i) = value.as_i64() {
        i
    } else if let Some(u) = value.as_u64() {
        i64::try_from(u).unwrap_or(i64::MAX)
    } else if let Some(f) = value.as_f64() {
        f.trunc() as i64
    } else {
        return METRIC_MIN;
    };
    raw.clamp(METRIC_MIN as i64, METRIC_MAX as i64) as i32
}

fn read_bool(doc: &Value, key: &str) -> bool {
    doc.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn read_string(doc: &Value, key: &str) -> String {
    doc.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn weighted_tenths(terms: [(i32, i64); 4]) -> i32 {
    let sum: i64 = terms.iter().map(|(v, w)| *v as i64 * w).sum();
    (sum / 10) as i32
}

pub fn relevance(s: &RelevanceSub) -> i32 {
    let [a, b, c, d] = RELEVANCE_WEIGHTS;
    weighted_tenths([
        (s.direct_fit, a),
        (s.bottleneck, b),
        (s.core_support, c),
        (s.decoy, d),
    ])
}

pub fn impact(s: &ImpactSub) -> i32 {
    let [a, b, c, d] = IMPACT_WEIGHTS;
    weighted_tenths([
        (s.depth, a),
        (s.breadth, b),
        (s.compound, c),
        (s.risk_reduction, d),
    ])
}

pub fn urgency(s: &UrgencySub) -> i32 {
    let [a, b, c, d] = URGENCY_WEIGHTS;
    weighted_tenths([
        (s.deadline_pressure, a),
        (s.effort_vs_time, b),
        (s.cost_of_delay, c),
        (s.interdependence, d),
    ])
}

pub fn effort(s: &EffortSub) -> i32 {
    let [a, b, c] = EFFORT_WEIGHTS;
    let sum = s.complexity as i64 * a + s.emotion as i64 * b + s.uncertainty as i64 * c;
    (sum / EFFORT_DIVISOR) as i32
}

/// Aggregates a raw oracle document into the evaluation stored for `task_id`.
/// Pure: the same document always yields the same evaluation.
pub fn aggregate(task_id: i64, model_version: &str, doc: &Value) -> Evaluation {
    let doc = OracleDocument::from_value(doc);
    let scores = &doc.scores;

    let relevance = if doc.trap_task {
        METRIC_MIN
    } else {
        relevance(&scores.relevance)
    };

    let clarification_question = if doc.clarification_needed {
        doc.clarification_question
    } else {
        String::new()
    };

    Evaluation {
        task_id,
        model_version: model_version.to_string(),
        relevance,
        impact: impact(&scores.impact),
        urgency: urgency(&scores.urgency),
        effort: effort(&scores.effort),
        normalized_task: doc.normalized_task,
        avoidance_flag: doc.avoidance_flag,
        trap_task: doc.trap_task,
        clarification_needed: doc.clarification_needed,
        clarification_question,
        explanation_short: doc.explanation_short,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(relevance: [i64; 4], trap_task: bool) -> Value {
        json!({
            "normalized_task": "Draft the landing page copy",
            "scores": {
                "relevance_sub": {
                    "direct_fit": relevance[0],
                    "bottleneck": relevance[1],
                    "core_support": relevance[2],
                    "decoy": relevance[3]
                },
                "impact_sub": {"depth": 500, "breadth": 500, "compound": 500, "risk_reduction": 500},
                "urgency_sub": {"deadline_pressure": 300, "effort_vs_time": 300, "cost_of_delay": 300, "interdependence": 300},
                "effort_sub": {"complexity": 600, "emotion": 400, "uncertainty": 200}
            },
            "avoidance_flag": false,
            "trap_task": trap_task,
            "clarification_needed": false,
            "clarification_question": "",
            "explanation_short": "Directly moves the launch forward."
        })
    }

    /// Small deterministic generator so bound checks cover many documents.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: i64) -> i64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) % bound as u64) as i64
        }
    }

    #[test]
    fn test_relevance_scenario() {
        let s = RelevanceSub {
            direct_fit: 800,
            bottleneck: 600,
            core_support: 500,
            decoy: 100,
        };
        assert_eq!(relevance(&s), 610);
    }

    #[test]
    fn test_effort_scenario() {
        let s = EffortSub {
            complexity: 600,
            emotion: 400,
            uncertainty: 200,
        };
        assert_eq!(effort(&s), 450);
    }

    #[test]
    fn test_results_are_truncated_not_rounded() {
        // 0.4·1 + 0.3·1 = 0.7 → 0
        let s = RelevanceSub {
            direct_fit: 1,
            bottleneck: 1,
            core_support: 0,
            decoy: 0,
        };
        assert_eq!(relevance(&s), 0);

        // (2·1 + 1 + 0) / 4 = 0.75 → 0
        let e = EffortSub {
            complexity: 1,
            emotion: 1,
            uncertainty: 0,
        };
        assert_eq!(effort(&e), 0);

        // 0.4·999 + 0.3·999 + 0.2·999 + 0.1·998 = 998.9 → 998
        let u = UrgencySub {
            deadline_pressure: 999,
            effort_vs_time: 999,
            cost_of_delay: 999,
            interdependence: 998,
        };
        assert_eq!(urgency(&u), 998);
    }

    #[test]
    fn test_full_document_aggregates_all_metrics() {
        let eval = aggregate(7, "m/subfactors-v1", &document([800, 600, 500, 100], false));
        assert_eq!(eval.task_id, 7);
        assert_eq!(eval.model_version, "m/subfactors-v1");
        assert_eq!(eval.relevance, 610);
        assert_eq!(eval.impact, 500);
        assert_eq!(eval.urgency, 300);
        assert_eq!(eval.effort, 450);
        assert_eq!(eval.normalized_task, "Draft the landing page copy");
        assert_eq!(eval.explanation_short, "Directly moves the launch forward.");
    }

    #[test]
    fn test_trap_task_pins_relevance_to_zero() {
        let eval = aggregate(1, "m", &document([1000, 1000, 1000, 1000], true));
        assert!(eval.trap_task);
        assert_eq!(eval.relevance, 0);
        // Other metrics are untouched.
        assert_eq!(eval.impact, 500);
    }

    #[test]
    fn test_trap_task_always_zero_relevance() {
        let mut rng = Lcg(42);
        for _ in 0..200 {
            let rel = [
                rng.next(1001),
                rng.next(1001),
                rng.next(1001),
                rng.next(1001),
            ];
            let eval = aggregate(1, "m", &document(rel, true));
            assert_eq!(eval.relevance, 0, "subfactors {rel:?}");
        }
    }

    #[test]
    fn test_question_blanked_when_clarification_not_needed() {
        let mut doc = document([100, 100, 100, 100], false);
        doc["clarification_needed"] = json!(false);
        doc["clarification_question"] = json!("Which page exactly?");

        let eval = aggregate(1, "m", &doc);
        assert!(!eval.clarification_needed);
        assert_eq!(eval.clarification_question, "");
    }

    #[test]
    fn test_question_kept_when_clarification_needed() {
        let mut doc = document([100, 100, 100, 100], false);
        doc["clarification_needed"] = json!(true);
        doc["clarification_question"] = json!(" Which page exactly? ");

        let eval = aggregate(1, "m", &doc);
        assert!(eval.clarification_needed);
        assert_eq!(eval.clarification_question, "Which page exactly?");
    }

    #[test]
    fn test_avoidance_flag_passed_through() {
        let mut doc = document([100, 100, 100, 100], false);
        doc["avoidance_flag"] = json!(true);
        let eval = aggregate(1, "m", &doc);
        assert!(eval.avoidance_flag);
        assert!(!eval.trap_task);
    }

    #[test]
    fn test_missing_and_mistyped_fields_default_to_zero() {
        let doc = json!({
            "scores": {
                "relevance_sub": {"direct_fit": 1000, "bottleneck": "high", "decoy": null},
                "impact_sub": "n/a"
            },
            "trap_task": "yes"
        });
        let eval = aggregate(1, "m", &doc);
        assert_eq!(eval.relevance, 400);
        assert_eq!(eval.impact, 0);
        assert_eq!(eval.urgency, 0);
        assert_eq!(eval.effort, 0);
        assert!(!eval.trap_task);
        assert_eq!(eval.normalized_task, "");
    }

    #[test]
    fn test_out_of_range_subfactors_are_clamped() {
        let doc = json!({
            "scores": {
                "relevance_sub": {"direct_fit": 5000, "bottleneck": -300, "core_support": 1000, "decoy": 1000},
                "effort_sub": {"complexity": 1e9, "emotion": 999.9, "uncertainty": -1}
            }
        });
        let eval = aggregate(1, "m", &doc);
        // 0.4·1000 + 0 + 0.2·1000 + 0.1·1000
        assert_eq!(eval.relevance, 700);
        // (2·1000 + 999 + 0) / 4 = 749.75
        assert_eq!(eval.effort, 749);
    }

    #[test]
    fn test_metrics_stay_within_bounds() {
        let mut rng = Lcg(7);
        for _ in 0..500 {
            let mut v = || rng.next(3000) - 1000;
            let doc = json!({
                "scores": {
                    "relevance_sub": {"direct_fit": v(), "bottleneck": v(), "core_support": v(), "decoy": v()},
                    "impact_sub": {"depth": v(), "breadth": v(), "compound": v(), "risk_reduction": v()},
                    "urgency_sub": {"deadline_pressure": v(), "effort_vs_time": v(), "cost_of_delay": v(), "interdependence": v()},
                    "effort_sub": {"complexity": v(), "emotion": v(), "uncertainty": v()}
                }
            });
            let eval = aggregate(1, "m", &doc);
            for metric in [eval.relevance, eval.impact, eval.urgency, eval.effort] {
                assert!((METRIC_MIN..=METRIC_MAX).contains(&metric), "{metric} out of range");
            }
        }
    }

    #[test]
    fn test_maximum_subfactors_reach_maximum_metrics() {
        let doc = json!({
            "scores": {
                "relevance_sub": {"direct_fit": 1000, "bottleneck": 1000, "core_support": 1000, "decoy": 1000},
                "impact_sub": {"depth": 1000, "breadth": 1000, "compound": 1000, "risk_reduction": 1000},
                "urgency_sub": {"deadline_pressure": 1000, "effort_vs_time": 1000, "cost_of_delay": 1000, "interdependence": 1000},
                "effort_sub": {"complexity": 1000, "emotion": 1000, "uncertainty": 1000}
            }
        });
        let eval = aggregate(1, "m", &doc);
        assert_eq!(
            [eval.relevance, eval.impact, eval.urgency, eval.effort],
            [1000, 1000, 1000, 1000]
        );
    }

    #[test]
    fn test_aggregation_is_pure() {
        let doc = document([321, 654, 987, 12], false);
        assert_eq!(aggregate(3, "m", &doc), aggregate(3, "m", &doc));
    }
}
