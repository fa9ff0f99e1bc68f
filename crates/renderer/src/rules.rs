//! Rule matching: which symbolizers apply to a feature at a given scale.

use map_common::style::{FeatureTypeStyle, Rule, Symbolizer};
use map_common::Feature;

/// Tolerance applied to both scale bounds, so a denominator sitting exactly
/// on a rule boundary is not lost to floating-point noise.
pub const SCALE_TOLERANCE: f64 = 1e-6;

/// One applicable symbolizer with its position in the rule list, which
/// fixes draw order.
#[derive(Debug, Clone, Copy)]
pub struct SymbolizerMatch<'a> {
    pub rule_index: usize,
    pub symbolizer_index: usize,
    pub symbolizer: &'a Symbolizer,
}

/// Result of matching one feature against one rule list.
#[derive(Debug, Default)]
pub struct RuleMatch<'a> {
    pub symbolizers: Vec<SymbolizerMatch<'a>>,
    /// True when the match came from else rules only.
    pub via_else: bool,
}

/// Scale applicability: `[min, max)` with tolerance on both bounds.
pub fn rule_applies_at_scale(rule: &Rule, scale_denominator: f64) -> bool {
    rule.min_scale_denominator - SCALE_TOLERANCE <= scale_denominator
        && rule.max_scale_denominator + SCALE_TOLERANCE > scale_denominator
}

/// Case-insensitive feature-type gate: a feature only sees the rules of
/// feature-type styles declaring its schema type name.
pub fn feature_type_matches(fts: &FeatureTypeStyle, feature: &Feature) -> bool {
    fts.feature_type_name
        .eq_ignore_ascii_case(feature.type_name())
}

/// Collect the symbolizers that apply to a feature, preserving rule order.
///
/// Two passes: every non-else rule whose scale range and filter accept the
/// feature contributes its symbolizers (more than one rule may fire). Only
/// when no non-else rule fired do the else rules get a turn; an else rule
/// still has to pass the scale gate.
pub fn applicable_symbolizers<'a>(
    feature: &Feature,
    rules: &'a [Rule],
    scale_denominator: f64,
) -> RuleMatch<'a> {
    let mut matched = RuleMatch::default();

    for (rule_index, rule) in rules.iter().enumerate() {
        if rule.is_else_filter || !rule_applies_at_scale(rule, scale_denominator) {
            continue;
        }
        let filter_accepts = rule
            .filter
            .as_ref()
            .map(|f| f.evaluate(feature))
            .unwrap_or(true);
        if filter_accepts {
            collect(&mut matched, rule_index, rule);
        }
    }

    if matched.symbolizers.is_empty() {
        for (rule_index, rule) in rules.iter().enumerate() {
            if rule.is_else_filter && rule_applies_at_scale(rule, scale_denominator) {
                collect(&mut matched, rule_index, rule);
                matched.via_else = true;
            }
        }
    }

    matched
}

fn collect<'a>(matched: &mut RuleMatch<'a>, rule_index: usize, rule: &'a Rule) {
    for (symbolizer_index, symbolizer) in rule.symbolizers.iter().enumerate() {
        matched.symbolizers.push(SymbolizerMatch {
            rule_index,
            symbolizer_index,
            symbolizer,
        });
    }
}
